use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::attempt::AttemptRecord;

/// Aggregate of one user's attempts on one tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TreeProgress {
    pub user_id: String,
    pub tree_id: String,
    pub attempt_count: u32,
    pub best_score: Option<u32>,
    /// Fastest completion among attempts, in seconds.
    pub best_time_secs: Option<u64>,
    /// Attempts that ended on an optimal outcome.
    pub optimal_outcomes: u32,
    pub last_attempt_at: Option<jiff::Timestamp>,
    /// Ids of the records already folded in.
    #[serde(default)]
    pub recorded: BTreeSet<Uuid>,
}

impl TreeProgress {
    pub fn new(user_id: impl Into<String>, tree_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            tree_id: tree_id.into(),
            attempt_count: 0,
            best_score: None,
            best_time_secs: None,
            optimal_outcomes: 0,
            last_attempt_at: None,
            recorded: BTreeSet::new(),
        }
    }

    /// Fold one attempt into the aggregate.
    ///
    /// Records for another user or tree, and records already folded in, are
    /// ignored and return `false`.
    pub fn record(&mut self, record: &AttemptRecord) -> bool {
        if record.user_id != self.user_id || record.result.tree_id != self.tree_id {
            return false;
        }
        if !self.recorded.insert(record.id) {
            return false;
        }

        let result = &record.result;
        self.attempt_count += 1;
        self.best_score = Some(self.best_score.map_or(result.score, |s| s.max(result.score)));
        if result.completed {
            self.best_time_secs = Some(
                self.best_time_secs
                    .map_or(result.time_spent, |t| t.min(result.time_spent)),
            );
        }
        if result.is_optimal_path {
            self.optimal_outcomes += 1;
        }
        self.last_attempt_at = Some(match self.last_attempt_at {
            Some(prev) if prev > record.recorded_at => prev,
            _ => record.recorded_at,
        });
        true
    }
}
