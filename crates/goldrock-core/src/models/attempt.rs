use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Components of an attempt score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScoreBreakdown {
    /// Optimal path length over actual path length, as a percentage.
    pub path_efficiency: f64,
    /// 100 for an optimal outcome, 50 otherwise.
    pub correctness: u32,
    /// 10 when finished inside the time window, 0 otherwise.
    pub time_bonus: u32,
    pub total: u32,
}

/// The summary of a finished traversal, handed to the persistence sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AttemptResult {
    pub tree_id: String,
    pub path_taken: Vec<String>,
    pub decisions: BTreeMap<String, String>,
    pub final_outcome: String,
    /// Whole seconds between start and completion.
    pub time_spent: u64,
    pub score: u32,
    pub is_optimal_path: bool,
    pub completed: bool,
    pub breakdown: ScoreBreakdown,
    pub backtracks: u32,
    pub started_at: jiff::Timestamp,
    pub completed_at: jiff::Timestamp,
}

/// A persisted attempt, attributed to a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AttemptRecord {
    pub id: Uuid,
    pub user_id: String,
    pub result: AttemptResult,
    pub recorded_at: jiff::Timestamp,
}

impl AttemptRecord {
    pub fn new(user_id: impl Into<String>, result: AttemptResult) -> Self {
        Self::with_id(Uuid::new_v4(), user_id, result)
    }

    /// Build a record under a caller-chosen id. Resubmitting a record with
    /// the same id stores it once.
    pub fn with_id(id: Uuid, user_id: impl Into<String>, result: AttemptResult) -> Self {
        Self {
            id,
            user_id: user_id.into(),
            result,
            recorded_at: jiff::Timestamp::now(),
        }
    }
}
