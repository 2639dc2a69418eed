use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Where a traversal sits in its lifecycle.
///
/// `Active` is the only non-terminal status. A traversal becomes `Completed`
/// when it lands on an outcome node and `Abandoned` when the learner exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum TraversalStatus {
    #[default]
    Active,
    Completed,
    Abandoned,
}

impl TraversalStatus {
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Abandoned)
    }
}

/// Per-attempt traversal state. Owned by the caller and passed explicitly to
/// every engine operation; it can be serialized mid-attempt and restored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TraversalState {
    pub tree_id: String,
    pub current_node_id: String,
    /// Visited node ids, root first.
    pub path: Vec<String>,
    /// Decision node id → chosen option text.
    pub decisions: BTreeMap<String, String>,
    pub started_at: jiff::Timestamp,
    pub status: TraversalStatus,
    #[serde(default)]
    pub backtracks: u32,
}

impl TraversalState {
    pub fn is_active(&self) -> bool {
        self.status == TraversalStatus::Active
    }

    pub fn is_completed(&self) -> bool {
        self.status == TraversalStatus::Completed
    }

    /// Number of nodes visited so far, the root included.
    pub fn steps_taken(&self) -> usize {
        self.path.len()
    }
}

/// Progress indicator for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Progress {
    pub steps_taken: u32,
    pub expected_steps: Option<u32>,
}
