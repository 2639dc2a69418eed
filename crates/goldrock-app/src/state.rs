use std::collections::HashMap;
use std::sync::Arc;

use goldrock_core::models::attempt::AttemptRecord;
use goldrock_core::models::traversal::TraversalState;
use goldrock_core::models::tree::DecisionTree;
use tokio::sync::Mutex;
use uuid::Uuid;

/// One learner's in-flight attempt.
#[derive(Debug, Clone)]
pub struct ActiveAttempt {
    pub user_id: String,
    pub tree: Arc<DecisionTree>,
    pub state: TraversalState,
    /// Built once when the attempt completes, under the attempt's id, and
    /// resubmitted unchanged until the sink accepts it.
    pub record: Option<AttemptRecord>,
    /// A submit for this attempt is in flight.
    pub submitting: bool,
    /// Last time a call touched this attempt.
    pub last_active: jiff::Timestamp,
}

impl ActiveAttempt {
    pub fn new(user_id: impl Into<String>, tree: Arc<DecisionTree>, state: TraversalState) -> Self {
        Self {
            user_id: user_id.into(),
            tree,
            state,
            record: None,
            submitting: false,
            last_active: jiff::Timestamp::now(),
        }
    }

    /// Has the learner left this attempt idle for longer than `max_idle`?
    /// Completed attempts waiting on a submit never count as idle.
    pub fn is_idle(&self, now: jiff::Timestamp, max_idle: jiff::SignedDuration) -> bool {
        self.record.is_none() && now.duration_since(self.last_active) > max_idle
    }
}

pub type AttemptMap = Arc<Mutex<HashMap<Uuid, ActiveAttempt>>>;
