use thiserror::Error;

/// Contract violations raised by the decision-tree engine.
///
/// Neither variant is transient; callers surface them instead of retrying.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrainerError {
    #[error("invalid transition ({action}): {reason}")]
    InvalidTransition {
        action: &'static str,
        reason: String,
    },

    #[error("malformed tree '{tree_id}': {reason}")]
    MalformedTree { tree_id: String, reason: String },

    #[error("unknown tree: {0}")]
    UnknownTree(String),
}

impl TrainerError {
    pub(crate) fn transition(action: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidTransition {
            action,
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(tree_id: &str, reason: impl Into<String>) -> Self {
        Self::MalformedTree {
            tree_id: tree_id.to_string(),
            reason: reason.into(),
        }
    }
}
