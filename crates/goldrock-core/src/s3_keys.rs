//! S3 key/path conventions.
//!
//! Pure string functions with no AWS SDK dependency. These define the canonical
//! layout of objects in the GoldRock bucket.

use uuid::Uuid;

use crate::error::CoreError;

pub const TREES_PREFIX: &str = "trees/";

pub const CASES_PREFIX: &str = "cases/";

pub fn tree(tree_id: &str) -> String {
    format!("trees/{tree_id}.json")
}

/// Recover a tree id from a key produced by [`tree`].
pub fn tree_id_from_key(key: &str) -> Option<&str> {
    key.strip_prefix(TREES_PREFIX)?.strip_suffix(".json")
}

pub fn attempt(user_id: &str, tree_id: &str, attempt_id: Uuid) -> String {
    format!("attempts/{user_id}/{tree_id}/{attempt_id}.json")
}

pub fn attempts_prefix(user_id: &str, tree_id: &str) -> String {
    format!("attempts/{user_id}/{tree_id}/")
}

pub fn progress(user_id: &str, tree_id: &str) -> String {
    format!("progress/{user_id}/{tree_id}.json")
}

pub fn case(id: Uuid) -> String {
    format!("cases/{id}.json")
}

/// Reject ids that would escape their slot in a key.
pub fn check_segment(segment: &str) -> Result<&str, CoreError> {
    if segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\'])
        || segment.chars().any(char::is_control)
    {
        return Err(CoreError::InvalidKeySegment(segment.to_string()));
    }
    Ok(segment)
}
