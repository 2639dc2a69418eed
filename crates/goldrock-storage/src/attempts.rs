//! Attempt persistence and per-user progress aggregation.
//!
//! Each completed attempt is written once under its record id. The progress
//! aggregate for the (user, tree) pair is then updated with ETag optimistic
//! locking so concurrent submissions from the same user never lose a count.
//! Both steps tolerate a repeat of the same record, so a submission that
//! failed halfway can be retried as is.

use std::time::Duration;

use aws_sdk_s3::Client;
use goldrock_core::models::attempt::AttemptRecord;
use goldrock_core::models::progress::TreeProgress;
use goldrock_core::s3_keys;
use tracing::{debug, info};

use crate::error::StorageError;
use crate::objects::{self, PutCondition};
use crate::state;

const MAX_PROGRESS_WRITES: u32 = 5;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(50);

/// Persist a completed attempt and fold it into the user's progress.
///
/// Returns the stored record. When a record with the same id already
/// exists, that copy is kept and only the progress step is repeated.
pub async fn record_attempt(
    client: &Client,
    bucket: &str,
    record: &AttemptRecord,
) -> Result<AttemptRecord, StorageError> {
    let user_id = s3_keys::check_segment(&record.user_id)?;
    let tree_id = s3_keys::check_segment(&record.result.tree_id)?;
    let key = s3_keys::attempt(user_id, tree_id, record.id);

    let stored = match state::save_json(client, bucket, &key, record, PutCondition::IfAbsent).await {
        Ok(_) => {
            info!(
                record_id = %record.id,
                user_id,
                tree_id,
                score = record.result.score,
                "attempt recorded"
            );
            record.clone()
        }
        Err(StorageError::PreconditionFailed { .. }) => {
            debug!(key = %key, "attempt already recorded, resuming progress update");
            state::load_json::<AttemptRecord>(client, bucket, &key).await?.0
        }
        Err(e) => return Err(e),
    };

    update_progress(client, bucket, &stored).await?;
    Ok(stored)
}

/// Apply one attempt record to the stored progress aggregate. A record
/// that was already applied leaves the stored object untouched.
pub async fn update_progress(
    client: &Client,
    bucket: &str,
    record: &AttemptRecord,
) -> Result<TreeProgress, StorageError> {
    let key = s3_keys::progress(
        s3_keys::check_segment(&record.user_id)?,
        s3_keys::check_segment(&record.result.tree_id)?,
    );

    for attempt in 1..=MAX_PROGRESS_WRITES {
        let existing = state::load_json_opt::<TreeProgress>(client, bucket, &key).await?;
        let (mut progress, etag) = match existing {
            Some((progress, etag)) => (progress, Some(etag)),
            None => (
                TreeProgress::new(&record.user_id, &record.result.tree_id),
                None,
            ),
        };
        if !progress.record(record) {
            debug!(key = %key, record_id = %record.id, "progress already includes record");
            return Ok(progress);
        }

        let condition = match etag.as_deref() {
            Some(etag) => PutCondition::IfMatch(etag),
            None => PutCondition::IfAbsent,
        };

        match state::save_json(client, bucket, &key, &progress, condition).await {
            Ok(_) => {
                debug!(key = %key, attempt_count = progress.attempt_count, "progress updated");
                return Ok(progress);
            }
            Err(StorageError::PreconditionFailed { .. }) => {
                debug!(key = %key, attempt, "progress write conflicted, retrying");
                tokio::time::sleep(RETRY_BASE_DELAY * attempt).await;
            }
            Err(e) => return Err(e),
        }
    }

    Err(StorageError::Contention {
        key,
        attempts: MAX_PROGRESS_WRITES,
    })
}

/// Load progress for a (user, tree) pair; empty if nothing was recorded.
pub async fn load_progress(
    client: &Client,
    bucket: &str,
    user_id: &str,
    tree_id: &str,
) -> Result<TreeProgress, StorageError> {
    let key = s3_keys::progress(
        s3_keys::check_segment(user_id)?,
        s3_keys::check_segment(tree_id)?,
    );
    Ok(state::load_json_opt(client, bucket, &key)
        .await?
        .map(|(progress, _)| progress)
        .unwrap_or_else(|| TreeProgress::new(user_id, tree_id)))
}

/// Every stored attempt for a (user, tree) pair, oldest first.
pub async fn list_attempts(
    client: &Client,
    bucket: &str,
    user_id: &str,
    tree_id: &str,
) -> Result<Vec<AttemptRecord>, StorageError> {
    let prefix = s3_keys::attempts_prefix(
        s3_keys::check_segment(user_id)?,
        s3_keys::check_segment(tree_id)?,
    );

    let mut records = Vec::new();
    for key in objects::list_objects(client, bucket, &prefix).await? {
        let (record, _): (AttemptRecord, _) = state::load_json(client, bucket, &key).await?;
        records.push(record);
    }
    records.sort_by_key(|r| r.recorded_at);
    Ok(records)
}
