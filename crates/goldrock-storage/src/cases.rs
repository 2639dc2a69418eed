use aws_sdk_s3::Client;
use goldrock_core::models::case::GeneratedCase;
use goldrock_core::s3_keys;
use tracing::info;
use uuid::Uuid;

use crate::error::StorageError;
use crate::objects::{self, PutCondition};
use crate::state;

pub async fn save_case(
    client: &Client,
    bucket: &str,
    case: &GeneratedCase,
) -> Result<String, StorageError> {
    let key = s3_keys::case(case.id);
    let etag = state::save_json(client, bucket, &key, case, PutCondition::IfAbsent).await?;
    info!(case_id = %case.id, title = %case.title, "generated case saved");
    Ok(etag)
}

pub async fn load_case(client: &Client, bucket: &str, id: Uuid) -> Result<GeneratedCase, StorageError> {
    let (case, _) = state::load_json(client, bucket, &s3_keys::case(id)).await?;
    Ok(case)
}

/// Ids of every stored case. Keys that do not parse as UUIDs are skipped.
pub async fn list_case_ids(client: &Client, bucket: &str) -> Result<Vec<Uuid>, StorageError> {
    let keys = objects::list_objects(client, bucket, s3_keys::CASES_PREFIX).await?;
    Ok(keys
        .iter()
        .filter_map(|k| k.strip_prefix(s3_keys::CASES_PREFIX)?.strip_suffix(".json"))
        .filter_map(|id| id.parse().ok())
        .collect())
}
