//! Decision tree source.
//!
//! Trees are validated on every load and save, so the engine only ever sees
//! well-formed trees.

use aws_sdk_s3::Client;
use goldrock_core::models::tree::DecisionTree;
use goldrock_core::s3_keys;
use goldrock_trainer::validate::ensure_well_formed;
use tracing::{info, warn};

use crate::error::StorageError;
use crate::objects::{self, PutCondition};
use crate::state;

pub async fn load_tree(
    client: &Client,
    bucket: &str,
    tree_id: &str,
) -> Result<DecisionTree, StorageError> {
    let key = s3_keys::tree(s3_keys::check_segment(tree_id)?);
    let (tree, _etag): (DecisionTree, _) = state::load_json(client, bucket, &key).await?;

    if tree.id != tree_id {
        warn!(key = %key, stored_id = %tree.id, "tree id does not match its key");
    }
    ensure_well_formed(&tree)?;

    Ok(tree)
}

pub async fn save_tree(
    client: &Client,
    bucket: &str,
    tree: &DecisionTree,
) -> Result<String, StorageError> {
    let key = s3_keys::tree(s3_keys::check_segment(&tree.id)?);
    ensure_well_formed(tree)?;

    let etag = state::save_json(client, bucket, &key, tree, PutCondition::None).await?;
    info!(tree_id = %tree.id, nodes = tree.nodes.len(), "tree saved");
    Ok(etag)
}

/// Ids of every stored tree, sorted.
pub async fn list_tree_ids(client: &Client, bucket: &str) -> Result<Vec<String>, StorageError> {
    let keys = objects::list_objects(client, bucket, s3_keys::TREES_PREFIX).await?;
    let mut ids: Vec<String> = keys
        .iter()
        .filter_map(|k| s3_keys::tree_id_from_key(k))
        .map(String::from)
        .collect();
    ids.sort();
    Ok(ids)
}
