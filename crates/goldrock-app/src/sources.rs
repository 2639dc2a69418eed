//! Where decision trees come from.

use std::future::Future;

use goldrock_core::models::tree::DecisionTree;
use goldrock_trainer::TrainerError;
use goldrock_trainer::catalog;
use goldrock_trainer::validate::ensure_well_formed;

/// Supplies validated trees by id.
pub trait TreeSource: Send + Sync {
    fn load_tree(&self, tree_id: &str) -> impl Future<Output = eyre::Result<DecisionTree>> + Send;

    fn list_tree_ids(&self) -> impl Future<Output = eyre::Result<Vec<String>>> + Send;
}

/// The trees compiled into `goldrock-trainer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogTrees;

impl TreeSource for CatalogTrees {
    async fn load_tree(&self, tree_id: &str) -> eyre::Result<DecisionTree> {
        let tree = catalog::get_tree(tree_id)
            .ok_or_else(|| TrainerError::UnknownTree(tree_id.to_string()))?;
        ensure_well_formed(tree)?;
        Ok(tree.clone())
    }

    async fn list_tree_ids(&self) -> eyre::Result<Vec<String>> {
        Ok(catalog::all_trees().iter().map(|t| t.id.clone()).collect())
    }
}

/// Trees stored as JSON in S3 under `trees/`.
#[derive(Debug, Clone)]
pub struct S3Trees {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Trees {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

impl TreeSource for S3Trees {
    async fn load_tree(&self, tree_id: &str) -> eyre::Result<DecisionTree> {
        Ok(goldrock_storage::trees::load_tree(&self.client, &self.bucket, tree_id).await?)
    }

    async fn list_tree_ids(&self) -> eyre::Result<Vec<String>> {
        Ok(goldrock_storage::trees::list_tree_ids(&self.client, &self.bucket).await?)
    }
}
