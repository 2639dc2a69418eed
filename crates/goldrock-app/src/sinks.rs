//! Where completed attempts go.

use std::future::Future;

use goldrock_core::models::attempt::AttemptRecord;
use goldrock_core::models::progress::TreeProgress;
use tokio::sync::Mutex;

/// Persists completed attempts.
///
/// A record may arrive more than once when an earlier submit failed
/// partway; it must be stored once per record id.
pub trait AttemptSink: Send + Sync {
    fn submit(&self, record: &AttemptRecord) -> impl Future<Output = eyre::Result<()>> + Send;
}

/// Attempt records and per-tree progress in S3.
#[derive(Debug, Clone)]
pub struct S3Attempts {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Attempts {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

impl AttemptSink for S3Attempts {
    async fn submit(&self, record: &AttemptRecord) -> eyre::Result<()> {
        goldrock_storage::attempts::record_attempt(&self.client, &self.bucket, record).await?;
        Ok(())
    }
}

/// Keeps records in memory. Used by the walkthrough and tests.
#[derive(Debug, Default)]
pub struct MemoryAttempts {
    records: Mutex<Vec<AttemptRecord>>,
}

impl MemoryAttempts {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<AttemptRecord> {
        self.records.lock().await.clone()
    }

    /// Aggregate the stored records for one user and tree.
    pub async fn progress(&self, user_id: &str, tree_id: &str) -> TreeProgress {
        let mut progress = TreeProgress::new(user_id, tree_id);
        for record in self.records.lock().await.iter() {
            progress.record(record);
        }
        progress
    }
}

impl AttemptSink for MemoryAttempts {
    async fn submit(&self, record: &AttemptRecord) -> eyre::Result<()> {
        let mut records = self.records.lock().await;
        if records.iter().any(|r| r.id == record.id) {
            tracing::debug!(record_id = %record.id, "attempt already kept");
            return Ok(());
        }
        records.push(record.clone());
        tracing::debug!(record_id = %record.id, tree_id = %record.result.tree_id, "attempt kept in memory");
        Ok(())
    }
}
