//! goldrock-core
//!
//! Pure domain types and S3 key conventions for the case trainer.
//! No AWS SDK dependency; this is the shared vocabulary of the GoldRock system.

pub mod error;
pub mod models;
pub mod s3_keys;
