//! goldrock-storage
//!
//! S3 persistence for trees, attempts, progress and generated cases.
//! Thin wrapper around the AWS S3 SDK.

pub mod attempts;
pub mod cases;
pub mod client;
pub mod error;
pub mod objects;
pub mod state;
pub mod trees;
