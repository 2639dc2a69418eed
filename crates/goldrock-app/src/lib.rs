//! goldrock-app library root.
//!
//! The trainer service and its AWS wiring, exposed as a library so the
//! CLI, the walkthrough example and integration tests share one code path.

pub mod aws;
pub mod config;
pub mod service;
pub mod sinks;
pub mod sources;
pub mod state;

pub use service::{AttemptView, NodeView, TrainerService};
