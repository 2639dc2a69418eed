//! goldrock-trainer
//!
//! Clinical decision-tree training. Pure logic, no AWS dependency.
//! Drives a learner through an authored tree, scores the attempt, and
//! produces the review and findings content around it.

pub mod catalog;
pub mod config;
pub mod debrief;
pub mod engine;
pub mod error;
pub mod findings;
pub mod scoring;
pub mod validate;

pub use config::{DecisionHistory, EngineConfig};
pub use engine::{Engine, Step};
pub use error::TrainerError;
