//! goldrock-bedrock
//!
//! LLM-backed content generation. The model sits behind the narrow
//! [`generator::TextGenerator`] interface; this crate builds prompts and
//! turns the model's JSON replies into validated domain types.

pub mod case;
pub mod error;
pub mod generator;
pub mod json;
pub mod tokens;
pub mod tree;
