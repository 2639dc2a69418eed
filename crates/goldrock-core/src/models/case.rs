use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::usage::TokenUsage;

/// Parameters for an AI-authored teaching case.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CaseRequest {
    pub specialty: String,
    /// 1 through 3; out-of-range values are clamped when the prompt is built.
    pub difficulty: u8,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub learner_level: Option<String>,
}

/// A generated teaching case, after validation and cleanup.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GeneratedCase {
    pub id: Uuid,
    pub title: String,
    pub specialty: String,
    pub difficulty: u8,
    pub presentation: String,
    pub history: String,
    pub physical_exam: String,
    pub diagnostics: Vec<String>,
    pub differential: Vec<String>,
    pub final_diagnosis: String,
    pub teaching_points: Vec<String>,
    pub model_id: String,
    pub usage: TokenUsage,
    pub created_at: jiff::Timestamp,
}
