//! AI-authored teaching cases.
//!
//! The model drafts the case; this module validates the draft, cleans its
//! lists, and backfills thin sections from the rule-based findings so a
//! case is never returned with an empty history or examination.

use std::collections::HashSet;

use goldrock_core::models::case::{CaseRequest, GeneratedCase};
use goldrock_core::models::usage::TokenUsage;
use goldrock_trainer::findings::clinical_findings;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::BedrockError;
use crate::generator::TextGenerator;
use crate::json;

const CASE_SYSTEM_PROMPT: &str = "\
You are a medical educator writing realistic teaching cases for clinical \
trainees. Respond with a single JSON object and nothing else, using exactly \
these keys: title, presentation, history, physical_exam, diagnostics (array \
of strings), differential (array of strings), final_diagnosis, \
teaching_points (array of strings), difficulty (integer 1-3). Do not include \
real patient identifiers.";

/// The shape the model is asked to return.
#[derive(Debug, Deserialize)]
struct CaseDraft {
    #[serde(default)]
    title: String,
    #[serde(default)]
    presentation: String,
    #[serde(default)]
    history: String,
    #[serde(default)]
    physical_exam: String,
    #[serde(default)]
    diagnostics: Vec<String>,
    #[serde(default)]
    differential: Vec<String>,
    #[serde(default)]
    final_diagnosis: String,
    #[serde(default)]
    teaching_points: Vec<String>,
    #[serde(default)]
    difficulty: Option<u8>,
}

/// Build the user message for a case request.
pub fn build_case_prompt(request: &CaseRequest) -> String {
    let difficulty = request.difficulty.clamp(1, 3);
    let mut prompt = format!(
        "Write a {} teaching case in {} (difficulty {difficulty} of 3).",
        difficulty_label(difficulty),
        request.specialty.trim(),
    );
    if let Some(topic) = request.topic.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        prompt.push_str(&format!(" Focus on: {topic}."));
    }
    if let Some(level) = request
        .learner_level
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
    {
        prompt.push_str(&format!(" The learner is a {level}."));
    }
    prompt.push_str(" Include at least three differential diagnoses and three teaching points.");
    prompt
}

/// Generate, validate and clean a teaching case.
pub async fn generate_case<G: TextGenerator>(
    generator: &G,
    request: &CaseRequest,
) -> Result<GeneratedCase, BedrockError> {
    info!(specialty = %request.specialty, difficulty = request.difficulty, "generating case");

    let generation = generator
        .generate(CASE_SYSTEM_PROMPT, &build_case_prompt(request))
        .await?;

    let case = parse_case(&generation.text, request, generator.model_id(), generation.usage)?;
    info!(case_id = %case.id, title = %case.title, "case generated");
    Ok(case)
}

/// Turn a raw model reply into a `GeneratedCase`.
pub fn parse_case(
    text: &str,
    request: &CaseRequest,
    model_id: &str,
    usage: TokenUsage,
) -> Result<GeneratedCase, BedrockError> {
    let draft: CaseDraft = json::parse_json(text)?;

    let title = required(draft.title, "title")?;
    let presentation = required(draft.presentation, "presentation")?;
    let final_diagnosis = required(draft.final_diagnosis, "final_diagnosis")?;

    let mut history = draft.history.trim().to_string();
    let mut physical_exam = draft.physical_exam.trim().to_string();
    let mut diagnostics = clean_list(draft.diagnostics);

    if history.is_empty() || physical_exam.is_empty() || diagnostics.is_empty() {
        warn!(final_diagnosis = %final_diagnosis, "case draft incomplete, backfilling from findings");
        let findings = clinical_findings(&final_diagnosis);
        if history.is_empty() {
            history = findings.history;
        }
        if physical_exam.is_empty() {
            physical_exam = findings.physical_exam;
        }
        if diagnostics.is_empty() {
            diagnostics = findings.labs.into_iter().chain(findings.imaging).collect();
        }
    }

    let teaching_points = clean_list(draft.teaching_points);
    if teaching_points.is_empty() {
        return Err(BedrockError::SchemaViolation(
            "case has no teaching points".to_string(),
        ));
    }

    Ok(GeneratedCase {
        id: Uuid::new_v4(),
        title,
        specialty: request.specialty.trim().to_string(),
        difficulty: draft.difficulty.unwrap_or(request.difficulty).clamp(1, 3),
        presentation,
        history,
        physical_exam,
        diagnostics,
        differential: clean_list(draft.differential),
        final_diagnosis,
        teaching_points,
        model_id: model_id.to_string(),
        usage,
        created_at: jiff::Timestamp::now(),
    })
}

fn required(value: String, field: &str) -> Result<String, BedrockError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BedrockError::SchemaViolation(format!(
            "missing required field: {field}"
        )));
    }
    Ok(trimmed.to_string())
}

/// Trim entries, drop blanks, and drop case-insensitive duplicates,
/// keeping first occurrences in order.
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && seen.insert(s.to_lowercase()))
        .collect()
}

fn difficulty_label(difficulty: u8) -> &'static str {
    match difficulty {
        1 => "introductory",
        2 => "intermediate",
        _ => "advanced",
    }
}
