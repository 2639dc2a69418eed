use std::sync::Mutex;

use goldrock_bedrock::case::{build_case_prompt, generate_case};
use goldrock_bedrock::error::BedrockError;
use goldrock_bedrock::generator::{Generation, TextGenerator};
use goldrock_bedrock::json::extract_json;
use goldrock_bedrock::tree::{TreeRequest, generate_tree, slugify};
use goldrock_core::models::case::CaseRequest;
use goldrock_core::models::usage::TokenUsage;

/// Returns a canned reply and remembers the prompts it was given.
struct CannedGenerator {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl CannedGenerator {
    fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl TextGenerator for CannedGenerator {
    fn model_id(&self) -> &str {
        "stub-model"
    }

    async fn generate(
        &self,
        _system_prompt: &str,
        user_message: &str,
    ) -> Result<Generation, BedrockError> {
        self.prompts.lock().unwrap().push(user_message.to_string());
        Ok(Generation {
            text: self.reply.clone(),
            usage: TokenUsage {
                input_tokens: 120,
                output_tokens: 480,
                cost_usd: 0.0,
            },
        })
    }
}

struct FailingGenerator;

impl TextGenerator for FailingGenerator {
    fn model_id(&self) -> &str {
        "stub-model"
    }

    async fn generate(&self, _: &str, _: &str) -> Result<Generation, BedrockError> {
        Err(BedrockError::Invocation("throttled".to_string()))
    }
}

fn cardiology_request() -> CaseRequest {
    CaseRequest {
        specialty: "Cardiology".to_string(),
        difficulty: 2,
        topic: Some("inferior STEMI".to_string()),
        learner_level: Some("final-year medical student".to_string()),
    }
}

// ── JSON extraction ─────────────────────────────────────────────────

#[test]
fn bare_object_is_returned_as_is() {
    assert_eq!(extract_json(r#"{"a": 1}"#).unwrap(), r#"{"a": 1}"#);
}

#[test]
fn fenced_reply_is_unwrapped() {
    let reply = "Here is the case:\n```json\n{\"a\": {\"b\": 2}}\n```\nLet me know.";
    assert_eq!(extract_json(reply).unwrap(), r#"{"a": {"b": 2}}"#);
}

#[test]
fn prose_around_object_is_ignored() {
    let reply = "Sure! {\"a\": 1} Hope that helps {not json}";
    assert_eq!(extract_json(reply).unwrap(), r#"{"a": 1}"#);
}

#[test]
fn braces_inside_strings_do_not_close_the_object() {
    let reply = r#"{"note": "use } and { freely", "quote": "a \"}\" here"}"#;
    assert_eq!(extract_json(reply).unwrap(), reply);
}

#[test]
fn missing_or_unterminated_object_is_a_parse_error() {
    assert!(matches!(
        extract_json("no json here"),
        Err(BedrockError::ResponseParse(_))
    ));
    assert!(matches!(
        extract_json(r#"{"a": {"b": 1}"#),
        Err(BedrockError::ResponseParse(_))
    ));
}

// ── Cases ───────────────────────────────────────────────────────────

#[test]
fn case_prompt_mentions_request_details() {
    let prompt = build_case_prompt(&cardiology_request());
    assert!(prompt.contains("Cardiology"));
    assert!(prompt.contains("difficulty 2 of 3"));
    assert!(prompt.contains("inferior STEMI"));
    assert!(prompt.contains("final-year medical student"));
}

#[tokio::test]
async fn case_is_cleaned_and_wrapped() {
    let reply = r#"```json
{
  "title": "  Crushing chest pain at the bus stop ",
  "presentation": "A 58-year-old man with 40 minutes of central chest pain.",
  "history": "Smoker, type 2 diabetes.",
  "physical_exam": "Diaphoretic, BP 100/60.",
  "diagnostics": ["ECG", " ecg ", "Troponin", ""],
  "differential": ["Aortic dissection", "Pulmonary embolism", "aortic dissection"],
  "final_diagnosis": "Inferior STEMI",
  "teaching_points": ["Door-to-balloon under 90 minutes", "  "],
  "difficulty": 7
}
```"#;
    let generator = CannedGenerator::new(reply);

    let case = generate_case(&generator, &cardiology_request()).await.unwrap();

    assert_eq!(case.title, "Crushing chest pain at the bus stop");
    assert_eq!(case.diagnostics, vec!["ECG", "Troponin"]);
    assert_eq!(case.differential, vec!["Aortic dissection", "Pulmonary embolism"]);
    assert_eq!(case.teaching_points, vec!["Door-to-balloon under 90 minutes"]);
    assert_eq!(case.difficulty, 3);
    assert_eq!(case.specialty, "Cardiology");
    assert_eq!(case.model_id, "stub-model");
    assert_eq!(case.usage.total_tokens(), 600);
    assert_eq!(generator.prompts.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn thin_case_is_backfilled_from_findings() {
    let reply = r#"{
      "title": "Breathless and febrile",
      "presentation": "A 70-year-old woman with three days of cough.",
      "final_diagnosis": "Community-acquired pneumonia",
      "teaching_points": ["Use CURB-65"]
    }"#;
    let generator = CannedGenerator::new(reply);

    let case = generate_case(&generator, &cardiology_request()).await.unwrap();

    assert!(!case.history.is_empty());
    assert!(!case.physical_exam.is_empty());
    assert!(!case.diagnostics.is_empty());
    assert_eq!(case.difficulty, 2);
}

#[tokio::test]
async fn case_without_final_diagnosis_is_a_schema_violation() {
    let reply = r#"{"title": "Untitled", "presentation": "Something", "teaching_points": ["x"]}"#;
    let generator = CannedGenerator::new(reply);

    let err = generate_case(&generator, &cardiology_request()).await.unwrap_err();
    assert!(matches!(err, BedrockError::SchemaViolation(msg) if msg.contains("final_diagnosis")));
}

#[tokio::test]
async fn invocation_errors_pass_through() {
    let err = generate_case(&FailingGenerator, &cardiology_request())
        .await
        .unwrap_err();
    assert!(matches!(err, BedrockError::Invocation(_)));
}

// ── Trees ───────────────────────────────────────────────────────────

const GENERATED_TREE: &str = r#"Here you go:
{
  "id": "Acute Asthma!",
  "title": "Acute Asthma",
  "specialty": "",
  "category": "Respiratory",
  "difficulty": 0,
  "root_node_id": "start",
  "nodes": [
    {"type": "decision", "id": "start", "title": "Arrival", "content": "Wheezy, speaking in words.",
     "options": [
       {"text": "Nebulised salbutamol", "next_node_id": "nebs"},
       {"text": "Send home", "next_node_id": "home"}
     ]},
    {"type": "decision", "id": "nebs", "title": "After nebs", "content": "Still tight.",
     "options": [
       {"text": "IV magnesium", "next_node_id": "mag"},
       {"text": "Wait", "next_node_id": "home"}
     ]},
    {"type": "outcome", "id": "mag", "title": "Improves", "content": "Peak flow recovers.",
     "is_optimal": true, "explanation": "Escalation per guidelines."},
    {"type": "outcome", "id": "home", "title": "Re-presents", "content": "Back within hours.",
     "is_optimal": false}
  ]
}"#;

fn asthma_request() -> TreeRequest {
    TreeRequest {
        topic: "acute severe asthma".to_string(),
        specialty: "Emergency Medicine".to_string(),
        difficulty: 2,
        max_depth: 3,
    }
}

#[tokio::test]
async fn generated_tree_is_normalized_and_measured() {
    let generator = CannedGenerator::new(GENERATED_TREE);

    let tree = generate_tree(&generator, &asthma_request()).await.unwrap();

    assert_eq!(tree.id, "acute_asthma");
    assert_eq!(tree.specialty, "Emergency Medicine");
    assert_eq!(tree.difficulty, 2);
    // start -> nebs -> mag
    assert_eq!(tree.optimal_path_length, Some(3));
}

#[tokio::test]
async fn generated_tree_with_dangling_option_is_rejected() {
    let broken = GENERATED_TREE.replace(r#""next_node_id": "mag""#, r#""next_node_id": "icu""#);
    let generator = CannedGenerator::new(&broken);

    let err = generate_tree(&generator, &asthma_request()).await.unwrap_err();
    assert!(matches!(err, BedrockError::MalformedTree(_)));
}

#[test]
fn slugify_keeps_ascii_words_only() {
    assert_eq!(slugify("  Acute Asthma (Adult) "), "acute_asthma_adult");
    assert_eq!(slugify("../etc/passwd"), "etc_passwd");
    assert_eq!(slugify("!!!"), "");
}
