use std::collections::BTreeMap;

use goldrock_core::models::attempt::{AttemptRecord, AttemptResult, ScoreBreakdown};
use goldrock_core::models::progress::TreeProgress;
use goldrock_core::models::tree::{DecisionNode, DecisionTree};
use goldrock_core::models::usage::ModelPricing;
use goldrock_core::s3_keys;

const TREE_JSON: &str = r#"{
    "id": "syncope",
    "title": "Syncope in the ED",
    "specialty": "emergency_medicine",
    "category": "cardiology",
    "difficulty": 2,
    "root_node_id": "start",
    "nodes": [
        {
            "type": "decision",
            "id": "start",
            "title": "Initial assessment",
            "content": "A 68-year-old collapses while standing.",
            "options": [
                { "text": "Obtain ECG", "next_node_id": "good" },
                { "text": "Discharge", "next_node_id": "bad" }
            ]
        },
        {
            "type": "outcome",
            "id": "good",
            "title": "Complete heart block identified",
            "content": "Pacing arranged.",
            "is_optimal": true,
            "explanation": "ECG is mandatory in syncope."
        },
        {
            "type": "outcome",
            "id": "bad",
            "title": "Re-presents in extremis",
            "content": "Missed arrhythmia.",
            "is_optimal": false
        }
    ]
}"#;

fn result(tree_id: &str, score: u32, time_spent: u64, optimal: bool) -> AttemptResult {
    let now = jiff::Timestamp::now();
    AttemptResult {
        tree_id: tree_id.to_string(),
        path_taken: vec!["start".to_string(), "good".to_string()],
        decisions: BTreeMap::new(),
        final_outcome: "good".to_string(),
        time_spent,
        score,
        is_optimal_path: optimal,
        completed: true,
        breakdown: ScoreBreakdown {
            path_efficiency: 100.0,
            correctness: if optimal { 100 } else { 50 },
            time_bonus: 0,
            total: score,
        },
        backtracks: 0,
        started_at: now,
        completed_at: now,
    }
}

#[test]
fn tree_deserializes_tagged_nodes() {
    let tree: DecisionTree = serde_json::from_str(TREE_JSON).unwrap();

    assert_eq!(tree.nodes.len(), 3);
    assert_eq!(tree.optimal_path_length, None);
    assert_eq!(tree.root().unwrap().id(), "start");
    assert_eq!(tree.root().unwrap().options().len(), 2);

    match tree.node("good").unwrap() {
        DecisionNode::Outcome {
            is_optimal,
            explanation,
            ..
        } => {
            assert!(*is_optimal);
            assert_eq!(explanation.as_deref(), Some("ECG is mandatory in syncope."));
        }
        other => panic!("expected outcome, got {other:?}"),
    }
    assert_eq!(tree.outcomes().count(), 2);
}

#[test]
fn node_type_tag_is_serialized() {
    let tree: DecisionTree = serde_json::from_str(TREE_JSON).unwrap();
    let value = serde_json::to_value(&tree).unwrap();

    assert_eq!(value["nodes"][0]["type"], "decision");
    assert_eq!(value["nodes"][1]["type"], "outcome");
    assert!(value["nodes"][2].get("explanation").is_none());
}

#[test]
fn outcome_without_is_optimal_is_rejected() {
    let json = r#"{ "type": "outcome", "id": "x", "title": "t", "content": "c" }"#;
    assert!(serde_json::from_str::<DecisionNode>(json).is_err());
}

#[test]
fn progress_tracks_best_score_and_count() {
    let mut progress = TreeProgress::new("u1", "syncope");

    assert!(progress.record(&AttemptRecord::new("u1", result("syncope", 45, 400, false))));
    assert!(progress.record(&AttemptRecord::new("u1", result("syncope", 91, 120, true))));
    assert!(progress.record(&AttemptRecord::new("u1", result("syncope", 70, 200, true))));

    assert_eq!(progress.attempt_count, 3);
    assert_eq!(progress.best_score, Some(91));
    assert_eq!(progress.best_time_secs, Some(120));
    assert_eq!(progress.optimal_outcomes, 2);
    assert!(progress.last_attempt_at.is_some());
}

#[test]
fn progress_ignores_foreign_records() {
    let mut progress = TreeProgress::new("u1", "syncope");

    assert!(!progress.record(&AttemptRecord::new("u2", result("syncope", 91, 10, true))));
    assert!(!progress.record(&AttemptRecord::new("u1", result("sepsis", 91, 10, true))));
    assert_eq!(progress.attempt_count, 0);
    assert_eq!(progress.best_score, None);
}

#[test]
fn progress_counts_a_record_once() {
    let mut progress = TreeProgress::new("u1", "syncope");
    let record = AttemptRecord::with_id(
        uuid::Uuid::new_v4(),
        "u1",
        result("syncope", 80, 150, true),
    );

    assert!(progress.record(&record));
    assert!(!progress.record(&record));
    assert_eq!(progress.attempt_count, 1);
    assert_eq!(progress.optimal_outcomes, 1);

    // A stored aggregate without the id set still loads
    let mut json = serde_json::to_value(&progress).unwrap();
    json.as_object_mut().unwrap().remove("recorded");
    let legacy: TreeProgress = serde_json::from_value(json).unwrap();
    assert!(legacy.recorded.is_empty());
    assert_eq!(legacy.attempt_count, 1);
}

#[test]
fn key_layout() {
    let id = uuid::Uuid::nil();
    assert_eq!(s3_keys::tree("syncope"), "trees/syncope.json");
    assert_eq!(s3_keys::tree_id_from_key("trees/syncope.json"), Some("syncope"));
    assert_eq!(s3_keys::tree_id_from_key("cases/x.json"), None);
    assert_eq!(
        s3_keys::attempt("u1", "syncope", id),
        format!("attempts/u1/syncope/{id}.json")
    );
    assert_eq!(s3_keys::progress("u1", "syncope"), "progress/u1/syncope.json");
}

#[test]
fn unsafe_segments_are_rejected() {
    assert!(s3_keys::check_segment("user-42").is_ok());
    assert!(s3_keys::check_segment("").is_err());
    assert!(s3_keys::check_segment("..").is_err());
    assert!(s3_keys::check_segment("a/b").is_err());
    assert!(s3_keys::check_segment("a\nb").is_err());
}

#[test]
fn pricing_scales_per_million() {
    let pricing = ModelPricing {
        input_per_million: 3.0,
        output_per_million: 15.0,
    };
    let usage = pricing.price(1_000_000, 200_000);
    assert_eq!(usage.total_tokens(), 1_200_000);
    assert!((usage.cost_usd - 6.0).abs() < 1e-9);
}
