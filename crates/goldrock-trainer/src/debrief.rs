use goldrock_core::models::attempt::AttemptResult;
use goldrock_core::models::tree::{DecisionNode, DecisionTree};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::validate::optimal_route;

/// Post-attempt review shown to the learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Debrief {
    pub tree_title: String,
    pub outcome_title: String,
    pub outcome_content: String,
    pub explanation: Option<String>,
    pub is_optimal: bool,
    pub score: u32,
    pub steps: Vec<DebriefStep>,
    /// Node titles along the shortest route to an optimal outcome.
    pub optimal_route: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DebriefStep {
    pub node_title: String,
    /// `None` for the final outcome node.
    pub choice: Option<String>,
}

pub fn debrief(tree: &DecisionTree, result: &AttemptResult) -> Debrief {
    let steps = result
        .path_taken
        .iter()
        .map(|id| DebriefStep {
            node_title: title_of(tree, id),
            choice: result.decisions.get(id).cloned(),
        })
        .collect();

    let (outcome_title, outcome_content, explanation) = match tree.node(&result.final_outcome) {
        Some(DecisionNode::Outcome {
            title,
            content,
            explanation,
            ..
        }) => (title.clone(), content.clone(), explanation.clone()),
        Some(node) => (node.title().to_string(), node.content().to_string(), None),
        None => (result.final_outcome.clone(), String::new(), None),
    };

    Debrief {
        tree_title: tree.title.clone(),
        outcome_title,
        outcome_content,
        explanation,
        is_optimal: result.is_optimal_path,
        score: result.score,
        steps,
        optimal_route: optimal_route(tree)
            .unwrap_or_default()
            .iter()
            .map(|id| title_of(tree, id))
            .collect(),
    }
}

fn title_of(tree: &DecisionTree, id: &str) -> String {
    tree.node(id)
        .map(|n| n.title().to_string())
        .unwrap_or_else(|| id.to_string())
}
