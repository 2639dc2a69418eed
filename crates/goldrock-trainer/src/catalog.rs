//! Built-in decision trees.

pub mod chest_pain;
pub mod sepsis;

use goldrock_core::models::tree::{DecisionNode, DecisionOption, DecisionTree};

/// Return all built-in trees.
pub fn all_trees() -> Vec<&'static DecisionTree> {
    vec![chest_pain::tree(), sepsis::tree()]
}

/// Look up a built-in tree by id.
pub fn get_tree(id: &str) -> Option<&'static DecisionTree> {
    all_trees().into_iter().find(|t| t.id == id)
}

fn decision(id: &str, title: &str, content: &str, options: &[(&str, &str)]) -> DecisionNode {
    DecisionNode::Decision {
        id: id.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        additional_info: None,
        options: options
            .iter()
            .map(|(text, next)| DecisionOption {
                text: text.to_string(),
                next_node_id: next.to_string(),
            })
            .collect(),
    }
}

fn outcome(id: &str, title: &str, content: &str, is_optimal: bool, explanation: &str) -> DecisionNode {
    DecisionNode::Outcome {
        id: id.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        additional_info: None,
        is_optimal,
        explanation: Some(explanation.to_string()),
    }
}

fn with_info(mut node: DecisionNode, info: &str) -> DecisionNode {
    match &mut node {
        DecisionNode::Decision {
            additional_info, ..
        }
        | DecisionNode::Outcome {
            additional_info, ..
        } => *additional_info = Some(info.to_string()),
    }
    node
}
