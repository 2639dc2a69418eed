//! Tree well-formedness checks and path analysis.
//!
//! The engine trusts the trees it is handed; tree sources run
//! [`ensure_well_formed`] before a tree reaches it.

use std::collections::{HashMap, HashSet, VecDeque};

use goldrock_core::models::tree::{DecisionNode, DecisionTree};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::error::TrainerError;

/// A single problem found in a tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum TreeIssue {
    #[error("duplicate node id '{node_id}'")]
    DuplicateNode { node_id: String },

    #[error("root node '{node_id}' does not exist")]
    MissingRoot { node_id: String },

    #[error("node '{node_id}' option {option_index} points to missing node '{target}'")]
    DanglingOption {
        node_id: String,
        option_index: usize,
        target: String,
    },

    #[error("decision node '{node_id}' has no options")]
    NoOptions { node_id: String },

    #[error("difficulty {difficulty} is outside 1-3")]
    DifficultyOutOfRange { difficulty: u8 },

    #[error("optimal path length must be at least 1")]
    ZeroOptimalPathLength,

    #[error("no outcome node is reachable from the root")]
    NoReachableOutcome,
}

/// Collect every problem with the tree. An empty list means well-formed.
pub fn validate_tree(tree: &DecisionTree) -> Vec<TreeIssue> {
    let mut issues = Vec::new();

    if !(1..=3).contains(&tree.difficulty) {
        issues.push(TreeIssue::DifficultyOutOfRange {
            difficulty: tree.difficulty,
        });
    }
    if tree.optimal_path_length == Some(0) {
        issues.push(TreeIssue::ZeroOptimalPathLength);
    }

    let mut seen = HashSet::new();
    for node in &tree.nodes {
        if !seen.insert(node.id()) {
            issues.push(TreeIssue::DuplicateNode {
                node_id: node.id().to_string(),
            });
        }
    }

    if !seen.contains(tree.root_node_id.as_str()) {
        issues.push(TreeIssue::MissingRoot {
            node_id: tree.root_node_id.clone(),
        });
    }

    for node in &tree.nodes {
        let DecisionNode::Decision { id, options, .. } = node else {
            continue;
        };
        if options.is_empty() {
            issues.push(TreeIssue::NoOptions {
                node_id: id.clone(),
            });
        }
        for (option_index, option) in options.iter().enumerate() {
            if !seen.contains(option.next_node_id.as_str()) {
                issues.push(TreeIssue::DanglingOption {
                    node_id: id.clone(),
                    option_index,
                    target: option.next_node_id.clone(),
                });
            }
        }
    }

    if seen.contains(tree.root_node_id.as_str()) && !reachable_outcome(tree) {
        issues.push(TreeIssue::NoReachableOutcome);
    }

    issues
}

/// Fail with `MalformedTree` listing every issue, if there are any.
pub fn ensure_well_formed(tree: &DecisionTree) -> Result<(), TrainerError> {
    let issues = validate_tree(tree);
    if issues.is_empty() {
        return Ok(());
    }
    let reason = issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    Err(TrainerError::malformed(&tree.id, reason))
}

fn reachable_outcome(tree: &DecisionTree) -> bool {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([tree.root_node_id.as_str()]);
    while let Some(id) = queue.pop_front() {
        if !visited.insert(id) {
            continue;
        }
        let Some(node) = tree.node(id) else { continue };
        if node.is_outcome() {
            return true;
        }
        queue.extend(node.options().iter().map(|o| o.next_node_id.as_str()));
    }
    false
}

/// Shortest route from the root to any optimal outcome, as node ids.
///
/// Returns `None` when no optimal outcome is reachable.
pub fn optimal_route(tree: &DecisionTree) -> Option<Vec<String>> {
    let root = tree.root()?;
    let mut parents: HashMap<&str, &str> = HashMap::new();
    let mut visited = HashSet::from([root.id()]);
    let mut queue = VecDeque::from([root]);

    while let Some(node) = queue.pop_front() {
        if let DecisionNode::Outcome {
            is_optimal: true, ..
        } = node
        {
            let mut route = vec![node.id().to_string()];
            let mut cursor = node.id();
            while let Some(parent) = parents.get(cursor) {
                route.push(parent.to_string());
                cursor = *parent;
            }
            route.reverse();
            return Some(route);
        }
        for option in node.options() {
            let Some(next) = tree.node(&option.next_node_id) else {
                continue;
            };
            if visited.insert(next.id()) {
                parents.insert(next.id(), node.id());
                queue.push_back(next);
            }
        }
    }
    None
}
