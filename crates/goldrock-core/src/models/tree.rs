use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A pre-authored clinical decision tree. Read-only reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DecisionTree {
    pub id: String,
    pub title: String,
    pub specialty: String,
    pub category: String,
    /// 1 (introductory) through 3 (advanced).
    pub difficulty: u8,
    pub root_node_id: String,
    pub nodes: Vec<DecisionNode>,
    /// Number of nodes on the best-scoring path, root and outcome included.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimal_path_length: Option<u32>,
}

impl DecisionTree {
    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&DecisionNode> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    pub fn root(&self) -> Option<&DecisionNode> {
        self.node(&self.root_node_id)
    }

    pub fn outcomes(&self) -> impl Iterator<Item = &DecisionNode> {
        self.nodes.iter().filter(|n| n.is_outcome())
    }
}

/// A single node in a decision tree.
///
/// Decision nodes carry the options a learner picks from; outcome nodes are
/// terminal and say whether the learner reached the best management.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export)]
pub enum DecisionNode {
    Decision {
        id: String,
        title: String,
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        additional_info: Option<String>,
        options: Vec<DecisionOption>,
    },
    Outcome {
        id: String,
        title: String,
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        additional_info: Option<String>,
        is_optimal: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        explanation: Option<String>,
    },
}

impl DecisionNode {
    pub fn id(&self) -> &str {
        match self {
            Self::Decision { id, .. } | Self::Outcome { id, .. } => id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Decision { title, .. } | Self::Outcome { title, .. } => title,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::Decision { content, .. } | Self::Outcome { content, .. } => content,
        }
    }

    pub fn additional_info(&self) -> Option<&str> {
        match self {
            Self::Decision {
                additional_info, ..
            }
            | Self::Outcome {
                additional_info, ..
            } => additional_info.as_deref(),
        }
    }

    pub fn is_outcome(&self) -> bool {
        matches!(self, Self::Outcome { .. })
    }

    /// Options of a decision node; empty for outcomes.
    pub fn options(&self) -> &[DecisionOption] {
        match self {
            Self::Decision { options, .. } => options,
            Self::Outcome { .. } => &[],
        }
    }
}

/// One selectable answer at a decision node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DecisionOption {
    pub text: String,
    pub next_node_id: String,
}
