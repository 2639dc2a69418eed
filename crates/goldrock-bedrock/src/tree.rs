//! AI-authored decision trees.
//!
//! A generated tree goes through the same validation as a stored one before
//! it is handed back. Nothing the model returns reaches the engine unchecked.

use goldrock_core::models::tree::DecisionTree;
use goldrock_trainer::validate::{ensure_well_formed, optimal_route};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::BedrockError;
use crate::generator::TextGenerator;
use crate::json;

const TREE_SYSTEM_PROMPT: &str = "\
You author branching clinical decision trees for medical training. Respond \
with a single JSON object and nothing else, shaped as: {\"id\", \"title\", \
\"specialty\", \"category\", \"difficulty\" (1-3), \"root_node_id\", \
\"nodes\": [...]}. Each node has \"type\" set to \"decision\" or \"outcome\", \
plus \"id\", \"title\", \"content\" and optionally \"additional_info\". \
Decision nodes have \"options\": [{\"text\", \"next_node_id\"}]. Outcome \
nodes have \"is_optimal\" (boolean) and \"explanation\". Every option must \
point at a node in the list, and exactly one outcome should be optimal.";

/// What to ask the model for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeRequest {
    pub topic: String,
    pub specialty: String,
    pub difficulty: u8,
    /// Upper bound on decision points along any path.
    #[serde(default = "default_max_depth")]
    pub max_depth: u8,
}

fn default_max_depth() -> u8 {
    4
}

pub fn build_tree_prompt(request: &TreeRequest) -> String {
    format!(
        "Create a decision tree about \"{}\" in {} at difficulty {} of 3. \
         Use at most {} decision points on any path, and give each decision \
         two to four options including at least one plausible mistake.",
        request.topic.trim(),
        request.specialty.trim(),
        request.difficulty.clamp(1, 3),
        request.max_depth.max(1),
    )
}

pub async fn generate_tree<G: TextGenerator>(
    generator: &G,
    request: &TreeRequest,
) -> Result<DecisionTree, BedrockError> {
    info!(topic = %request.topic, specialty = %request.specialty, "generating decision tree");

    let generation = generator
        .generate(TREE_SYSTEM_PROMPT, &build_tree_prompt(request))
        .await?;

    let tree = parse_tree(&generation.text, request)?;
    info!(
        tree_id = %tree.id,
        nodes = tree.nodes.len(),
        optimal_path_length = ?tree.optimal_path_length,
        "decision tree generated"
    );
    Ok(tree)
}

/// Parse, normalize and validate a model reply.
///
/// The id is slugified so it is safe as a storage key. A missing id falls
/// back to the slugified title. Specialty and difficulty come from the
/// request when the model leaves them out.
pub fn parse_tree(text: &str, request: &TreeRequest) -> Result<DecisionTree, BedrockError> {
    let mut tree: DecisionTree = json::parse_json(text)?;

    let source = if tree.id.trim().is_empty() {
        &tree.title
    } else {
        &tree.id
    };
    let id = slugify(source);
    if id.is_empty() {
        return Err(BedrockError::SchemaViolation(
            "tree has neither an id nor a title".to_string(),
        ));
    }
    tree.id = id;

    if tree.specialty.trim().is_empty() {
        tree.specialty = request.specialty.trim().to_string();
    }
    if tree.difficulty == 0 {
        tree.difficulty = request.difficulty.clamp(1, 3);
    }

    ensure_well_formed(&tree)?;

    if tree.optimal_path_length.is_none() {
        match optimal_route(&tree) {
            Some(route) => tree.optimal_path_length = u32::try_from(route.len()).ok(),
            None => warn!(tree_id = %tree.id, "generated tree has no reachable optimal outcome"),
        }
    }

    Ok(tree)
}

/// Lowercase ASCII alphanumerics joined by single underscores.
pub fn slugify(text: &str) -> String {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}
