//! Decision-tree traversal engine.
//!
//! The engine holds no per-attempt state. Every operation takes the
//! caller's [`TraversalState`] and checks all of its preconditions before
//! touching it, so a rejected call leaves the state exactly as it was.
//!
//! Lifecycle:
//! - `start` → `Active`
//! - `decide` keeps the state `Active`, or moves it to `Completed` when the
//!   chosen option lands on an outcome node (completion happens in the same
//!   call)
//! - `go_back` stays `Active`
//! - `abandon` → `Abandoned`
//!
//! `Completed` and `Abandoned` are terminal.

use std::collections::BTreeMap;

use goldrock_core::models::attempt::AttemptResult;
use goldrock_core::models::traversal::{Progress, TraversalState, TraversalStatus};
use goldrock_core::models::tree::{DecisionNode, DecisionTree};
use tracing::{debug, info};

use crate::config::{DecisionHistory, EngineConfig};
use crate::error::TrainerError;
use crate::scoring::{self, ScoreInputs};

/// Result of a successful `decide`.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Moved to another decision node.
    Advanced,
    /// Landed on an outcome node; the attempt is complete.
    Completed(AttemptResult),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn start(&self, tree: &DecisionTree) -> Result<TraversalState, TrainerError> {
        self.start_at(tree, jiff::Timestamp::now())
    }

    /// Begin an attempt at the tree's root.
    pub fn start_at(
        &self,
        tree: &DecisionTree,
        now: jiff::Timestamp,
    ) -> Result<TraversalState, TrainerError> {
        if tree.root().is_none() {
            return Err(TrainerError::malformed(
                &tree.id,
                format!("root node '{}' not found", tree.root_node_id),
            ));
        }

        info!(tree_id = %tree.id, "starting traversal");

        Ok(TraversalState {
            tree_id: tree.id.clone(),
            current_node_id: tree.root_node_id.clone(),
            path: vec![tree.root_node_id.clone()],
            decisions: BTreeMap::new(),
            started_at: now,
            status: TraversalStatus::Active,
            backtracks: 0,
        })
    }

    pub fn decide(
        &self,
        state: &mut TraversalState,
        tree: &DecisionTree,
        option_index: usize,
    ) -> Result<Step, TrainerError> {
        self.decide_at(state, tree, option_index, jiff::Timestamp::now())
    }

    /// Apply the learner's choice at the current decision node.
    pub fn decide_at(
        &self,
        state: &mut TraversalState,
        tree: &DecisionTree,
        option_index: usize,
        now: jiff::Timestamp,
    ) -> Result<Step, TrainerError> {
        const ACTION: &str = "decide";

        ensure_active(state, ACTION)?;
        ensure_same_tree(state, tree, ACTION)?;

        let current = current_node(state, tree)?;
        let DecisionNode::Decision { id, options, .. } = current else {
            return Err(TrainerError::transition(
                ACTION,
                format!("node '{}' is an outcome", current.id()),
            ));
        };
        let option = options.get(option_index).ok_or_else(|| {
            TrainerError::transition(
                ACTION,
                format!(
                    "option {option_index} out of range; node '{id}' has {} options",
                    options.len()
                ),
            )
        })?;
        let next = tree.node(&option.next_node_id).ok_or_else(|| {
            TrainerError::malformed(
                &tree.id,
                format!(
                    "option '{}' of node '{id}' points to missing node '{}'",
                    option.text, option.next_node_id
                ),
            )
        })?;

        state.decisions.insert(id.clone(), option.text.clone());
        state.path.push(next.id().to_string());
        state.current_node_id = next.id().to_string();

        debug!(
            tree_id = %tree.id,
            from = %id,
            to = %next.id(),
            steps = state.path.len(),
            "decision applied"
        );

        if next.is_outcome() {
            let result = self.complete_at(state, tree, next.id(), now)?;
            return Ok(Step::Completed(result));
        }

        Ok(Step::Advanced)
    }

    /// Step back to the previously visited node.
    ///
    /// Rejected once the attempt is no longer active, or when the state is
    /// already at the root.
    pub fn go_back(&self, state: &mut TraversalState) -> Result<(), TrainerError> {
        const ACTION: &str = "go_back";

        ensure_active(state, ACTION)?;
        if state.path.len() <= 1 {
            return Err(TrainerError::transition(ACTION, "already at the root node"));
        }

        state.path.pop();
        let Some(previous) = state.path.last() else {
            return Err(TrainerError::transition(ACTION, "path is empty"));
        };
        state.current_node_id = previous.clone();
        state.backtracks += 1;

        if self.config.decision_history == DecisionHistory::Prune {
            state.decisions.remove(&state.current_node_id);
        }

        debug!(
            tree_id = %state.tree_id,
            node = %state.current_node_id,
            steps = state.path.len(),
            "stepped back"
        );
        Ok(())
    }

    pub fn complete(
        &self,
        state: &mut TraversalState,
        tree: &DecisionTree,
        outcome_node_id: &str,
    ) -> Result<AttemptResult, TrainerError> {
        self.complete_at(state, tree, outcome_node_id, jiff::Timestamp::now())
    }

    /// Score the attempt and mark it completed.
    ///
    /// `outcome_node_id` must be the outcome the traversal is standing on.
    /// Can succeed at most once per traversal; later calls are rejected and
    /// produce no result.
    pub fn complete_at(
        &self,
        state: &mut TraversalState,
        tree: &DecisionTree,
        outcome_node_id: &str,
        now: jiff::Timestamp,
    ) -> Result<AttemptResult, TrainerError> {
        const ACTION: &str = "complete";

        ensure_active(state, ACTION)?;
        ensure_same_tree(state, tree, ACTION)?;

        let node = tree.node(outcome_node_id).ok_or_else(|| {
            TrainerError::malformed(&tree.id, format!("node '{outcome_node_id}' not found"))
        })?;
        let DecisionNode::Outcome { is_optimal, .. } = node else {
            return Err(TrainerError::transition(
                ACTION,
                format!("node '{outcome_node_id}' is not an outcome"),
            ));
        };
        if state.current_node_id != outcome_node_id {
            return Err(TrainerError::transition(
                ACTION,
                format!(
                    "outcome '{outcome_node_id}' has not been reached; current node is '{}'",
                    state.current_node_id
                ),
            ));
        }

        let time_spent = scoring::elapsed_secs(state.started_at, now);
        let breakdown = scoring::score(
            &ScoreInputs {
                path_len: state.path.len(),
                optimal_path_length: tree.optimal_path_length,
                outcome_is_optimal: *is_optimal,
                time_spent_secs: time_spent,
            },
            &self.config,
        );

        state.status = TraversalStatus::Completed;

        info!(
            tree_id = %tree.id,
            outcome = %outcome_node_id,
            score = breakdown.total,
            optimal = *is_optimal,
            time_spent,
            "traversal completed"
        );

        Ok(AttemptResult {
            tree_id: tree.id.clone(),
            path_taken: state.path.clone(),
            decisions: state.decisions.clone(),
            final_outcome: outcome_node_id.to_string(),
            time_spent,
            score: breakdown.total,
            is_optimal_path: *is_optimal,
            completed: true,
            breakdown,
            backtracks: state.backtracks,
            started_at: state.started_at,
            completed_at: now,
        })
    }

    /// Mark an active attempt as abandoned. No result is produced.
    pub fn abandon(&self, state: &mut TraversalState) -> Result<(), TrainerError> {
        ensure_active(state, "abandon")?;
        state.status = TraversalStatus::Abandoned;
        info!(tree_id = %state.tree_id, steps = state.path.len(), "traversal abandoned");
        Ok(())
    }

    pub fn progress(&self, state: &TraversalState, tree: &DecisionTree) -> Progress {
        Progress {
            steps_taken: u32::try_from(state.path.len()).unwrap_or(u32::MAX),
            expected_steps: tree.optimal_path_length,
        }
    }
}

/// Resolve the node the state currently points at.
pub fn current_node<'t>(
    state: &TraversalState,
    tree: &'t DecisionTree,
) -> Result<&'t DecisionNode, TrainerError> {
    tree.node(&state.current_node_id).ok_or_else(|| {
        TrainerError::malformed(
            &tree.id,
            format!("current node '{}' not found", state.current_node_id),
        )
    })
}

fn ensure_active(state: &TraversalState, action: &'static str) -> Result<(), TrainerError> {
    match state.status {
        TraversalStatus::Active => Ok(()),
        TraversalStatus::Completed => Err(TrainerError::transition(action, "attempt is completed")),
        TraversalStatus::Abandoned => Err(TrainerError::transition(action, "attempt was abandoned")),
    }
}

fn ensure_same_tree(
    state: &TraversalState,
    tree: &DecisionTree,
    action: &'static str,
) -> Result<(), TrainerError> {
    if state.tree_id != tree.id {
        return Err(TrainerError::transition(
            action,
            format!("state belongs to tree '{}', not '{}'", state.tree_id, tree.id),
        ));
    }
    Ok(())
}
