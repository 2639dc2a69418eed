use serde::{Deserialize, Serialize};

/// Seconds under which a completed attempt earns the time bonus.
pub const DEFAULT_TIME_BONUS_WINDOW_SECS: u64 = 300;

/// What `go_back` does with the decision recorded at the node it returns to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionHistory {
    /// Keep every choice ever made; re-deciding at a node overwrites it.
    #[default]
    Retain,
    /// Drop the choice for the node being re-entered, so the final
    /// decisions only describe the path actually taken.
    Prune,
}

/// Tunables for the decision-tree engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub decision_history: DecisionHistory,
    /// Cap path efficiency at 100 so a path shorter than the nominal
    /// optimum cannot push the score above 100.
    pub clamp_efficiency: bool,
    pub time_bonus_window_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            decision_history: DecisionHistory::Retain,
            clamp_efficiency: true,
            time_bonus_window_secs: DEFAULT_TIME_BONUS_WINDOW_SECS,
        }
    }
}
