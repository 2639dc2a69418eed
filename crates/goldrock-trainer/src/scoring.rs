//! Attempt scoring.
//!
//! The score blends three components:
//!
//! | component        | weight | value                                        |
//! |------------------|--------|----------------------------------------------|
//! | path efficiency  | 0.4    | `optimal_path_length / path_len * 100`       |
//! | correctness      | 0.5    | 100 for an optimal outcome, 50 otherwise     |
//! | time bonus       | 0.1    | 10 inside the time window, 0 otherwise       |
//!
//! When the tree has no `optimal_path_length` the path is its own reference
//! and efficiency is 100.

use goldrock_core::models::attempt::ScoreBreakdown;

use crate::config::EngineConfig;

const EFFICIENCY_WEIGHT: f64 = 0.4;
const CORRECTNESS_WEIGHT: f64 = 0.5;
const TIME_BONUS_WEIGHT: f64 = 0.1;

const OPTIMAL_CORRECTNESS: u32 = 100;
const SUBOPTIMAL_CORRECTNESS: u32 = 50;
const TIME_BONUS: u32 = 10;

/// Everything the score depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreInputs {
    pub path_len: usize,
    pub optimal_path_length: Option<u32>,
    pub outcome_is_optimal: bool,
    pub time_spent_secs: u64,
}

pub fn path_efficiency(path_len: usize, optimal_path_length: Option<u32>, clamp: bool) -> f64 {
    let Some(optimal) = optimal_path_length else {
        return 100.0;
    };
    if path_len == 0 {
        return 0.0;
    }
    let efficiency = (optimal as f64 / path_len as f64 * 100.0).max(0.0);
    if clamp { efficiency.min(100.0) } else { efficiency }
}

/// Compute the score for a finished attempt. Deterministic in its inputs.
pub fn score(inputs: &ScoreInputs, config: &EngineConfig) -> ScoreBreakdown {
    let path_efficiency = path_efficiency(
        inputs.path_len,
        inputs.optimal_path_length,
        config.clamp_efficiency,
    );
    let correctness = if inputs.outcome_is_optimal {
        OPTIMAL_CORRECTNESS
    } else {
        SUBOPTIMAL_CORRECTNESS
    };
    let time_bonus = if inputs.time_spent_secs < config.time_bonus_window_secs {
        TIME_BONUS
    } else {
        0
    };

    let weighted = path_efficiency * EFFICIENCY_WEIGHT
        + correctness as f64 * CORRECTNESS_WEIGHT
        + time_bonus as f64 * TIME_BONUS_WEIGHT;

    ScoreBreakdown {
        path_efficiency,
        correctness,
        time_bonus,
        total: weighted.round().max(0.0) as u32,
    }
}

/// Whole seconds from `started_at` to `now`, floored at zero.
pub fn elapsed_secs(started_at: jiff::Timestamp, now: jiff::Timestamp) -> u64 {
    let secs = now.duration_since(started_at).as_secs();
    u64::try_from(secs).unwrap_or(0)
}
