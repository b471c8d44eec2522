//! Engine error types.
use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised by the engine before or during an optimization pass.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{side} team is empty")]
    EmptyTeam { side: &'static str },
    #[error("{side} team has {size} members; at most {max} can deploy")]
    OversizedTeam {
        side: &'static str,
        size: usize,
        max: usize,
    },
    #[error("machine {id} has no computed stats")]
    MissingBattleStats { id: String },
    #[error("invalid planner configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),
}
