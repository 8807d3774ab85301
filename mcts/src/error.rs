//! Error taxonomy for the search layer

use pineapple_engine::EngineError;

/// Errors surfaced by the solver's public operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolverError {
    /// A domain-layer precondition failed.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The search configuration is unusable.
    #[error("bad configuration: {0}")]
    BadConfiguration(String),

    /// `solve` was invoked on a completed game.
    #[error("game is already complete")]
    StateTerminal,

    /// The stop flag was raised before any simulation completed.
    #[error("search cancelled before any simulation completed")]
    SearchCancelled,
}
