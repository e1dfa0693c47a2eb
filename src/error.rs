use thiserror::Error;

use crate::session::Phase;

/// Errors returned to the presentation layer
#[derive(Debug, Error, PartialEq)]
pub enum QuizError {
    #[error("please enter a number (got {input:?})")]
    InvalidInput { input: String },
    #[error("please enter your name")]
    InvalidName,
    #[error("cannot move from {from} to {to}")]
    InvalidPhaseTransition { from: Phase, to: Phase },
    #[error("{operation} is not available while {phase}")]
    WrongPhase {
        operation: &'static str,
        phase: Phase,
    },
    #[error("there is no new record waiting to be saved")]
    NoPendingRecord,
}

/// Failures of the key-value transport; never surfaced past the scoreboard
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}
