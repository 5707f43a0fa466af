//! Quality engine errors
//!
//! Every variant reaches the caller; nothing is retried or swallowed.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Recipe id does not resolve in the repository
    #[error("Recipe not found: {0}")]
    NotFound(String),

    /// Malformed request (empty recipe id, missing rejection reason)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation not applicable to the recipe's current review setup
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A reviewer entry already carries a terminal decision
    #[error("Conflict on recipe {recipe_id}: reviewer {reviewer_id} {message}")]
    Conflict {
        recipe_id: String,
        reviewer_id: String,
        message: String,
    },

    /// Collaborator (repository, store, identity provider) failure
    #[error("Storage error: {0}")]
    Storage(#[source] goldrec_common::Error),
}

impl From<goldrec_common::Error> for EngineError {
    fn from(err: goldrec_common::Error) -> Self {
        match err {
            goldrec_common::Error::InvalidInput(msg) => EngineError::InvalidInput(msg),
            other => EngineError::Storage(other),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
