//! Domain error types.

use thiserror::Error;

use crate::state::{SessionState, SessionTrigger};

/// Top-level domain error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A command is not legal in the current session state.
    #[error("cannot handle {trigger} while {state}")]
    InvalidTransition {
        /// The state the command was rejected in.
        state: SessionState,
        /// The rejected trigger.
        trigger: SessionTrigger,
    },

    /// Invalid coordinator or manifest configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// The observation queue has no consumer any more.
    #[error("observation channel closed")]
    ChannelClosed,
}
