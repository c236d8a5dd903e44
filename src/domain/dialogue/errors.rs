//! Error types for the dialogue engine.

use crate::domain::foundation::ValidationError;

use super::values::SlotId;

/// Errors that abort a turn. A turn that fails leaves the caller's snapshot untouched.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum DialogueError {
    /// A slot asked to chain into `on_fill` of a slot that does not exist.
    #[error("There is no slot with that name: {0}")]
    SlotNotFound(SlotId),

    #[error("Fill chain exceeded {limit} chained on_fill calls")]
    FillChainTooDeep { limit: usize },

    /// A slot or ability callback failed.
    #[error("Callback failed: {0}")]
    Callback(String),

    #[error("Invalid ability configuration: {0}")]
    Configuration(#[from] ValidationError),
}

impl DialogueError {
    /// Convenience constructor for integrator callbacks.
    pub fn callback(reason: impl Into<String>) -> Self {
        DialogueError::Callback(reason.into())
    }

    /// True for errors caused by the integrator's ability/slot definitions.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            DialogueError::SlotNotFound(_)
                | DialogueError::FillChainTooDeep { .. }
                | DialogueError::Configuration(_)
        )
    }
}
