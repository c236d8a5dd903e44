//! NLU Provider Port - Turns raw user text into intent and entities.

use async_trait::async_trait;

use crate::domain::dialogue::NlpResult;

/// Errors from an NLU provider
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum NluError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("could not parse input: {0}")]
    Parse(String),
}

impl NluError {
    /// Whether the same input may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, NluError::Unavailable(_))
    }
}

/// Port for natural-language understanding
#[async_trait]
pub trait NluProvider: Send + Sync {
    /// Recognize intent and entities in one user message.
    async fn understand(&self, text: &str) -> Result<NlpResult, NluError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unavailable_is_retryable() {
        assert!(NluError::Unavailable("timeout".into()).is_retryable());
        assert!(!NluError::Parse("bad token".into()).is_retryable());
    }
}
