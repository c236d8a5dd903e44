//! State Storage Port - Interface for persisting conversation snapshots.
//!
//! The engine never stores anything itself. The host loads the snapshot
//! before a turn and saves the returned snapshot after a successful one.

use async_trait::async_trait;

use crate::domain::dialogue::ConversationState;
use crate::domain::foundation::ConversationId;

/// Errors that can occur during state storage operations
#[derive(Debug, thiserror::Error)]
pub enum StateStorageError {
    #[error("State not found for conversation: {0}")]
    NotFound(ConversationId),

    #[error("Failed to serialize state: {0}")]
    SerializationFailed(String),

    #[error("Failed to deserialize state: {0}")]
    DeserializationFailed(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl StateStorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StateStorageError::NotFound(_))
    }
}

/// Port for persisting and loading conversation snapshots
#[async_trait]
pub trait ConversationStateStore: Send + Sync {
    /// Save (or overwrite) the snapshot of a conversation
    ///
    /// # Errors
    /// Returns `StateStorageError` if save fails
    async fn save_state(
        &self,
        conversation_id: ConversationId,
        state: &ConversationState,
    ) -> Result<(), StateStorageError>;

    /// Load the snapshot of a conversation
    ///
    /// # Errors
    /// Returns `StateStorageError::NotFound` if no snapshot exists
    async fn load_state(
        &self,
        conversation_id: ConversationId,
    ) -> Result<ConversationState, StateStorageError>;

    /// Check if a snapshot exists for a conversation
    async fn exists(&self, conversation_id: ConversationId) -> Result<bool, StateStorageError>;

    /// Delete everything stored for a conversation
    async fn delete(&self, conversation_id: ConversationId) -> Result<(), StateStorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_the_conversation() {
        let id = ConversationId::new();
        let err = StateStorageError::NotFound(id);
        assert!(err.to_string().contains("State not found"));
        assert!(err.to_string().contains(&id.to_string()));
        assert!(err.is_not_found());
    }

    #[test]
    fn serialization_error_is_not_not_found() {
        let err = StateStorageError::SerializationFailed("Invalid YAML".to_string());
        assert!(err.to_string().contains("serialize"));
        assert!(!err.is_not_found());
    }
}
