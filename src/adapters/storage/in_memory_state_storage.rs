//! In-Memory State Storage Adapter
//!
//! Keeps conversation snapshots in a map. Useful for tests and the console host.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::dialogue::ConversationState;
use crate::domain::foundation::ConversationId;
use crate::ports::{ConversationStateStore, StateStorageError};

/// In-memory storage for conversation snapshots
#[derive(Debug, Clone, Default)]
pub struct InMemoryStateStorage {
    states: Arc<RwLock<HashMap<ConversationId, ConversationState>>>,
}

impl InMemoryStateStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored snapshots (useful for tests)
    pub async fn clear(&self) {
        self.states.write().await.clear();
    }

    /// Get the number of stored snapshots
    pub async fn state_count(&self) -> usize {
        self.states.read().await.len()
    }
}

#[async_trait]
impl ConversationStateStore for InMemoryStateStorage {
    async fn save_state(
        &self,
        conversation_id: ConversationId,
        state: &ConversationState,
    ) -> Result<(), StateStorageError> {
        let mut states = self.states.write().await;
        states.insert(conversation_id, state.clone());
        Ok(())
    }

    async fn load_state(
        &self,
        conversation_id: ConversationId,
    ) -> Result<ConversationState, StateStorageError> {
        let states = self.states.read().await;
        states
            .get(&conversation_id)
            .cloned()
            .ok_or(StateStorageError::NotFound(conversation_id))
    }

    async fn exists(&self, conversation_id: ConversationId) -> Result<bool, StateStorageError> {
        Ok(self.states.read().await.contains_key(&conversation_id))
    }

    async fn delete(&self, conversation_id: ConversationId) -> Result<(), StateStorageError> {
        self.states.write().await.remove(&conversation_id);
        Ok(())
    }
}
