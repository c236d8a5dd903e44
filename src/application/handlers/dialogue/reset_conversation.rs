//! ResetConversationHandler - Forget a conversation's snapshot

use std::sync::Arc;

use crate::domain::foundation::ConversationId;
use crate::ports::{ConversationStateStore, StateStorageError};

/// Command to discard everything stored for a conversation
#[derive(Debug, Clone)]
pub struct ResetConversationCommand {
    pub conversation_id: ConversationId,
}

/// Handler for resetting conversations
pub struct ResetConversationHandler {
    storage: Arc<dyn ConversationStateStore>,
}

impl ResetConversationHandler {
    pub fn new(storage: Arc<dyn ConversationStateStore>) -> Self {
        Self { storage }
    }

    /// Returns whether a snapshot existed.
    pub async fn handle(&self, cmd: ResetConversationCommand) -> Result<bool, StateStorageError> {
        let existed = self.storage.exists(cmd.conversation_id).await?;
        self.storage.delete(cmd.conversation_id).await?;
        tracing::info!(conversation_id = %cmd.conversation_id, existed, "conversation reset");
        Ok(existed)
    }
}
