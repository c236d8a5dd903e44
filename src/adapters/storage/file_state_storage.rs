//! File-based State Storage Adapter
//!
//! Stores each conversation snapshot as YAML under
//! `<base_path>/<conversation_id>/state.yaml`.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::dialogue::ConversationState;
use crate::domain::foundation::ConversationId;
use crate::ports::{ConversationStateStore, StateStorageError};

/// File-based storage for conversation snapshots
#[derive(Debug, Clone)]
pub struct FileStateStorage {
    base_path: PathBuf,
}

impl FileStateStorage {
    /// Create a new file storage rooted at `base_path`
    ///
    /// # Example
    /// ```ignore
    /// let storage = FileStateStorage::new("./data/conversations");
    /// ```
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn conversation_dir(&self, conversation_id: ConversationId) -> PathBuf {
        self.base_path.join(conversation_id.to_string())
    }

    fn state_file_path(&self, conversation_id: ConversationId) -> PathBuf {
        self.conversation_dir(conversation_id).join("state.yaml")
    }

    fn staging_file_path(&self, conversation_id: ConversationId) -> PathBuf {
        self.conversation_dir(conversation_id).join("state.yaml.tmp")
    }

    async fn ensure_dir(&self, path: &Path) -> Result<(), StateStorageError> {
        fs::create_dir_all(path)
            .await
            .map_err(|e| StateStorageError::IoError(e.to_string()))
    }
}

#[async_trait]
impl ConversationStateStore for FileStateStorage {
    async fn save_state(
        &self,
        conversation_id: ConversationId,
        state: &ConversationState,
    ) -> Result<(), StateStorageError> {
        self.ensure_dir(&self.conversation_dir(conversation_id))
            .await?;

        let yaml = serde_yaml::to_string(state)
            .map_err(|e| StateStorageError::SerializationFailed(e.to_string()))?;

        // Staged write; the rename replaces the snapshot in one step.
        let staging = self.staging_file_path(conversation_id);
        fs::write(&staging, yaml)
            .await
            .map_err(|e| StateStorageError::IoError(e.to_string()))?;
        fs::rename(&staging, self.state_file_path(conversation_id))
            .await
            .map_err(|e| StateStorageError::IoError(e.to_string()))?;

        tracing::debug!(%conversation_id, "snapshot written");
        Ok(())
    }

    async fn load_state(
        &self,
        conversation_id: ConversationId,
    ) -> Result<ConversationState, StateStorageError> {
        let file_path = self.state_file_path(conversation_id);

        if !file_path.exists() {
            return Err(StateStorageError::NotFound(conversation_id));
        }

        let yaml = fs::read_to_string(&file_path)
            .await
            .map_err(|e| StateStorageError::IoError(e.to_string()))?;

        serde_yaml::from_str(&yaml)
            .map_err(|e| StateStorageError::DeserializationFailed(e.to_string()))
    }

    async fn exists(&self, conversation_id: ConversationId) -> Result<bool, StateStorageError> {
        Ok(self.state_file_path(conversation_id).exists())
    }

    async fn delete(&self, conversation_id: ConversationId) -> Result<(), StateStorageError> {
        let dir = self.conversation_dir(conversation_id);

        if dir.exists() {
            fs::remove_dir_all(&dir)
                .await
                .map_err(|e| StateStorageError::IoError(e.to_string()))?;
        }

        Ok(())
    }
}
