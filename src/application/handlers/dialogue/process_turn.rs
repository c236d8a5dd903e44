//! ProcessTurnHandler - Run one user message through the dialogue engine

use std::sync::Arc;

use crate::domain::dialogue::{
    ConversationState, DialogueEngine, DialogueError, ExecuteOutcome, OutputMessage, TurnInput,
};
use crate::domain::foundation::ConversationId;
use crate::ports::{
    ConversationStateStore, NluError, NluProvider, SlotDataError, SlotDataProvider,
    StateStorageError,
};

/// Command to process one inbound user message
#[derive(Debug, Clone)]
pub struct ProcessTurnCommand {
    pub conversation_id: ConversationId,
    pub text: String,
}

/// Result of a processed turn
#[derive(Debug, Clone)]
pub struct ProcessTurnResult {
    /// Messages to forward to the user, in order
    pub messages: Vec<OutputMessage>,
    /// The snapshot that was persisted
    pub state: ConversationState,
    pub execution: ExecuteOutcome,
}

/// Error type for processing a turn
#[derive(Debug, Clone)]
pub enum ProcessTurnError {
    /// Snapshot could not be loaded or saved
    Storage(String),
    /// NLU provider failed
    Nlu(NluError),
    /// Slot data provider failed
    SlotData(SlotDataError),
    /// The engine aborted the turn
    Dialogue(DialogueError),
}

impl std::fmt::Display for ProcessTurnError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessTurnError::Storage(err) => write!(f, "Storage error: {}", err),
            ProcessTurnError::Nlu(err) => write!(f, "NLU error: {}", err),
            ProcessTurnError::SlotData(err) => write!(f, "Slot data error: {}", err),
            ProcessTurnError::Dialogue(err) => write!(f, "Turn failed: {}", err),
        }
    }
}

impl std::error::Error for ProcessTurnError {}

impl From<StateStorageError> for ProcessTurnError {
    fn from(err: StateStorageError) -> Self {
        ProcessTurnError::Storage(err.to_string())
    }
}

impl From<NluError> for ProcessTurnError {
    fn from(err: NluError) -> Self {
        ProcessTurnError::Nlu(err)
    }
}

impl From<SlotDataError> for ProcessTurnError {
    fn from(err: SlotDataError) -> Self {
        ProcessTurnError::SlotData(err)
    }
}

impl From<DialogueError> for ProcessTurnError {
    fn from(err: DialogueError) -> Self {
        ProcessTurnError::Dialogue(err)
    }
}

/// Handler that loads a snapshot, runs the pipeline and saves the result
pub struct ProcessTurnHandler {
    engine: Arc<DialogueEngine>,
    storage: Arc<dyn ConversationStateStore>,
    nlu: Arc<dyn NluProvider>,
    slot_data: Option<Arc<dyn SlotDataProvider>>,
}

impl ProcessTurnHandler {
    pub fn new(
        engine: Arc<DialogueEngine>,
        storage: Arc<dyn ConversationStateStore>,
        nlu: Arc<dyn NluProvider>,
    ) -> Self {
        Self {
            engine,
            storage,
            nlu,
            slot_data: None,
        }
    }

    pub fn with_slot_data_provider(mut self, provider: Arc<dyn SlotDataProvider>) -> Self {
        self.slot_data = Some(provider);
        self
    }

    pub async fn handle(
        &self,
        cmd: ProcessTurnCommand,
    ) -> Result<ProcessTurnResult, ProcessTurnError> {
        // 1. Load the snapshot, starting fresh for a new conversation
        let snapshot = match self.storage.load_state(cmd.conversation_id).await {
            Ok(state) => state,
            Err(err) if err.is_not_found() => {
                tracing::info!(conversation_id = %cmd.conversation_id, "starting new conversation");
                ConversationState::new()
            }
            Err(err) => return Err(err.into()),
        };

        // 2. Understand the message
        let nlp = self.nlu.understand(&cmd.text).await?;

        // 3. Ask the host for externally sourced slot data
        let incoming = match &self.slot_data {
            Some(provider) => {
                provider
                    .incoming_slot_data(cmd.conversation_id, &nlp, &snapshot)
                    .await?
            }
            None => Default::default(),
        };

        // 4. Run the pipeline; nothing is saved if it fails
        let outcome = self
            .engine
            .process_turn(&snapshot, TurnInput { nlp, incoming })
            .await
            .map_err(|err| {
                tracing::error!(conversation_id = %cmd.conversation_id, error = %err, "turn aborted");
                err
            })?;

        // 5. Persist the new snapshot
        self.storage
            .save_state(cmd.conversation_id, &outcome.state)
            .await?;

        Ok(ProcessTurnResult {
            messages: outcome.messages,
            state: outcome.state,
            execution: outcome.execution,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryStateStorage, KeyValueNluProvider};
    use crate::domain::dialogue::{
        Ability, AbilityRegistry, EngineSettings, IncomingSlotData, NlpResult, SlotDefinition,
        SlotId, SlotOverride,
    };
    use async_trait::async_trait;

    struct ProfileLookup;

    #[async_trait]
    impl SlotDataProvider for ProfileLookup {
        async fn incoming_slot_data(
            &self,
            _conversation_id: ConversationId,
            _message: &NlpResult,
            _state: &ConversationState,
        ) -> Result<IncomingSlotData, SlotDataError> {
            Ok(IncomingSlotData::default().with_override(SlotOverride::new(
                "book_flight",
                "origin",
                "SEA",
            )))
        }
    }

    struct BrokenLookup;

    #[async_trait]
    impl SlotDataProvider for BrokenLookup {
        async fn incoming_slot_data(
            &self,
            _conversation_id: ConversationId,
            _message: &NlpResult,
            _state: &ConversationState,
        ) -> Result<IncomingSlotData, SlotDataError> {
            Err(SlotDataError::Lookup("profile service down".into()))
        }
    }

    fn engine() -> Arc<DialogueEngine> {
        let registry = AbilityRegistry::new(vec![Ability::new("book_flight")
            .with_slot(SlotDefinition::new("origin", |_| "Where from?".into()).with_order(1))
            .with_slot(SlotDefinition::new("destination", |_| "Where to?".into()).with_order(2))])
        .unwrap();
        Arc::new(DialogueEngine::new(
            registry,
            EngineSettings {
                default_ability: Some("book_flight".into()),
                ..EngineSettings::default()
            },
        ))
    }

    fn handler(storage: Arc<InMemoryStateStorage>) -> ProcessTurnHandler {
        ProcessTurnHandler::new(engine(), storage, Arc::new(KeyValueNluProvider::new()))
    }

    #[tokio::test]
    async fn first_turn_creates_and_persists_snapshot() {
        let storage = Arc::new(InMemoryStateStorage::new());
        let conversation_id = ConversationId::new();

        let result = handler(storage.clone())
            .handle(ProcessTurnCommand {
                conversation_id,
                text: "hello".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.messages[0].message, "Where from?");
        let saved = storage.load_state(conversation_id).await.unwrap();
        assert_eq!(saved, result.state);
    }

    #[tokio::test]
    async fn slot_data_provider_feeds_intake() {
        let storage = Arc::new(InMemoryStateStorage::new());
        let handler = handler(storage).with_slot_data_provider(Arc::new(ProfileLookup));

        let result = handler
            .handle(ProcessTurnCommand {
                conversation_id: ConversationId::new(),
                text: "hi".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(
            result.state.slot_value(&SlotId::new("book_flight", "origin")),
            Some("SEA")
        );
        assert_eq!(result.messages[0].message, "Where to?");
    }

    #[tokio::test]
    async fn provider_failure_saves_nothing() {
        let storage = Arc::new(InMemoryStateStorage::new());
        let conversation_id = ConversationId::new();
        let handler = handler(storage.clone()).with_slot_data_provider(Arc::new(BrokenLookup));

        let result = handler
            .handle(ProcessTurnCommand {
                conversation_id,
                text: "hi".to_string(),
            })
            .await;

        assert!(matches!(result, Err(ProcessTurnError::SlotData(_))));
        assert!(!storage.exists(conversation_id).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_markup_is_an_nlu_error() {
        let storage = Arc::new(InMemoryStateStorage::new());

        let result = handler(storage)
            .handle(ProcessTurnCommand {
                conversation_id: ConversationId::new(),
                text: "=oops".to_string(),
            })
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, ProcessTurnError::Nlu(_)));
        assert!(err.to_string().starts_with("NLU error"));
    }
}
