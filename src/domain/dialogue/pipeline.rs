//! Turn pipeline: Intake → FillSlot → Evaluate → Execute → Outtake.

use std::sync::Arc;

use super::ability::AbilityRegistry;
use super::actions::{StateAction, StateStore};
use super::errors::DialogueError;
use super::requests::IncomingSlotData;
use super::stages::{evaluate, execute, fill_slot, intake, outtake, ExecuteOutcome};
use super::state::ConversationState;
use super::values::{NlpResult, OutputMessage};

/// Default limit on chained `on_fill` calls within one fill.
pub const DEFAULT_MAX_CHAINED_FILLS: usize = 32;

/// Engine-wide settings supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Ability adopted when nothing else is focused.
    pub default_ability: Option<String>,
    pub max_chained_fills: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            default_ability: None,
            max_chained_fills: DEFAULT_MAX_CHAINED_FILLS,
        }
    }
}

/// Everything one turn consumes.
#[derive(Debug, Clone, Default)]
pub struct TurnInput {
    pub nlp: NlpResult,
    pub incoming: IncomingSlotData,
}

impl TurnInput {
    pub fn new(nlp: NlpResult) -> Self {
        Self {
            nlp,
            incoming: IncomingSlotData::default(),
        }
    }

    pub fn with_incoming(mut self, incoming: IncomingSlotData) -> Self {
        self.incoming = incoming;
        self
    }
}

/// Result of a successful turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Snapshot to persist.
    pub state: ConversationState,
    /// Messages to send, in enqueue order.
    pub messages: Vec<OutputMessage>,
    /// Journal of actions applied during the turn.
    pub actions: Vec<StateAction>,
    pub execution: ExecuteOutcome,
}

/// Runs turns against a fixed ability registry.
#[derive(Debug, Clone)]
pub struct DialogueEngine {
    registry: Arc<AbilityRegistry>,
    settings: EngineSettings,
}

impl DialogueEngine {
    pub fn new(registry: AbilityRegistry, settings: EngineSettings) -> Self {
        Self {
            registry: Arc::new(registry),
            settings,
        }
    }

    pub fn registry(&self) -> &AbilityRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Processes one turn.
    ///
    /// The stages run on a copy of `snapshot`; on error the copy is discarded,
    /// so a failed turn never changes what the caller persists.
    #[tracing::instrument(skip_all, fields(turn = snapshot.turn_count() + 1))]
    pub async fn process_turn(
        &self,
        snapshot: &ConversationState,
        input: TurnInput,
    ) -> Result<TurnOutcome, DialogueError> {
        let registry = self.registry.as_ref();
        let max_chained_fills = self.settings.max_chained_fills;
        let mut store = StateStore::new(snapshot.clone());

        intake(
            &mut store,
            registry,
            input.nlp,
            input.incoming,
            self.settings.default_ability.as_deref(),
        );
        fill_slot(&mut store, registry, max_chained_fills).await?;
        evaluate(&mut store, registry);
        let execution = execute(&mut store, registry, max_chained_fills).await?;
        let messages = outtake(&mut store);

        tracing::debug!(
            messages = messages.len(),
            actions = store.journal().len(),
            "turn processed"
        );
        let (state, actions) = store.into_parts();
        Ok(TurnOutcome {
            state,
            messages,
            actions,
            execution,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dialogue::ability::{Ability, SlotDefinition};
    use crate::domain::dialogue::actions::replay;
    use crate::domain::dialogue::requests::FillOutcome;
    use crate::domain::dialogue::values::{SlotId, ValidateResult};

    fn engine() -> DialogueEngine {
        let registry = AbilityRegistry::new(vec![Ability::new("book_flight")
            .with_slot(
                SlotDefinition::new("origin", |_| "Where from?".into())
                    .with_order(1)
                    .with_validate(|v, _| {
                        if v.is_empty() {
                            ValidateResult::invalid()
                        } else {
                            ValidateResult::valid()
                        }
                    }),
            )
            .with_slot(
                SlotDefinition::new("destination", |_| "Where to?".into())
                    .with_order(2)
                    .with_on_fill(|_, _| FillOutcome::none().set_slot_value("book_flight", "ghost", "x", true)),
            )])
        .unwrap();
        DialogueEngine::new(
            registry,
            EngineSettings {
                default_ability: Some("book_flight".into()),
                ..EngineSettings::default()
            },
        )
    }

    #[tokio::test]
    async fn journal_replays_to_the_returned_snapshot() {
        let engine = engine();
        let before = ConversationState::new();

        let outcome = engine
            .process_turn(&before, TurnInput::new(NlpResult::text("hi")))
            .await
            .unwrap();

        let mut replayed = before;
        replay(&mut replayed, &outcome.actions);
        assert_eq!(replayed, outcome.state);
        assert_eq!(outcome.messages[0].message, "Where from?");
    }

    #[tokio::test]
    async fn missing_chain_target_fails_the_turn() {
        let engine = engine();
        let first = engine
            .process_turn(
                &ConversationState::new(),
                TurnInput::new(NlpResult::text("hi")),
            )
            .await
            .unwrap();
        let err = engine
            .process_turn(
                &first.state,
                TurnInput::new(NlpResult::text("").with_entity("destination", "LAX")),
            )
            .await
            .unwrap_err();

        assert_eq!(err, DialogueError::SlotNotFound(SlotId::new("book_flight", "ghost")));
    }
}
