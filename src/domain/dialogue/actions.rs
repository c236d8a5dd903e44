//! Named state mutations and the reducer that applies them.
//!
//! Every change a stage makes to [`ConversationState`] is expressed as a
//! [`StateAction`]. Actions are plain data so a turn's journal can be logged,
//! persisted or replayed against the pre-turn snapshot.

use serde::{Deserialize, Serialize};

use super::state::ConversationState;
use super::values::{
    NlpResult, OutputMessage, PendingFulfillment, PromptReason, PromptedSlot, SlotId, SlotRecord,
};

/// A discrete, replayable mutation of the conversation snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum StateAction {
    /// Resets the per-turn logs and bumps the turn counter.
    StartTurn,
    SetMessageData(NlpResult),
    SetDefaultAbility(String),
    SetFocusedAbility(Option<String>),
    FillSlot {
        slot: SlotId,
        value: String,
        fill_message: Option<String>,
    },
    ClearSlot(SlotId),
    EnableSlot(SlotId),
    DisableSlot(SlotId),
    SetSlotDone {
        slot: SlotId,
        done: bool,
    },
    AddMessage(OutputMessage),
    PushPrompt {
        slot: SlotId,
        reason: PromptReason,
        origin: Option<SlotId>,
        prompted: bool,
    },
    RemovePrompt(SlotId),
    MarkPrompted(SlotId),
    IncrementPromptTurnCount(SlotId),
    AbilityCompleted(String),
    AcceptSlot(SlotId),
    DenySlot(SlotId),
    AddToOnFillStack(PendingFulfillment),
    ClearOnFillStack,
    ClearOutputQueue,
}

/// Applies one action to the snapshot.
///
/// References to slots that have no entry are created on demand; the reducer
/// never consults the ability registry, so it cannot fail.
pub fn reduce(state: &mut ConversationState, action: &StateAction) {
    match action {
        StateAction::StartTurn => {
            state.filled_slots_on_current_turn.clear();
            state.abilities_complete_on_current_turn.clear();
            state.turn_count += 1;
        }
        StateAction::SetMessageData(nlp) => {
            state.message_data = Some(nlp.clone());
        }
        StateAction::SetDefaultAbility(name) => {
            state.default_ability = Some(name.clone());
        }
        StateAction::SetFocusedAbility(name) => {
            state.focused_ability = name.clone();
        }
        StateAction::FillSlot {
            slot,
            value,
            fill_message,
        } => {
            state
                .slot_data
                .entry(slot.ability_name.clone())
                .or_default()
                .insert(
                    slot.slot_name.clone(),
                    SlotRecord {
                        value: value.clone(),
                        fill_message: fill_message.clone(),
                    },
                );
            state.filled_slots_on_current_turn.push(slot.clone());
        }
        StateAction::ClearSlot(slot) => {
            if let Some(slots) = state.slot_data.get_mut(&slot.ability_name) {
                slots.remove(&slot.slot_name);
                if slots.is_empty() {
                    state.slot_data.remove(&slot.ability_name);
                }
            }
        }
        StateAction::EnableSlot(slot) => status_mut(state, slot).is_enabled = true,
        StateAction::DisableSlot(slot) => status_mut(state, slot).is_enabled = false,
        StateAction::SetSlotDone { slot, done } => status_mut(state, slot).is_done = *done,
        StateAction::AddMessage(message) => {
            state.output_message_queue.push(message.clone());
        }
        StateAction::PushPrompt {
            slot,
            reason,
            origin,
            prompted,
        } => {
            // A slot appears on the stack at most once; re-pushing moves it to the top.
            state.prompted_slot_stack.retain(|p| &p.slot != slot);
            state.prompted_slot_stack.push(PromptedSlot {
                slot: slot.clone(),
                reason: *reason,
                prompted: *prompted,
                turn_count: 0,
                origin: origin.clone(),
            });
        }
        StateAction::RemovePrompt(slot) => {
            state.prompted_slot_stack.retain(|p| &p.slot != slot);
        }
        StateAction::MarkPrompted(slot) => {
            if let Some(entry) = prompt_mut(state, slot) {
                entry.prompted = true;
            }
        }
        StateAction::IncrementPromptTurnCount(slot) => {
            if let Some(entry) = prompt_mut(state, slot) {
                entry.turn_count += 1;
            }
        }
        StateAction::AbilityCompleted(name) => {
            state.ability_status.insert(name.clone());
            if !state.abilities_complete_on_current_turn.contains(name) {
                state.abilities_complete_on_current_turn.push(name.clone());
            }
        }
        StateAction::AcceptSlot(slot) => status_mut(state, slot).confirmed = Some(true),
        StateAction::DenySlot(slot) => status_mut(state, slot).confirmed = Some(false),
        StateAction::AddToOnFillStack(pending) => {
            state.run_on_fill_stack.push(pending.clone());
        }
        StateAction::ClearOnFillStack => state.run_on_fill_stack.clear(),
        StateAction::ClearOutputQueue => state.output_message_queue.clear(),
    }
}

fn status_mut<'a>(
    state: &'a mut ConversationState,
    slot: &SlotId,
) -> &'a mut super::values::SlotStatus {
    state
        .slot_status
        .entry(slot.ability_name.clone())
        .or_default()
        .entry(slot.slot_name.clone())
        .or_default()
}

fn prompt_mut<'a>(state: &'a mut ConversationState, slot: &SlotId) -> Option<&'a mut PromptedSlot> {
    state
        .prompted_slot_stack
        .iter_mut()
        .rev()
        .find(|p| &p.slot == slot)
}

/// Snapshot plus the ordered journal of actions applied to it during a turn.
#[derive(Debug, Clone)]
pub struct StateStore {
    state: ConversationState,
    journal: Vec<StateAction>,
}

impl StateStore {
    pub fn new(state: ConversationState) -> Self {
        Self {
            state,
            journal: Vec::new(),
        }
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    /// Applies an action and records it.
    pub fn dispatch(&mut self, action: StateAction) {
        tracing::trace!(?action, "dispatch");
        reduce(&mut self.state, &action);
        self.journal.push(action);
    }

    pub fn journal(&self) -> &[StateAction] {
        &self.journal
    }

    pub fn into_parts(self) -> (ConversationState, Vec<StateAction>) {
        (self.state, self.journal)
    }
}

/// Replays a journal on top of a snapshot.
pub fn replay<'a>(
    state: &mut ConversationState,
    actions: impl IntoIterator<Item = &'a StateAction>,
) {
    for action in actions {
        reduce(state, action);
    }
}
