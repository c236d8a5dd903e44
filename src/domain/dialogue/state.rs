//! Conversation-state snapshot.
//!
//! The snapshot is owned by the engine and persisted opaquely by the host.
//! Its fields are only written through [`super::actions::reduce`]; everything
//! outside the dialogue module sees read accessors.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::foundation::Timestamp;

use super::values::{
    NlpResult, OutputMessage, PendingFulfillment, PromptedSlot, SlotId, SlotRecord, SlotStatus,
};

/// Per-conversation state threaded through every stage of a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    #[serde(default)]
    pub(super) message_data: Option<NlpResult>,
    /// ability name -> slot name -> value
    #[serde(default)]
    pub(super) slot_data: BTreeMap<String, BTreeMap<String, SlotRecord>>,
    /// ability name -> slot name -> status
    #[serde(default)]
    pub(super) slot_status: BTreeMap<String, BTreeMap<String, SlotStatus>>,
    #[serde(default)]
    pub(super) ability_status: BTreeSet<String>,
    /// Last element is the top of the stack.
    #[serde(default)]
    pub(super) prompted_slot_stack: Vec<PromptedSlot>,
    #[serde(default)]
    pub(super) focused_ability: Option<String>,
    #[serde(default)]
    pub(super) default_ability: Option<String>,
    #[serde(default)]
    pub(super) output_message_queue: Vec<OutputMessage>,
    #[serde(default)]
    pub(super) filled_slots_on_current_turn: Vec<SlotId>,
    #[serde(default)]
    pub(super) abilities_complete_on_current_turn: Vec<String>,
    #[serde(default)]
    pub(super) run_on_fill_stack: Vec<PendingFulfillment>,
    #[serde(default)]
    pub(super) turn_count: u64,
    pub(super) created_at: Timestamp,
}

impl ConversationState {
    /// Creates the default snapshot for a brand-new conversation.
    pub fn new() -> Self {
        Self {
            message_data: None,
            slot_data: BTreeMap::new(),
            slot_status: BTreeMap::new(),
            ability_status: BTreeSet::new(),
            prompted_slot_stack: Vec::new(),
            focused_ability: None,
            default_ability: None,
            output_message_queue: Vec::new(),
            filled_slots_on_current_turn: Vec::new(),
            abilities_complete_on_current_turn: Vec::new(),
            run_on_fill_stack: Vec::new(),
            turn_count: 0,
            created_at: Timestamp::now(),
        }
    }

    /// NLU result of the current (or most recent) turn.
    pub fn message_data(&self) -> Option<&NlpResult> {
        self.message_data.as_ref()
    }

    /// Raw text of the current turn, empty when no turn has run.
    pub fn raw_text(&self) -> &str {
        self.message_data
            .as_ref()
            .map(|m| m.raw_text.as_str())
            .unwrap_or("")
    }

    pub fn slot_record(&self, slot: &SlotId) -> Option<&SlotRecord> {
        self.slot_data
            .get(&slot.ability_name)
            .and_then(|slots| slots.get(&slot.slot_name))
    }

    pub fn slot_value(&self, slot: &SlotId) -> Option<&str> {
        self.slot_record(slot).map(|r| r.value.as_str())
    }

    pub fn is_slot_filled(&self, slot: &SlotId) -> bool {
        self.slot_record(slot).is_some()
    }

    /// Explicit status entry, if one was ever written.
    pub fn slot_status_entry(&self, slot: &SlotId) -> Option<&SlotStatus> {
        self.slot_status
            .get(&slot.ability_name)
            .and_then(|slots| slots.get(&slot.slot_name))
    }

    /// Status of a slot, falling back to defaults when absent.
    pub fn slot_status(&self, slot: &SlotId) -> SlotStatus {
        self.slot_status_entry(slot).cloned().unwrap_or_default()
    }

    pub fn is_ability_complete(&self, ability_name: &str) -> bool {
        self.ability_status.contains(ability_name)
    }

    pub fn completed_abilities(&self) -> impl Iterator<Item = &str> {
        self.ability_status.iter().map(String::as_str)
    }

    pub fn prompted_slot_stack(&self) -> &[PromptedSlot] {
        &self.prompted_slot_stack
    }

    /// The slot currently awaiting an answer.
    pub fn active_prompt(&self) -> Option<&PromptedSlot> {
        self.prompted_slot_stack.last()
    }

    pub fn prompt_for(&self, slot: &SlotId) -> Option<&PromptedSlot> {
        self.prompted_slot_stack.iter().rev().find(|p| &p.slot == slot)
    }

    pub fn focused_ability(&self) -> Option<&str> {
        self.focused_ability.as_deref()
    }

    pub fn default_ability(&self) -> Option<&str> {
        self.default_ability.as_deref()
    }

    pub fn output_messages(&self) -> &[OutputMessage] {
        &self.output_message_queue
    }

    pub fn filled_slots_on_current_turn(&self) -> &[SlotId] {
        &self.filled_slots_on_current_turn
    }

    pub fn abilities_complete_on_current_turn(&self) -> &[String] {
        &self.abilities_complete_on_current_turn
    }

    pub fn run_on_fill_stack(&self) -> &[PendingFulfillment] {
        &self.run_on_fill_stack
    }

    /// Number of turns processed for this conversation.
    pub fn turn_count(&self) -> u64 {
        self.turn_count
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_snapshot_is_empty() {
        let state = ConversationState::new();
        assert!(state.message_data().is_none());
        assert!(state.prompted_slot_stack().is_empty());
        assert!(state.focused_ability().is_none());
        assert!(state.default_ability().is_none());
        assert!(state.output_messages().is_empty());
        assert_eq!(state.turn_count(), 0);
        assert_eq!(state.raw_text(), "");
    }

    #[test]
    fn missing_status_reads_as_enabled() {
        let state = ConversationState::new();
        let slot = SlotId::new("book_flight", "origin");
        assert!(state.slot_status_entry(&slot).is_none());
        assert!(state.slot_status(&slot).is_enabled);
    }

    #[test]
    fn deserializes_snapshot_with_only_required_fields() {
        let original = ConversationState::new();
        let yaml = format!(
            "created_at: {}\n",
            serde_json::to_string(&original.created_at()).unwrap()
        );
        let state: ConversationState = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(state.created_at(), original.created_at());
        assert!(state.prompted_slot_stack().is_empty());
    }
}
