//! Read-only queries over the snapshot and the ability registry.

use std::sync::Arc;

use super::ability::{Ability, AbilityRegistry, Slot};
use super::state::ConversationState;
use super::values::{NlpResult, PromptReason, SlotId};

/// Enabled flag of a slot: the recorded status wins, otherwise the slot's default.
pub fn is_slot_enabled(state: &ConversationState, ability_name: &str, slot: &dyn Slot) -> bool {
    state
        .slot_status_entry(&SlotId::new(ability_name, slot.name()))
        .map(|status| status.is_enabled)
        .unwrap_or_else(|| slot.default_is_enabled())
}

/// A slot counts as settled once it holds a value or was marked done.
pub fn is_slot_settled(state: &ConversationState, slot: &SlotId) -> bool {
    state.is_slot_filled(slot) || state.slot_status(slot).is_done
}

/// Slots of `ability` that still need a value, in declaration order.
pub fn unfilled_enabled_slots<'a>(
    state: &ConversationState,
    ability: &'a Ability,
) -> Vec<&'a Arc<dyn Slot>> {
    ability
        .slots()
        .iter()
        .filter(|slot| {
            let id = SlotId::new(ability.name(), slot.name());
            !is_slot_settled(state, &id) && is_slot_enabled(state, ability.name(), slot.as_ref())
        })
        .collect()
}

/// Lowest `order` wins; equal orders keep declaration order.
pub fn next_slot_to_prompt<'a>(
    state: &ConversationState,
    ability: &'a Ability,
) -> Option<&'a Arc<dyn Slot>> {
    unfilled_enabled_slots(state, ability)
        .into_iter()
        .min_by_key(|slot| slot.order())
}

/// First ability, in fill order, that a fill on this turn left with nothing to collect.
pub fn ability_completed_by_fills<'a>(
    state: &ConversationState,
    registry: &'a AbilityRegistry,
) -> Option<&'a Ability> {
    let mut checked: Vec<&str> = Vec::new();
    for filled in state.filled_slots_on_current_turn() {
        if checked.contains(&filled.ability_name.as_str()) {
            continue;
        }
        checked.push(&filled.ability_name);
        if let Some(ability) = registry.get(&filled.ability_name) {
            if unfilled_enabled_slots(state, ability).is_empty() {
                return Some(ability);
            }
        }
    }
    None
}

/// The slot whose fill asked `slot` to confirm it.
pub fn confirmation_origin(state: &ConversationState, slot: &SlotId) -> Option<SlotId> {
    state
        .prompt_for(slot)
        .filter(|entry| entry.reason == PromptReason::ConfirmationRequest)
        .and_then(|entry| entry.origin.clone())
}

/// An entity whose name matches a slot of the ability being searched.
#[derive(Clone)]
pub struct PotentialMatch<'a> {
    pub slot: &'a Arc<dyn Slot>,
    pub slot_id: SlotId,
    pub value: String,
}

impl std::fmt::Debug for PotentialMatch<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PotentialMatch")
            .field("slot_id", &self.slot_id)
            .field("value", &self.value)
            .finish()
    }
}

/// Every slot of `ability` named by an entity, in entity order.
///
/// When several entities name the same slot only the first is used.
pub fn potential_matches<'a>(nlp: &NlpResult, ability: &'a Ability) -> Vec<PotentialMatch<'a>> {
    let mut matches: Vec<PotentialMatch<'a>> = Vec::new();
    for entity in &nlp.entities {
        if matches.iter().any(|m| m.slot_id.slot_name == entity.name) {
            continue;
        }
        if let Some(slot) = ability.slot(&entity.name) {
            matches.push(PotentialMatch {
                slot,
                slot_id: SlotId::new(ability.name(), slot.name()),
                value: entity.value.clone(),
            });
        }
    }
    matches
}
