//! Evaluate stage: decide the single next action for this turn.

use crate::domain::dialogue::ability::AbilityRegistry;
use crate::domain::dialogue::actions::{StateAction, StateStore};
use crate::domain::dialogue::selectors::{ability_completed_by_fills, next_slot_to_prompt};
use crate::domain::dialogue::values::{PromptReason, SlotId};

/// Marks at most one ability complete or pushes at most one prompt.
///
/// Precedence: completion already recorded this turn, completion caused by
/// this turn's fills, pending prompt, next slot of the focused (or default)
/// ability.
pub fn evaluate(store: &mut StateStore, registry: &AbilityRegistry) {
    if !store.state().abilities_complete_on_current_turn().is_empty() {
        return;
    }

    if let Some(ability) = ability_completed_by_fills(store.state(), registry) {
        tracing::info!(ability = ability.name(), "ability complete");
        store.dispatch(StateAction::AbilityCompleted(ability.name().to_string()));
        return;
    }

    if !store.state().prompted_slot_stack().is_empty() {
        return;
    }

    let focused = store
        .state()
        .focused_ability()
        .filter(|name| {
            let known = registry.get(name).is_some();
            if !known {
                tracing::warn!(ability = %name, "focused ability is not registered");
            }
            known
        })
        .map(str::to_string);

    let focused = match focused {
        Some(name) => name,
        None => match store.state().default_ability().map(str::to_string) {
            Some(name) => {
                store.dispatch(StateAction::SetFocusedAbility(Some(name.clone())));
                name
            }
            None => {
                tracing::debug!("no focused or default ability");
                return;
            }
        },
    };

    let Some(ability) = registry.get(&focused) else {
        tracing::warn!(ability = %focused, "default ability is not registered");
        return;
    };

    if let Some(slot) = next_slot_to_prompt(store.state(), ability) {
        tracing::debug!(ability = %focused, slot = slot.name(), "next slot to prompt");
        store.dispatch(StateAction::PushPrompt {
            slot: SlotId::new(&focused, slot.name()),
            reason: PromptReason::Query,
            origin: None,
            prompted: false,
        });
    }
}
