//! Intake stage: start the turn and merge externally supplied data.

use crate::domain::dialogue::ability::AbilityRegistry;
use crate::domain::dialogue::actions::{StateAction, StateStore};
use crate::domain::dialogue::requests::{IncomingSlotData, SlotDataRequest};
use crate::domain::dialogue::values::{NlpResult, PendingFulfillment, SlotId};

/// Resets per-turn logs, records the message data and applies incoming slot data.
///
/// Overrides are applied first, then provider requests, each in the order given.
/// Targets that do not resolve to a registered slot are dropped. Fulfillments are
/// queued unchecked; Execute resolves them.
pub fn intake(
    store: &mut StateStore,
    registry: &AbilityRegistry,
    nlp: NlpResult,
    incoming: IncomingSlotData,
    default_ability: Option<&str>,
) {
    store.dispatch(StateAction::StartTurn);
    store.dispatch(StateAction::SetMessageData(nlp));

    if store.state().default_ability().is_none() {
        if let Some(name) = default_ability {
            store.dispatch(StateAction::SetDefaultAbility(name.to_string()));
        }
    }

    let IncomingSlotData {
        overrides,
        requests,
    } = incoming;

    for slot_override in overrides {
        let slot = slot_override.slot_id();
        if !registry.contains_slot(&slot) {
            tracing::warn!(slot = %slot, "override for unknown slot dropped");
            continue;
        }
        fill_immediately(store, slot, slot_override.value);
    }

    for request in requests {
        match request {
            SlotDataRequest::FulfillSlot { slot, value } => {
                store.dispatch(StateAction::AddToOnFillStack(PendingFulfillment { slot, value }));
            }
            SlotDataRequest::SetSlotValue { slot, .. }
            | SlotDataRequest::SetSlotEnabled { slot, .. }
            | SlotDataRequest::SetSlotDone { slot, .. }
                if !registry.contains_slot(&slot) =>
            {
                tracing::warn!(slot = %slot, "slot data request for unknown slot dropped");
            }
            SlotDataRequest::SetSlotValue { slot, value } => fill_immediately(store, slot, value),
            SlotDataRequest::SetSlotEnabled { slot, enabled: true } => {
                store.dispatch(StateAction::EnableSlot(slot));
            }
            SlotDataRequest::SetSlotEnabled { slot, enabled: false } => {
                store.dispatch(StateAction::DisableSlot(slot));
            }
            SlotDataRequest::SetSlotDone { slot, done } => {
                store.dispatch(StateAction::SetSlotDone { slot, done });
            }
        }
    }
}

fn fill_immediately(store: &mut StateStore, slot: SlotId, value: String) {
    store.dispatch(StateAction::FillSlot {
        slot: slot.clone(),
        value,
        fill_message: None,
    });
    if store.state().prompt_for(&slot).is_some() {
        store.dispatch(StateAction::RemovePrompt(slot));
    }
}
