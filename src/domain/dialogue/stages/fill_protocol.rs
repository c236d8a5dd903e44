//! Fill protocol shared by FillSlot (validated fills) and Execute (deferred fulfillments).

use std::collections::VecDeque;

use crate::domain::dialogue::ability::{AbilityRegistry, SlotContext};
use crate::domain::dialogue::actions::{StateAction, StateStore};
use crate::domain::dialogue::errors::DialogueError;
use crate::domain::dialogue::requests::{FillOutcome, SlotRequest};
use crate::domain::dialogue::selectors::confirmation_origin;
use crate::domain::dialogue::values::{OutputMessage, OutputMessageKind, PromptReason, SlotId};

/// Records a value that needs no further validation.
///
/// Runs the slot's `on_fill`, writes the value, enqueues the returned text and
/// applies the returned requests in order. Requests that chain into another
/// slot's `on_fill` are processed the same way, breadth first, up to
/// `max_chained_fills` links.
pub(crate) async fn fill_slot_value(
    store: &mut StateStore,
    registry: &AbilityRegistry,
    max_chained_fills: usize,
    slot_id: SlotId,
    value: String,
) -> Result<(), DialogueError> {
    let mut queue = VecDeque::from([(slot_id, value)]);
    let mut chained = 0usize;

    while let Some((slot_id, value)) = queue.pop_front() {
        let slot = registry
            .find_slot(&slot_id)
            .ok_or_else(|| DialogueError::SlotNotFound(slot_id.clone()))?;

        let outcome = {
            let ctx = SlotContext::new(&slot_id.ability_name, store.state());
            slot.on_fill(&value, &ctx).await?
        };
        let FillOutcome { message, requests } = outcome;

        tracing::debug!(slot = %slot_id, requests = requests.len(), "slot filled");
        store.dispatch(StateAction::FillSlot {
            slot: slot_id.clone(),
            value,
            fill_message: message.clone(),
        });
        if let Some(text) = message {
            store.dispatch(StateAction::AddMessage(OutputMessage::for_slot(
                OutputMessageKind::SlotFill,
                &slot_id,
                text,
            )));
        }

        for request in requests {
            if let Some(next) = apply_request(store, registry, &slot_id, request)? {
                chained += 1;
                if chained > max_chained_fills {
                    return Err(DialogueError::FillChainTooDeep {
                        limit: max_chained_fills,
                    });
                }
                queue.push_back(next);
            }
        }

        if store.state().prompt_for(&slot_id).is_some() {
            store.dispatch(StateAction::RemovePrompt(slot_id));
        }
    }
    Ok(())
}

/// Applies one request raised by `filled`'s `on_fill`. Returns a fill to chain into.
fn apply_request(
    store: &mut StateStore,
    registry: &AbilityRegistry,
    filled: &SlotId,
    request: SlotRequest,
) -> Result<Option<(SlotId, String)>, DialogueError> {
    match request {
        SlotRequest::SetSlotValue {
            slot,
            value,
            run_on_fill: true,
        } => {
            if !registry.contains_slot(&slot) {
                return Err(DialogueError::SlotNotFound(slot));
            }
            return Ok(Some((slot, value)));
        }
        SlotRequest::SetSlotValue { slot, value, .. } => {
            if registry.contains_slot(&slot) {
                store.dispatch(StateAction::FillSlot {
                    slot,
                    value,
                    fill_message: None,
                });
            } else {
                tracing::warn!(slot = %slot, requested_by = %filled, "set_slot_value on unknown slot ignored");
            }
        }
        SlotRequest::SetSlotEnabled { slot, enabled } => {
            if !registry.contains_slot(&slot) {
                tracing::warn!(slot = %slot, requested_by = %filled, "set_slot_enabled on unknown slot ignored");
            } else if enabled {
                store.dispatch(StateAction::EnableSlot(slot));
            } else {
                store.dispatch(StateAction::DisableSlot(slot));
            }
        }
        SlotRequest::RequireConfirmation { slot_name } => {
            let target = SlotId::new(&filled.ability_name, slot_name);
            if !registry.contains_slot(&target) {
                tracing::warn!(slot = %target, requested_by = %filled, "confirmation slot not found");
                return Ok(None);
            }
            // A fresh confirmation must be answered again before the ability can complete.
            store.dispatch(StateAction::ClearSlot(target.clone()));
            store.dispatch(StateAction::EnableSlot(target.clone()));
            store.dispatch(StateAction::PushPrompt {
                slot: target,
                reason: PromptReason::ConfirmationRequest,
                origin: Some(filled.clone()),
                prompted: false,
            });
        }
        SlotRequest::Accept => match confirmation_origin(store.state(), filled) {
            Some(origin) => {
                tracing::debug!(slot = %origin, "confirmation accepted");
                store.dispatch(StateAction::AcceptSlot(origin));
            }
            None => {
                tracing::warn!(slot = %filled, "accept issued without a pending confirmation");
            }
        },
        SlotRequest::Deny => match confirmation_origin(store.state(), filled) {
            Some(origin) => {
                tracing::debug!(slot = %origin, "confirmation denied, asking again");
                store.dispatch(StateAction::DenySlot(origin.clone()));
                store.dispatch(StateAction::ClearSlot(origin.clone()));
                store.dispatch(StateAction::PushPrompt {
                    slot: origin,
                    reason: PromptReason::Query,
                    origin: None,
                    prompted: false,
                });
            }
            None => {
                tracing::warn!(slot = %filled, "deny issued without a pending confirmation");
            }
        },
    }
    Ok(None)
}
