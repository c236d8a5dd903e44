//! FillSlot stage: answer the active prompt, then match entities opportunistically.

use crate::domain::dialogue::ability::{Ability, AbilityRegistry, SlotContext};
use crate::domain::dialogue::actions::{StateAction, StateStore};
use crate::domain::dialogue::errors::DialogueError;
use crate::domain::dialogue::selectors::{potential_matches, PotentialMatch};
use crate::domain::dialogue::values::{
    NlpResult, OutputMessage, OutputMessageKind, PromptReason, SlotId, ValidateResult,
};

use super::fill_protocol::fill_slot_value;

/// What opportunistic matching saw this turn.
#[derive(Debug, Default)]
struct MatchTracker {
    potential_match_found: bool,
    filled: bool,
    /// First match whose validator rejected its value.
    not_valid: Option<(SlotId, String)>,
}

/// Runs the FillSlot stage against the current message data.
pub async fn fill_slot(
    store: &mut StateStore,
    registry: &AbilityRegistry,
    max_chained_fills: usize,
) -> Result<(), DialogueError> {
    let nlp = store.state().message_data().cloned().unwrap_or_default();
    let mut tracker = MatchTracker::default();

    // Active prompt that rejected this turn's answer, with the rejected value.
    let mut unanswered: Option<(SlotId, String)> = None;

    if let Some(entry) = store.state().active_prompt().cloned() {
        match registry.find_slot(&entry.slot) {
            None => {
                tracing::warn!(slot = %entry.slot, "prompted slot no longer exists, dropping it");
                store.dispatch(StateAction::RemovePrompt(entry.slot));
            }
            Some(slot) => {
                let candidate = nlp
                    .entity(slot.name())
                    .map(|e| e.value.clone())
                    .unwrap_or_else(|| nlp.raw_text.clone());
                let result = {
                    let ctx = SlotContext::new(&entry.slot.ability_name, store.state());
                    slot.validate(&candidate, &ctx).await?
                };
                if result.is_valid {
                    tracing::debug!(slot = %entry.slot, "active prompt answered");
                    fill_slot_value(store, registry, max_chained_fills, entry.slot, candidate).await?;
                    return Ok(());
                }
                tracing::debug!(slot = %entry.slot, "active prompt answer rejected");
                enqueue_reason(store, &entry.slot, result);
                unanswered = Some((entry.slot, candidate));
            }
        }
    }

    if store.state().focused_ability().is_none() {
        match nlp.intent.as_deref() {
            Some(intent) if registry.get(intent).is_some() => {
                store.dispatch(StateAction::SetFocusedAbility(Some(intent.to_string())));
            }
            Some(intent) => tracing::debug!(intent, "intent names no ability, focus unchanged"),
            None => {}
        }
    }

    if !nlp.has_entities() {
        return retry_check(store, registry, tracker, unanswered).await;
    }

    let skip = unanswered.as_ref().map(|(slot, _)| slot.clone());
    let focused = store.state().focused_ability().map(str::to_string);

    if let Some(ability) = focused.as_deref().and_then(|name| registry.get(name)) {
        if !ability.has_slots() {
            complete_slotless(store, ability);
            return Ok(());
        }
        let matches = potential_matches(&nlp, ability);
        try_matches(store, registry, max_chained_fills, matches, skip.as_ref(), &mut tracker).await?;
    }

    if !tracker.filled {
        let intent_ability = nlp
            .intent
            .as_deref()
            .filter(|intent| Some(*intent) != focused.as_deref())
            .and_then(|intent| registry.get(intent));
        if let Some(ability) = intent_ability {
            if !ability.has_slots() {
                complete_slotless(store, ability);
                return Ok(());
            }
            let matches = potential_matches(&nlp, ability);
            if !matches.is_empty() {
                switch_focus(store, ability.name());
            }
            try_matches(store, registry, max_chained_fills, matches, skip.as_ref(), &mut tracker).await?;
        }
    }

    retry_check(store, registry, tracker, unanswered).await
}

async fn try_matches(
    store: &mut StateStore,
    registry: &AbilityRegistry,
    max_chained_fills: usize,
    matches: Vec<PotentialMatch<'_>>,
    skip: Option<&SlotId>,
    tracker: &mut MatchTracker,
) -> Result<(), DialogueError> {
    for candidate in matches {
        // Already validated against this value as the active prompt.
        if skip == Some(&candidate.slot_id) {
            continue;
        }
        tracker.potential_match_found = true;

        let result = {
            let ctx = SlotContext::new(&candidate.slot_id.ability_name, store.state());
            candidate.slot.validate(&candidate.value, &ctx).await?
        };
        if result.is_valid {
            tracing::debug!(slot = %candidate.slot_id, "opportunistic match filled");
            fill_slot_value(
                store,
                registry,
                max_chained_fills,
                candidate.slot_id,
                candidate.value,
            )
            .await?;
            tracker.filled = true;
        } else {
            tracing::debug!(slot = %candidate.slot_id, "opportunistic match rejected");
            enqueue_reason(store, &candidate.slot_id, result);
            if tracker.not_valid.is_none() {
                tracker.not_valid = Some((candidate.slot_id, candidate.value));
            }
        }
    }
    Ok(())
}

async fn retry_check(
    store: &mut StateStore,
    registry: &AbilityRegistry,
    tracker: MatchTracker,
    unanswered: Option<(SlotId, String)>,
) -> Result<(), DialogueError> {
    if tracker.filled {
        return Ok(());
    }

    if let (true, Some((slot_id, value))) = (tracker.potential_match_found, tracker.not_valid) {
        let Some(slot) = registry.find_slot(&slot_id) else {
            return Ok(());
        };
        let retry = {
            let ctx = SlotContext::new(&slot_id.ability_name, store.state());
            slot.retry(&value, &ctx, 1).await?
        };
        // Without retry text the slot waits for Execute to send its query.
        store.dispatch(StateAction::PushPrompt {
            slot: slot_id.clone(),
            reason: PromptReason::Query,
            origin: None,
            prompted: retry.is_some(),
        });
        if let Some(text) = retry {
            store.dispatch(StateAction::IncrementPromptTurnCount(slot_id.clone()));
            store.dispatch(StateAction::AddMessage(OutputMessage::for_slot(
                OutputMessageKind::Retry,
                &slot_id,
                text,
            )));
        }
        return Ok(());
    }

    let Some((slot_id, value)) = unanswered else {
        return Ok(());
    };
    if store.state().prompt_for(&slot_id).is_none() {
        return Ok(());
    }
    let Some(slot) = registry.find_slot(&slot_id) else {
        return Ok(());
    };
    store.dispatch(StateAction::IncrementPromptTurnCount(slot_id.clone()));
    let turn_count = store
        .state()
        .prompt_for(&slot_id)
        .map(|entry| entry.turn_count)
        .unwrap_or(1);
    let retry = {
        let ctx = SlotContext::new(&slot_id.ability_name, store.state());
        slot.retry(&value, &ctx, turn_count).await?
    };
    if let Some(text) = retry {
        tracing::debug!(slot = %slot_id, turn_count, "retrying active prompt");
        store.dispatch(StateAction::AddMessage(OutputMessage::for_slot(
            OutputMessageKind::Retry,
            &slot_id,
            text,
        )));
    }
    Ok(())
}

fn enqueue_reason(store: &mut StateStore, slot: &SlotId, result: ValidateResult) {
    if let Some(reason) = result.reason {
        store.dispatch(StateAction::AddMessage(OutputMessage::for_slot(
            OutputMessageKind::ValidateReason,
            slot,
            reason,
        )));
    }
}

fn complete_slotless(store: &mut StateStore, ability: &Ability) {
    tracing::info!(ability = ability.name(), "ability has no slots, completing");
    store.dispatch(StateAction::AbilityCompleted(ability.name().to_string()));
}

/// Moves focus to `ability_name`, dropping prompts that belong to other abilities.
fn switch_focus(store: &mut StateStore, ability_name: &str) {
    tracing::debug!(ability = ability_name, "intent match moves focus");
    store.dispatch(StateAction::SetFocusedAbility(Some(ability_name.to_string())));
    let stale: Vec<SlotId> = store
        .state()
        .prompted_slot_stack()
        .iter()
        .filter(|entry| !entry.slot.belongs_to(ability_name))
        .map(|entry| entry.slot.clone())
        .collect();
    for slot in stale {
        store.dispatch(StateAction::RemovePrompt(slot));
    }
}
