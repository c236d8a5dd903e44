//! Execute stage: run completions or send the pending prompt.

use serde::{Deserialize, Serialize};

use crate::domain::dialogue::ability::{AbilityRegistry, SlotContext};
use crate::domain::dialogue::actions::{StateAction, StateStore};
use crate::domain::dialogue::errors::DialogueError;
use crate::domain::dialogue::selectors::ability_completed_by_fills;
use crate::domain::dialogue::values::{OutputMessage, OutputMessageKind, SlotId};

use super::fill_protocol::fill_slot_value;

/// What Execute did this turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecuteOutcome {
    /// Completion callbacks ran for these abilities.
    Completed { abilities: Vec<String> },
    /// The slot's query was sent.
    Prompted { slot: SlotId },
    Idle,
}

/// Honors deferred fulfillments, then runs completions or sends the pending prompt.
///
/// Fulfillments run first so completion messages stay last in the queue. A
/// fulfillment that settles an ability's last slot completes it this turn.
pub async fn execute(
    store: &mut StateStore,
    registry: &AbilityRegistry,
    max_chained_fills: usize,
) -> Result<ExecuteOutcome, DialogueError> {
    if drain_fulfillments(store, registry, max_chained_fills).await?
        && store.state().abilities_complete_on_current_turn().is_empty()
    {
        if let Some(ability) = ability_completed_by_fills(store.state(), registry) {
            tracing::info!(ability = ability.name(), "ability complete after fulfillment");
            store.dispatch(StateAction::AbilityCompleted(ability.name().to_string()));
        }
    }

    let completed = store.state().abilities_complete_on_current_turn().to_vec();
    if !completed.is_empty() {
        let mut next_focus = None;
        for name in &completed {
            drop_prompts_of(store, name);
            let Some(ability) = registry.get(name) else {
                tracing::warn!(ability = %name, "completed ability is not registered");
                continue;
            };
            let Some(completion) = ability.completion() else {
                continue;
            };
            let outcome = {
                let ctx = SlotContext::new(name, store.state());
                completion.on_complete(&ctx).await?
            };
            for message in outcome.messages {
                store.dispatch(StateAction::AddMessage(OutputMessage::for_ability(name, message)));
            }
            if outcome.next_ability.is_some() {
                next_focus = outcome.next_ability;
            }
        }
        tracing::debug!(next_focus = ?next_focus, "completion callbacks ran");
        store.dispatch(StateAction::SetFocusedAbility(next_focus));
        return Ok(ExecuteOutcome::Completed {
            abilities: completed,
        });
    }

    let Some(entry) = store.state().active_prompt().filter(|p| !p.prompted).cloned() else {
        return Ok(ExecuteOutcome::Idle);
    };
    let Some(slot) = registry.find_slot(&entry.slot) else {
        tracing::warn!(slot = %entry.slot, "prompted slot no longer exists, dropping it");
        store.dispatch(StateAction::RemovePrompt(entry.slot));
        return Ok(ExecuteOutcome::Idle);
    };

    let text = {
        let ctx = SlotContext::new(&entry.slot.ability_name, store.state());
        slot.query(&ctx).await?
    };
    store.dispatch(StateAction::AddMessage(OutputMessage::for_slot(
        OutputMessageKind::SlotQuery,
        &entry.slot,
        text,
    )));
    store.dispatch(StateAction::MarkPrompted(entry.slot.clone()));
    Ok(ExecuteOutcome::Prompted { slot: entry.slot })
}

/// Removes stack entries left behind by a completed ability.
fn drop_prompts_of(store: &mut StateStore, ability_name: &str) {
    let leftover: Vec<SlotId> = store
        .state()
        .prompted_slot_stack()
        .iter()
        .filter(|entry| entry.slot.belongs_to(ability_name))
        .map(|entry| entry.slot.clone())
        .collect();
    for slot in leftover {
        tracing::debug!(%slot, "dropping prompt of completed ability");
        store.dispatch(StateAction::RemovePrompt(slot));
    }
}

/// Returns whether any fulfillment filled a slot.
async fn drain_fulfillments(
    store: &mut StateStore,
    registry: &AbilityRegistry,
    max_chained_fills: usize,
) -> Result<bool, DialogueError> {
    let pending = store.state().run_on_fill_stack().to_vec();
    if pending.is_empty() {
        return Ok(false);
    }
    let mut filled = false;
    for fulfillment in pending {
        if !registry.contains_slot(&fulfillment.slot) {
            tracing::warn!(slot = %fulfillment.slot, "fulfillment for unknown slot dropped");
            continue;
        }
        fill_slot_value(
            store,
            registry,
            max_chained_fills,
            fulfillment.slot,
            fulfillment.value,
        )
        .await?;
        filled = true;
    }
    store.dispatch(StateAction::ClearOnFillStack);
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dialogue::ability::{Ability, CompletionFn, SlotDefinition};
    use crate::domain::dialogue::requests::{CompletionOutcome, FillOutcome};
    use crate::domain::dialogue::state::ConversationState;
    use crate::domain::dialogue::values::{PendingFulfillment, PromptReason};

    fn registry() -> AbilityRegistry {
        AbilityRegistry::new(vec![
            Ability::new("book_flight")
                .with_slot(SlotDefinition::new("origin", |_| "Where from?".into()))
                .with_slot(
                    SlotDefinition::new("loyalty", |_| "Loyalty number?".into())
                        .with_on_fill(|v, _| FillOutcome::message(format!("Loyalty {} saved", v))),
                )
                .on_complete(CompletionFn::new(|ctx| {
                    CompletionOutcome::message(format!(
                        "Flight from {} booked",
                        ctx.slot_value("origin").unwrap_or("?")
                    ))
                    .then_focus("order_meal")
                })),
            Ability::new("order_meal").with_slot(SlotDefinition::new("meal", |_| "Meal?".into())),
        ])
        .unwrap()
    }

    fn turn() -> StateStore {
        let mut store = StateStore::new(ConversationState::new());
        store.dispatch(StateAction::StartTurn);
        store
    }

    fn push(store: &mut StateStore, slot: &str, prompted: bool) {
        store.dispatch(StateAction::PushPrompt {
            slot: SlotId::new("book_flight", slot),
            reason: PromptReason::Query,
            origin: None,
            prompted,
        });
    }

    #[tokio::test]
    async fn unprompted_top_entry_is_queried_once() {
        let registry = registry();
        let mut store = turn();
        push(&mut store, "origin", false);

        let first = execute(&mut store, &registry, 32).await.unwrap();
        let second = execute(&mut store, &registry, 32).await.unwrap();

        assert_eq!(
            first,
            ExecuteOutcome::Prompted {
                slot: SlotId::new("book_flight", "origin")
            }
        );
        assert_eq!(second, ExecuteOutcome::Idle);
        assert_eq!(store.state().output_messages().len(), 1);
        assert!(store.state().active_prompt().unwrap().prompted);
    }

    #[tokio::test]
    async fn completion_wins_over_pending_prompt() {
        let registry = registry();
        let mut store = turn();
        store.dispatch(StateAction::FillSlot {
            slot: SlotId::new("book_flight", "origin"),
            value: "NYC".into(),
            fill_message: None,
        });
        push(&mut store, "loyalty", false);
        store.dispatch(StateAction::AbilityCompleted("book_flight".into()));

        let outcome = execute(&mut store, &registry, 32).await.unwrap();

        assert_eq!(
            outcome,
            ExecuteOutcome::Completed {
                abilities: vec!["book_flight".into()]
            }
        );
        let messages = store.state().output_messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message, "Flight from NYC booked");
        assert_eq!(messages[0].kind, OutputMessageKind::AbilityComplete);
        assert_eq!(store.state().focused_ability(), Some("order_meal"));
        assert!(store.state().prompted_slot_stack().is_empty());
    }

    #[tokio::test]
    async fn completion_keeps_prompts_of_other_abilities() {
        let registry = registry();
        let mut store = turn();
        store.dispatch(StateAction::PushPrompt {
            slot: SlotId::new("order_meal", "meal"),
            reason: PromptReason::Query,
            origin: None,
            prompted: true,
        });
        push(&mut store, "loyalty", false);
        store.dispatch(StateAction::AbilityCompleted("book_flight".into()));

        execute(&mut store, &registry, 32).await.unwrap();

        let stack = store.state().prompted_slot_stack();
        assert_eq!(stack.len(), 1);
        assert_eq!(stack[0].slot, SlotId::new("order_meal", "meal"));
    }

    #[tokio::test]
    async fn completion_without_callback_clears_focus() {
        let registry = registry();
        let mut store = turn();
        store.dispatch(StateAction::SetFocusedAbility(Some("order_meal".into())));
        store.dispatch(StateAction::AbilityCompleted("order_meal".into()));

        execute(&mut store, &registry, 32).await.unwrap();

        assert!(store.state().focused_ability().is_none());
        assert!(store.state().output_messages().is_empty());
    }

    #[tokio::test]
    async fn fulfillments_run_on_fill_and_unknown_ones_are_dropped() {
        let registry = registry();
        let mut store = turn();
        store.dispatch(StateAction::AddToOnFillStack(PendingFulfillment {
            slot: SlotId::new("nowhere", "ghost"),
            value: "boo".into(),
        }));
        store.dispatch(StateAction::AddToOnFillStack(PendingFulfillment {
            slot: SlotId::new("book_flight", "loyalty"),
            value: "LY-7".into(),
        }));

        let outcome = execute(&mut store, &registry, 32).await.unwrap();

        assert_eq!(outcome, ExecuteOutcome::Idle);
        let state = store.state();
        assert_eq!(state.slot_value(&SlotId::new("book_flight", "loyalty")), Some("LY-7"));
        assert_eq!(state.output_messages()[0].message, "Loyalty LY-7 saved");
        assert!(state.run_on_fill_stack().is_empty());
    }

    #[tokio::test]
    async fn fulfillment_of_last_slot_completes_the_ability() {
        let registry = registry();
        let mut store = turn();
        store.dispatch(StateAction::FillSlot {
            slot: SlotId::new("book_flight", "origin"),
            value: "NYC".into(),
            fill_message: None,
        });
        store.dispatch(StateAction::StartTurn);
        push(&mut store, "loyalty", false);
        store.dispatch(StateAction::AddToOnFillStack(PendingFulfillment {
            slot: SlotId::new("book_flight", "loyalty"),
            value: "LY-7".into(),
        }));

        let outcome = execute(&mut store, &registry, 32).await.unwrap();

        assert_eq!(
            outcome,
            ExecuteOutcome::Completed {
                abilities: vec!["book_flight".into()]
            }
        );
        let texts: Vec<&str> = store
            .state()
            .output_messages()
            .iter()
            .map(|m| m.message.as_str())
            .collect();
        assert_eq!(texts, vec!["Loyalty LY-7 saved", "Flight from NYC booked"]);
        assert!(store.state().is_ability_complete("book_flight"));
    }

    #[tokio::test]
    async fn stale_unprompted_entry_is_dropped() {
        let registry = registry();
        let mut store = turn();
        push(&mut store, "gone", false);

        let outcome = execute(&mut store, &registry, 32).await.unwrap();

        assert_eq!(outcome, ExecuteOutcome::Idle);
        assert!(store.state().prompted_slot_stack().is_empty());
    }
}
