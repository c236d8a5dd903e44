//! Outtake stage.

use crate::domain::dialogue::actions::{StateAction, StateStore};
use crate::domain::dialogue::values::OutputMessage;

/// Drains the output queue in enqueue order.
pub fn outtake(store: &mut StateStore) -> Vec<OutputMessage> {
    let messages = store.state().output_messages().to_vec();
    store.dispatch(StateAction::ClearOutputQueue);
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dialogue::state::ConversationState;
    use crate::domain::dialogue::values::{OutputMessageKind, SlotId};
    use proptest::prelude::*;

    fn enqueue(store: &mut StateStore, text: &str) {
        store.dispatch(StateAction::AddMessage(OutputMessage::for_slot(
            OutputMessageKind::SlotQuery,
            &SlotId::new("a", "b"),
            text,
        )));
    }

    #[test]
    fn second_outtake_is_empty() {
        let mut store = StateStore::new(ConversationState::new());
        enqueue(&mut store, "one");

        assert_eq!(outtake(&mut store).len(), 1);
        assert!(outtake(&mut store).is_empty());
    }

    proptest! {
        #[test]
        fn returns_messages_in_enqueue_order(texts in prop::collection::vec("[a-z]{1,8}", 0..12)) {
            let mut store = StateStore::new(ConversationState::new());
            for text in &texts {
                enqueue(&mut store, text);
            }

            let drained: Vec<String> = outtake(&mut store).into_iter().map(|m| m.message).collect();

            prop_assert_eq!(drained, texts);
            prop_assert!(store.state().output_messages().is_empty());
        }
    }
}
