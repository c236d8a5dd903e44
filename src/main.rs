//! Interactive console host.
//!
//! Type plain answers, or `name=value` to supply entities and `#intent` to
//! name an ability. `/state` prints the stored snapshot as JSON, `/reset`
//! forgets the conversation and `/quit` exits.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use slotwise::adapters::{FileStateStorage, InMemoryStateStorage, KeyValueNluProvider};
use slotwise::application::{
    ProcessTurnCommand, ProcessTurnHandler, ResetConversationCommand, ResetConversationHandler,
};
use slotwise::config::{AppConfig, StorageBackend};
use slotwise::domain::dialogue::{
    Ability, AbilityRegistry, CompletionFn, CompletionOutcome, DialogueEngine, FillOutcome,
    SlotDefinition, ValidateResult,
};
use slotwise::domain::foundation::{ConversationId, ValidationError};
use slotwise::ports::ConversationStateStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;
    config.logging.init_tracing();

    let engine = Arc::new(DialogueEngine::new(
        travel_abilities()?,
        config.engine.settings(),
    ));
    let storage: Arc<dyn ConversationStateStore> = match config.storage.backend {
        StorageBackend::Memory => Arc::new(InMemoryStateStorage::new()),
        StorageBackend::File => Arc::new(FileStateStorage::new(&config.storage.path)),
    };
    let turns = ProcessTurnHandler::new(
        engine,
        storage.clone(),
        Arc::new(KeyValueNluProvider::new()),
    );
    let reset = ResetConversationHandler::new(storage.clone());

    let conversation_id = ConversationId::new();
    tracing::info!(%conversation_id, backend = ?config.storage.backend, "console ready");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => continue,
            "/quit" => break,
            "/reset" => {
                let existed = reset
                    .handle(ResetConversationCommand { conversation_id })
                    .await?;
                println!("[conversation reset: {}]", if existed { "cleared" } else { "empty" });
                continue;
            }
            "/state" => {
                match storage.load_state(conversation_id).await {
                    Ok(state) => println!("{}", serde_json::to_string_pretty(&state)?),
                    Err(err) if err.is_not_found() => println!("[no turns yet]"),
                    Err(err) => eprintln!("error: {}", err),
                }
                continue;
            }
            _ => {}
        }

        match turns
            .handle(ProcessTurnCommand {
                conversation_id,
                text: line,
            })
            .await
        {
            Ok(result) => {
                for message in result.messages {
                    println!("{}", message.message);
                }
            }
            Err(err) => eprintln!("error: {}", err),
        }
    }

    Ok(())
}

/// Abilities served by the console.
fn travel_abilities() -> Result<AbilityRegistry, ValidationError> {
    let book_flight = Ability::new("book_flight")
        .with_slot(
            SlotDefinition::new("origin", |_| "Where are you flying from?".into())
                .with_order(1)
                .with_validate(|value, _| non_empty(value)),
        )
        .with_slot(
            SlotDefinition::new("destination", |_| "Where are you flying to?".into())
                .with_order(2)
                .with_validate(|value, ctx| {
                    if value.trim().is_empty() {
                        ValidateResult::invalid()
                    } else if ctx.slot_value("origin") == Some(value) {
                        ValidateResult::invalid_because("same as origin")
                    } else {
                        ValidateResult::valid()
                    }
                })
                .with_retry(|value, _, turn| {
                    if turn > 2 {
                        "Please name a city, e.g. destination=LAX.".into()
                    } else {
                        format!("You can't fly to {} from there. Where to?", value)
                    }
                }),
        )
        .with_slot(
            SlotDefinition::new("seats", |_| "How many seats?".into())
                .with_order(3)
                .with_validate(|value, _| match value.parse::<u32>() {
                    Ok(n) if (1..=9).contains(&n) => ValidateResult::valid(),
                    _ => ValidateResult::invalid_because("expected 1 to 9"),
                })
                .with_retry(|_, _, _| "Please enter a number from 1 to 9.".into())
                .with_on_fill(|value, _| {
                    if value == "9" {
                        FillOutcome::none().require_confirmation("confirm_seats")
                    } else {
                        FillOutcome::none()
                    }
                }),
        )
        .with_slot(
            SlotDefinition::new("confirm_seats", |ctx| {
                format!(
                    "Book {} seats? (yes/no)",
                    ctx.slot_value("seats").unwrap_or("?")
                )
            })
            .disabled_by_default()
            .with_validate(|value, _| match value {
                "yes" | "no" => ValidateResult::valid(),
                _ => ValidateResult::invalid(),
            })
            .with_retry(|_, _, _| "Please answer yes or no.".into())
            .with_on_fill(|value, _| {
                if value == "yes" {
                    FillOutcome::none().accept()
                } else {
                    FillOutcome::message("Okay, let's change that.").deny()
                }
            }),
        )
        .on_complete(CompletionFn::new(|ctx| {
            CompletionOutcome::message(format!(
                "Booked {} seat(s) from {} to {}.",
                ctx.slot_value("seats").unwrap_or("?"),
                ctx.slot_value("origin").unwrap_or("?"),
                ctx.slot_value("destination").unwrap_or("?"),
            ))
        }));

    AbilityRegistry::new(vec![book_flight])
}

fn non_empty(value: &str) -> ValidateResult {
    if value.trim().is_empty() {
        ValidateResult::invalid()
    } else {
        ValidateResult::valid()
    }
}
