//! Turn-based slot-filling dialogue engine.
//!
//! # Module Organization
//!
//! - `values` - Slot ids, NLU results, prompt entries, output messages
//! - `state` - The per-conversation snapshot
//! - `actions` - Named mutations, the reducer and the per-turn journal
//! - `ability` - Slot and ability capabilities, the registry
//! - `requests` - Mutation requests returned by callbacks and providers
//! - `selectors` - Read-only queries used by the stages
//! - `stages` - Intake, FillSlot, Evaluate, Execute, Outtake
//! - `pipeline` - `DialogueEngine`, which runs one turn end to end

mod ability;
mod actions;
mod errors;
mod pipeline;
mod requests;
mod selectors;
mod state;
mod values;

pub mod stages;

pub use ability::{
    Ability, AbilityCompletion, AbilityRegistry, CompletionFn, Slot, SlotContext, SlotDefinition,
};
pub use actions::{reduce, replay, StateAction, StateStore};
pub use errors::DialogueError;
pub use pipeline::{
    DialogueEngine, EngineSettings, TurnInput, TurnOutcome, DEFAULT_MAX_CHAINED_FILLS,
};
pub use requests::{
    CompletionOutcome, FillOutcome, IncomingSlotData, SlotDataRequest, SlotOverride, SlotRequest,
};
pub use selectors::{next_slot_to_prompt, unfilled_enabled_slots};
pub use stages::ExecuteOutcome;
pub use state::ConversationState;
pub use values::{
    Entity, NlpResult, OutputMessage, OutputMessageKind, PendingFulfillment, PromptReason,
    PromptedSlot, SlotId, SlotRecord, SlotStatus, ValidateResult, DEFAULT_SLOT_ORDER,
};
