//! Dialogue handlers.

mod process_turn;
mod reset_conversation;

pub use process_turn::{
    ProcessTurnCommand, ProcessTurnError, ProcessTurnHandler, ProcessTurnResult,
};
pub use reset_conversation::{ResetConversationCommand, ResetConversationHandler};
