//! Application handlers.
//!
//! Command handlers that orchestrate the dialogue engine and its ports.

pub mod dialogue;

pub use dialogue::{
    ProcessTurnCommand, ProcessTurnError, ProcessTurnHandler, ProcessTurnResult,
    ResetConversationCommand, ResetConversationHandler,
};
