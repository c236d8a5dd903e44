//! Application layer - Commands and Handlers.
//!
//! This layer coordinates the dialogue engine with storage, NLU and slot data ports.

pub mod handlers;

pub use handlers::{
    ProcessTurnCommand, ProcessTurnError, ProcessTurnHandler, ProcessTurnResult,
    ResetConversationCommand, ResetConversationHandler,
};
