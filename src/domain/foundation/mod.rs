//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps and error types
//! that form the vocabulary of the Slotwise domain.

mod errors;
mod ids;
mod timestamp;

pub use errors::ValidationError;
pub use ids::ConversationId;
pub use timestamp::Timestamp;
