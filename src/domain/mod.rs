//! Domain layer containing the dialogue engine and its primitives.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (ids, timestamps, validation errors)
//! - `dialogue` - Abilities, slots, the conversation snapshot and the turn pipeline

pub mod dialogue;
pub mod foundation;
