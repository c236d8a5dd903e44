//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the dialogue engine and its host. Adapters implement these ports.
//!
//! - `ConversationStateStore` - Persists conversation snapshots between turns
//! - `NluProvider` - Extracts intent and entities from user text
//! - `SlotDataProvider` - Supplies externally sourced slot data per turn

mod nlu_provider;
mod slot_data_provider;
mod state_storage;

pub use nlu_provider::{NluError, NluProvider};
pub use slot_data_provider::{SlotDataError, SlotDataProvider};
pub use state_storage::{ConversationStateStore, StateStorageError};
