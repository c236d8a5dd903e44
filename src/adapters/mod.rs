//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the dialogue engine to the outside world:
//! - `storage` - Conversation snapshot persistence (in-memory, YAML files)
//! - `nlu` - NLU providers

pub mod nlu;
pub mod storage;

pub use nlu::KeyValueNluProvider;
pub use storage::{FileStateStorage, InMemoryStateStorage};
