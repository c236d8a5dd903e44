//! Storage Adapters
//!
//! Implementations of the `ConversationStateStore` port.
//!
//! - **FileStateStorage** - Stores snapshots as YAML files on disk
//! - **InMemoryStateStorage** - Stores snapshots in memory (testing/development)

mod file_state_storage;
mod in_memory_state_storage;

pub use file_state_storage::FileStateStorage;
pub use in_memory_state_storage::InMemoryStateStorage;
