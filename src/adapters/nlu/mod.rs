//! NLU Adapters
//!
//! - **KeyValueNluProvider** - `#intent` and `name=value` markup, for the console host and tests

mod key_value_nlu;

pub use key_value_nlu::KeyValueNluProvider;
