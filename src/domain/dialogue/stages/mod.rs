//! The five per-turn stages, run strictly in order by the pipeline.
//!
//! Each stage reads the snapshot through a [`StateStore`](super::actions::StateStore)
//! and changes it only by dispatching actions.

mod evaluate;
mod execute;
mod fill_protocol;
mod fill_slot;
mod intake;
mod outtake;

pub use evaluate::evaluate;
pub use execute::{execute, ExecuteOutcome};
pub use fill_slot::fill_slot;
pub use intake::intake;
pub use outtake::outtake;
