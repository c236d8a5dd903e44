//! Slotwise - Turn-based dialogue slot-filling engine
//!
//! Each user message runs through Intake → FillSlot → Evaluate → Execute → Outtake
//! against a persisted conversation snapshot. Abilities declare the slots they
//! need; the engine prompts for them, validates answers and runs the ability's
//! completion once every enabled slot is filled.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
