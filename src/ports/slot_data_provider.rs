//! Slot Data Provider Port - Externally sourced slot data for a turn.
//!
//! Providers describe what they want changed through
//! [`IncomingSlotData`]; intake applies it inside the pipeline.

use async_trait::async_trait;

use crate::domain::dialogue::{ConversationState, IncomingSlotData, NlpResult};
use crate::domain::foundation::ConversationId;

/// Errors from a slot data provider
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SlotDataError {
    #[error("slot data lookup failed: {0}")]
    Lookup(String),
}

/// Port for host-supplied slot data (profile lookups and the like)
#[async_trait]
pub trait SlotDataProvider: Send + Sync {
    /// Slot data to merge into the turn about to run.
    ///
    /// `state` is the snapshot before the turn starts.
    async fn incoming_slot_data(
        &self,
        conversation_id: ConversationId,
        message: &NlpResult,
        state: &ConversationState,
    ) -> Result<IncomingSlotData, SlotDataError>;
}
