//! Mutation requests returned by slot callbacks and slot-data providers.
//!
//! Callbacks never touch the snapshot. They describe what they want changed
//! and the engine applies the requests, in order, after the callback returns.

use serde::{Deserialize, Serialize};

use super::values::SlotId;

/// A change requested from inside a slot's `on_fill`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlotRequest {
    /// Store a value for another slot, optionally running that slot's `on_fill`.
    SetSlotValue {
        slot: SlotId,
        value: String,
        run_on_fill: bool,
    },
    SetSlotEnabled { slot: SlotId, enabled: bool },
    /// Ask the user to confirm through the named slot of the same ability.
    RequireConfirmation { slot_name: String },
    /// Accept the value that requested the current confirmation.
    Accept,
    /// Reject the value that requested the current confirmation.
    Deny,
}

/// What a slot's `on_fill` produced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FillOutcome {
    pub message: Option<String>,
    pub requests: Vec<SlotRequest>,
}

impl FillOutcome {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            requests: Vec::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn set_slot_value(
        mut self,
        ability_name: impl Into<String>,
        slot_name: impl Into<String>,
        value: impl Into<String>,
        run_on_fill: bool,
    ) -> Self {
        self.requests.push(SlotRequest::SetSlotValue {
            slot: SlotId::new(ability_name, slot_name),
            value: value.into(),
            run_on_fill,
        });
        self
    }

    pub fn set_slot_enabled(
        mut self,
        ability_name: impl Into<String>,
        slot_name: impl Into<String>,
        enabled: bool,
    ) -> Self {
        self.requests.push(SlotRequest::SetSlotEnabled {
            slot: SlotId::new(ability_name, slot_name),
            enabled,
        });
        self
    }

    pub fn require_confirmation(mut self, slot_name: impl Into<String>) -> Self {
        self.requests.push(SlotRequest::RequireConfirmation {
            slot_name: slot_name.into(),
        });
        self
    }

    pub fn accept(mut self) -> Self {
        self.requests.push(SlotRequest::Accept);
        self
    }

    pub fn deny(mut self) -> Self {
        self.requests.push(SlotRequest::Deny);
        self
    }
}

/// What an ability's completion callback produced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompletionOutcome {
    pub messages: Vec<String>,
    /// Ability to focus next; focus is cleared when absent.
    pub next_ability: Option<String>,
}

impl CompletionOutcome {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
            next_ability: None,
        }
    }

    pub fn then_focus(mut self, ability_name: impl Into<String>) -> Self {
        self.next_ability = Some(ability_name.into());
        self
    }
}

/// An externally sourced value applied as an immediate fill, bypassing validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotOverride {
    pub ability_name: String,
    pub slot_name: String,
    pub value: String,
}

impl SlotOverride {
    pub fn new(
        ability_name: impl Into<String>,
        slot_name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            ability_name: ability_name.into(),
            slot_name: slot_name.into(),
            value: value.into(),
        }
    }

    pub fn slot_id(&self) -> SlotId {
        SlotId::new(&self.ability_name, &self.slot_name)
    }
}

/// A slot-data accessor call issued by a host-supplied provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlotDataRequest {
    SetSlotValue { slot: SlotId, value: String },
    SetSlotEnabled { slot: SlotId, enabled: bool },
    SetSlotDone { slot: SlotId, done: bool },
    /// Deferred fill honored by the execute stage, running the slot's `on_fill`.
    FulfillSlot { slot: SlotId, value: String },
}

/// Everything a slot-data provider hands to intake for one turn.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IncomingSlotData {
    #[serde(default)]
    pub overrides: Vec<SlotOverride>,
    #[serde(default)]
    pub requests: Vec<SlotDataRequest>,
}

impl IncomingSlotData {
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty() && self.requests.is_empty()
    }

    pub fn with_override(mut self, slot_override: SlotOverride) -> Self {
        self.overrides.push(slot_override);
        self
    }

    pub fn set_slot_value(mut self, slot: SlotId, value: impl Into<String>) -> Self {
        self.requests.push(SlotDataRequest::SetSlotValue {
            slot,
            value: value.into(),
        });
        self
    }

    pub fn set_slot_enabled(mut self, slot: SlotId, enabled: bool) -> Self {
        self.requests
            .push(SlotDataRequest::SetSlotEnabled { slot, enabled });
        self
    }

    pub fn set_slot_done(mut self, slot: SlotId, done: bool) -> Self {
        self.requests.push(SlotDataRequest::SetSlotDone { slot, done });
        self
    }

    pub fn fulfill_slot(mut self, slot: SlotId, value: impl Into<String>) -> Self {
        self.requests.push(SlotDataRequest::FulfillSlot {
            slot,
            value: value.into(),
        });
        self
    }
}
