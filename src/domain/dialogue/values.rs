//! Value objects shared by every stage of the turn pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default tie-break priority of a slot. Lower values are prompted first.
pub const DEFAULT_SLOT_ORDER: u32 = 100;

/// Identifies one slot inside one ability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId {
    pub ability_name: String,
    pub slot_name: String,
}

impl SlotId {
    pub fn new(ability_name: impl Into<String>, slot_name: impl Into<String>) -> Self {
        Self {
            ability_name: ability_name.into(),
            slot_name: slot_name.into(),
        }
    }

    /// Returns true if this id points into the named ability.
    pub fn belongs_to(&self, ability_name: &str) -> bool {
        self.ability_name == ability_name
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.ability_name, self.slot_name)
    }
}

/// A structured value extracted from user text by NLU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub value: String,
}

impl Entity {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// NLU result for one conversational turn.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NlpResult {
    pub raw_text: String,
    pub intent: Option<String>,
    #[serde(default)]
    pub entities: Vec<Entity>,
}

impl NlpResult {
    /// Creates a result carrying only raw text.
    pub fn text(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            ..Default::default()
        }
    }

    pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = Some(intent.into());
        self
    }

    pub fn with_entity(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.entities.push(Entity::new(name, value));
        self
    }

    /// Returns the first entity with the given name, in recognition order.
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn has_entities(&self) -> bool {
        !self.entities.is_empty()
    }
}

/// Why a slot sits on the prompted-slot stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptReason {
    /// Ordinary request for missing information.
    Query,
    /// Dependent slot asking the user to confirm another slot's value.
    ConfirmationRequest,
}

/// One entry of the prompted-slot stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptedSlot {
    pub slot: SlotId,
    pub reason: PromptReason,
    /// True once the slot's query (or a retry standing in for it) has been sent.
    pub prompted: bool,
    /// Number of retries issued for this entry.
    #[serde(default)]
    pub turn_count: u32,
    /// Slot whose fill requested this confirmation.
    #[serde(default)]
    pub origin: Option<SlotId>,
}

impl PromptedSlot {
    pub fn query(slot: SlotId) -> Self {
        Self {
            slot,
            reason: PromptReason::Query,
            prompted: false,
            turn_count: 0,
            origin: None,
        }
    }

    pub fn confirmation(slot: SlotId, origin: SlotId) -> Self {
        Self {
            slot,
            reason: PromptReason::ConfirmationRequest,
            prompted: false,
            turn_count: 0,
            origin: Some(origin),
        }
    }
}

/// A filled slot value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRecord {
    pub value: String,
    /// Text the slot's `on_fill` sent back when this value was recorded.
    #[serde(default)]
    pub fill_message: Option<String>,
}

/// Per-slot status flags. Absence of an entry means all defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotStatus {
    pub is_enabled: bool,
    #[serde(default)]
    pub is_done: bool,
    /// `Some(true)` after accept, `Some(false)` after deny.
    #[serde(default)]
    pub confirmed: Option<bool>,
}

impl Default for SlotStatus {
    fn default() -> Self {
        Self {
            is_enabled: true,
            is_done: false,
            confirmed: None,
        }
    }
}

/// What produced an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMessageKind {
    SlotQuery,
    Retry,
    ValidateReason,
    SlotFill,
    AbilityComplete,
}

/// One pending outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputMessage {
    pub message: String,
    pub kind: OutputMessageKind,
    pub ability_name: Option<String>,
    pub slot_name: Option<String>,
}

impl OutputMessage {
    /// Creates a message attributed to a slot.
    pub fn for_slot(kind: OutputMessageKind, slot: &SlotId, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            ability_name: Some(slot.ability_name.clone()),
            slot_name: Some(slot.slot_name.clone()),
        }
    }

    /// Creates a message attributed to an ability as a whole.
    pub fn for_ability(ability_name: &str, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: OutputMessageKind::AbilityComplete,
            ability_name: Some(ability_name.to_string()),
            slot_name: None,
        }
    }
}

/// Deferred programmatic fill queued through `fulfill_slot`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingFulfillment {
    pub slot: SlotId,
    pub value: String,
}

/// Result of a slot's validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidateResult {
    pub is_valid: bool,
    pub reason: Option<String>,
}

impl ValidateResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            reason: None,
        }
    }

    pub fn invalid() -> Self {
        Self {
            is_valid: false,
            reason: None,
        }
    }

    /// Invalid, with a user-facing reason that is enqueued as a message.
    pub fn invalid_because(reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            reason: Some(reason.into()),
        }
    }
}
