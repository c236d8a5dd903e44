//! Dialogue engine configuration

use serde::Deserialize;

use crate::domain::dialogue::{EngineSettings, DEFAULT_MAX_CHAINED_FILLS};

use super::error::ValidationError;

/// Engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Ability adopted when nothing is focused
    pub default_ability: Option<String>,

    /// Limit on chained `on_fill` calls within one fill
    #[serde(default = "default_max_chained_fills")]
    pub max_chained_fills: usize,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_chained_fills == 0 {
            return Err(ValidationError::InvalidChainLimit);
        }
        if matches!(&self.default_ability, Some(name) if name.trim().is_empty()) {
            return Err(ValidationError::BlankDefaultAbility);
        }
        Ok(())
    }

    /// Settings handed to the engine.
    pub fn settings(&self) -> EngineSettings {
        EngineSettings {
            default_ability: self.default_ability.clone(),
            max_chained_fills: self.max_chained_fills,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_ability: None,
            max_chained_fills: default_max_chained_fills(),
        }
    }
}

fn default_max_chained_fills() -> usize {
    DEFAULT_MAX_CHAINED_FILLS
}
