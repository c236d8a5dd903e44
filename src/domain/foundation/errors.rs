//! Error types for the domain layer.

use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Duplicate {kind} name '{name}'")]
    Duplicate { kind: &'static str, name: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates a duplicate name validation error.
    pub fn duplicate(kind: &'static str, name: impl Into<String>) -> Self {
        ValidationError::Duplicate {
            kind,
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_empty_field_displays_correctly() {
        let err = ValidationError::empty_field("ability_name");
        assert_eq!(format!("{}", err), "Field 'ability_name' cannot be empty");
    }

    #[test]
    fn validation_error_duplicate_displays_kind_and_name() {
        let err = ValidationError::duplicate("ability", "book_flight");
        assert_eq!(format!("{}", err), "Duplicate ability name 'book_flight'");
    }
}
