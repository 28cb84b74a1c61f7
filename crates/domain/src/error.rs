//! Unified error types for the domain layer
//!
//! Provides a common error type for stat edits, choice allocation and
//! persisted-record validation, so the engine can wrap it with `#[from]`
//! instead of passing strings around.

use thiserror::Error;

use crate::choices::{ChoiceCategory, SlotId};
use crate::value_objects::{FormulaParseError, StatName};

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed (e.g., invalid field values)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Parse error (for value objects)
    #[error("Parse error: {0}")]
    Parse(String),

    /// The target stat is already claimed by a sibling slot of the same passive
    #[error("{stat} is already claimed by slot {claimed_by} of {category} '{passive}'")]
    StatAlreadyClaimed {
        category: ChoiceCategory,
        passive: String,
        stat: StatName,
        claimed_by: SlotId,
    },

    /// The character's race offers no passive with this name
    #[error("Race '{race}' has no {category} named '{passive}'")]
    UnknownPassive {
        race: String,
        category: ChoiceCategory,
        passive: String,
    },

    /// The passive does not offer this option type
    #[error("'{passive}' has no option '{option_type}'")]
    UnknownOption { passive: String, option_type: String },

    /// The slot index is not funded at the character's current level
    #[error("Slot {index} of '{passive}' is unavailable ({available} slots available)")]
    SlotUnavailable {
        passive: String,
        index: usize,
        available: usize,
    },

    /// A loaded record is missing fields or violates choice invariants
    #[error("Malformed persisted record: {0}")]
    MalformedPersistedRecord(String),

    /// No character at this position in the collection
    #[error("Character not found at index {0}")]
    CharacterNotFound(usize),
}

impl DomainError {
    /// Creates a validation error for business rule violations.
    ///
    /// # Example
    /// ```ignore
    /// if level == 0 {
    ///     return Err(DomainError::validation("Level must be at least 1"));
    /// }
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a parse error for string-to-type conversion failures.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a malformed persisted record error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedPersistedRecord(msg.into())
    }

    /// Whether this error is a rejected double allocation.
    pub fn is_stat_already_claimed(&self) -> bool {
        matches!(self, Self::StatAlreadyClaimed { .. })
    }
}

impl From<FormulaParseError> for DomainError {
    fn from(err: FormulaParseError) -> Self {
        Self::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = DomainError::validation("Level must be at least 1");
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(err.to_string(), "Validation failed: Level must be at least 1");
    }

    #[test]
    fn test_stat_already_claimed_message() {
        let err = DomainError::StatAlreadyClaimed {
            category: ChoiceCategory::RacialPassive,
            passive: "Adaptable Physique".to_string(),
            stat: StatName::Strength,
            claimed_by: SlotId::new(ChoiceCategory::RacialPassive, "Adaptable Physique", 0),
        };
        assert!(err.is_stat_already_claimed());
        assert_eq!(
            err.to_string(),
            "Strength is already claimed by slot racialPassive:adaptable-physique:0 of racialPassive 'Adaptable Physique'"
        );
    }

    #[test]
    fn test_from_formula_parse_error() {
        let err: DomainError = FormulaParseError::Empty.into();
        assert!(matches!(err, DomainError::Parse(_)));
        assert!(err.to_string().contains("Empty formula"));
    }

    #[test]
    fn test_malformed_record_error() {
        let err = DomainError::malformed("missing stat Strength");
        assert_eq!(
            err.to_string(),
            "Malformed persisted record: missing stat Strength"
        );
    }
}
