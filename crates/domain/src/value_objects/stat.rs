//! Stat names - the fixed set of attributes every character sheet carries.
//!
//! Provides type safety for stat references instead of passing magic strings
//! like "Strength" or "AGI" through the choice and formula layers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::DomainError;

/// A named character attribute.
///
/// Serialized by its full name ("Strength"), which is also the key used in
/// persisted stat maps and in `StatsAffected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StatName {
    /// Physical power
    Strength,
    /// Speed and reflexes
    Agility,
    /// Endurance; feeds maximum health
    Constitution,
    /// Reasoning; feeds maximum mana
    Intelligence,
    /// Insight and willpower
    Wisdom,
    /// Force of personality
    Charisma,
    /// Awareness of surroundings
    Perception,
}

impl StatName {
    /// Every stat, in sheet display order.
    pub const ALL: [StatName; 7] = [
        Self::Strength,
        Self::Agility,
        Self::Constitution,
        Self::Intelligence,
        Self::Wisdom,
        Self::Charisma,
        Self::Perception,
    ];

    /// Returns the full display name (e.g., "Strength").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strength => "Strength",
            Self::Agility => "Agility",
            Self::Constitution => "Constitution",
            Self::Intelligence => "Intelligence",
            Self::Wisdom => "Wisdom",
            Self::Charisma => "Charisma",
            Self::Perception => "Perception",
        }
    }

    /// Returns the three-letter abbreviation (e.g., "STR").
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Self::Strength => "STR",
            Self::Agility => "AGI",
            Self::Constitution => "CON",
            Self::Intelligence => "INT",
            Self::Wisdom => "WIS",
            Self::Charisma => "CHA",
            Self::Perception => "PER",
        }
    }
}

impl fmt::Display for StatName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StatName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "STR" | "STRENGTH" => Ok(Self::Strength),
            "AGI" | "AGILITY" => Ok(Self::Agility),
            "CON" | "CONSTITUTION" => Ok(Self::Constitution),
            "INT" | "INTELLIGENCE" => Ok(Self::Intelligence),
            "WIS" | "WISDOM" => Ok(Self::Wisdom),
            "CHA" | "CHARISMA" => Ok(Self::Charisma),
            "PER" | "PERCEPTION" => Ok(Self::Perception),
            _ => Err(DomainError::parse(format!("Unknown stat: {}", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_from_str_accepts_names_and_abbreviations() {
        assert_eq!(StatName::from_str("STR").unwrap(), StatName::Strength);
        assert_eq!(StatName::from_str("strength").unwrap(), StatName::Strength);
        assert_eq!(StatName::from_str(" Agility ").unwrap(), StatName::Agility);
        assert_eq!(StatName::from_str("per").unwrap(), StatName::Perception);
        assert!(StatName::from_str("Luck").is_err());
    }

    #[test]
    fn test_stat_display_uses_full_name() {
        assert_eq!(StatName::Constitution.to_string(), "Constitution");
        assert_eq!(StatName::Constitution.abbreviation(), "CON");
    }

    #[test]
    fn test_stat_serde_uses_full_name() {
        let json = serde_json::to_string(&StatName::Wisdom).unwrap();
        assert_eq!(json, "\"Wisdom\"");
        let parsed: StatName = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, StatName::Wisdom);
    }

    #[test]
    fn test_all_lists_every_stat_once() {
        let mut names: Vec<_> = StatName::ALL.iter().map(|s| s.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), StatName::ALL.len());
    }
}
