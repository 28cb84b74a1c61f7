//! Save file format.
//!
//! ```json
//! { "metadata": { "version": "1", "savedAt": "..." }, "characters": [ ... ] }
//! ```
//!
//! Older saves are a bare array of character records; they load with
//! version `"0"` and no timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sheetkeeper_domain::PersistedCharacter;

/// Version written by this build.
pub const SAVE_FORMAT_VERSION: &str = "1";

/// Version reported for bare-array saves.
pub const LEGACY_SAVE_VERSION: &str = "0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveMetadata {
    pub version: String,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

/// A saved character collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveFile {
    pub metadata: SaveMetadata,
    pub characters: Vec<PersistedCharacter>,
}

impl SaveFile {
    pub fn new(characters: Vec<PersistedCharacter>, saved_at: DateTime<Utc>) -> Self {
        Self {
            metadata: SaveMetadata {
                version: SAVE_FORMAT_VERSION.to_string(),
                saved_at: Some(saved_at),
            },
            characters,
        }
    }

    /// Parse either the wrapped format or a bare array of records.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if value.is_array() {
            let characters: Vec<PersistedCharacter> = serde_json::from_value(value)?;
            return Ok(Self {
                metadata: SaveMetadata {
                    version: LEGACY_SAVE_VERSION.to_string(),
                    saved_at: None,
                },
                characters,
            });
        }
        serde_json::from_value(value)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sheetkeeper_domain::Character;

    #[test]
    fn wrapped_format_round_trips() {
        let saved_at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let file = SaveFile::new(vec![Character::new("Mira").to_persisted()], saved_at);

        let json = file.to_json_pretty().unwrap();
        assert!(json.contains("\"savedAt\""));

        let back = SaveFile::from_json(&json).unwrap();
        assert_eq!(back, file);
    }

    #[test]
    fn bare_array_loads_as_legacy() {
        let records = vec![Character::new("Mira").to_persisted(), Character::new("Vex").to_persisted()];
        let json = serde_json::to_string(&records).unwrap();

        let file = SaveFile::from_json(&json).unwrap();

        assert_eq!(file.metadata.version, LEGACY_SAVE_VERSION);
        assert!(file.metadata.saved_at.is_none());
        assert_eq!(file.characters, records);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(SaveFile::from_json("{\"characters\": 3}").is_err());
        assert!(SaveFile::from_json("not json").is_err());
    }
}
