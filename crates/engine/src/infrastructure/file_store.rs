//! JSON file adapter for the character store.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::infrastructure::ports::{CharacterStore, StoreError};
use crate::infrastructure::save_file::SaveFile;

/// Stores the whole collection in one pretty-printed JSON file.
///
/// Saves go to a sibling temporary file that is then renamed over the
/// target, so a failed write never truncates the previous save.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "characters.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CharacterStore for JsonFileStore {
    fn load(&self) -> Result<SaveFile, StoreError> {
        let json = fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StoreError::not_found(self.path.display()),
            _ => StoreError::io("load", e),
        })?;
        SaveFile::from_json(&json).map_err(StoreError::serialization)
    }

    fn save(&self, file: &SaveFile) -> Result<(), StoreError> {
        let json = file.to_json_pretty().map_err(StoreError::serialization)?;
        let temp = self.temp_path();
        fs::write(&temp, json).map_err(|e| StoreError::io("save", e))?;
        fs::rename(&temp, &self.path).map_err(|e| StoreError::io("save", e))?;
        Ok(())
    }
}
