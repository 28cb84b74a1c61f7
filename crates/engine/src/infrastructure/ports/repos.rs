//! Character persistence port.

use super::error::StoreError;
use crate::infrastructure::save_file::SaveFile;

/// Whole-collection load and save of character records.
///
/// Implementations either return a complete save file or an error; they
/// never hand back a partially read collection.
#[cfg_attr(test, mockall::automock)]
pub trait CharacterStore: Send + Sync {
    fn load(&self) -> Result<SaveFile, StoreError>;
    fn save(&self, file: &SaveFile) -> Result<(), StoreError>;
}
