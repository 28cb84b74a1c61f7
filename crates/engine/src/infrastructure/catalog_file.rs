//! Loads a race/class catalog from a JSON file.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use sheetkeeper_domain::StaticCatalog;

use crate::infrastructure::ports::StoreError;

pub fn load_catalog(path: &Path) -> Result<StaticCatalog, StoreError> {
    let json = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => StoreError::not_found(path.display()),
        _ => StoreError::io("load_catalog", e),
    })?;
    let catalog: StaticCatalog = serde_json::from_str(&json).map_err(StoreError::serialization)?;
    tracing::info!(
        path = %path.display(),
        races = catalog.races().len(),
        classes = catalog.classes().len(),
        "Loaded reference catalog"
    );
    Ok(catalog)
}
