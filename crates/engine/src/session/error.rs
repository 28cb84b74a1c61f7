//! Editor session errors.

use crate::infrastructure::ports::StoreError;
use sheetkeeper_domain::DomainError;

/// Errors that can occur during session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No character is selected")]
    NoActiveCharacter,

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
