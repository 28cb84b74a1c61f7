//! Port traits for infrastructure boundaries.
//!
//! Ports exist for:
//! - Character persistence (could swap a JSON file for a cloud drive)
//! - Clock (for testing)

mod error;
mod external;
mod repos;

pub use error::StoreError;
pub use external::ClockPort;
pub use repos::CharacterStore;

#[cfg(test)]
pub use repos::MockCharacterStore;
