//! Sheetkeeper Engine library.
//!
//! ## Structure
//!
//! - `session/` - Editor session: every edit goes mutate → recalculate → snapshot
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `config` - Environment configuration

pub mod config;
pub mod infrastructure;
pub mod session;

pub use config::EditorConfig;
pub use session::{EditOutcome, EditorSession, LevelChange, ResourceField, SessionError};
