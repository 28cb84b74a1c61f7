//! Infrastructure: ports and their adapters.

pub mod catalog_file;
pub mod clock;
pub mod file_store;
pub mod ports;
pub mod save_file;
