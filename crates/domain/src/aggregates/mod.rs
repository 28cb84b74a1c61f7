//! Aggregate roots - domain objects that own their related data
//!
//! # Rustic DDD Principles
//!
//! | Concern                  | Rustic Equivalent                        |
//! |--------------------------|------------------------------------------|
//! | Private fields + getters | Derived fields writable only in-crate    |
//! | Aggregate root guards    | Mutators return `bool` / `Result`        |
//! | Factory pattern          | `::new()` + builder methods              |

pub mod character;

pub use character::{specialization_key, Character, SPECIALIZATION_SEPARATOR};
