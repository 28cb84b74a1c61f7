//! Domain entities - inventory records carried by a character

mod item;

pub use item::{ArmorItem, GeneralItem, WeaponItem};
