//! Inventory items carried on a character sheet.
//!
//! Plain data structs: any combination of values is valid, so fields are
//! public. Weapon damage is free text that the formula evaluator renders.

use serde::{Deserialize, Serialize};

/// A weapon entry; `damage` may be a formula ("1d8 + STR/2") or any text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WeaponItem {
    pub name: String,
    pub damage: String,
    pub notes: String,
}

impl WeaponItem {
    pub fn new(name: impl Into<String>, damage: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            damage: damage.into(),
            notes: String::new(),
        }
    }
}

/// An armor entry; only equipped pieces count toward armor class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArmorItem {
    pub name: String,
    pub defense: i32,
    pub equipped: bool,
    pub notes: String,
}

impl ArmorItem {
    pub fn new(name: impl Into<String>, defense: i32, equipped: bool) -> Self {
        Self {
            name: name.into(),
            defense,
            equipped,
            notes: String::new(),
        }
    }
}

/// Anything else in the pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneralItem {
    pub name: String,
    pub quantity: u32,
    pub notes: String,
}

impl Default for GeneralItem {
    fn default() -> Self {
        Self {
            name: String::new(),
            quantity: 1,
            notes: String::new(),
        }
    }
}

impl GeneralItem {
    pub fn new(name: impl Into<String>, quantity: u32) -> Self {
        Self {
            name: name.into(),
            quantity,
            notes: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn general_item_quantity_defaults_to_one() {
        let item: GeneralItem = serde_json::from_str(r#"{"name":"Rope"}"#).unwrap();
        assert_eq!(item.quantity, 1);
        assert_eq!(item.name, "Rope");
    }

    #[test]
    fn armor_item_reads_camel_case() {
        let armor: ArmorItem =
            serde_json::from_str(r#"{"name":"Shield","defense":2,"equipped":true}"#).unwrap();
        assert_eq!(armor, ArmorItem::new("Shield", 2, true));
    }
}
