//! Persisted character record.
//!
//! The shape save/load collaborators read and write. Derived fields (stat
//! totals, experience caps, pool maxima, armor class) are left out and
//! recomputed after loading; `statsAffected` sets are written as arrays.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::choices::{StatChoices, StatsAffected};
use crate::entities::{ArmorItem, GeneralItem, WeaponItem};
use crate::value_objects::StatName;

/// Authoritative components of one stat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedStat {
    pub value: i32,
    pub equipment: i32,
    pub temporary: i32,
    pub experience: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedCharacter {
    pub name: String,
    pub level: u32,
    #[serde(default)]
    pub level_experience: i32,
    #[serde(default)]
    pub race: String,
    #[serde(rename = "class", default)]
    pub classes: Vec<String>,
    #[serde(rename = "specialization", default)]
    pub specializations: Vec<String>,
    pub stats: BTreeMap<StatName, PersistedStat>,
    #[serde(default)]
    pub health: i32,
    #[serde(default)]
    pub health_bonus: i32,
    #[serde(default)]
    pub mana: i32,
    #[serde(default)]
    pub mana_bonus: i32,
    #[serde(default)]
    pub racial_power: i32,
    #[serde(default)]
    pub racial_power_bonus: i32,
    #[serde(default)]
    pub armor_bonus: i32,
    #[serde(default)]
    pub skills: String,
    #[serde(default)]
    pub personal_notes: String,
    #[serde(default)]
    pub weapon_inventory: Vec<WeaponItem>,
    #[serde(default)]
    pub armor_inventory: Vec<ArmorItem>,
    #[serde(default)]
    pub general_inventory: Vec<GeneralItem>,
    #[serde(default)]
    pub stat_choices: StatChoices,
    #[serde(default)]
    pub stats_affected: StatsAffected,
    #[serde(default)]
    pub section_visibility: BTreeMap<String, bool>,
}

/// Check that the two choice maps describe the same claims and that no stat
/// is claimed twice within a passive.
pub(crate) fn validate_choice_state(choices: &StatChoices, affected: &StatsAffected) -> Result<(), String> {
    for (category, passive, stat, slots) in affected.iter() {
        if slots.len() > 1 {
            return Err(format!(
                "{} of {} '{}' is claimed by {} slots",
                stat,
                category,
                passive,
                slots.len()
            ));
        }
        for slot in slots {
            let targets_stat = choices
                .get(category, passive, slot)
                .is_some_and(|option| option.stat_name == Some(stat));
            if !targets_stat {
                return Err(format!(
                    "slot {} claims {} without a matching choice",
                    slot, stat
                ));
            }
        }
    }
    for (category, passive, slot, option) in choices.iter() {
        if let Some(stat) = option.stat_name {
            if !affected.contains(category, passive, stat, slot) {
                return Err(format!(
                    "choice in slot {} targets {} but holds no claim",
                    slot, stat
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregates::Character;
    use crate::choices::{ChoiceCategory, ChosenOption, EffectCalc, SlotId};
    use crate::DomainError;

    const RACIAL: ChoiceCategory = ChoiceCategory::RacialPassive;

    fn plus_two(stat: StatName) -> ChosenOption {
        ChosenOption {
            option_type: "plus2".to_string(),
            stat_name: Some(stat),
            calc: EffectCalc::Add,
            value: 2,
            label: String::new(),
        }
    }

    #[test]
    fn record_omits_derived_fields() {
        let json = serde_json::to_value(Character::new("Mira").to_persisted()).unwrap();
        let strength = &json["stats"]["Strength"];
        assert!(strength.get("total").is_none());
        assert!(strength.get("maxExperience").is_none());
        assert!(json.get("ac").is_none());
        assert!(json.get("maxHealth").is_none());
        assert!(json.get("hasUnsavedChanges").is_none());
        assert_eq!(json["class"], serde_json::json!([]));
    }

    #[test]
    fn record_reads_minimal_json() {
        let stats: serde_json::Map<String, serde_json::Value> = StatName::ALL
            .iter()
            .map(|name| (name.to_string(), serde_json::json!({ "value": 10 })))
            .collect();
        let json = serde_json::json!({ "name": "Mira", "level": 2, "stats": stats });

        let record: PersistedCharacter = serde_json::from_value(json).unwrap();
        let character = Character::from_persisted(record).unwrap();

        assert_eq!(character.level(), 2);
        assert_eq!(character.stats().get(StatName::Wisdom).value(), 10);
    }

    #[test]
    fn double_claim_is_malformed() {
        let mut record = Character::new("Mira").to_persisted();
        let first = SlotId::new(RACIAL, "Adaptable Physique", 0);
        let second = SlotId::new(RACIAL, "Adaptable Physique", 1);
        record
            .stat_choices
            .insert(RACIAL, "Adaptable Physique", first.clone(), plus_two(StatName::Strength));
        record
            .stat_choices
            .insert(RACIAL, "Adaptable Physique", second.clone(), plus_two(StatName::Strength));
        record.stats_affected.add(RACIAL, "Adaptable Physique", StatName::Strength, first);
        record.stats_affected.add(RACIAL, "Adaptable Physique", StatName::Strength, second);

        assert!(matches!(
            Character::from_persisted(record),
            Err(DomainError::MalformedPersistedRecord(_))
        ));
    }

    #[test]
    fn choice_without_claim_is_malformed() {
        let mut record = Character::new("Mira").to_persisted();
        record.stat_choices.insert(
            RACIAL,
            "Adaptable Physique",
            SlotId::new(RACIAL, "Adaptable Physique", 0),
            plus_two(StatName::Agility),
        );
        let err = Character::from_persisted(record).unwrap_err();
        assert!(err.to_string().contains("holds no claim"));
    }

    #[test]
    fn claim_without_choice_is_malformed() {
        let mut record = Character::new("Mira").to_persisted();
        record.stats_affected.add(
            RACIAL,
            "Adaptable Physique",
            StatName::Agility,
            SlotId::new(RACIAL, "Adaptable Physique", 0),
        );
        let err = Character::from_persisted(record).unwrap_err();
        assert!(err.to_string().contains("without a matching choice"));
    }
}
