//! Race and class reference data.
//!
//! The sheet core never hard-codes races: it asks a `ReferenceCatalog` for
//! unconditional bonuses, resource progressions and the manual passives
//! (choice slots) a race offers. `StaticCatalog` is an in-memory catalog that
//! can be built in code or deserialized from JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::choices::{ChoiceCategory, EffectCalc};
use crate::value_objects::StatName;

/// Lookup of race and class reference data.
pub trait ReferenceCatalog: Send + Sync {
    /// Race definition by exact name, `None` for empty or unknown races.
    fn race(&self, name: &str) -> Option<&RaceDefinition>;

    /// Specializations available to a class (empty for unknown classes).
    fn specializations(&self, class: &str) -> Vec<String>;

    /// Progressions for characters without a known race.
    fn default_resources(&self) -> ResourceProgressions {
        ResourceProgressions::default()
    }
}

/// Base value and per-level growth of a resource pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceProgression {
    pub base: i32,
    pub per_level: i32,
}

impl ResourceProgression {
    pub const fn new(base: i32, per_level: i32) -> Self {
        Self { base, per_level }
    }

    /// Pool size at `level` before stat and bonus contributions.
    pub fn at_level(&self, level: u32) -> i32 {
        let levels_gained = i32::try_from(level.saturating_sub(1)).unwrap_or(i32::MAX);
        self.base.saturating_add(self.per_level.saturating_mul(levels_gained))
    }
}

/// Health, mana and racial power progressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceProgressions {
    pub health: ResourceProgression,
    pub mana: ResourceProgression,
    pub racial_power: ResourceProgression,
}

impl Default for ResourceProgressions {
    /// Progressions used when a character has no (or an unknown) race.
    fn default() -> Self {
        Self {
            health: ResourceProgression::new(10, 5),
            mana: ResourceProgression::new(5, 3),
            racial_power: ResourceProgression::new(0, 0),
        }
    }
}

/// One race's reference entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceDefinition {
    pub name: String,
    /// Unconditional bonuses applied to stat totals
    #[serde(default)]
    pub stat_bonuses: BTreeMap<StatName, i32>,
    /// Offsets to the experience needed per stat point
    #[serde(default)]
    pub experience_offsets: BTreeMap<StatName, i32>,
    #[serde(default)]
    pub resources: ResourceProgressions,
    /// Choice-slot passives the player allocates manually
    #[serde(default)]
    pub manual_passives: Vec<ManualPassive>,
}

impl RaceDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stat_bonuses: BTreeMap::new(),
            experience_offsets: BTreeMap::new(),
            resources: ResourceProgressions::default(),
            manual_passives: Vec::new(),
        }
    }

    pub fn with_stat_bonus(mut self, stat: StatName, bonus: i32) -> Self {
        self.stat_bonuses.insert(stat, bonus);
        self
    }

    pub fn with_experience_offset(mut self, stat: StatName, offset: i32) -> Self {
        self.experience_offsets.insert(stat, offset);
        self
    }

    pub fn with_resources(mut self, resources: ResourceProgressions) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_passive(mut self, passive: ManualPassive) -> Self {
        self.manual_passives.push(passive);
        self
    }

    pub fn stat_bonus(&self, stat: StatName) -> i32 {
        self.stat_bonuses.get(&stat).copied().unwrap_or(0)
    }

    pub fn experience_offset(&self, stat: StatName) -> i32 {
        self.experience_offsets.get(&stat).copied().unwrap_or(0)
    }

    pub fn passive(&self, category: ChoiceCategory, name: &str) -> Option<&ManualPassive> {
        self.manual_passives
            .iter()
            .find(|p| p.category == category && p.name == name)
    }
}

/// A passive whose effect the player allocates through choice slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualPassive {
    pub name: String,
    pub category: ChoiceCategory,
    #[serde(default)]
    pub description: String,
    pub options: Vec<ChoiceOption>,
    pub allocation: SlotAllocation,
}

impl ManualPassive {
    pub fn option(&self, option_type: &str) -> Option<&ChoiceOption> {
        self.options.iter().find(|o| o.option_type == option_type)
    }
}

/// An option a slot can hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceOption {
    #[serde(rename = "type")]
    pub option_type: String,
    pub label: String,
    pub calc: EffectCalc,
    pub value: i32,
    /// Whether the player must pick a target stat for this option
    #[serde(default)]
    pub requires_stat: bool,
}

impl ChoiceOption {
    pub fn stat_modifier(option_type: &str, label: &str, calc: EffectCalc, value: i32) -> Self {
        Self {
            option_type: option_type.to_string(),
            label: label.to_string(),
            calc,
            value,
            requires_stat: true,
        }
    }
}

/// How many slots a passive funds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum SlotAllocation {
    /// A fixed number of slots regardless of level
    Fixed { slots: usize },
    /// Slots granted by the highest threshold at or below the current level
    LevelGated { thresholds: Vec<LevelThreshold> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelThreshold {
    pub level: u32,
    pub points: usize,
}

impl SlotAllocation {
    /// Number of funded slots at `level`.
    pub fn slots_at(&self, level: u32) -> usize {
        match self {
            Self::Fixed { slots } => *slots,
            Self::LevelGated { thresholds } => thresholds
                .iter()
                .filter(|t| t.level <= level)
                .max_by_key(|t| t.level)
                .map(|t| t.points)
                .unwrap_or(0),
        }
    }
}

/// A class and its specializations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDefinition {
    pub name: String,
    #[serde(default)]
    pub specializations: Vec<String>,
}

/// In-memory catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticCatalog {
    #[serde(default)]
    races: Vec<RaceDefinition>,
    #[serde(default)]
    classes: Vec<ClassDefinition>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_race(mut self, race: RaceDefinition) -> Self {
        self.races.retain(|r| r.name != race.name);
        self.races.push(race);
        self
    }

    pub fn with_class(mut self, name: &str, specializations: &[&str]) -> Self {
        self.classes.retain(|c| c.name != name);
        self.classes.push(ClassDefinition {
            name: name.to_string(),
            specializations: specializations.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn races(&self) -> &[RaceDefinition] {
        &self.races
    }

    pub fn classes(&self) -> &[ClassDefinition] {
        &self.classes
    }

    /// The catalog shipped with the editor.
    pub fn builtin() -> Self {
        Self::new()
            .with_race(RaceDefinition::new("Human").with_stat_bonus(StatName::Charisma, 1))
            .with_race(
                RaceDefinition::new("Demi-human")
                    .with_experience_offset(StatName::Agility, -2)
                    .with_passive(ManualPassive {
                        name: "Adaptable Physique".to_string(),
                        category: ChoiceCategory::RacialPassive,
                        description: "Two stats of your choice gain +2.".to_string(),
                        options: vec![ChoiceOption::stat_modifier(
                            "plus2",
                            "+2 to a stat",
                            EffectCalc::Add,
                            2,
                        )],
                        allocation: SlotAllocation::Fixed { slots: 2 },
                    }),
            )
            .with_race(
                RaceDefinition::new("Mutant")
                    .with_resources(ResourceProgressions {
                        racial_power: ResourceProgression::new(10, 2),
                        ..ResourceProgressions::default()
                    })
                    .with_passive(ManualPassive {
                        name: "Unstable Genome".to_string(),
                        category: ChoiceCategory::MutantAbility,
                        description: "Mutations strengthen a stat; degenerations weaken one."
                            .to_string(),
                        options: vec![
                            ChoiceOption::stat_modifier("mutation", "Mutation (+3)", EffectCalc::Add, 3),
                            ChoiceOption::stat_modifier(
                                "degeneration",
                                "Degeneration (-2)",
                                EffectCalc::Subtract,
                                2,
                            ),
                            ChoiceOption {
                                option_type: "dormant".to_string(),
                                label: "Dormant gene".to_string(),
                                calc: EffectCalc::Add,
                                value: 0,
                                requires_stat: false,
                            },
                        ],
                        allocation: SlotAllocation::LevelGated {
                            thresholds: vec![
                                LevelThreshold { level: 1, points: 1 },
                                LevelThreshold { level: 5, points: 2 },
                                LevelThreshold { level: 10, points: 3 },
                            ],
                        },
                    }),
            )
            .with_class("Warrior", &["Berserker", "Guardian"])
            .with_class("Mage", &["Elementalist", "Necromancer"])
            .with_class("Rogue", &["Assassin", "Trickster"])
    }
}

impl ReferenceCatalog for StaticCatalog {
    fn race(&self, name: &str) -> Option<&RaceDefinition> {
        self.races.iter().find(|r| r.name == name)
    }

    fn specializations(&self, class: &str) -> Vec<String> {
        self.classes
            .iter()
            .find(|c| c.name == class)
            .map(|c| c.specializations.clone())
            .unwrap_or_default()
    }
}
