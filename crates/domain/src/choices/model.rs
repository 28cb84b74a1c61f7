//! Choice slot data: slot ids, chosen options, and the two nested maps that
//! track them.
//!
//! `StatChoices` records what each slot picked; `StatsAffected` records which
//! slots currently claim each stat. Both are three-level maps
//! (category → passive → key) whose inner levels are created on first write
//! and pruned when they become empty.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::value_objects::StatName;

/// Kind of manual passive a slot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChoiceCategory {
    /// Race-granted adjustable stats
    RacialPassive,
    /// Level-gated mutation / degeneration abilities
    MutantAbility,
}

impl ChoiceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RacialPassive => "racialPassive",
            Self::MutantAbility => "mutantAbility",
        }
    }
}

impl fmt::Display for ChoiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identifier for one assignable slot.
///
/// Derived from category, passive name and slot index so the same slot gets
/// the same id on every render and after a save/load round trip.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(String);

impl SlotId {
    pub fn new(category: ChoiceCategory, passive: &str, index: usize) -> Self {
        Self(format!("{}:{}:{}", category, slugify(passive), index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Slot index encoded in the id, if it was built by `SlotId::new`.
    pub fn index(&self) -> Option<usize> {
        self.0.rsplit_once(':').and_then(|(_, index)| index.parse().ok())
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.trim().chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// How a chosen option changes its target stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectCalc {
    Add,
    Subtract,
}

impl EffectCalc {
    /// Signed contribution of `value` under this calculation.
    pub fn apply(self, value: i32) -> i32 {
        match self {
            Self::Add => value,
            Self::Subtract => -value,
        }
    }
}

/// The option a slot currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChosenOption {
    /// Option type key from the passive definition
    #[serde(rename = "type")]
    pub option_type: String,
    /// Target stat, for options that modify a specific stat
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stat_name: Option<StatName>,
    pub calc: EffectCalc,
    pub value: i32,
    #[serde(default)]
    pub label: String,
}

impl ChosenOption {
    /// Signed numeric effect on the target stat.
    pub fn effect(&self) -> i32 {
        self.calc.apply(self.value)
    }
}

// =============================================================================
// StatChoices
// =============================================================================

/// category → passive name → slot id → chosen option
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatChoices {
    entries: BTreeMap<ChoiceCategory, BTreeMap<String, BTreeMap<SlotId, ChosenOption>>>,
}

impl StatChoices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, category: ChoiceCategory, passive: &str, slot: &SlotId) -> Option<&ChosenOption> {
        self.entries.get(&category)?.get(passive)?.get(slot)
    }

    /// Record a choice, creating intermediate levels as needed.
    ///
    /// Returns the option the slot held before, if any.
    pub fn insert(
        &mut self,
        category: ChoiceCategory,
        passive: &str,
        slot: SlotId,
        option: ChosenOption,
    ) -> Option<ChosenOption> {
        self.entries
            .entry(category)
            .or_default()
            .entry(passive.to_string())
            .or_default()
            .insert(slot, option)
    }

    /// Remove a choice, pruning empty intermediate levels.
    pub fn remove(&mut self, category: ChoiceCategory, passive: &str, slot: &SlotId) -> Option<ChosenOption> {
        let passives = self.entries.get_mut(&category)?;
        let slots = passives.get_mut(passive)?;
        let removed = slots.remove(slot);
        if slots.is_empty() {
            passives.remove(passive);
        }
        if passives.is_empty() {
            self.entries.remove(&category);
        }
        removed
    }

    /// Slots of one passive with their options.
    pub fn slots(&self, category: ChoiceCategory, passive: &str) -> impl Iterator<Item = (&SlotId, &ChosenOption)> {
        self.entries
            .get(&category)
            .and_then(|passives| passives.get(passive))
            .into_iter()
            .flatten()
    }

    /// Every recorded choice as (category, passive, slot, option).
    pub fn iter(&self) -> impl Iterator<Item = (ChoiceCategory, &str, &SlotId, &ChosenOption)> {
        self.entries.iter().flat_map(|(category, passives)| {
            passives.iter().flat_map(move |(passive, slots)| {
                slots
                    .iter()
                    .map(move |(slot, option)| (*category, passive.as_str(), slot, option))
            })
        })
    }
}

// =============================================================================
// StatsAffected
// =============================================================================

/// category → passive name → stat → slots claiming that stat
///
/// Sets serialize as JSON arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatsAffected {
    entries: BTreeMap<ChoiceCategory, BTreeMap<String, BTreeMap<StatName, BTreeSet<SlotId>>>>,
}

impl StatsAffected {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn claimants(&self, category: ChoiceCategory, passive: &str, stat: StatName) -> Option<&BTreeSet<SlotId>> {
        self.entries.get(&category)?.get(passive)?.get(&stat)
    }

    pub fn contains(&self, category: ChoiceCategory, passive: &str, stat: StatName, slot: &SlotId) -> bool {
        self.claimants(category, passive, stat)
            .is_some_and(|slots| slots.contains(slot))
    }

    /// First slot other than `slot` claiming `stat` within the passive.
    pub fn claimed_by_other(
        &self,
        category: ChoiceCategory,
        passive: &str,
        stat: StatName,
        slot: &SlotId,
    ) -> Option<&SlotId> {
        self.claimants(category, passive, stat)?
            .iter()
            .find(|claimant| *claimant != slot)
    }

    /// Add a claim, creating intermediate levels as needed.
    pub fn add(&mut self, category: ChoiceCategory, passive: &str, stat: StatName, slot: SlotId) -> bool {
        self.entries
            .entry(category)
            .or_default()
            .entry(passive.to_string())
            .or_default()
            .entry(stat)
            .or_default()
            .insert(slot)
    }

    /// Remove a claim, deleting the set and any intermediate level that
    /// becomes empty.
    pub fn remove(&mut self, category: ChoiceCategory, passive: &str, stat: StatName, slot: &SlotId) -> bool {
        let Some(passives) = self.entries.get_mut(&category) else {
            return false;
        };
        let Some(stats) = passives.get_mut(passive) else {
            return false;
        };
        let Some(slots) = stats.get_mut(&stat) else {
            return false;
        };
        let removed = slots.remove(slot);
        if slots.is_empty() {
            stats.remove(&stat);
        }
        if stats.is_empty() {
            passives.remove(passive);
        }
        if passives.is_empty() {
            self.entries.remove(&category);
        }
        removed
    }

    /// Every claim as (category, passive, stat, slots).
    pub fn iter(&self) -> impl Iterator<Item = (ChoiceCategory, &str, StatName, &BTreeSet<SlotId>)> {
        self.entries.iter().flat_map(|(category, passives)| {
            passives.iter().flat_map(move |(passive, stats)| {
                stats
                    .iter()
                    .map(move |(stat, slots)| (*category, passive.as_str(), *stat, slots))
            })
        })
    }
}
