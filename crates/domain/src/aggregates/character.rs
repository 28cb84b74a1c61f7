//! Character aggregate - one editable character sheet
//!
//! # Rustic DDD Design
//!
//! - **Private fields**: derived values (totals, maxima, armor class) can only
//!   be written by the recalculation engine
//! - **Explicit mutators**: every setter returns whether it changed anything,
//!   so callers know when to recalculate and snapshot
//! - **Valid by construction**: `new()` yields level 1 with zeroed stats;
//!   `from_persisted()` validates loaded records before building one

use std::collections::BTreeMap;

use crate::choices::{StatChoices, StatsAffected};
use crate::entities::{ArmorItem, GeneralItem, WeaponItem};
use crate::persisted::{validate_choice_state, PersistedCharacter, PersistedStat};
use crate::value_objects::{
    FormulaBindings, ResourceKind, ResourcePool, Stat, StatBlock, StatField, StatName,
};
use crate::DomainError;

/// Separator between class and specialization in specialization keys.
pub const SPECIALIZATION_SEPARATOR: char = '→';

/// Build the `"<class>→<spec>"` key stored in a character's specializations.
pub fn specialization_key(class: &str, specialization: &str) -> String {
    format!("{}{}{}", class, SPECIALIZATION_SEPARATOR, specialization)
}

/// A character sheet.
///
/// # Invariants
///
/// - `level` is always >= 1
/// - `classes` and `specializations` contain no duplicates
/// - every specialization's class prefix is one of `classes`
/// - `stat_choices` and `stats_affected` describe the same claims
///
/// # Example
///
/// ```
/// use sheetkeeper_domain::aggregates::Character;
/// use sheetkeeper_domain::value_objects::StatName;
///
/// let character = Character::new("Mira");
/// assert_eq!(character.level(), 1);
/// assert_eq!(character.stats().get(StatName::Strength).value(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct Character {
    // Identity and progression
    name: String,
    level: u32,
    level_experience: i32,
    level_max_experience: i32,
    race: String,
    classes: Vec<String>,
    specializations: Vec<String>,

    // Stats and pools
    stats: StatBlock,
    health: ResourcePool,
    mana: ResourcePool,
    racial_power: ResourcePool,
    armor_bonus: i32,
    armor_class: i32,

    // Free text
    skills: String,
    personal_notes: String,

    // Inventory
    weapons: Vec<WeaponItem>,
    armor: Vec<ArmorItem>,
    items: Vec<GeneralItem>,

    // Choice slots
    stat_choices: StatChoices,
    stats_affected: StatsAffected,

    // UI state persisted with the sheet
    section_visibility: BTreeMap<String, bool>,

    // Transient
    has_unsaved_changes: bool,
}

impl PartialEq for Character {
    /// Compares sheet content; the transient unsaved flag is ignored.
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.level == other.level
            && self.level_experience == other.level_experience
            && self.level_max_experience == other.level_max_experience
            && self.race == other.race
            && self.classes == other.classes
            && self.specializations == other.specializations
            && self.stats == other.stats
            && self.health == other.health
            && self.mana == other.mana
            && self.racial_power == other.racial_power
            && self.armor_bonus == other.armor_bonus
            && self.armor_class == other.armor_class
            && self.skills == other.skills
            && self.personal_notes == other.personal_notes
            && self.weapons == other.weapons
            && self.armor == other.armor
            && self.items == other.items
            && self.stat_choices == other.stat_choices
            && self.stats_affected == other.stats_affected
            && self.section_visibility == other.section_visibility
    }
}

impl Eq for Character {}

impl Character {
    // =========================================================================
    // Constructor
    // =========================================================================

    /// Baseline character: level 1, no race or class, every stat zeroed.
    ///
    /// Derived fields are zero until the first recalculation.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: 1,
            level_experience: 0,
            level_max_experience: 0,
            race: String::new(),
            classes: Vec::new(),
            specializations: Vec::new(),
            stats: StatBlock::new(),
            health: ResourcePool::default(),
            mana: ResourcePool::default(),
            racial_power: ResourcePool::default(),
            armor_bonus: 0,
            armor_class: 0,
            skills: String::new(),
            personal_notes: String::new(),
            weapons: Vec::new(),
            armor: Vec::new(),
            items: Vec::new(),
            stat_choices: StatChoices::new(),
            stats_affected: StatsAffected::new(),
            section_visibility: BTreeMap::new(),
            has_unsaved_changes: false,
        }
    }

    /// Builder-style stat setup, mostly for fixtures.
    pub fn with_stat(mut self, name: StatName, stat: Stat) -> Self {
        *self.stats.get_mut(name) = stat;
        self
    }

    pub fn with_race(mut self, race: impl Into<String>) -> Self {
        self.race = race.into();
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level.max(1);
        self
    }

    // =========================================================================
    // Read accessors
    // =========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn level_experience(&self) -> i32 {
        self.level_experience
    }

    pub fn level_max_experience(&self) -> i32 {
        self.level_max_experience
    }

    /// Race key, empty when no race is chosen.
    pub fn race(&self) -> &str {
        &self.race
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn specializations(&self) -> &[String] {
        &self.specializations
    }

    pub fn stats(&self) -> &StatBlock {
        &self.stats
    }

    pub fn resource(&self, kind: ResourceKind) -> &ResourcePool {
        match kind {
            ResourceKind::Health => &self.health,
            ResourceKind::Mana => &self.mana,
            ResourceKind::RacialPower => &self.racial_power,
        }
    }

    pub fn armor_bonus(&self) -> i32 {
        self.armor_bonus
    }

    /// Derived armor class.
    pub fn armor_class(&self) -> i32 {
        self.armor_class
    }

    pub fn skills(&self) -> &str {
        &self.skills
    }

    pub fn personal_notes(&self) -> &str {
        &self.personal_notes
    }

    pub fn weapons(&self) -> &[WeaponItem] {
        &self.weapons
    }

    pub fn armor(&self) -> &[ArmorItem] {
        &self.armor
    }

    pub fn items(&self) -> &[GeneralItem] {
        &self.items
    }

    pub fn stat_choices(&self) -> &StatChoices {
        &self.stat_choices
    }

    pub fn stats_affected(&self) -> &StatsAffected {
        &self.stats_affected
    }

    pub fn section_visibility(&self) -> &BTreeMap<String, bool> {
        &self.section_visibility
    }

    /// Whether a section is shown; sections default to visible.
    pub fn is_section_visible(&self, section_id: &str) -> bool {
        self.section_visibility.get(section_id).copied().unwrap_or(true)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.has_unsaved_changes
    }

    /// Bindings for evaluating formulas against this character's totals.
    pub fn formula_bindings(&self) -> FormulaBindings {
        FormulaBindings::from_stats(&self.stats, self.level)
    }

    // =========================================================================
    // Mutators (return `true` when something changed)
    // =========================================================================

    pub fn set_name(&mut self, name: impl Into<String>) -> bool {
        replace_if_changed(&mut self.name, name.into())
    }

    pub fn set_level(&mut self, level: u32) -> Result<bool, DomainError> {
        if level == 0 {
            return Err(DomainError::validation("Level must be at least 1"));
        }
        Ok(replace_if_changed(&mut self.level, level))
    }

    pub fn set_level_experience(&mut self, experience: i32) -> bool {
        replace_if_changed(&mut self.level_experience, experience)
    }

    /// Change the race key. Choice slots of the previous race are left to the
    /// allocator to prune.
    pub fn set_race(&mut self, race: impl Into<String>) -> bool {
        replace_if_changed(&mut self.race, race.into())
    }

    pub fn set_stat(&mut self, name: StatName, field: StatField, amount: i32) -> bool {
        self.stats.get_mut(name).set(field, amount)
    }

    /// Add experience to a stat, rolling full bars into base value.
    ///
    /// Returns the number of points gained. Uses the stat's current
    /// `max_experience`, so the character should be recalculated first.
    pub fn award_stat_experience(&mut self, name: StatName, amount: i32) -> i32 {
        self.stats.get_mut(name).award_experience(amount)
    }

    pub fn add_class(&mut self, class: &str) -> bool {
        let class = class.trim();
        if class.is_empty() || self.classes.iter().any(|c| c == class) {
            return false;
        }
        self.classes.push(class.to_string());
        true
    }

    /// Remove a class and every specialization that belonged to it.
    pub fn remove_class(&mut self, class: &str) -> bool {
        let before = self.classes.len();
        self.classes.retain(|c| c != class);
        if self.classes.len() == before {
            return false;
        }
        self.retain_consistent_specializations();
        true
    }

    /// Add the specialization if absent, remove it if present.
    pub fn toggle_specialization(&mut self, class: &str, specialization: &str) -> Result<bool, DomainError> {
        if !self.classes.iter().any(|c| c == class) {
            return Err(DomainError::validation(format!(
                "Cannot specialize in '{}' without class '{}'",
                specialization, class
            )));
        }
        let key = specialization_key(class, specialization);
        if let Some(pos) = self.specializations.iter().position(|s| *s == key) {
            self.specializations.remove(pos);
        } else {
            self.specializations.push(key);
        }
        Ok(true)
    }

    pub fn set_resource_current(&mut self, kind: ResourceKind, current: i32) -> bool {
        self.resource_mut(kind).set_current(current)
    }

    pub fn set_resource_bonus(&mut self, kind: ResourceKind, bonus: i32) -> bool {
        self.resource_mut(kind).set_bonus(bonus)
    }

    pub fn set_armor_bonus(&mut self, bonus: i32) -> bool {
        replace_if_changed(&mut self.armor_bonus, bonus)
    }

    pub fn set_skills(&mut self, skills: impl Into<String>) -> bool {
        replace_if_changed(&mut self.skills, skills.into())
    }

    pub fn set_personal_notes(&mut self, notes: impl Into<String>) -> bool {
        replace_if_changed(&mut self.personal_notes, notes.into())
    }

    /// Sections without an entry count as visible.
    pub fn set_section_visibility(&mut self, section_id: &str, visible: bool) -> bool {
        if self.is_section_visible(section_id) == visible {
            return false;
        }
        self.section_visibility.insert(section_id.to_string(), visible);
        true
    }

    pub fn add_weapon(&mut self, weapon: WeaponItem) {
        self.weapons.push(weapon);
    }

    pub fn remove_weapon(&mut self, index: usize) -> Option<WeaponItem> {
        (index < self.weapons.len()).then(|| self.weapons.remove(index))
    }

    pub fn add_armor(&mut self, armor: ArmorItem) {
        self.armor.push(armor);
    }

    pub fn remove_armor(&mut self, index: usize) -> Option<ArmorItem> {
        (index < self.armor.len()).then(|| self.armor.remove(index))
    }

    pub fn set_armor_equipped(&mut self, index: usize, equipped: bool) -> Result<bool, DomainError> {
        let piece = self
            .armor
            .get_mut(index)
            .ok_or_else(|| DomainError::validation(format!("No armor at index {}", index)))?;
        Ok(replace_if_changed(&mut piece.equipped, equipped))
    }

    pub fn add_item(&mut self, item: GeneralItem) {
        self.items.push(item);
    }

    pub fn remove_item(&mut self, index: usize) -> Option<GeneralItem> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    pub fn mark_dirty(&mut self) {
        self.has_unsaved_changes = true;
    }

    pub fn mark_saved(&mut self) {
        self.has_unsaved_changes = false;
    }

    // =========================================================================
    // Crate-internal access for the recalculation engine and allocator
    // =========================================================================

    pub(crate) fn stats_mut(&mut self) -> &mut StatBlock {
        &mut self.stats
    }

    pub(crate) fn resource_mut(&mut self, kind: ResourceKind) -> &mut ResourcePool {
        match kind {
            ResourceKind::Health => &mut self.health,
            ResourceKind::Mana => &mut self.mana,
            ResourceKind::RacialPower => &mut self.racial_power,
        }
    }

    pub(crate) fn apply_level_max_experience(&mut self, max: i32) {
        self.level_max_experience = max;
        self.level_experience = self.level_experience.clamp(0, max);
    }

    pub(crate) fn apply_armor_class(&mut self, armor_class: i32) {
        self.armor_class = armor_class;
    }

    pub(crate) fn choice_state_mut(&mut self) -> (&mut StatChoices, &mut StatsAffected) {
        (&mut self.stat_choices, &mut self.stats_affected)
    }

    fn retain_consistent_specializations(&mut self) {
        let classes = &self.classes;
        self.specializations.retain(|key| {
            key.split_once(SPECIALIZATION_SEPARATOR)
                .is_some_and(|(class, _)| classes.iter().any(|c| c == class))
        });
    }

    // =========================================================================
    // Persistence boundary
    // =========================================================================

    /// Record shape handed to save collaborators: no derived fields.
    pub fn to_persisted(&self) -> PersistedCharacter {
        PersistedCharacter {
            name: self.name.clone(),
            level: self.level,
            level_experience: self.level_experience,
            race: self.race.clone(),
            classes: self.classes.clone(),
            specializations: self.specializations.clone(),
            stats: self
                .stats
                .iter()
                .map(|(name, stat)| {
                    (
                        name,
                        PersistedStat {
                            value: stat.value(),
                            equipment: stat.equipment(),
                            temporary: stat.temporary(),
                            experience: stat.experience(),
                        },
                    )
                })
                .collect(),
            health: self.health.current(),
            health_bonus: self.health.bonus(),
            mana: self.mana.current(),
            mana_bonus: self.mana.bonus(),
            racial_power: self.racial_power.current(),
            racial_power_bonus: self.racial_power.bonus(),
            armor_bonus: self.armor_bonus,
            skills: self.skills.clone(),
            personal_notes: self.personal_notes.clone(),
            weapon_inventory: self.weapons.clone(),
            armor_inventory: self.armor.clone(),
            general_inventory: self.items.clone(),
            stat_choices: self.stat_choices.clone(),
            stats_affected: self.stats_affected.clone(),
            section_visibility: self.section_visibility.clone(),
        }
    }

    /// Rebuild a character from a loaded record.
    ///
    /// Derived fields are zero until the caller recalculates. Specializations
    /// whose class is missing are dropped.
    ///
    /// # Errors
    ///
    /// `MalformedPersistedRecord` when the level is 0, a stat is missing, or
    /// the choice maps disagree with each other.
    pub fn from_persisted(record: PersistedCharacter) -> Result<Self, DomainError> {
        if record.level == 0 {
            return Err(DomainError::malformed(format!(
                "'{}' has level 0",
                record.name
            )));
        }
        let mut stats = StatBlock::new();
        for name in StatName::ALL {
            let persisted = record.stats.get(&name).ok_or_else(|| {
                DomainError::malformed(format!("'{}' is missing stat {}", record.name, name))
            })?;
            *stats.get_mut(name) = Stat::new(
                persisted.value,
                persisted.equipment,
                persisted.temporary,
                persisted.experience,
            );
        }
        validate_choice_state(&record.stat_choices, &record.stats_affected)
            .map_err(|reason| DomainError::malformed(format!("'{}': {}", record.name, reason)))?;

        let mut classes: Vec<String> = Vec::with_capacity(record.classes.len());
        for class in record.classes {
            if !classes.contains(&class) {
                classes.push(class);
            }
        }
        let mut specializations: Vec<String> = Vec::with_capacity(record.specializations.len());
        for key in record.specializations {
            if !specializations.contains(&key) {
                specializations.push(key);
            }
        }

        let mut character = Self {
            name: record.name,
            level: record.level,
            level_experience: record.level_experience,
            level_max_experience: 0,
            race: record.race,
            classes,
            specializations,
            stats,
            health: ResourcePool::new(record.health, record.health_bonus),
            mana: ResourcePool::new(record.mana, record.mana_bonus),
            racial_power: ResourcePool::new(record.racial_power, record.racial_power_bonus),
            armor_bonus: record.armor_bonus,
            armor_class: 0,
            skills: record.skills,
            personal_notes: record.personal_notes,
            weapons: record.weapon_inventory,
            armor: record.armor_inventory,
            items: record.general_inventory,
            stat_choices: record.stat_choices,
            stats_affected: record.stats_affected,
            section_visibility: record.section_visibility,
            has_unsaved_changes: false,
        };
        character.retain_consistent_specializations();
        Ok(character)
    }
}

fn replace_if_changed<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}
