//! Calculation rules for derived sheet values.
//!
//! The recalculation engine asks a `CalculationEngine` for every number it
//! derives, so house rules can be swapped without touching the pipeline.

use crate::entities::ArmorItem;
use crate::game_systems::catalog::{RaceDefinition, ResourceProgression};
use crate::value_objects::{StatBlock, StatName};

/// Rules that turn authoritative sheet data into derived values.
pub trait CalculationEngine: Send + Sync {
    /// Experience needed to gain one point in `stat` at `level`.
    ///
    /// `race` is `None` when the character has no (or an unknown) race.
    fn stat_max_experience(&self, stat: StatName, level: u32, race: Option<&RaceDefinition>) -> i32;

    /// Experience needed to reach the next character level.
    fn level_max_experience(&self, level: u32) -> i32;

    /// Maximum health from the race progression, stat totals and bonus.
    fn max_health(&self, progression: ResourceProgression, level: u32, stats: &StatBlock, bonus: i32) -> i32;

    /// Maximum mana from the race progression, stat totals and bonus.
    fn max_mana(&self, progression: ResourceProgression, level: u32, stats: &StatBlock, bonus: i32) -> i32;

    /// Maximum racial power.
    fn max_racial_power(&self, progression: ResourceProgression, level: u32, bonus: i32) -> i32;

    /// Armor class from armor pieces and the flat bonus.
    fn armor_class(&self, armor: &[ArmorItem], armor_bonus: i32) -> i32;
}
