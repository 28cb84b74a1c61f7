//! Default house rules.
//!
//! | Derived value         | Rule                                              |
//! |-----------------------|---------------------------------------------------|
//! | stat max experience   | 10 + 2 × (level − 1) + race offset, at least 1    |
//! | level max experience  | 100 × level                                       |
//! | max health            | progression + Constitution total + bonus          |
//! | max mana              | progression + Intelligence total + bonus          |
//! | max racial power      | progression + bonus                               |
//! | armor class           | Σ defense of equipped armor + armor bonus         |
//!
//! Pool maxima never go below zero.

use crate::entities::ArmorItem;
use crate::game_systems::catalog::{RaceDefinition, ResourceProgression};
use crate::game_systems::traits::CalculationEngine;
use crate::value_objects::{StatBlock, StatName};

const BASE_STAT_EXPERIENCE: i32 = 10;
const STAT_EXPERIENCE_PER_LEVEL: i32 = 2;
const LEVEL_EXPERIENCE_PER_LEVEL: i32 = 100;

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRules;

impl StandardRules {
    pub fn new() -> Self {
        Self
    }
}

fn levels_gained(level: u32) -> i32 {
    i32::try_from(level.saturating_sub(1)).unwrap_or(i32::MAX)
}

impl CalculationEngine for StandardRules {
    fn stat_max_experience(&self, stat: StatName, level: u32, race: Option<&RaceDefinition>) -> i32 {
        let offset = race.map(|r| r.experience_offset(stat)).unwrap_or(0);
        BASE_STAT_EXPERIENCE
            .saturating_add(STAT_EXPERIENCE_PER_LEVEL.saturating_mul(levels_gained(level)))
            .saturating_add(offset)
            .max(1)
    }

    fn level_max_experience(&self, level: u32) -> i32 {
        let level = i32::try_from(level.max(1)).unwrap_or(i32::MAX);
        LEVEL_EXPERIENCE_PER_LEVEL.saturating_mul(level)
    }

    fn max_health(&self, progression: ResourceProgression, level: u32, stats: &StatBlock, bonus: i32) -> i32 {
        progression
            .at_level(level)
            .saturating_add(stats.total(StatName::Constitution))
            .saturating_add(bonus)
            .max(0)
    }

    fn max_mana(&self, progression: ResourceProgression, level: u32, stats: &StatBlock, bonus: i32) -> i32 {
        progression
            .at_level(level)
            .saturating_add(stats.total(StatName::Intelligence))
            .saturating_add(bonus)
            .max(0)
    }

    fn max_racial_power(&self, progression: ResourceProgression, level: u32, bonus: i32) -> i32 {
        progression.at_level(level).saturating_add(bonus).max(0)
    }

    fn armor_class(&self, armor: &[ArmorItem], armor_bonus: i32) -> i32 {
        armor
            .iter()
            .filter(|piece| piece.equipped)
            .fold(armor_bonus, |ac, piece| ac.saturating_add(piece.defense))
    }
}
