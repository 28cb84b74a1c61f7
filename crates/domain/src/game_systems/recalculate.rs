//! Derived-field recalculation.
//!
//! `recalculate` restores every derived field of a character from its
//! authoritative data. Stages run in a fixed order and each only reads the
//! results of earlier ones, so running it twice yields the same sheet.

use crate::aggregates::Character;
use crate::game_systems::catalog::ReferenceCatalog;
use crate::game_systems::traits::CalculationEngine;
use crate::value_objects::{ResourceKind, StatName};

/// Recompute racial changes, totals, experience caps, pool maxima and armor
/// class in place.
pub fn recalculate(character: &mut Character, catalog: &dyn ReferenceCatalog, rules: &dyn CalculationEngine) {
    let race = catalog.race(character.race());
    let level = character.level();

    // 1-2. racial change and totals
    let mut racial_changes = [0i32; StatName::ALL.len()];
    for (slot_change, stat) in racial_changes.iter_mut().zip(StatName::ALL) {
        let race_bonus = race.map(|r| r.stat_bonus(stat)).unwrap_or(0);
        *slot_change = race_bonus.saturating_add(active_choice_effect(character, stat));
    }
    for ((_, stat), racial_change) in character.stats_mut().iter_mut().zip(racial_changes) {
        stat.apply_racial_change(racial_change);
    }

    // 3. experience caps
    for (name, stat) in character.stats_mut().iter_mut() {
        stat.apply_max_experience(rules.stat_max_experience(name, level, race));
    }
    character.apply_level_max_experience(rules.level_max_experience(level));

    // 4. pools
    let progressions = race
        .map(|r| r.resources)
        .unwrap_or_else(|| catalog.default_resources());
    let max_health = rules.max_health(
        progressions.health,
        level,
        character.stats(),
        character.resource(ResourceKind::Health).bonus(),
    );
    let max_mana = rules.max_mana(
        progressions.mana,
        level,
        character.stats(),
        character.resource(ResourceKind::Mana).bonus(),
    );
    let max_power = rules.max_racial_power(
        progressions.racial_power,
        level,
        character.resource(ResourceKind::RacialPower).bonus(),
    );
    character.resource_mut(ResourceKind::Health).apply_max(max_health);
    character.resource_mut(ResourceKind::Mana).apply_max(max_mana);
    character.resource_mut(ResourceKind::RacialPower).apply_max(max_power);

    // 5. armor class
    let armor_class = rules.armor_class(character.armor(), character.armor_bonus());
    character.apply_armor_class(armor_class);
}

/// Sum of choice effects targeting `stat` whose slot holds the claim.
fn active_choice_effect(character: &Character, stat: StatName) -> i32 {
    let affected = character.stats_affected();
    character
        .stat_choices()
        .iter()
        .filter(|(_, _, _, option)| option.stat_name == Some(stat))
        .filter(|(category, passive, slot, _)| affected.contains(*category, passive, stat, slot))
        .fold(0i32, |sum, (_, _, _, option)| sum.saturating_add(option.effect()))
}
