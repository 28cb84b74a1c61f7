//! Choice slot allocation.
//!
//! `set_choice` / `clear_choice` are the primitives that keep `StatChoices`
//! and `StatsAffected` in step. `ChoiceAllocator` layers the race catalog on
//! top: which passives exist, how many slots they fund, which options they
//! offer.

use thiserror::Error;

use crate::aggregates::Character;
use crate::choices::model::{ChoiceCategory, ChosenOption, SlotId};
use crate::game_systems::{recalculate, CalculationEngine, ManualPassive, ReferenceCatalog};
use crate::value_objects::StatName;
use crate::DomainError;

/// Record `option` in `slot`.
///
/// A stat can be claimed by only one slot of a passive; claiming a stat held
/// by a sibling slot fails with `StatAlreadyClaimed` and leaves the
/// character untouched. Does not recalculate.
pub fn set_choice(
    character: &mut Character,
    category: ChoiceCategory,
    passive: &str,
    slot: &SlotId,
    option: ChosenOption,
) -> Result<(), DomainError> {
    let (choices, affected) = character.choice_state_mut();

    if let Some(stat) = option.stat_name {
        if let Some(other) = affected.claimed_by_other(category, passive, stat, slot) {
            return Err(DomainError::StatAlreadyClaimed {
                category,
                passive: passive.to_string(),
                stat,
                claimed_by: other.clone(),
            });
        }
    }

    let previous_stat = choices
        .get(category, passive, slot)
        .and_then(|previous| previous.stat_name);
    if let Some(stat) = previous_stat {
        affected.remove(category, passive, stat, slot);
    }
    if let Some(stat) = option.stat_name {
        affected.add(category, passive, stat, slot.clone());
    }
    choices.insert(category, passive, slot.clone(), option);
    Ok(())
}

/// Remove whatever `slot` holds. Returns `false` if it was empty.
///
/// Does not recalculate.
pub fn clear_choice(character: &mut Character, category: ChoiceCategory, passive: &str, slot: &SlotId) -> bool {
    let (choices, affected) = character.choice_state_mut();
    let Some(removed) = choices.remove(category, passive, slot) else {
        return false;
    };
    if let Some(stat) = removed.stat_name {
        affected.remove(category, passive, stat, slot);
    }
    true
}

/// An assigned slot that the character's level no longer funds.
///
/// The slot keeps its effect; the player decides whether to clear it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid level transition: level {level} funds {funded} slot(s) of '{passive}', but {slot} is still assigned")]
pub struct LevelTransitionWarning {
    pub category: ChoiceCategory,
    pub passive: String,
    pub slot: SlotId,
    pub level: u32,
    pub funded: usize,
}

/// Catalog-aware allocation policy.
pub struct ChoiceAllocator<'a> {
    catalog: &'a dyn ReferenceCatalog,
    rules: &'a dyn CalculationEngine,
}

impl<'a> ChoiceAllocator<'a> {
    pub fn new(catalog: &'a dyn ReferenceCatalog, rules: &'a dyn CalculationEngine) -> Self {
        Self { catalog, rules }
    }

    /// Slot ids the passive funds at the character's current level.
    pub fn available_slots(
        &self,
        character: &Character,
        category: ChoiceCategory,
        passive: &str,
    ) -> Result<Vec<SlotId>, DomainError> {
        let definition = self.passive(character, category, passive)?;
        let funded = definition.allocation.slots_at(character.level());
        Ok((0..funded)
            .map(|index| SlotId::new(category, passive, index))
            .collect())
    }

    /// Put `option_type` into slot `index` of the passive, then recalculate.
    ///
    /// `target` must be given exactly when the option modifies a stat.
    pub fn assign(
        &self,
        character: &mut Character,
        category: ChoiceCategory,
        passive: &str,
        index: usize,
        option_type: &str,
        target: Option<StatName>,
    ) -> Result<SlotId, DomainError> {
        let definition = self.passive(character, category, passive)?;

        let funded = definition.allocation.slots_at(character.level());
        if index >= funded {
            return Err(DomainError::SlotUnavailable {
                passive: passive.to_string(),
                index,
                available: funded,
            });
        }

        let option = definition
            .option(option_type)
            .ok_or_else(|| DomainError::UnknownOption {
                passive: passive.to_string(),
                option_type: option_type.to_string(),
            })?;
        match (option.requires_stat, target) {
            (true, None) => {
                return Err(DomainError::validation(format!(
                    "'{}' needs a target stat",
                    option.label
                )))
            }
            (false, Some(stat)) => {
                return Err(DomainError::validation(format!(
                    "'{}' does not target a stat (got {})",
                    option.label, stat
                )))
            }
            _ => {}
        }

        let slot = SlotId::new(category, passive, index);
        let chosen = ChosenOption {
            option_type: option.option_type.clone(),
            stat_name: target,
            calc: option.calc,
            value: option.value,
            label: option.label.clone(),
        };
        set_choice(character, category, passive, &slot, chosen)?;
        recalculate(character, self.catalog, self.rules);
        Ok(slot)
    }

    /// Clear slot `index` of the passive and recalculate.
    pub fn unassign(&self, character: &mut Character, category: ChoiceCategory, passive: &str, index: usize) -> bool {
        let slot = SlotId::new(category, passive, index);
        let removed = clear_choice(character, category, passive, &slot);
        if removed {
            recalculate(character, self.catalog, self.rules);
        }
        removed
    }

    /// Assigned slots whose index is beyond what the current level funds.
    pub fn level_warnings(&self, character: &Character) -> Vec<LevelTransitionWarning> {
        let Some(race) = self.catalog.race(character.race()) else {
            return Vec::new();
        };
        let level = character.level();
        character
            .stat_choices()
            .iter()
            .filter_map(|(category, passive, slot, _)| {
                let funded = race.passive(category, passive)?.allocation.slots_at(level);
                let index = slot.index()?;
                (index >= funded).then(|| LevelTransitionWarning {
                    category,
                    passive: passive.to_string(),
                    slot: slot.clone(),
                    level,
                    funded,
                })
            })
            .collect()
    }

    /// Clear every choice whose passive the character's current race does
    /// not offer, then recalculate. Returns the cleared slots.
    pub fn prune_for_race(&self, character: &mut Character) -> Vec<SlotId> {
        let race = self.catalog.race(character.race());
        let orphaned: Vec<(ChoiceCategory, String, SlotId)> = character
            .stat_choices()
            .iter()
            .filter(|(category, passive, _, _)| race.and_then(|r| r.passive(*category, passive)).is_none())
            .map(|(category, passive, slot, _)| (category, passive.to_string(), slot.clone()))
            .collect();

        for (category, passive, slot) in &orphaned {
            clear_choice(character, *category, passive, slot);
        }
        if !orphaned.is_empty() {
            recalculate(character, self.catalog, self.rules);
        }
        orphaned.into_iter().map(|(_, _, slot)| slot).collect()
    }

    fn passive(
        &self,
        character: &Character,
        category: ChoiceCategory,
        passive: &str,
    ) -> Result<&'a ManualPassive, DomainError> {
        self.catalog
            .race(character.race())
            .and_then(|race| race.passive(category, passive))
            .ok_or_else(|| DomainError::UnknownPassive {
                race: character.race().to_string(),
                category,
                passive: passive.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choices::EffectCalc;
    use crate::game_systems::{StandardRules, StaticCatalog};
    use crate::value_objects::Stat;

    const RACIAL: ChoiceCategory = ChoiceCategory::RacialPassive;
    const MUTANT: ChoiceCategory = ChoiceCategory::MutantAbility;
    const PHYSIQUE: &str = "Adaptable Physique";
    const GENOME: &str = "Unstable Genome";

    fn demi_human() -> Character {
        let mut character = Character::new("Mira")
            .with_race("Demi-human")
            .with_stat(StatName::Strength, Stat::new(10, 0, 0, 0));
        recalculate(&mut character, &StaticCatalog::builtin(), &StandardRules::new());
        character
    }

    fn plus_two(stat: StatName) -> ChosenOption {
        ChosenOption {
            option_type: "plus2".to_string(),
            stat_name: Some(stat),
            calc: EffectCalc::Add,
            value: 2,
            label: "+2 to a stat".to_string(),
        }
    }

    /// Every stat-targeting choice has exactly its claim and nothing else.
    fn assert_choice_state_consistent(character: &Character) {
        let choices = character.stat_choices();
        let affected = character.stats_affected();
        for (category, passive, slot, option) in choices.iter() {
            if let Some(stat) = option.stat_name {
                assert!(affected.contains(category, passive, stat, slot));
            }
        }
        for (category, passive, stat, slots) in affected.iter() {
            assert_eq!(slots.len(), 1, "{stat} claimed by {slots:?}");
            for slot in slots {
                let option = choices.get(category, passive, slot).expect("claim without choice");
                assert_eq!(option.stat_name, Some(stat));
            }
        }
    }

    #[test]
    fn set_choice_rejects_second_claim_and_leaves_state_untouched() {
        let mut character = demi_human();
        let first = SlotId::new(RACIAL, PHYSIQUE, 0);
        let second = SlotId::new(RACIAL, PHYSIQUE, 1);
        set_choice(&mut character, RACIAL, PHYSIQUE, &first, plus_two(StatName::Strength)).unwrap();
        let before = character.clone();

        let err = set_choice(&mut character, RACIAL, PHYSIQUE, &second, plus_two(StatName::Strength)).unwrap_err();

        assert_eq!(
            err,
            DomainError::StatAlreadyClaimed {
                category: RACIAL,
                passive: PHYSIQUE.to_string(),
                stat: StatName::Strength,
                claimed_by: first,
            }
        );
        assert_eq!(character, before);
        assert_choice_state_consistent(&character);
    }

    #[test]
    fn set_choice_moves_claim_when_slot_is_retargeted() {
        let mut character = demi_human();
        let slot = SlotId::new(RACIAL, PHYSIQUE, 0);
        set_choice(&mut character, RACIAL, PHYSIQUE, &slot, plus_two(StatName::Strength)).unwrap();
        set_choice(&mut character, RACIAL, PHYSIQUE, &slot, plus_two(StatName::Agility)).unwrap();

        let affected = character.stats_affected();
        assert!(affected.claimants(RACIAL, PHYSIQUE, StatName::Strength).is_none());
        assert!(affected.contains(RACIAL, PHYSIQUE, StatName::Agility, &slot));
        assert_choice_state_consistent(&character);
    }

    #[test]
    fn set_choice_same_stat_same_slot_is_allowed() {
        let mut character = demi_human();
        let slot = SlotId::new(RACIAL, PHYSIQUE, 0);
        set_choice(&mut character, RACIAL, PHYSIQUE, &slot, plus_two(StatName::Strength)).unwrap();
        assert!(set_choice(&mut character, RACIAL, PHYSIQUE, &slot, plus_two(StatName::Strength)).is_ok());
        assert_choice_state_consistent(&character);
    }

    #[test]
    fn clear_choice_removes_both_entries() {
        let mut character = demi_human();
        let slot = SlotId::new(RACIAL, PHYSIQUE, 0);
        set_choice(&mut character, RACIAL, PHYSIQUE, &slot, plus_two(StatName::Strength)).unwrap();

        assert!(clear_choice(&mut character, RACIAL, PHYSIQUE, &slot));
        assert!(character.stat_choices().is_empty());
        assert!(character.stats_affected().is_empty());
        assert!(!clear_choice(&mut character, RACIAL, PHYSIQUE, &slot));
    }

    #[test]
    fn any_sequence_of_set_and_clear_keeps_claims_exclusive() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let targets = [Some(StatName::Strength), Some(StatName::Agility), Some(StatName::Constitution), None];
        let slots: Vec<SlotId> = (0..3).map(|index| SlotId::new(RACIAL, PHYSIQUE, index)).collect();
        let mut held: Vec<Option<Option<StatName>>> = vec![None; slots.len()];
        let mut character = demi_human();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..500 {
            let index = rng.gen_range(0..slots.len());
            if rng.gen_bool(0.3) {
                let was_held = held[index].is_some();
                assert_eq!(clear_choice(&mut character, RACIAL, PHYSIQUE, &slots[index]), was_held);
                held[index] = None;
            } else {
                let target = targets[rng.gen_range(0..targets.len())];
                let mut option = plus_two(StatName::Strength);
                option.stat_name = target;
                let taken_elsewhere = target.is_some()
                    && held
                        .iter()
                        .enumerate()
                        .any(|(other, stat)| other != index && *stat == Some(target));
                let result = set_choice(&mut character, RACIAL, PHYSIQUE, &slots[index], option);
                assert_eq!(result.is_err(), taken_elsewhere);
                if result.is_ok() {
                    held[index] = Some(target);
                }
            }
            assert_choice_state_consistent(&character);
        }
    }

    #[test]
    fn demi_human_plus_two_strength_walkthrough() {
        let catalog = StaticCatalog::builtin();
        let rules = StandardRules::new();
        let allocator = ChoiceAllocator::new(&catalog, &rules);
        let mut character = demi_human();
        assert_eq!(character.stats().total(StatName::Strength), 10);

        allocator
            .assign(&mut character, RACIAL, PHYSIQUE, 0, "plus2", Some(StatName::Strength))
            .unwrap();
        assert_eq!(character.stats().total(StatName::Strength), 12);

        let err = allocator
            .assign(&mut character, RACIAL, PHYSIQUE, 1, "plus2", Some(StatName::Strength))
            .unwrap_err();
        assert!(err.is_stat_already_claimed());
        assert_eq!(character.stats().total(StatName::Strength), 12);

        assert!(allocator.unassign(&mut character, RACIAL, PHYSIQUE, 0));
        assert_eq!(character.stats().total(StatName::Strength), 10);

        allocator
            .assign(&mut character, RACIAL, PHYSIQUE, 1, "plus2", Some(StatName::Strength))
            .unwrap();
        assert_eq!(character.stats().total(StatName::Strength), 12);
        assert_choice_state_consistent(&character);
    }

    #[test]
    fn available_slots_fixed_and_level_gated() {
        let catalog = StaticCatalog::builtin();
        let rules = StandardRules::new();
        let allocator = ChoiceAllocator::new(&catalog, &rules);

        let slots = allocator.available_slots(&demi_human(), RACIAL, PHYSIQUE).unwrap();
        assert_eq!(
            slots.iter().map(SlotId::as_str).collect::<Vec<_>>(),
            vec!["racialPassive:adaptable-physique:0", "racialPassive:adaptable-physique:1"]
        );

        let mutant = Character::new("Vex").with_race("Mutant");
        assert_eq!(allocator.available_slots(&mutant, MUTANT, GENOME).unwrap().len(), 1);
        let mutant = mutant.with_level(5);
        assert_eq!(allocator.available_slots(&mutant, MUTANT, GENOME).unwrap().len(), 2);
        let mutant = mutant.with_level(12);
        assert_eq!(allocator.available_slots(&mutant, MUTANT, GENOME).unwrap().len(), 3);
    }

    #[test]
    fn assign_rejects_unfunded_slot_unknown_passive_and_option() {
        let catalog = StaticCatalog::builtin();
        let rules = StandardRules::new();
        let allocator = ChoiceAllocator::new(&catalog, &rules);
        let mut character = demi_human();

        assert!(matches!(
            allocator.assign(&mut character, RACIAL, PHYSIQUE, 2, "plus2", Some(StatName::Wisdom)),
            Err(DomainError::SlotUnavailable { index: 2, available: 2, .. })
        ));
        assert!(matches!(
            allocator.assign(&mut character, MUTANT, GENOME, 0, "mutation", Some(StatName::Wisdom)),
            Err(DomainError::UnknownPassive { .. })
        ));
        assert!(matches!(
            allocator.assign(&mut character, RACIAL, PHYSIQUE, 0, "plus9", Some(StatName::Wisdom)),
            Err(DomainError::UnknownOption { .. })
        ));
        assert!(matches!(
            allocator.assign(&mut character, RACIAL, PHYSIQUE, 0, "plus2", None),
            Err(DomainError::Validation(_))
        ));
        assert!(character.stat_choices().is_empty());
    }

    #[test]
    fn mutant_options_add_subtract_or_hold_no_stat() {
        let catalog = StaticCatalog::builtin();
        let rules = StandardRules::new();
        let allocator = ChoiceAllocator::new(&catalog, &rules);
        let mut character = Character::new("Vex")
            .with_race("Mutant")
            .with_level(5)
            .with_stat(StatName::Perception, Stat::new(6, 0, 0, 0));

        allocator
            .assign(&mut character, MUTANT, GENOME, 0, "degeneration", Some(StatName::Perception))
            .unwrap();
        assert_eq!(character.stats().total(StatName::Perception), 4);

        allocator.assign(&mut character, MUTANT, GENOME, 1, "dormant", None).unwrap();
        assert!(character.stats_affected().claimants(MUTANT, GENOME, StatName::Perception).is_some());
        assert_eq!(character.stat_choices().slots(MUTANT, GENOME).count(), 2);
        assert_choice_state_consistent(&character);
    }

    #[test]
    fn level_drop_keeps_slot_and_warns() {
        let catalog = StaticCatalog::builtin();
        let rules = StandardRules::new();
        let allocator = ChoiceAllocator::new(&catalog, &rules);
        let mut character = Character::new("Vex")
            .with_race("Mutant")
            .with_level(5)
            .with_stat(StatName::Strength, Stat::new(10, 0, 0, 0));
        allocator
            .assign(&mut character, MUTANT, GENOME, 1, "mutation", Some(StatName::Strength))
            .unwrap();
        assert!(allocator.level_warnings(&character).is_empty());

        character.set_level(4).unwrap();
        recalculate(&mut character, &catalog, &rules);

        let warnings = allocator.level_warnings(&character);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].slot, SlotId::new(MUTANT, GENOME, 1));
        assert_eq!(warnings[0].funded, 1);
        assert_eq!(character.stats().total(StatName::Strength), 13);
    }

    #[test]
    fn prune_for_race_clears_foreign_passives() {
        let catalog = StaticCatalog::builtin();
        let rules = StandardRules::new();
        let allocator = ChoiceAllocator::new(&catalog, &rules);
        let mut character = demi_human();
        allocator
            .assign(&mut character, RACIAL, PHYSIQUE, 0, "plus2", Some(StatName::Strength))
            .unwrap();

        character.set_race("Mutant");
        let cleared = allocator.prune_for_race(&mut character);

        assert_eq!(cleared, vec![SlotId::new(RACIAL, PHYSIQUE, 0)]);
        assert!(character.stat_choices().is_empty());
        assert!(character.stats_affected().is_empty());
        assert_eq!(character.stats().total(StatName::Strength), 10);
    }
}
