//! Editor session.
//!
//! Owns the character collection, the selected character and the edit
//! history. Every edit runs the same pipeline: mutate a copy of the active
//! character, recalculate it, store it, take one snapshot and mark the
//! session dirty. An edit that changes nothing takes no snapshot.

mod error;

pub use error::SessionError;

use std::sync::Arc;

use rand::Rng;
use sheetkeeper_domain::{
    evaluate, recalculate, roll, ArmorItem, CalculationEngine, Character, ChoiceAllocator,
    ChoiceCategory, DomainError, GeneralItem, History, HistoryStep, LevelTransitionWarning,
    PersistedCharacter, ReferenceCatalog, ResourceKind, RollResult, StatField, StatName,
    WeaponItem,
};

use crate::infrastructure::ports::{CharacterStore, ClockPort};
use crate::infrastructure::save_file::SaveFile;

// =============================================================================
// Result Types
// =============================================================================

/// Whether an edit changed the active character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Changed,
    Unchanged,
}

impl EditOutcome {
    pub fn is_changed(self) -> bool {
        self == Self::Changed
    }
}

/// Which part of a resource pool an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceField {
    Current,
    Bonus,
}

/// Result of a level edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelChange {
    pub outcome: EditOutcome,
    /// Assigned slots the new level no longer funds
    pub warnings: Vec<LevelTransitionWarning>,
}

// =============================================================================
// Session
// =============================================================================

pub struct EditorSession {
    characters: Vec<Character>,
    active: Option<usize>,
    history: History<Vec<Character>>,
    catalog: Arc<dyn ReferenceCatalog>,
    rules: Arc<dyn CalculationEngine>,
    store: Arc<dyn CharacterStore>,
    clock: Arc<dyn ClockPort>,
    /// Collection as last loaded or saved
    saved: Vec<Character>,
    has_unsaved_changes: bool,
}

impl EditorSession {
    /// An empty session. The empty collection is the first history entry,
    /// so adding the first character can be undone.
    pub fn new(
        catalog: Arc<dyn ReferenceCatalog>,
        rules: Arc<dyn CalculationEngine>,
        store: Arc<dyn CharacterStore>,
        clock: Arc<dyn ClockPort>,
        history_limit: usize,
    ) -> Self {
        let mut history = History::new(history_limit);
        history.reset_with(&Vec::new());
        Self {
            characters: Vec::new(),
            active: None,
            history,
            catalog,
            rules,
            store,
            clock,
            saved: Vec::new(),
            has_unsaved_changes: false,
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active(&self) -> Option<&Character> {
        self.active.and_then(|index| self.characters.get(index))
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.has_unsaved_changes
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_revert()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_forward()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn catalog(&self) -> &dyn ReferenceCatalog {
        self.catalog.as_ref()
    }

    /// Assigned choice slots the active character's level no longer funds.
    pub fn level_warnings(&self) -> Vec<LevelTransitionWarning> {
        self.active()
            .map(|character| self.allocator().level_warnings(character))
            .unwrap_or_default()
    }

    /// Display form of a weapon's damage formula, evaluated against the
    /// active character. Unparseable text is returned as written.
    pub fn weapon_damage(&self, index: usize) -> Result<String, SessionError> {
        let character = self.active_character()?;
        let weapon = weapon_at(character, index)?;
        Ok(evaluate(&weapon.damage, &character.formula_bindings()))
    }

    /// Roll a weapon's damage formula for the active character.
    pub fn roll_weapon_damage<R: Rng + ?Sized>(&self, index: usize, rng: &mut R) -> Result<RollResult, SessionError> {
        let character = self.active_character()?;
        let weapon = weapon_at(character, index)?;
        let result = roll(&weapon.damage, &character.formula_bindings(), rng).map_err(DomainError::from)?;
        tracing::debug!(
            weapon = %weapon.name,
            breakdown = %result.breakdown(),
            "Rolled weapon damage"
        );
        Ok(result)
    }

    // =========================================================================
    // Collection edits
    // =========================================================================

    /// Append a baseline character and select it. Returns its index.
    pub fn add_character(&mut self, name: &str) -> usize {
        let mut character = Character::new(name);
        recalculate(&mut character, self.catalog.as_ref(), self.rules.as_ref());
        character.mark_dirty();
        self.characters.push(character);
        let index = self.characters.len() - 1;
        self.active = Some(index);
        self.commit("add_character");
        tracing::info!(index, name = %name, "Added character");
        index
    }

    pub fn delete_character(&mut self, index: usize) -> Result<Character, SessionError> {
        if index >= self.characters.len() {
            return Err(DomainError::CharacterNotFound(index).into());
        }
        let removed = self.characters.remove(index);
        self.active = match self.active {
            _ if self.characters.is_empty() => None,
            Some(active) if active > index => Some(active - 1),
            Some(active) => Some(active.min(self.characters.len() - 1)),
            None => None,
        };
        self.commit("delete_character");
        tracing::info!(index, name = %removed.name(), "Deleted character");
        Ok(removed)
    }

    /// Change the selected character. Not an edit; takes no snapshot.
    pub fn select(&mut self, index: usize) -> Result<(), SessionError> {
        if index >= self.characters.len() {
            return Err(DomainError::CharacterNotFound(index).into());
        }
        self.active = Some(index);
        Ok(())
    }

    // =========================================================================
    // Active character edits
    // =========================================================================

    /// Replace the active character with a baseline one of the same name.
    pub fn reset_character(&mut self) -> Result<EditOutcome, SessionError> {
        self.edit_active("reset_character", |character, _| {
            let fresh = Character::new(character.name());
            let changed = character.to_persisted() != fresh.to_persisted();
            *character = fresh;
            Ok(changed)
        })
    }

    pub fn set_name(&mut self, name: &str) -> Result<EditOutcome, SessionError> {
        self.edit_active("set_name", |character, _| Ok(character.set_name(name)))
    }

    /// Change the level. Slots the new level no longer funds keep their
    /// effect and are reported as warnings.
    pub fn set_level(&mut self, level: u32) -> Result<LevelChange, SessionError> {
        let outcome = self.edit_active("set_level", |character, _| character.set_level(level))?;
        let warnings = self.level_warnings();
        for warning in &warnings {
            tracing::warn!(
                slot = %warning.slot,
                passive = %warning.passive,
                level = warning.level,
                funded = warning.funded,
                "Assigned slot no longer funded at this level"
            );
        }
        Ok(LevelChange { outcome, warnings })
    }

    pub fn set_level_experience(&mut self, experience: i32) -> Result<EditOutcome, SessionError> {
        self.edit_active("set_level_experience", |character, _| {
            Ok(character.set_level_experience(experience))
        })
    }

    pub fn set_stat_field(&mut self, stat: StatName, field: StatField, amount: i32) -> Result<EditOutcome, SessionError> {
        self.edit_active("set_stat_field", |character, _| {
            Ok(character.set_stat(stat, field, amount))
        })
    }

    /// Add stat experience; every full bar becomes one point of base value.
    pub fn award_stat_experience(&mut self, stat: StatName, amount: i32) -> Result<EditOutcome, SessionError> {
        self.edit_active("award_stat_experience", |character, _| {
            let before = character.stats().get(stat).clone();
            let gained = character.award_stat_experience(stat, amount);
            if gained > 0 {
                tracing::debug!(stat = %stat, gained, "Stat experience rolled over");
            }
            Ok(*character.stats().get(stat) != before)
        })
    }

    /// Change race and clear choices the new race does not offer.
    pub fn set_race(&mut self, race: &str) -> Result<EditOutcome, SessionError> {
        self.edit_active("set_race", |character, allocator| {
            if !character.set_race(race) {
                return Ok(false);
            }
            let cleared = allocator.prune_for_race(character);
            if !cleared.is_empty() {
                tracing::info!(race = %race, cleared = cleared.len(), "Cleared choices not offered by new race");
            }
            Ok(true)
        })
    }

    pub fn add_class(&mut self, class: &str) -> Result<EditOutcome, SessionError> {
        self.edit_active("add_class", |character, _| Ok(character.add_class(class)))
    }

    /// Remove a class together with its specializations.
    pub fn remove_class(&mut self, class: &str) -> Result<EditOutcome, SessionError> {
        self.edit_active("remove_class", |character, _| Ok(character.remove_class(class)))
    }

    /// Toggle a specialization the catalog offers for `class`.
    pub fn toggle_specialization(&mut self, class: &str, specialization: &str) -> Result<EditOutcome, SessionError> {
        let offered = self
            .catalog
            .specializations(class)
            .iter()
            .any(|s| s == specialization);
        if !offered {
            return Err(DomainError::validation(format!(
                "'{}' is not a specialization of '{}'",
                specialization, class
            ))
            .into());
        }
        self.edit_active("toggle_specialization", |character, _| {
            character.toggle_specialization(class, specialization)
        })
    }

    pub fn set_resource(&mut self, kind: ResourceKind, field: ResourceField, amount: i32) -> Result<EditOutcome, SessionError> {
        self.edit_active("set_resource", |character, _| {
            Ok(match field {
                ResourceField::Current => character.set_resource_current(kind, amount),
                ResourceField::Bonus => character.set_resource_bonus(kind, amount),
            })
        })
    }

    pub fn set_armor_bonus(&mut self, bonus: i32) -> Result<EditOutcome, SessionError> {
        self.edit_active("set_armor_bonus", |character, _| Ok(character.set_armor_bonus(bonus)))
    }

    pub fn add_weapon(&mut self, weapon: WeaponItem) -> Result<EditOutcome, SessionError> {
        self.edit_active("add_weapon", |character, _| {
            character.add_weapon(weapon);
            Ok(true)
        })
    }

    pub fn remove_weapon(&mut self, index: usize) -> Result<EditOutcome, SessionError> {
        self.edit_active("remove_weapon", |character, _| {
            character
                .remove_weapon(index)
                .map(|_| true)
                .ok_or_else(|| DomainError::validation(format!("No weapon at index {}", index)))
        })
    }

    pub fn add_armor(&mut self, armor: ArmorItem) -> Result<EditOutcome, SessionError> {
        self.edit_active("add_armor", |character, _| {
            character.add_armor(armor);
            Ok(true)
        })
    }

    pub fn remove_armor(&mut self, index: usize) -> Result<EditOutcome, SessionError> {
        self.edit_active("remove_armor", |character, _| {
            character
                .remove_armor(index)
                .map(|_| true)
                .ok_or_else(|| DomainError::validation(format!("No armor at index {}", index)))
        })
    }

    pub fn set_armor_equipped(&mut self, index: usize, equipped: bool) -> Result<EditOutcome, SessionError> {
        self.edit_active("set_armor_equipped", |character, _| {
            character.set_armor_equipped(index, equipped)
        })
    }

    pub fn add_item(&mut self, item: GeneralItem) -> Result<EditOutcome, SessionError> {
        self.edit_active("add_item", |character, _| {
            character.add_item(item);
            Ok(true)
        })
    }

    pub fn remove_item(&mut self, index: usize) -> Result<EditOutcome, SessionError> {
        self.edit_active("remove_item", |character, _| {
            character
                .remove_item(index)
                .map(|_| true)
                .ok_or_else(|| DomainError::validation(format!("No item at index {}", index)))
        })
    }

    pub fn set_skills(&mut self, skills: &str) -> Result<EditOutcome, SessionError> {
        self.edit_active("set_skills", |character, _| Ok(character.set_skills(skills)))
    }

    pub fn set_personal_notes(&mut self, notes: &str) -> Result<EditOutcome, SessionError> {
        self.edit_active("set_personal_notes", |character, _| {
            Ok(character.set_personal_notes(notes))
        })
    }

    pub fn set_section_visibility(&mut self, section_id: &str, visible: bool) -> Result<EditOutcome, SessionError> {
        self.edit_active("set_section_visibility", |character, _| {
            Ok(character.set_section_visibility(section_id, visible))
        })
    }

    /// Assign an option to a choice slot of one of the race's passives.
    ///
    /// Rejected assignments (for example a stat already claimed by a sibling
    /// slot) leave the character untouched.
    pub fn set_choice(
        &mut self,
        category: ChoiceCategory,
        passive: &str,
        index: usize,
        option_type: &str,
        target: Option<StatName>,
    ) -> Result<EditOutcome, SessionError> {
        let result = self.edit_active("set_choice", |character, allocator| {
            let before = character.stat_choices().clone();
            allocator.assign(character, category, passive, index, option_type, target)?;
            Ok(*character.stat_choices() != before)
        });
        if let Err(SessionError::Domain(err)) = &result {
            tracing::warn!(
                category = %category,
                passive = %passive,
                index,
                error = %err,
                "Choice rejected"
            );
        }
        result
    }

    pub fn clear_choice(&mut self, category: ChoiceCategory, passive: &str, index: usize) -> Result<EditOutcome, SessionError> {
        self.edit_active("clear_choice", |character, allocator| {
            Ok(allocator.unassign(character, category, passive, index))
        })
    }

    // =========================================================================
    // History
    // =========================================================================

    /// Restore the previous snapshot. Returns `false` when there is none.
    pub fn undo(&mut self) -> bool {
        let characters = match self.history.revert() {
            HistoryStep::Restored(characters) => characters.clone(),
            HistoryStep::AtBoundary => {
                tracing::debug!("Nothing to undo");
                return false;
            }
        };
        self.restore(characters);
        true
    }

    /// Re-apply the next snapshot. Returns `false` when there is none.
    pub fn redo(&mut self) -> bool {
        let characters = match self.history.forward() {
            HistoryStep::Restored(characters) => characters.clone(),
            HistoryStep::AtBoundary => {
                tracing::debug!("Nothing to redo");
                return false;
            }
        };
        self.restore(characters);
        true
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Replace the collection with loaded records.
    ///
    /// Either every record is valid and the session switches to them, or
    /// nothing changes. History restarts at the loaded state.
    pub fn load(&mut self, records: Vec<PersistedCharacter>) -> Result<usize, SessionError> {
        let mut characters = records
            .into_iter()
            .map(Character::from_persisted)
            .collect::<Result<Vec<_>, _>>()?;
        for character in &mut characters {
            recalculate(character, self.catalog.as_ref(), self.rules.as_ref());
        }

        let count = characters.len();
        self.characters = characters;
        self.active = (count > 0).then_some(0);
        self.history.reset_with(&self.characters);
        self.saved = self.characters.clone();
        self.has_unsaved_changes = false;
        tracing::info!(count, "Loaded characters");
        Ok(count)
    }

    pub fn load_from_store(&mut self) -> Result<usize, SessionError> {
        let file = self.store.load()?;
        tracing::info!(
            version = %file.metadata.version,
            saved_at = ?file.metadata.saved_at,
            "Read save file"
        );
        self.load(file.characters)
    }

    pub fn save_to_store(&mut self) -> Result<(), SessionError> {
        let records = self.characters.iter().map(Character::to_persisted).collect();
        let file = SaveFile::new(records, self.clock.now());
        self.store.save(&file)?;
        for character in &mut self.characters {
            character.mark_saved();
        }
        self.saved = self.characters.clone();
        self.has_unsaved_changes = false;
        tracing::info!(count = file.characters.len(), "Saved characters");
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn allocator(&self) -> ChoiceAllocator<'_> {
        ChoiceAllocator::new(self.catalog.as_ref(), self.rules.as_ref())
    }

    fn active_character(&self) -> Result<&Character, SessionError> {
        let index = self.active.ok_or(SessionError::NoActiveCharacter)?;
        self.characters
            .get(index)
            .ok_or_else(|| DomainError::CharacterNotFound(index).into())
    }

    /// Mutate a copy of the active character and commit it if it changed.
    fn edit_active<F>(&mut self, operation: &'static str, edit: F) -> Result<EditOutcome, SessionError>
    where
        F: FnOnce(&mut Character, &ChoiceAllocator<'_>) -> Result<bool, DomainError>,
    {
        let index = self.active.ok_or(SessionError::NoActiveCharacter)?;
        let mut draft = self
            .characters
            .get(index)
            .cloned()
            .ok_or(DomainError::CharacterNotFound(index))?;

        let allocator = ChoiceAllocator::new(self.catalog.as_ref(), self.rules.as_ref());
        if !edit(&mut draft, &allocator)? {
            tracing::debug!(operation, index, "Edit changed nothing");
            return Ok(EditOutcome::Unchanged);
        }
        recalculate(&mut draft, self.catalog.as_ref(), self.rules.as_ref());
        draft.mark_dirty();
        self.characters[index] = draft;
        self.commit(operation);
        Ok(EditOutcome::Changed)
    }

    fn commit(&mut self, operation: &'static str) {
        self.history.snapshot(&self.characters);
        self.has_unsaved_changes = true;
        tracing::debug!(
            operation,
            history_len = self.history.len(),
            "Snapshot taken"
        );
    }

    /// Swap in a history snapshot. Landing back on the loaded or saved
    /// collection clears the dirty flags.
    fn restore(&mut self, characters: Vec<Character>) {
        self.characters = characters;
        self.active = match self.characters.len() {
            0 => None,
            len => Some(self.active.unwrap_or(0).min(len - 1)),
        };
        self.has_unsaved_changes = self.characters != self.saved;
        if !self.has_unsaved_changes {
            for character in &mut self.characters {
                character.mark_saved();
            }
        }
    }
}

fn weapon_at(character: &Character, index: usize) -> Result<&WeaponItem, SessionError> {
    character
        .weapons()
        .get(index)
        .ok_or_else(|| DomainError::validation(format!("No weapon at index {}", index)).into())
}
