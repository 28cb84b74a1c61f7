//! Sheetkeeper domain: character sheet model, derived-stat recalculation,
//! choice slot allocation and edit history.
//!
//! Pure and synchronous. No I/O, no logging; the engine crate owns both.

pub mod aggregates;
pub mod choices;
pub mod entities;
pub mod error;
pub mod game_systems;
pub mod history;
pub mod persisted;
pub mod value_objects;

pub use aggregates::{specialization_key, Character, SPECIALIZATION_SEPARATOR};
pub use choices::{
    clear_choice, set_choice, ChoiceAllocator, ChoiceCategory, ChosenOption, EffectCalc,
    LevelTransitionWarning, SlotId, StatChoices, StatsAffected,
};
pub use entities::{ArmorItem, GeneralItem, WeaponItem};
pub use error::DomainError;
pub use game_systems::{
    recalculate, CalculationEngine, ChoiceOption, ClassDefinition, LevelThreshold, ManualPassive,
    RaceDefinition, ReferenceCatalog, ResourceProgression, ResourceProgressions, SlotAllocation,
    StandardRules, StaticCatalog,
};
pub use history::{History, HistoryState, HistoryStep, DEFAULT_MAX_HISTORY};
pub use persisted::{PersistedCharacter, PersistedStat};
pub use value_objects::{
    evaluate, roll, DiceTerm, FormulaBindings, FormulaParseError, ResolvedFormula, ResourceKind,
    ResourcePool, RollResult, Stat, StatBlock, StatField, StatName,
};
