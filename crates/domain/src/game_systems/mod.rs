//! Game rules: reference catalog, calculation rules and recalculation.

pub mod catalog;
mod recalculate;
mod standard;
mod traits;

pub use catalog::{
    ChoiceOption, ClassDefinition, LevelThreshold, ManualPassive, RaceDefinition,
    ReferenceCatalog, ResourceProgression, ResourceProgressions, SlotAllocation, StaticCatalog,
};
pub use recalculate::recalculate;
pub use standard::StandardRules;
pub use traits::CalculationEngine;
