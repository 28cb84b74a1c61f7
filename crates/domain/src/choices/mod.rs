//! Manual passive choice slots.

mod allocator;
mod model;

pub use allocator::{clear_choice, set_choice, ChoiceAllocator, LevelTransitionWarning};
pub use model::{ChoiceCategory, ChosenOption, EffectCalc, SlotId, StatChoices, StatsAffected};
