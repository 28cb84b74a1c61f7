//! Value objects - Immutable objects defined by their attributes

mod formula;
mod resource;
mod stat;
mod stat_block;

pub use formula::{
    evaluate, roll, DiceTerm, FormulaBindings, FormulaParseError, ResolvedFormula, RollResult,
};
pub use resource::{ResourceKind, ResourcePool};
pub use stat::StatName;
pub use stat_block::{Stat, StatBlock, StatField};
