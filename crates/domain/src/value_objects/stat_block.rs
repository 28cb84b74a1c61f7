//! Stat and StatBlock - per-character stat records
//!
//! A `Stat` keeps the authoritative components a player edits (base value,
//! equipment, temporary bonus, experience) next to the fields the
//! recalculation engine derives from them (racial change, total, maximum
//! experience). Derived fields are only written by `recalculate`.

use super::StatName;

/// One stat's components and derived values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stat {
    // Authoritative
    value: i32,
    equipment: i32,
    temporary: i32,
    experience: i32,

    // Derived (recomputed, never persisted)
    racial_change: i32,
    max_experience: i32,
    total: i32,
}

/// Editable component of a stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatField {
    Value,
    Equipment,
    Temporary,
    Experience,
}

impl Stat {
    /// Create a stat from its authoritative components.
    ///
    /// Derived fields start at zero until the next recalculation.
    pub fn new(value: i32, equipment: i32, temporary: i32, experience: i32) -> Self {
        Self {
            value,
            equipment,
            temporary,
            experience,
            ..Self::default()
        }
    }

    // ──────────────────────────────────────────────────────────────────────────
    // Read accessors
    // ──────────────────────────────────────────────────────────────────────────

    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn equipment(&self) -> i32 {
        self.equipment
    }

    pub fn temporary(&self) -> i32 {
        self.temporary
    }

    pub fn experience(&self) -> i32 {
        self.experience
    }

    /// Sum of active choice effects and unconditional race bonuses.
    pub fn racial_change(&self) -> i32 {
        self.racial_change
    }

    /// Experience needed for the next bonus point.
    pub fn max_experience(&self) -> i32 {
        self.max_experience
    }

    /// value + equipment + temporary + racial change
    pub fn total(&self) -> i32 {
        self.total
    }

    pub fn get(&self, field: StatField) -> i32 {
        match field {
            StatField::Value => self.value,
            StatField::Equipment => self.equipment,
            StatField::Temporary => self.temporary,
            StatField::Experience => self.experience,
        }
    }

    // ──────────────────────────────────────────────────────────────────────────
    // Mutators
    // ──────────────────────────────────────────────────────────────────────────

    /// Set an authoritative component. Returns `true` if the value changed.
    pub fn set(&mut self, field: StatField, amount: i32) -> bool {
        let slot = match field {
            StatField::Value => &mut self.value,
            StatField::Equipment => &mut self.equipment,
            StatField::Temporary => &mut self.temporary,
            StatField::Experience => &mut self.experience,
        };
        if *slot == amount {
            return false;
        }
        *slot = amount;
        true
    }

    /// Add experience, converting every full `max_experience` into one point
    /// of base value. Requires `max_experience` to be current.
    ///
    /// Returns the number of points gained.
    pub fn award_experience(&mut self, amount: i32) -> i32 {
        self.experience = self.experience.saturating_add(amount).max(0);
        if self.max_experience <= 0 {
            return 0;
        }
        let gained = self.experience / self.max_experience;
        self.experience %= self.max_experience;
        self.value = self.value.saturating_add(gained);
        gained
    }

    pub(crate) fn apply_racial_change(&mut self, racial_change: i32) {
        self.racial_change = racial_change;
        self.total = [self.equipment, self.temporary, racial_change]
            .into_iter()
            .fold(self.value, i32::saturating_add);
    }

    pub(crate) fn apply_max_experience(&mut self, max_experience: i32) {
        self.max_experience = max_experience;
        self.experience = self.experience.clamp(0, max_experience);
    }
}

/// The full set of stats for one character.
///
/// Always holds exactly one `Stat` per `StatName`, so lookups cannot miss.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatBlock {
    stats: [Stat; StatName::ALL.len()],
}

impl StatBlock {
    /// A block with every stat zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stat(mut self, name: StatName, stat: Stat) -> Self {
        *self.get_mut(name) = stat;
        self
    }

    pub fn get(&self, name: StatName) -> &Stat {
        &self.stats[Self::index(name)]
    }

    pub fn get_mut(&mut self, name: StatName) -> &mut Stat {
        &mut self.stats[Self::index(name)]
    }

    /// Derived total for a stat.
    pub fn total(&self, name: StatName) -> i32 {
        self.get(name).total()
    }

    /// Iterate stats in display order.
    pub fn iter(&self) -> impl Iterator<Item = (StatName, &Stat)> {
        StatName::ALL.iter().copied().zip(self.stats.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (StatName, &mut Stat)> {
        StatName::ALL.iter().copied().zip(self.stats.iter_mut())
    }

    fn index(name: StatName) -> usize {
        match name {
            StatName::Strength => 0,
            StatName::Agility => 1,
            StatName::Constitution => 2,
            StatName::Intelligence => 3,
            StatName::Wisdom => 4,
            StatName::Charisma => 5,
            StatName::Perception => 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stat_total_includes_every_component() {
        let mut stat = Stat::new(10, 2, 1, 0);
        stat.apply_racial_change(3);
        assert_eq!(stat.total(), 16);
        assert_eq!(stat.racial_change(), 3);
    }

    #[test]
    fn stat_set_reports_change() {
        let mut stat = Stat::new(10, 0, 0, 0);
        assert!(stat.set(StatField::Value, 12));
        assert!(!stat.set(StatField::Value, 12));
        assert_eq!(stat.get(StatField::Value), 12);
    }

    #[test]
    fn stat_max_experience_clamps_current_experience() {
        let mut stat = Stat::new(10, 0, 0, 25);
        stat.apply_max_experience(12);
        assert_eq!(stat.experience(), 12);

        let mut negative = Stat::new(10, 0, 0, -4);
        negative.apply_max_experience(12);
        assert_eq!(negative.experience(), 0);
    }

    #[test]
    fn stat_award_experience_rolls_over_into_value() {
        let mut stat = Stat::new(10, 0, 0, 8);
        stat.apply_max_experience(10);

        let gained = stat.award_experience(15);

        assert_eq!(gained, 2);
        assert_eq!(stat.value(), 12);
        assert_eq!(stat.experience(), 3);
    }

    #[test]
    fn stat_award_experience_without_max_only_accumulates() {
        let mut stat = Stat::new(10, 0, 0, 0);
        assert_eq!(stat.award_experience(5), 0);
        assert_eq!(stat.experience(), 5);
        assert_eq!(stat.value(), 10);
    }

    #[test]
    fn stat_total_saturates_at_the_bounds() {
        let mut high = Stat::new(i32::MAX, 1, 0, 0);
        high.apply_racial_change(0);
        assert_eq!(high.total(), i32::MAX);

        let mut low = Stat::new(i32::MIN, 0, -1, 0);
        low.apply_racial_change(-3);
        assert_eq!(low.total(), i32::MIN);
    }

    #[test]
    fn stat_award_experience_saturates() {
        let mut stat = Stat::new(0, 0, 0, 5);
        stat.apply_max_experience(10);
        assert_eq!(stat.award_experience(i32::MAX), i32::MAX / 10);
        assert_eq!(stat.value(), i32::MAX / 10);
        assert_eq!(stat.experience(), i32::MAX % 10);

        let mut capped = Stat::new(i32::MAX, 0, 0, 0);
        capped.apply_max_experience(10);
        capped.award_experience(100);
        assert_eq!(capped.value(), i32::MAX);
    }

    #[test]
    fn stat_block_iterates_in_display_order() {
        let block = StatBlock::new().with_stat(StatName::Agility, Stat::new(7, 0, 0, 0));
        let names: Vec<_> = block.iter().map(|(name, _)| name).collect();
        assert_eq!(names, StatName::ALL.to_vec());
        assert_eq!(block.get(StatName::Agility).value(), 7);
        assert_eq!(block.get(StatName::Strength).value(), 0);
    }
}
