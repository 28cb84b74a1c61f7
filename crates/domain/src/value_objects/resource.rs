//! Resource pools (health, mana, racial power).

use std::fmt;

/// Which pool an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Health,
    Mana,
    RacialPower,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [Self::Health, Self::Mana, Self::RacialPower];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::Mana => "mana",
            Self::RacialPower => "racialPower",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current value, player bonus, and derived maximum of one pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourcePool {
    current: i32,
    bonus: i32,
    max: i32,
}

impl ResourcePool {
    /// A pool with the given current value and bonus; the max is derived later.
    pub fn new(current: i32, bonus: i32) -> Self {
        Self {
            current,
            bonus,
            max: 0,
        }
    }

    pub fn current(&self) -> i32 {
        self.current
    }

    pub fn bonus(&self) -> i32 {
        self.bonus
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn set_current(&mut self, current: i32) -> bool {
        let changed = self.current != current;
        self.current = current;
        changed
    }

    pub fn set_bonus(&mut self, bonus: i32) -> bool {
        let changed = self.bonus != bonus;
        self.bonus = bonus;
        changed
    }

    /// Store a new maximum and clamp the current value to it.
    pub(crate) fn apply_max(&mut self, max: i32) {
        self.max = max;
        self.current = self.current.min(max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_max_clamps_current_down_only() {
        let mut pool = ResourcePool::new(30, 0);
        pool.apply_max(20);
        assert_eq!(pool.current(), 20);

        pool.apply_max(50);
        assert_eq!(pool.current(), 20);
        assert_eq!(pool.max(), 50);
    }

    #[test]
    fn setters_report_change() {
        let mut pool = ResourcePool::new(5, 1);
        assert!(!pool.set_current(5));
        assert!(pool.set_current(6));
        assert!(pool.set_bonus(2));
        assert!(!pool.set_bonus(2));
    }
}
