//! # Special-Pool Progression
//!
//! Special pools (treasure vaults, boss rooms) stay locked until the dungeon
//! is both large enough and deep enough. Once unlocked, a pool waits in the
//! synthesizer's buffer until a room from it is placed, then rests for a
//! cooldown before it can unlock again.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::template::PoolId;

/// Unlock thresholds for one special pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockRule {
    /// Rooms that must have been placed.
    pub min_rooms: u32,
    /// Minimum depth of the room being grown.
    pub min_depth: u32,
}

impl UnlockRule {
    /// Returns true if both thresholds are met.
    #[inline]
    #[must_use]
    pub const fn is_met(&self, rooms_placed: u32, depth: u32) -> bool {
        rooms_placed >= self.min_rooms && depth >= self.min_depth
    }
}

/// Special pools and their unlock rules.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProgressionGate {
    rules: BTreeMap<PoolId, UnlockRule>,
}

impl ProgressionGate {
    /// Creates an empty gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the rule for a special pool.
    pub fn register(&mut self, pool: impl Into<PoolId>, min_rooms: u32, min_depth: u32) {
        self.rules.insert(pool.into(), UnlockRule { min_rooms, min_depth });
    }

    /// The rule for a pool, if it is special.
    #[must_use]
    pub fn rule(&self, pool: &str) -> Option<UnlockRule> {
        self.rules.get(pool).copied()
    }

    /// Returns true if the pool is gated.
    #[must_use]
    pub fn is_special(&self, pool: &str) -> bool {
        self.rules.contains_key(pool)
    }

    /// Number of special pools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if no special pools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Pools whose thresholds are met and that are neither already buffered
    /// nor resting, in pool-ID order.
    #[must_use]
    pub fn check(
        &self,
        rooms_placed: u32,
        depth: u32,
        cooldown: &BTreeMap<PoolId, u32>,
        buffered: &[PoolId],
    ) -> Vec<PoolId> {
        self.rules
            .iter()
            .filter(|(pool, rule)| {
                rule.is_met(rooms_placed, depth)
                    && !cooldown.contains_key(*pool)
                    && !buffered.contains(*pool)
            })
            .map(|(pool, _)| pool.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> ProgressionGate {
        let mut gate = ProgressionGate::new();
        gate.register("test:vault", 5, 2);
        gate.register("test:boss", 20, 6);
        gate
    }

    #[test]
    fn test_thresholds() {
        let gate = gate();
        let none = BTreeMap::new();
        assert!(gate.check(4, 9, &none, &[]).is_empty());
        assert!(gate.check(9, 1, &none, &[]).is_empty());
        assert_eq!(gate.check(5, 2, &none, &[]), vec!["test:vault"]);
        assert_eq!(gate.check(20, 6, &none, &[]), vec!["test:boss", "test:vault"]);
    }

    #[test]
    fn test_buffered_and_resting_pools_are_skipped() {
        let gate = gate();
        let mut cooldown = BTreeMap::new();
        cooldown.insert("test:vault".to_owned(), 3);
        assert!(gate.check(5, 2, &cooldown, &[]).is_empty());
        assert!(gate
            .check(5, 2, &BTreeMap::new(), &["test:vault".to_owned()])
            .is_empty());
    }

    #[test]
    fn test_rule_lookup() {
        let gate = gate();
        assert!(gate.is_special("test:boss"));
        assert!(!gate.is_special("test:halls"));
        assert_eq!(gate.len(), 2);
        assert_eq!(
            gate.rule("test:vault"),
            Some(UnlockRule { min_rooms: 5, min_depth: 2 })
        );
    }
}
