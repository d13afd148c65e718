//! Resource pool and party formation rule
//!
//! A party is exactly one tank, one healer and three damage dealers. The pool
//! only ever gives up players as a whole party: either all three counters are
//! decremented or none of them is.

use serde::{Deserialize, Serialize};

/// Tanks consumed by one party
pub const TANKS_PER_PARTY: u32 = 1;
/// Healers consumed by one party
pub const HEALERS_PER_PARTY: u32 = 1;
/// Damage dealers consumed by one party
pub const DPS_PER_PARTY: u32 = 3;

/// Counts of players per role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCounts {
    pub tanks: u32,
    pub healers: u32,
    pub dps: u32,
}

impl ResourceCounts {
    pub fn new(tanks: u32, healers: u32, dps: u32) -> Self {
        Self {
            tanks,
            healers,
            dps,
        }
    }

    /// Composition of a single party
    pub const fn party() -> Self {
        Self {
            tanks: TANKS_PER_PARTY,
            healers: HEALERS_PER_PARTY,
            dps: DPS_PER_PARTY,
        }
    }

    /// Total number of players across all roles
    pub fn total(&self) -> u64 {
        u64::from(self.tanks) + u64::from(self.healers) + u64::from(self.dps)
    }
}

/// A party taken out of the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Party {
    pub members: ResourceCounts,
}

/// Remaining players available to form new parties
///
/// Only the dispatcher mutates the pool, and only while holding the shared
/// simulation lock.
#[derive(Debug, Clone)]
pub struct ResourcePool {
    remaining: ResourceCounts,
}

impl ResourcePool {
    pub fn new(initial: ResourceCounts) -> Self {
        Self { remaining: initial }
    }

    /// Whether the remaining players can still fill at least one party
    pub fn can_form_party(&self) -> bool {
        self.remaining.tanks >= TANKS_PER_PARTY
            && self.remaining.healers >= HEALERS_PER_PARTY
            && self.remaining.dps >= DPS_PER_PARTY
    }

    /// Take one party out of the pool
    ///
    /// Returns `None` without touching any counter when any role is short.
    pub fn try_form_party(&mut self) -> Option<Party> {
        if !self.can_form_party() {
            return None;
        }

        self.remaining.tanks -= TANKS_PER_PARTY;
        self.remaining.healers -= HEALERS_PER_PARTY;
        self.remaining.dps -= DPS_PER_PARTY;

        Some(Party {
            members: ResourceCounts::party(),
        })
    }

    /// Number of parties the remaining players can still produce
    pub fn max_parties(&self) -> u32 {
        (self.remaining.tanks / TANKS_PER_PARTY)
            .min(self.remaining.healers / HEALERS_PER_PARTY)
            .min(self.remaining.dps / DPS_PER_PARTY)
    }

    pub fn remaining(&self) -> ResourceCounts {
        self.remaining
    }
}
