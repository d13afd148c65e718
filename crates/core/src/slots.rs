//! Slot registry
//!
//! A fixed set of instance slots plus the active count and the round-robin
//! cursor used to choose where the next party goes.

use serde::{Deserialize, Serialize};

/// One instance slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Zero-based position in the registry
    pub index: usize,
    /// Whether a party currently occupies the slot
    pub active: bool,
    /// Parties that have started in this slot
    pub parties_served: u64,
    /// Simulated seconds of all parties that have started in this slot
    pub seconds_served: u64,
}

impl Slot {
    fn new(index: usize) -> Self {
        Self {
            index,
            active: false,
            parties_served: 0,
            seconds_served: 0,
        }
    }
}

/// Active flag of a single slot at snapshot time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotStatus {
    pub index: usize,
    pub active: bool,
}

/// Point-in-time view of every slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub capacity: usize,
    pub active_count: usize,
    pub slots: Vec<SlotStatus>,
}

/// Fixed-size registry of slots
///
/// `active_count` always equals the number of slots with `active == true`.
#[derive(Debug, Clone)]
pub struct SlotRegistry {
    slots: Vec<Slot>,
    active_count: usize,
    next_hint: usize,
}

impl SlotRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(Slot::new).collect(),
            active_count: 0,
            next_hint: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    pub fn has_free_slot(&self) -> bool {
        self.active_count < self.slots.len()
    }

    /// Index the next round-robin scan starts from
    pub fn next_hint(&self) -> usize {
        self.next_hint
    }

    /// First empty slot scanning from `start_hint`, wrapping around
    pub fn find_free_slot(&self, start_hint: usize) -> Option<usize> {
        let capacity = self.slots.len();
        if capacity == 0 {
            return None;
        }

        (0..capacity)
            .map(|offset| (start_hint + offset) % capacity)
            .find(|&index| !self.slots[index].active)
    }

    /// Claim the next free slot in round-robin order
    ///
    /// Marks the slot active and moves the cursor past it.
    pub fn assign_next(&mut self) -> Option<usize> {
        let index = self.find_free_slot(self.next_hint)?;
        self.claim(index);
        Some(index)
    }

    /// Mark `index` active and start the next scan right after it
    pub fn claim(&mut self, index: usize) {
        self.mark_active(index);
        self.next_hint = (index + 1) % self.slots.len();
    }

    /// Mark a slot active; returns false if it already was
    pub fn mark_active(&mut self, index: usize) -> bool {
        let slot = &mut self.slots[index];
        if slot.active {
            return false;
        }
        slot.active = true;
        self.active_count += 1;
        true
    }

    /// Mark a slot empty; returns false if it already was
    pub fn mark_inactive(&mut self, index: usize) -> bool {
        let slot = &mut self.slots[index];
        if !slot.active {
            return false;
        }
        slot.active = false;
        self.active_count -= 1;
        true
    }

    /// Count one started party of `seconds` against the slot
    pub fn record_service(&mut self, index: usize, seconds: u64) {
        let slot = &mut self.slots[index];
        slot.parties_served += 1;
        slot.seconds_served += seconds;
    }

    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            capacity: self.slots.len(),
            active_count: self.active_count,
            slots: self
                .slots
                .iter()
                .map(|slot| SlotStatus {
                    index: slot.index,
                    active: slot.active,
                })
                .collect(),
        }
    }
}
