// Simulation Events
//
// Events describe every observable state change of a run: a party being
// dispatched, a slot becoming active or empty, status snapshots and the
// final drain. They are emitted while the simulation lock is held, so the
// order a sink sees is the order the state changed in.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::pool::ResourceCounts;
use crate::slots::StatusSnapshot;

// ============================================================================
// Event Type Constants
// ============================================================================

pub const PARTY_DISPATCHED: &str = "party.dispatched";
pub const SLOT_ACTIVE: &str = "slot.active";
pub const SLOT_EMPTY: &str = "slot.empty";
pub const STATUS_REPORT: &str = "status.report";
pub const RUN_DRAINED: &str = "run.drained";

// ============================================================================
// Events
// ============================================================================

/// What produced a status snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotSource {
    /// Periodic monitor poll
    Monitor,
    /// A worker finishing its party
    Completion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimulationEvent {
    /// A party was formed and bound to a slot
    PartyDispatched {
        slot: usize,
        duration: u32,
        /// Players left in the pool after this party was taken
        remaining: ResourceCounts,
    },

    /// A worker started occupying its slot
    SlotActive { slot: usize, duration: u32 },

    /// A worker left its slot
    SlotEmpty { slot: usize },

    /// Full view of all slots
    StatusReport {
        source: SnapshotSource,
        snapshot: StatusSnapshot,
    },

    /// No further party can be formed; no more dispatches follow
    Drained {
        remaining: ResourceCounts,
        parties_dispatched: u64,
    },
}

impl SimulationEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::PartyDispatched { .. } => PARTY_DISPATCHED,
            Self::SlotActive { .. } => SLOT_ACTIVE,
            Self::SlotEmpty { .. } => SLOT_EMPTY,
            Self::StatusReport { .. } => STATUS_REPORT,
            Self::Drained { .. } => RUN_DRAINED,
        }
    }
}

// ============================================================================
// EventSink - Receives simulation events
// ============================================================================

/// Receiver of simulation events
///
/// `emit` runs while the simulation lock is held. Implementations must not
/// block for long and must not call back into the simulation.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &SimulationEvent);
}

/// Sink that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: &SimulationEvent) {}
}

/// Sink that forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &SimulationEvent) {
        let event_type = event.event_type();
        match event {
            SimulationEvent::PartyDispatched {
                slot,
                duration,
                remaining,
            } => info!(
                event_type,
                slot,
                duration,
                tanks = remaining.tanks,
                healers = remaining.healers,
                dps = remaining.dps,
                "Party dispatched"
            ),
            SimulationEvent::SlotActive { slot, duration } => {
                info!(event_type, slot, duration, "Slot active")
            }
            SimulationEvent::SlotEmpty { slot } => info!(event_type, slot, "Slot empty"),
            SimulationEvent::StatusReport { source, snapshot } => debug!(
                event_type,
                source = ?source,
                active = snapshot.active_count,
                capacity = snapshot.capacity,
                "Instance status"
            ),
            SimulationEvent::Drained {
                remaining,
                parties_dispatched,
            } => info!(
                event_type,
                parties_dispatched,
                tanks = remaining.tanks,
                healers = remaining.healers,
                dps = remaining.dps,
                "No further party can be formed"
            ),
        }
    }
}

// ============================================================================
// MemorySink - Records events for tests and embedding
// ============================================================================

/// Sink that keeps every event in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<SimulationEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all events received so far
    pub fn events(&self) -> Vec<SimulationEvent> {
        self.events.lock().clone()
    }

    /// Events of a single type, in arrival order
    pub fn events_of_type(&self, event_type: &str) -> Vec<SimulationEvent> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.event_type() == event_type)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &SimulationEvent) {
        self.events.lock().push(event.clone());
    }
}
