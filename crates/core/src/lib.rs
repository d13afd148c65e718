// LFG Instance Simulator Core
//
// This crate runs the "looking for group" simulation: a fixed number of
// instance slots, a pool of tank/healer/damage-dealer players, and a
// dispatcher that forms parties of 1/1/3 and sends them into free slots
// until no further party can be formed.
//
// Key design decisions:
// - All shared state sits behind a single lock (SharedState); the dispatcher
//   waits on a Notify that every finishing worker signals
// - Party formation is all-or-nothing; the pool never gives up a partial party
// - Slots are chosen round-robin through a cursor on SlotRegistry
// - The run drains exactly once, when the pool can no longer fill a party;
//   in-flight workers always run to completion and are joined before the
//   summary is built
// - Events and summaries go through traits (EventSink, SummarySink) so the
//   console and file formats live outside this crate
//
// ┌──────────────────────────────────────────────────────────────┐
// │                          Simulation                           │
// │  ┌──────────────┐   spawns   ┌────────┐ ┌────────┐            │
// │  │  Dispatcher  │──────────► │ Worker │ │ Worker │ ...        │
// │  └──────┬───────┘            └───┬────┘ └───┬────┘            │
// │         │ waits on Notify        │ notify   │                 │
// │         ▼                        ▼          ▼                 │
// │  ┌─────────────────────────────────────────────────────┐      │
// │  │ SharedState: Mutex<SimulationState>                 │      │
// │  │   ResourcePool · SlotRegistry · keep_running        │      │
// │  └─────────────────────────────────────────────────────┘      │
// │         ▲ polls every interval                                │
// │  ┌──────┴───────┐                                             │
// │  │   Monitor    │                                             │
// │  └──────────────┘                                             │
// └──────────────────────────────────────────────────────────────┘

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod monitor;
pub mod pool;
pub mod simulation;
pub mod slots;
pub mod state;
pub mod summary;
pub mod worker;

// Logging setup for binaries
pub mod telemetry;

/// Prelude for common imports
pub mod prelude {
    pub use crate::config::{ConfigError, RunOptions, SimulationConfig};
    pub use crate::error::SimulationError;
    pub use crate::events::{EventSink, MemorySink, SimulationEvent, SnapshotSource, TracingSink};
    pub use crate::pool::ResourceCounts;
    pub use crate::simulation::Simulation;
    pub use crate::summary::{RunSummary, SlotSummary, SummaryError, SummarySink};
}

// Re-export key types at crate root
pub use config::{ConfigError, RunOptions, SimulationConfig};
pub use dispatcher::{DispatchOutcome, Dispatcher, DispatcherPhase, DurationSampler};
pub use error::{Result, SimulationError};
pub use events::{EventSink, MemorySink, NoopSink, SimulationEvent, SnapshotSource, TracingSink};
pub use monitor::Monitor;
pub use pool::{Party, ResourceCounts, ResourcePool};
pub use simulation::Simulation;
pub use slots::{Slot, SlotRegistry, SlotStatus, StatusSnapshot};
pub use state::{SharedState, SimulationState};
pub use summary::{RunSummary, SlotSummary, SummaryError, SummarySink};
pub use worker::Worker;
