//! Shared simulation state
//!
//! [`SimulationState`] is everything the dispatcher, workers and monitor
//! coordinate on. It lives behind a single mutex inside [`SharedState`],
//! together with the dispatcher's wakeup and the shutdown broadcast.
//!
//! The mutex is never held across an `.await`: every critical section is a
//! synchronous block.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use tokio::sync::{watch, Notify};
use tracing::debug;

use crate::config::SimulationConfig;
use crate::events::{EventSink, SimulationEvent, SnapshotSource};
use crate::pool::ResourcePool;
use crate::slots::{SlotRegistry, StatusSnapshot};
use crate::summary::SlotSummary;

/// State guarded by the simulation lock
#[derive(Debug)]
pub struct SimulationState {
    pub(crate) pool: ResourcePool,
    pub(crate) slots: SlotRegistry,
    keep_running: bool,
    parties_dispatched: u64,
}

impl SimulationState {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            pool: ResourcePool::new(config.initial_players()),
            slots: SlotRegistry::new(config.instance_count),
            keep_running: true,
            parties_dispatched: 0,
        }
    }

    pub fn pool(&self) -> &ResourcePool {
        &self.pool
    }

    pub fn slots(&self) -> &SlotRegistry {
        &self.slots
    }

    /// False once the run has drained; never flips back
    pub fn is_running(&self) -> bool {
        self.keep_running
    }

    pub(crate) fn record_dispatch(&mut self) {
        self.parties_dispatched += 1;
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.slots.snapshot()
    }

    pub fn slot_summaries(&self) -> Vec<SlotSummary> {
        self.slots
            .slots()
            .iter()
            .map(|slot| SlotSummary {
                index: slot.index,
                parties_served: slot.parties_served,
                seconds_served: slot.seconds_served,
            })
            .collect()
    }
}

struct Inner {
    state: Mutex<SimulationState>,
    /// Dispatcher wait condition; `notify_one` keeps a permit if nobody waits
    wakeup: Notify,
    shutdown_tx: watch::Sender<bool>,
    sink: Arc<dyn EventSink>,
}

/// Cloneable handle to the shared simulation state
#[derive(Clone)]
pub struct SharedState {
    inner: Arc<Inner>,
}

impl SharedState {
    pub fn new(config: &SimulationConfig, sink: Arc<dyn EventSink>) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(SimulationState::new(config)),
                wakeup: Notify::new(),
                shutdown_tx,
                sink,
            }),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, SimulationState> {
        self.inner.state.lock()
    }

    /// Send an event to the sink
    ///
    /// Callers hold the lock so events reach the sink in state order.
    pub(crate) fn emit(&self, event: SimulationEvent) {
        self.inner.sink.emit(&event);
    }

    /// Snapshot the slots and emit it as a status report
    pub(crate) fn emit_status(&self, state: &SimulationState, source: SnapshotSource) {
        self.emit(SimulationEvent::StatusReport {
            source,
            snapshot: state.snapshot(),
        });
    }

    /// Emit a status report if the run is still going
    ///
    /// Returns false without emitting once the run has drained.
    pub fn report_status(&self, source: SnapshotSource) -> bool {
        let state = self.lock();
        if !state.is_running() {
            return false;
        }
        self.emit_status(&state, source);
        true
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.lock().snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.lock().is_running()
    }

    /// Wake the dispatcher so it re-evaluates its admission predicate
    pub(crate) fn notify_dispatcher(&self) {
        self.inner.wakeup.notify_one();
    }

    /// Wait until some worker signals a state change
    pub(crate) async fn changed(&self) {
        self.inner.wakeup.notified().await;
    }

    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.inner.shutdown_tx.subscribe()
    }

    /// Stop the run: clear `keep_running` and wake everyone waiting on it
    ///
    /// Must be called with the lock held. Returns false if the run had
    /// already drained.
    pub(crate) fn drain(&self, state: &mut SimulationState) -> bool {
        if !state.keep_running {
            return false;
        }
        state.keep_running = false;
        self.emit(SimulationEvent::Drained {
            remaining: state.pool.remaining(),
            parties_dispatched: state.parties_dispatched,
        });
        self.inner.shutdown_tx.send_replace(true);
        self.inner.wakeup.notify_waiters();
        debug!("Shutdown broadcast sent");
        true
    }
}
