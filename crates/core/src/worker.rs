//! Worker
//!
//! One worker per dispatched party. It occupies its slot for the sampled
//! duration and then hands the slot back. A worker runs exactly once.

use std::time::Duration;

use tracing::trace;

use crate::events::{SimulationEvent, SnapshotSource};
use crate::state::SharedState;

/// A party occupying one slot
pub struct Worker {
    shared: SharedState,
    slot: usize,
    /// Simulated seconds
    duration: u32,
    /// Wall-clock time to sleep for `duration`
    wall_time: Duration,
}

impl Worker {
    pub(crate) fn new(
        shared: SharedState,
        slot: usize,
        duration: u32,
        wall_time: Duration,
    ) -> Self {
        Self {
            shared,
            slot,
            duration,
            wall_time,
        }
    }

    pub async fn run(self) {
        // The dispatcher already claimed the slot and reported it active
        trace!(slot = self.slot, duration = self.duration, "Worker started");
        // Simulated work; no shared state is touched while sleeping
        tokio::time::sleep(self.wall_time).await;
        self.finish();
    }

    fn finish(&self) {
        {
            let mut state = self.shared.lock();
            state.slots.mark_inactive(self.slot);
            self.shared.emit(SimulationEvent::SlotEmpty { slot: self.slot });
            self.shared.emit_status(&state, SnapshotSource::Completion);
            trace!(slot = self.slot, "Worker finished");
        }
        self.shared.notify_dispatcher();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::SimulationConfig;
    use crate::events::{MemorySink, SLOT_EMPTY, STATUS_REPORT};
    use crate::pool::ResourceCounts;

    #[tokio::test(start_paused = true)]
    async fn test_worker_occupies_and_releases_slot() {
        let sink = Arc::new(MemorySink::new());
        let config = SimulationConfig::new(2, ResourceCounts::new(1, 1, 3));
        let shared = SharedState::new(&config, sink.clone());

        {
            let mut state = shared.lock();
            state.slots.claim(1);
            state.slots.record_service(1, 3);
        }
        let worker = Worker::new(shared.clone(), 1, 3, Duration::from_secs(3));

        let start = tokio::time::Instant::now();
        worker.run().await;
        assert_eq!(start.elapsed(), Duration::from_secs(3));

        let state = shared.lock();
        assert_eq!(state.slots().active_count(), 0);
        let slot = state.slots().slot(1).unwrap();
        assert!(!slot.active);
        assert_eq!(slot.parties_served, 1);
        assert_eq!(slot.seconds_served, 3);

        let types: Vec<_> = sink.events().iter().map(|e| e.event_type()).collect();
        assert_eq!(types, vec![SLOT_EMPTY, STATUS_REPORT]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_wakes_dispatcher() {
        let config = SimulationConfig::new(1, ResourceCounts::new(1, 1, 3));
        let shared = SharedState::new(&config, Arc::new(MemorySink::new()));
        shared.lock().slots.claim(0);

        let worker = Worker::new(shared.clone(), 0, 1, Duration::from_secs(1));
        let handle = tokio::spawn(worker.run());

        shared.changed().await;
        assert_eq!(shared.snapshot().active_count, 0);
        handle.await.unwrap();
    }
}
