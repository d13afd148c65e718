//! Periodic status monitor
//!
//! Emits a status report every `monitor_interval` simulated seconds until the
//! run drains. The first report comes one interval after start.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use crate::config::RunOptions;
use crate::events::SnapshotSource;
use crate::state::SharedState;

/// Shortest wall-clock interval the monitor ticks at
const MIN_TICK: Duration = Duration::from_millis(1);

pub struct Monitor {
    shared: SharedState,
    interval: Duration,
    shutdown_rx: watch::Receiver<bool>,
}

impl Monitor {
    pub fn new(shared: SharedState, options: &RunOptions) -> Self {
        let shutdown_rx = shared.subscribe_shutdown();
        Self {
            interval: options.scaled(options.monitor_interval).max(MIN_TICK),
            shared,
            shutdown_rx,
        }
    }

    /// Run until shutdown; returns the number of reports emitted
    pub async fn run(mut self) -> u64 {
        let mut reports = 0;
        if *self.shutdown_rx.borrow() {
            return reports;
        }

        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown_rx.changed() => {
                    debug!("Monitor: shutdown requested");
                    break;
                }
                _ = ticker.tick() => {
                    // Also covers a drain that happened before we subscribed
                    if !self.shared.report_status(SnapshotSource::Monitor) {
                        break;
                    }
                    reports += 1;
                }
            }
        }

        debug!(reports, "Monitor loop exited");
        reports
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::SimulationConfig;
    use crate::events::{MemorySink, STATUS_REPORT};
    use crate::pool::ResourceCounts;

    fn shared(sink: Arc<MemorySink>) -> SharedState {
        let config = SimulationConfig::new(3, ResourceCounts::new(1, 1, 3));
        SharedState::new(&config, sink)
    }

    #[tokio::test(start_paused = true)]
    async fn test_reports_each_interval_until_drain() {
        let sink = Arc::new(MemorySink::new());
        let state = shared(sink.clone());
        let monitor = Monitor::new(state.clone(), &RunOptions::default());
        let handle = tokio::spawn(monitor.run());

        // Reports at t=2, 4 and 6; drain at t=7
        tokio::time::sleep(Duration::from_secs(7)).await;
        {
            let mut guard = state.lock();
            state.drain(&mut guard);
        }

        let reports = handle.await.unwrap();
        assert_eq!(reports, 3);
        assert_eq!(sink.events_of_type(STATUS_REPORT).len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_promptly_on_shutdown() {
        let state = shared(Arc::new(MemorySink::new()));
        let options = RunOptions::default().with_monitor_interval(60);
        let handle = tokio::spawn(Monitor::new(state.clone(), &options).run());

        tokio::time::sleep(Duration::from_secs(1)).await;
        let drained_at = Instant::now();
        {
            let mut guard = state.lock();
            state.drain(&mut guard);
        }

        assert_eq!(handle.await.unwrap(), 0);
        assert!(drained_at.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exits_immediately_when_already_drained() {
        let state = shared(Arc::new(MemorySink::new()));
        {
            let mut guard = state.lock();
            state.drain(&mut guard);
        }

        let reports = Monitor::new(state, &RunOptions::default()).run().await;
        assert_eq!(reports, 0);
    }
}
