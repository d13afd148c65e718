//! Simulation entry point
//!
//! Owns one run from validated configuration to final summary: starts the
//! monitor, drives the dispatcher on the calling task, joins every worker and
//! the monitor, and only then reads the statistics.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::{RunOptions, SimulationConfig};
use crate::dispatcher::{DispatchOutcome, Dispatcher};
use crate::error::{Result, SimulationError};
use crate::events::EventSink;
use crate::monitor::Monitor;
use crate::pool::ResourcePool;
use crate::state::SharedState;
use crate::summary::{RunSummary, SummarySink};

pub struct Simulation {
    run_id: Uuid,
    config: SimulationConfig,
    options: RunOptions,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("run_id", &self.run_id)
            .field("config", &self.config)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Validate the configuration and prepare a run
    ///
    /// Nothing is allocated or spawned when the configuration is invalid.
    pub fn new(
        config: SimulationConfig,
        options: RunOptions,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            run_id: Uuid::now_v7(),
            config,
            options,
            sink,
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Run to completion and return the summary
    #[instrument(skip(self), fields(run_id = %self.run_id, instances = self.config.instance_count))]
    pub async fn run(self) -> Result<RunSummary> {
        let started_at = Utc::now();
        let initial = self.config.initial_players();
        info!(
            tanks = initial.tanks,
            healers = initial.healers,
            dps = initial.dps,
            min_duration = self.config.min_duration,
            max_duration = self.config.max_duration,
            expected_parties = ResourcePool::new(initial).max_parties(),
            "Starting simulation"
        );

        let shared = SharedState::new(&self.config, Arc::clone(&self.sink));

        let monitor = tokio::spawn(Monitor::new(shared.clone(), &self.options).run());

        let DispatchOutcome {
            parties_dispatched,
            mut workers,
        } = Dispatcher::new(shared.clone(), &self.config, &self.options)
            .run()
            .await;

        // In-flight parties finish before any statistic is read
        while let Some(result) = workers.join_next().await {
            result.map_err(SimulationError::worker)?;
        }
        let status_reports = monitor.await.map_err(SimulationError::monitor)?;

        let state = shared.lock();
        let summary = RunSummary {
            run_id: self.run_id,
            started_at,
            finished_at: Utc::now(),
            initial,
            remaining: state.pool().remaining(),
            parties_dispatched,
            slots: state.slot_summaries(),
        };
        drop(state);

        info!(
            parties_dispatched,
            total_seconds = summary.total_seconds(),
            status_reports,
            "Simulation complete"
        );
        Ok(summary)
    }

    /// Run to completion and hand the summary to `summary_sink`
    pub async fn run_with_summary(self, summary_sink: &dyn SummarySink) -> Result<RunSummary> {
        let summary = self.run().await?;
        summary_sink.write_summary(&summary)?;
        Ok(summary)
    }
}
