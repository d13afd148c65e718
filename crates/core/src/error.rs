// Error types for simulation runs

use tokio::task::JoinError;

use crate::config::ConfigError;
use crate::summary::SummaryError;

/// Errors that can end a simulation run
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// Configuration rejected before any state was created
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A worker or the monitor panicked
    #[error("{task} task failed: {source}")]
    TaskFailed {
        task: &'static str,
        #[source]
        source: JoinError,
    },

    /// The summary could not be delivered
    #[error(transparent)]
    Summary(#[from] SummaryError),
}

impl SimulationError {
    pub(crate) fn worker(source: JoinError) -> Self {
        Self::TaskFailed {
            task: "worker",
            source,
        }
    }

    pub(crate) fn monitor(source: JoinError) -> Self {
        Self::TaskFailed {
            task: "monitor",
            source,
        }
    }
}

/// Result type alias for simulation operations
pub type Result<T> = std::result::Result<T, SimulationError>;
