//! Run summary
//!
//! Produced once, after every worker and the monitor have been joined, and
//! handed to a [`SummarySink`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pool::ResourceCounts;

/// Totals for one slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSummary {
    pub index: usize,
    pub parties_served: u64,
    pub seconds_served: u64,
}

/// Final report of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Players configured at startup
    pub initial: ResourceCounts,
    /// Players left over that could not fill another party
    pub remaining: ResourceCounts,
    pub parties_dispatched: u64,
    /// One entry per slot, ordered by slot index
    pub slots: Vec<SlotSummary>,
}

impl RunSummary {
    /// Parties served across all slots
    pub fn total_parties(&self) -> u64 {
        self.slots.iter().map(|slot| slot.parties_served).sum()
    }

    /// Simulated seconds served across all slots
    pub fn total_seconds(&self) -> u64 {
        self.slots.iter().map(|slot| slot.seconds_served).sum()
    }
}

/// Summary output errors
#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    #[error("failed to write summary: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize summary: {0}")]
    Serialize(String),
}

/// Receiver of the final run summary
pub trait SummarySink {
    fn write_summary(&self, summary: &RunSummary) -> Result<(), SummaryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> RunSummary {
        RunSummary {
            run_id: Uuid::now_v7(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            initial: ResourceCounts::new(2, 2, 7),
            remaining: ResourceCounts::new(0, 0, 1),
            parties_dispatched: 2,
            slots: vec![
                SlotSummary {
                    index: 0,
                    parties_served: 1,
                    seconds_served: 4,
                },
                SlotSummary {
                    index: 1,
                    parties_served: 1,
                    seconds_served: 6,
                },
            ],
        }
    }

    #[test]
    fn test_totals() {
        let summary = summary();
        assert_eq!(summary.total_parties(), 2);
        assert_eq!(summary.total_seconds(), 10);
    }

    #[test]
    fn test_serializes_slots_in_order() {
        let json = serde_json::to_value(summary()).unwrap();
        assert_eq!(json["slots"][0]["index"], 0);
        assert_eq!(json["slots"][1]["seconds_served"], 6);
        assert_eq!(json["remaining"]["dps"], 1);
    }
}
