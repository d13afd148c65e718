// Output formatting for CLI

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::Local;
use lfg_core::{
    EventSink, ResourceCounts, RunSummary, SimulationEvent, SnapshotSource, StatusSnapshot,
    SummaryError, SummarySink,
};

const SUMMARY_BANNER: &str = "--------------------------------------\n D  U  N  G  E  O  N      S  T  A  T  S \n--------------------------------------\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryFormat {
    Text,
    Json,
    Yaml,
}

impl SummaryFormat {
    pub fn from_str(s: &str) -> Self {
        match s {
            "json" => SummaryFormat::Json,
            "yaml" => SummaryFormat::Yaml,
            _ => SummaryFormat::Text,
        }
    }
}

// ============================================
// Console
// ============================================

/// Prints simulation events to stdout with local timestamps
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl EventSink for ConsoleSink {
    fn emit(&self, event: &SimulationEvent) {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        if let Some(text) = render_event(event, &timestamp) {
            print!("{text}");
        }
    }
}

/// Console text for one event; instances are numbered from 1
pub fn render_event(event: &SimulationEvent, timestamp: &str) -> Option<String> {
    match event {
        SimulationEvent::SlotActive { slot, duration } => Some(format!(
            "\n[{timestamp}] Instance {}: active for {duration} seconds.\n",
            slot + 1
        )),
        SimulationEvent::SlotEmpty { slot } => {
            Some(format!("\n[{timestamp}] Instance {}: now empty.\n", slot + 1))
        }
        SimulationEvent::StatusReport { source, snapshot } => {
            let lead = match source {
                SnapshotSource::Monitor => "\n",
                SnapshotSource::Completion => "",
            };
            Some(format!(
                "{lead}[{timestamp}] [INSTANCE STATUS]\n{}",
                render_status(snapshot)
            ))
        }
        SimulationEvent::Drained { remaining, .. } => Some(format!(
            "\n[{timestamp}] No more parties can be formed. Left in queue: {}.\n",
            render_players(remaining)
        )),
        SimulationEvent::PartyDispatched { .. } => None,
    }
}

fn render_status(snapshot: &StatusSnapshot) -> String {
    snapshot.slots.iter().fold(String::new(), |mut out, slot| {
        let status = if slot.active { "ACTIVE" } else { "EMPTY" };
        let _ = writeln!(out, "Instance {}: {status}", slot.index + 1);
        out
    })
}

fn render_players(players: &ResourceCounts) -> String {
    format!(
        "{} tanks, {} healers, {} DPS",
        players.tanks, players.healers, players.dps
    )
}

// ============================================
// Summary file
// ============================================

/// Writes the run summary to a file
pub struct FileSummaryWriter {
    path: PathBuf,
    format: SummaryFormat,
}

impl FileSummaryWriter {
    pub fn new(path: impl Into<PathBuf>, format: SummaryFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SummarySink for FileSummaryWriter {
    fn write_summary(&self, summary: &RunSummary) -> Result<(), SummaryError> {
        let contents = render_summary(summary, self.format)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

pub fn render_summary(summary: &RunSummary, format: SummaryFormat) -> Result<String, SummaryError> {
    match format {
        SummaryFormat::Json => serde_json::to_string_pretty(summary)
            .map_err(|e| SummaryError::Serialize(e.to_string())),
        SummaryFormat::Yaml => {
            serde_yaml::to_string(summary).map_err(|e| SummaryError::Serialize(e.to_string()))
        }
        SummaryFormat::Text => {
            let mut out = String::from(SUMMARY_BANNER);
            for slot in &summary.slots {
                let _ = writeln!(
                    out,
                    "Instance{} served {} parties for a total of {} seconds.",
                    slot.index + 1,
                    slot.parties_served,
                    slot.seconds_served
                );
            }
            let _ = writeln!(out, "\nLeft in queue: {}.", render_players(&summary.remaining));
            Ok(out)
        }
    }
}
