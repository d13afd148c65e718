// LFG CLI
//
// Design Decision: Use clap derive for ergonomic argument parsing.
// Design Decision: Every flag has an environment fallback so runs can be scripted.
// Design Decision: Console lines go to stdout; diagnostics go to stderr through tracing.

mod output;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use lfg_core::telemetry::{init_telemetry, TelemetryConfig};
use lfg_core::{EventSink, RunOptions, Simulation, SimulationConfig, TracingSink};

use output::{ConsoleSink, FileSummaryWriter, SummaryFormat};

#[derive(Parser)]
#[command(name = "lfg")]
#[command(about = "LFG dungeon queue simulator - forms parties and runs them through instances")]
#[command(version)]
pub struct Cli {
    /// Simulation config file (key=value lines)
    #[arg(long, short, env = "LFG_CONFIG", default_value = "config.txt")]
    pub config: PathBuf,

    /// Where to write the run summary
    #[arg(long, short, env = "LFG_SUMMARY", default_value = "summary.txt")]
    pub summary: PathBuf,

    /// Summary file format
    #[arg(
        long,
        short,
        env = "LFG_FORMAT",
        default_value = "text",
        value_parser = ["text", "json", "yaml"]
    )]
    pub format: String,

    /// Wall-clock milliseconds per simulated second
    #[arg(long, env = "LFG_TIME_UNIT_MS", default_value = "1000")]
    pub time_unit_ms: u64,

    /// Simulated seconds between status reports
    #[arg(long, env = "LFG_MONITOR_INTERVAL", default_value = "2")]
    pub monitor_interval: u32,

    /// Seed for party durations
    #[arg(long, env = "LFG_SEED")]
    pub seed: Option<u64>,

    /// Send events to the log instead of the console
    #[arg(long, short, env = "LFG_QUIET")]
    pub quiet: bool,
}

impl Cli {
    fn run_options(&self) -> RunOptions {
        let options = RunOptions::new()
            .with_time_unit(Duration::from_millis(self.time_unit_ms))
            .with_monitor_interval(self.monitor_interval);
        match self.seed {
            Some(seed) => options.with_seed(seed),
            None => options,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_telemetry(TelemetryConfig::from_env());

    let text = std::fs::read_to_string(&cli.config)
        .with_context(|| format!("failed to read config file {}", cli.config.display()))?;
    let config: SimulationConfig = text
        .parse()
        .with_context(|| format!("invalid config file {}", cli.config.display()))?;

    let sink: Arc<dyn EventSink> = if cli.quiet {
        Arc::new(TracingSink)
    } else {
        Arc::new(ConsoleSink)
    };
    let writer = FileSummaryWriter::new(&cli.summary, SummaryFormat::from_str(&cli.format));

    Simulation::new(config, cli.run_options(), sink)?
        .run_with_summary(&writer)
        .await
        .context("simulation failed")?;

    println!("\nSummary written to {}", writer.path().display());
    Ok(())
}
