//! Simulation configuration
//!
//! [`SimulationConfig`] holds the parameters every run needs and is built from
//! a key-value mapping (`n`, `t`, `h`, `d`, `t1`, `t2`). Validation happens
//! before any shared state exists, so a bad configuration never starts a run.
//!
//! [`RunOptions`] holds the knobs that only affect pacing and reproducibility.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::pool::ResourceCounts;

/// Number of instance slots
pub const KEY_INSTANCES: &str = "n";
/// Tank players
pub const KEY_TANKS: &str = "t";
/// Healer players
pub const KEY_HEALERS: &str = "h";
/// Damage-dealer players
pub const KEY_DPS: &str = "d";
/// Minimum party duration in simulated seconds
pub const KEY_MIN_DURATION: &str = "t1";
/// Maximum party duration in simulated seconds
pub const KEY_MAX_DURATION: &str = "t2";

/// Keys that must be present, in the order they are checked
pub const REQUIRED_KEYS: [&str; 6] = [
    KEY_INSTANCES,
    KEY_TANKS,
    KEY_HEALERS,
    KEY_DPS,
    KEY_MIN_DURATION,
    KEY_MAX_DURATION,
];

/// Configuration errors
///
/// All of them are fatal; the process stops before any task is spawned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required key is absent
    #[error("missing configuration parameter: {0}")]
    MissingKey(&'static str),

    /// A value below zero
    #[error("negative value {value} for '{key}' is not allowed")]
    NegativeValue { key: String, value: i64 },

    /// A value that is not an integer or does not fit
    #[error("invalid value '{value}' for '{key}': expected a non-negative integer")]
    InvalidValue { key: String, value: String },

    /// Minimum duration above the maximum
    #[error("minimum duration {min} must be less than or equal to maximum duration {max}")]
    InvalidDurationRange { min: u32, max: u32 },

    /// No slots to run parties in
    #[error("instance count must be at least 1")]
    NoInstances,
}

/// Parameters of one simulation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of instance slots (`n`)
    pub instance_count: usize,
    /// Tank players (`t`)
    pub tanks: u32,
    /// Healer players (`h`)
    pub healers: u32,
    /// Damage-dealer players (`d`)
    pub dps: u32,
    /// Minimum party duration in simulated seconds (`t1`)
    pub min_duration: u32,
    /// Maximum party duration in simulated seconds (`t2`)
    pub max_duration: u32,
}

impl SimulationConfig {
    pub fn new(instance_count: usize, players: ResourceCounts) -> Self {
        Self {
            instance_count,
            tanks: players.tanks,
            healers: players.healers,
            dps: players.dps,
            min_duration: 1,
            max_duration: 1,
        }
    }

    /// Set the party duration range in simulated seconds
    pub fn with_duration_range(mut self, min: u32, max: u32) -> Self {
        self.min_duration = min;
        self.max_duration = max;
        self
    }

    /// Build a configuration from key-value pairs
    ///
    /// Unknown keys are ignored unless their value is a negative integer,
    /// which is rejected on any line. When a key appears more than once the
    /// last value wins.
    pub fn from_entries<I, K, V>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut values: [Option<u32>; 6] = [None; 6];

        for (key, value) in entries {
            let key = key.as_ref().trim();
            let Some(position) = REQUIRED_KEYS.iter().position(|k| *k == key) else {
                if let Ok(value @ ..=-1) = value.as_ref().trim().parse::<i64>() {
                    return Err(ConfigError::NegativeValue {
                        key: key.to_string(),
                        value,
                    });
                }
                warn!(key, "Ignoring unknown configuration key");
                continue;
            };
            values[position] = Some(parse_value(key, value.as_ref())?);
        }

        let mut fields = [0u32; 6];
        for (position, key) in REQUIRED_KEYS.iter().enumerate() {
            fields[position] = values[position].ok_or(ConfigError::MissingKey(*key))?;
        }
        let [instances, tanks, healers, dps, min_duration, max_duration] = fields;

        let config = Self {
            instance_count: instances as usize,
            tanks,
            healers,
            dps,
            min_duration,
            max_duration,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_duration > self.max_duration {
            return Err(ConfigError::InvalidDurationRange {
                min: self.min_duration,
                max: self.max_duration,
            });
        }
        // Zero slots would leave the dispatcher waiting for a slot forever
        if self.instance_count == 0 {
            return Err(ConfigError::NoInstances);
        }
        Ok(())
    }

    /// Players available at the start of the run
    pub fn initial_players(&self) -> ResourceCounts {
        ResourceCounts::new(self.tanks, self.healers, self.dps)
    }
}

impl FromStr for SimulationConfig {
    type Err = ConfigError;

    /// Parse `key=value` lines
    ///
    /// Blank lines and lines starting with `#` are skipped, as are lines
    /// without an `=`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let entries = s.lines().filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            match line.split_once('=') {
                Some((key, value)) => Some((key.trim(), value.trim())),
                None => {
                    warn!(line, "Skipping malformed configuration line");
                    None
                }
            }
        });

        Self::from_entries(entries)
    }
}

fn parse_value(key: &str, raw: &str) -> Result<u32, ConfigError> {
    let raw = raw.trim();
    let invalid = || ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    };

    let value: i64 = raw.parse().map_err(|_| invalid())?;
    if value < 0 {
        return Err(ConfigError::NegativeValue {
            key: key.to_string(),
            value,
        });
    }
    u32::try_from(value).map_err(|_| invalid())
}

/// Pacing and reproducibility options for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Wall-clock length of one simulated second
    pub time_unit: Duration,

    /// Simulated seconds between monitor status reports
    pub monitor_interval: u32,

    /// Seed for party duration sampling (random when `None`)
    pub seed: Option<u64>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            time_unit: Duration::from_secs(1),
            monitor_interval: 2,
            seed: None,
        }
    }
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the wall-clock length of one simulated second
    pub fn with_time_unit(mut self, unit: Duration) -> Self {
        self.time_unit = unit;
        self
    }

    /// Set the monitor interval in simulated seconds
    pub fn with_monitor_interval(mut self, seconds: u32) -> Self {
        self.monitor_interval = seconds.max(1);
        self
    }

    /// Seed duration sampling for reproducible runs
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Wall-clock duration of `seconds` simulated seconds
    pub fn scaled(&self, seconds: u32) -> Duration {
        self.time_unit.saturating_mul(seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "n=2\nt=2\nh=2\nd=6\nt1=1\nt2=1\n";

    #[test]
    fn test_parse_valid_config() {
        let config: SimulationConfig = VALID.parse().unwrap();
        assert_eq!(config.instance_count, 2);
        assert_eq!(config.initial_players(), ResourceCounts::new(2, 2, 6));
        assert_eq!(config.min_duration, 1);
        assert_eq!(config.max_duration, 1);
    }

    #[test]
    fn test_parse_tolerates_whitespace_comments_and_unknown_keys() {
        let text = "# dungeon setup\n\n n = 3 \nt=1\nh= 1\nd =3\nt1=2\nt2=5\nlabel=weekly\ngarbage line\n";
        let config: SimulationConfig = text.parse().unwrap();
        assert_eq!(config.instance_count, 3);
        assert_eq!(config.min_duration, 2);
        assert_eq!(config.max_duration, 5);
    }

    #[test]
    fn test_last_duplicate_wins() {
        let text = format!("{VALID}n=4\n");
        let config: SimulationConfig = text.parse().unwrap();
        assert_eq!(config.instance_count, 4);
    }

    #[test]
    fn test_missing_key() {
        let err = "n=2\nt=2\nh=2\nd=6\nt1=1\n"
            .parse::<SimulationConfig>()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingKey("t2"));
    }

    #[test]
    fn test_missing_keys_reported_in_order() {
        let err = "t1=1\nt2=1\n".parse::<SimulationConfig>().unwrap_err();
        assert_eq!(err, ConfigError::MissingKey("n"));
    }

    #[test]
    fn test_negative_value() {
        let err = "n=2\nt=-1\nh=2\nd=6\nt1=1\nt2=1\n"
            .parse::<SimulationConfig>()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::NegativeValue {
                key: "t".to_string(),
                value: -1
            }
        );
    }

    #[test]
    fn test_negative_value_on_unknown_key() {
        let text = format!("{VALID}bonus=-3\n");
        let err = text.parse::<SimulationConfig>().unwrap_err();
        assert_eq!(
            err,
            ConfigError::NegativeValue {
                key: "bonus".to_string(),
                value: -3
            }
        );

        // Non-numeric values on unknown keys are still ignored
        let text = format!("{VALID}bonus=lots\n");
        assert!(text.parse::<SimulationConfig>().is_ok());
    }

    #[test]
    fn test_non_integer_value() {
        let err = "n=two\nt=2\nh=2\nd=6\nt1=1\nt2=1\n"
            .parse::<SimulationConfig>()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "n"));
    }

    #[test]
    fn test_value_out_of_range() {
        let err = "n=2\nt=2\nh=2\nd=99999999999\nt1=1\nt2=1\n"
            .parse::<SimulationConfig>()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "d"));
    }

    #[test]
    fn test_inverted_duration_range() {
        let err = "n=2\nt=2\nh=2\nd=6\nt1=5\nt2=1\n"
            .parse::<SimulationConfig>()
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidDurationRange { min: 5, max: 1 });
    }

    #[test]
    fn test_zero_instances_rejected() {
        let err = "n=0\nt=2\nh=2\nd=6\nt1=1\nt2=1\n"
            .parse::<SimulationConfig>()
            .unwrap_err();
        assert_eq!(err, ConfigError::NoInstances);
    }

    #[test]
    fn test_from_entries() {
        let config = SimulationConfig::from_entries([
            ("n", "1"),
            ("t", "1"),
            ("h", "1"),
            ("d", "3"),
            ("t1", "2"),
            ("t2", "2"),
        ])
        .unwrap();
        assert_eq!(
            config,
            SimulationConfig::new(1, ResourceCounts::new(1, 1, 3)).with_duration_range(2, 2)
        );
    }

    #[test]
    fn test_run_options_builder() {
        let options = RunOptions::new()
            .with_time_unit(Duration::from_millis(10))
            .with_monitor_interval(0)
            .with_seed(7);

        assert_eq!(options.time_unit, Duration::from_millis(10));
        assert_eq!(options.monitor_interval, 1);
        assert_eq!(options.seed, Some(7));
        assert_eq!(options.scaled(3), Duration::from_millis(30));
    }

    #[test]
    fn test_default_run_options() {
        let options = RunOptions::default();
        assert_eq!(options.time_unit, Duration::from_secs(1));
        assert_eq!(options.monitor_interval, 2);
        assert_eq!(options.seed, None);
    }
}
