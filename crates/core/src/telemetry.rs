// Telemetry Module
//
// Log initialization shared by the binaries. Diagnostics go to stderr so the
// console event stream on stdout stays readable.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

// ============================================================================
// Telemetry Configuration
// ============================================================================

/// Configuration for logging
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name recorded at startup
    pub service_name: String,
    /// Whether to enable console logging
    pub enable_console: bool,
    /// Log filter (e.g., "info", "debug", "lfg_core=trace")
    pub log_filter: Option<String>,
    /// Whether to print ANSI colors
    pub ansi: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "lfg".to_string(),
            enable_console: true,
            log_filter: None,
            ansi: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `LFG_SERVICE_NAME`: Service name (default: "lfg")
    /// - `RUST_LOG` or `LOG_LEVEL`: Log filter
    /// - `NO_COLOR`: Disable ANSI colors when set
    pub fn from_env() -> Self {
        Self {
            service_name: std::env::var("LFG_SERVICE_NAME").unwrap_or_else(|_| "lfg".to_string()),
            enable_console: true,
            log_filter: std::env::var("RUST_LOG")
                .ok()
                .or_else(|| std::env::var("LOG_LEVEL").ok()),
            ansi: std::env::var_os("NO_COLOR").is_none(),
        }
    }

    /// Build the filter, falling back to "info" when unset or unparsable
    pub fn env_filter(&self) -> EnvFilter {
        self.log_filter
            .as_ref()
            .and_then(|f| EnvFilter::try_new(f).ok())
            .unwrap_or_else(|| EnvFilter::new("info"))
    }
}

// ============================================================================
// Initialization
// ============================================================================

/// Install the global subscriber
///
/// Calling it again after a subscriber is installed is a no-op.
pub fn init_telemetry(config: TelemetryConfig) {
    let console_layer = if config.enable_console {
        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(config.ansi)
                .with_filter(config.env_filter()),
        )
    } else {
        None
    };

    if tracing_subscriber::registry()
        .with(console_layer)
        .try_init()
        .is_ok()
    {
        tracing::debug!(service = %config.service_name, "Telemetry initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "lfg");
        assert!(config.enable_console);
        assert!(config.log_filter.is_none());
    }

    #[test]
    fn test_invalid_filter_falls_back_to_info() {
        let config = TelemetryConfig {
            log_filter: Some("lfg_core=verbose".to_string()),
            ..Default::default()
        };
        assert_eq!(config.env_filter().to_string(), "info");
    }
}
