//! # Logging Setup
//!
//! `tracing-subscriber` initialization for the binary. Logs go to stderr so
//! the `--json` report on stdout stays machine-readable.
//!
//! Filter precedence: `--log-level` / `QC_LOG_LEVEL`, then `RUST_LOG`, then
//! `info`.

use std::io::{self, IsTerminal};

use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Logging options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogConfig {
    /// Filter directive, e.g. `info` or `qc_bootstrap=debug`.
    pub level: Option<String>,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

/// Logging initialization errors.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Filter directive could not be parsed.
    #[error("invalid log filter {directive:?}: {reason}")]
    Filter { directive: String, reason: String },

    /// A global subscriber is already installed.
    #[error("failed to install subscriber: {0}")]
    Init(String),
}

impl LogConfig {
    /// Build the filter for this config.
    pub fn env_filter(&self) -> Result<EnvFilter, TelemetryError> {
        match self.level.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
            Some(directive) => EnvFilter::try_new(directive).map_err(|e| TelemetryError::Filter {
                directive: directive.to_string(),
                reason: e.to_string(),
            }),
            None => EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_LEVEL))
                .map_err(|e| TelemetryError::Filter {
                    directive: DEFAULT_LOG_LEVEL.to_string(),
                    reason: e.to_string(),
                }),
        }
    }
}

/// Color codes only when stderr is a terminal and `NO_COLOR` is unset.
fn use_ansi(stderr_is_terminal: bool) -> bool {
    stderr_is_terminal && std::env::var_os("NO_COLOR").map_or(true, |v| v.is_empty())
}

/// Install the global subscriber.
pub fn init_logging(config: &LogConfig) -> Result<(), TelemetryError> {
    let env_filter = config.env_filter()?;

    if config.json {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(io::stderr)
            .with_target(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()
            .map_err(|e| TelemetryError::Init(e.to_string()))
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
            .with_ansi(use_ansi(io::stderr().is_terminal()));

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::Init(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_level_parses() {
        let config = LogConfig {
            level: Some("qc_bootstrap=debug,reqwest=warn".to_string()),
            json: false,
        };
        assert!(config.env_filter().is_ok());
    }

    #[test]
    fn test_invalid_level_rejected() {
        let config = LogConfig {
            level: Some("qc_bootstrap=notalevel".to_string()),
            json: false,
        };
        assert!(matches!(
            config.env_filter(),
            Err(TelemetryError::Filter { .. })
        ));
    }

    #[test]
    fn test_blank_level_falls_back() {
        let config = LogConfig {
            level: Some("   ".to_string()),
            json: true,
        };
        assert!(config.env_filter().is_ok());
    }

    #[test]
    fn test_no_ansi_when_stderr_redirected() {
        assert!(!use_ansi(false));
    }
}
