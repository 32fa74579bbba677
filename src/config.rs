//! Runtime configuration and logging setup

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive that overrides `log_level`
pub const LOG_ENV_VAR: &str = "MAC_ACCESSIBILITY_CHECK_LOG";

/// Logging level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub log_level: LogLevel,
    /// How often `watch` re-reads the permission state
    pub poll_interval: Duration,
}

impl Config {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Build the log filter, preferring `MAC_ACCESSIBILITY_CHECK_LOG` when set.
pub fn log_filter(config: &Config) -> EnvFilter {
    let fallback = tracing::Level::from(config.log_level).to_string().to_lowercase();
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Initialize logging to stderr (ignored if already initialized)
pub fn init_logging(config: &Config) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(log_filter(config))
        .with_writer(std::io::stderr)
        .try_init();
}
