//! Process-wide `tracing` subscriber setup.
//!
//! The engine only emits events; embedding processes call [`init_tracing`]
//! once at start-up. The filter defaults to `RUST_LOG`, then `info`.

use crowdsale_types::{Result, SaleError};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive, e.g. `crowdsale_engine=debug,info`.
    pub filter: Option<String>,
    pub format: LogFormat,
    pub with_targets: bool,
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: None,
            format: LogFormat::Text,
            with_targets: true,
            ansi: true,
        }
    }
}

impl LogConfig {
    /// # Errors
    /// `InvalidConfig` for a malformed directive.
    pub fn env_filter(&self) -> Result<EnvFilter> {
        match &self.filter {
            Some(directive) => EnvFilter::try_new(directive)
                .map_err(|e| SaleError::InvalidConfig(format!("log filter {directive:?}: {e}"))),
            None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))),
        }
    }
}

/// Install the global subscriber.
///
/// Returns `Ok(false)` if another subscriber was already installed.
///
/// # Errors
/// `InvalidConfig` for a malformed filter directive.
pub fn init_tracing(config: &LogConfig) -> Result<bool> {
    let filter = config.env_filter()?;
    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.format {
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_target(config.with_targets)
                    .with_ansi(config.ansi),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(config.with_targets))
            .try_init(),
    };
    Ok(installed.is_ok())
}
