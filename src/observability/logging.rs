//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global tracing subscriber
//! - Configure the level from config, overridable via `RUST_LOG`
//!
//! # Design Decisions
//! - Uses the tracing crate for structured logging
//! - JSON format for machine consumption, pretty format for development
//! - Logs go to stderr so rendered output on stdout stays clean

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Install the global subscriber. Fails if one is already installed.
pub fn init(config: &ObservabilityConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()?,
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?,
    }
    Ok(())
}
