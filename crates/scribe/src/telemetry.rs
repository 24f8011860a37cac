//! Logging setup for the scribe CLI.
//!
//! Logs go to stderr so stdout carries only command output.

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a stderr `fmt` subscriber filtered by `log_level`.
///
/// An unparseable directive falls back to `info` rather than failing the run.
pub fn init(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|err| {
        eprintln!("invalid log level '{}' ({}), using info", log_level, err);
        EnvFilter::new("info")
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()?;

    Ok(())
}
