//! # Structured Logging
//!
//! Initializes the `tracing` subscriber for the console: `RUST_LOG`-driven
//! filtering, pretty or JSON output, everything on stderr. Stdout stays
//! reserved for the console's own output (snapshot summaries piped into
//! other tools).

use clap::ValueEnum;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format, selected with `--log-format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable output for a terminal.
    Pretty,
    /// JSON lines for log aggregation.
    Json,
}

/// Initializes the global tracing subscriber. Call once, before any other
/// work; a second call panics.
///
/// `default_filter` applies when `RUST_LOG` is unset, e.g.
/// `"landmark_node=info,landmark_ledger=info"`. When set, `RUST_LOG`
/// wins, with the usual `EnvFilter` directive syntax.
pub fn init_logging(default_filter: &str, format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let layer = fmt::layer().with_writer(std::io::stderr).with_target(true);

    match format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(layer.with_file(true).with_line_number(true))
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .init(),
    }

    tracing::debug!(?format, "logging initialized");
}
