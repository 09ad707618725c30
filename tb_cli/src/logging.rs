//! Structured logging configuration.
//!
//! Installs a `tracing` subscriber for the CLI. Records emitted by the
//! library through the `log` facade are picked up by the subscriber's
//! `tracing-log` bridge.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var and default to
/// `info,sqlx=warn`. Output goes to stderr so command output on stdout stays
/// machine readable.
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::debug!("Structured logging initialized");
}

/// Log a bracket operation with structured fields
///
/// # Arguments
///
/// * `operation` - Operation name (e.g. `generate`, `score`)
/// * `tournament_id` - Tournament the operation ran against, if known
/// * `duration_ms` - Duration in milliseconds
pub fn log_bracket_operation(operation: &str, tournament_id: Option<&str>, duration_ms: u64) {
    tracing::debug!(
        operation = operation,
        tournament_id = tournament_id,
        duration_ms = duration_ms,
        "Bracket operation"
    );

    if duration_ms > 1000 {
        tracing::warn!(
            operation = operation,
            tournament_id = tournament_id,
            duration_ms = duration_ms,
            "Slow bracket operation"
        );
    }
}
