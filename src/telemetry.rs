//! Structured logging and domain events.
//!
//! Thin layer over `tracing`: hosts call [`init`] once, hold the returned
//! guard for the process lifetime, and the rest of the crate emits events
//! through the free functions here. Logging is purely observational: the
//! pipeline never changes behavior based on whether a log line was written,
//! and nothing here returns an error to the hot path.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Handle returned by [`init`]. Dropping it is the shutdown half of the
/// lifecycle; keep it alive for as long as events should be recorded.
pub struct TelemetryGuard {
    _private: (),
}

/// Install the global subscriber.
///
/// The filter honors `RUST_LOG` when set and falls back to the configured
/// level otherwise. Calling `init` twice is an error (one lifecycle per
/// process).
pub fn init(config: &LoggingConfig) -> Result<TelemetryGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    tracing::info!(
        service = %config.service_name,
        event = "telemetry_initialized",
        "logging initialized"
    );

    Ok(TelemetryGuard { _private: () })
}

/// Record one question/answer exchange.
pub fn chat_interaction(question: &str, answer: &str, elapsed_ms: u128) {
    tracing::info!(
        event = "chat_interaction",
        timestamp = %chrono::Utc::now().to_rfc3339(),
        question_chars = question.chars().count(),
        answer_chars = answer.chars().count(),
        elapsed_ms,
        question,
        "chat interaction"
    );
}

/// Record a lifecycle or maintenance event (startup, reindex, reset).
pub fn system_event(kind: &str, message: &str) {
    tracing::info!(
        event = "system_event",
        timestamp = %chrono::Utc::now().to_rfc3339(),
        kind,
        message,
        "system event"
    );
}
