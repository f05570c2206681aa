//! # ragkit-telemetry
//!
//! Logging setup shared by the ragkit crates and demos.
//!
//! Library crates only emit `tracing` events; binaries pick a subscriber here:
//!
//! - [`init_telemetry`] - human-readable output
//! - [`init_json_telemetry`] - one JSON object per line
//! - [`init_with_capture`] - text output plus an in-memory [`EventCapture`]
//!
//! The filter comes from `RUST_LOG` and defaults to `info`.

pub mod capture;

pub use capture::{CapturedEvent, EventCapture};

use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Default filter directive when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global subscriber was already installed.
    #[error("Telemetry initialization failed: {0}")]
    InitError(String),
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install a human-readable global subscriber.
pub fn init_telemetry(service_name: &str) -> Result<(), TelemetryError> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_target(true))
        .try_init()
        .map_err(|e| TelemetryError::InitError(e.to_string()))?;

    tracing::info!(service.name = service_name, "telemetry initialized");
    Ok(())
}

/// Install a global subscriber that writes JSON lines.
pub fn init_json_telemetry(service_name: &str) -> Result<(), TelemetryError> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().json().with_current_span(true))
        .try_init()
        .map_err(|e| TelemetryError::InitError(e.to_string()))?;

    tracing::info!(service.name = service_name, "telemetry initialized");
    Ok(())
}

/// Install a human-readable global subscriber that also records every event
/// into `capture`.
pub fn init_with_capture(service_name: &str, capture: EventCapture) -> Result<(), TelemetryError> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_target(true))
        .with(capture)
        .try_init()
        .map_err(|e| TelemetryError::InitError(e.to_string()))?;

    tracing::info!(service.name = service_name, "telemetry initialized");
    Ok(())
}
