// ── Core error types ──
//
// User-facing errors from crimson-core. The connection cycle itself is
// infallible; these cover the edges: unknown endpoints, malformed
// catalogs and configuration, and a controller that has shut down.
// Advisory failures never show up here -- the advisor converts them
// into fallback text before they reach the controller.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Selection errors ─────────────────────────────────────────────
    #[error("Unknown endpoint: {id}")]
    UnknownEndpoint { id: String },

    // ── Catalog errors ───────────────────────────────────────────────
    #[error("Invalid server catalog: {reason}")]
    InvalidCatalog { reason: String },

    // ── Lifecycle errors ─────────────────────────────────────────────
    #[error("Controller has stopped")]
    ControllerStopped,

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────
//
// Only reachable while building an advisor (bad CA file, unusable key).
// Request-time errors are absorbed by the advisor itself.

impl From<crimson_api::Error> for CoreError {
    fn from(err: crimson_api::Error) -> Self {
        match err {
            crimson_api::Error::Authentication { message } => CoreError::Config {
                message: format!("advisor credentials rejected: {message}"),
            },
            crimson_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid advisor URL: {e}"),
            },
            crimson_api::Error::Tls(msg) => CoreError::Config {
                message: format!("advisor TLS setup failed: {msg}"),
            },
            other => CoreError::Config {
                message: other.to_string(),
            },
        }
    }
}
