//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a stable exit code.

use miette::Diagnostic;
use thiserror::Error;

use crimson_config::ConfigError;
use crimson_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Lookup ───────────────────────────────────────────────────────
    #[error("No endpoint with id '{identifier}'")]
    #[diagnostic(
        code(crimson::not_found),
        help("Run `crimson servers list` to see available endpoints.")
    )]
    NotFound { identifier: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid {field}: {reason}")]
    #[diagnostic(code(crimson::validation))]
    Validation { field: String, reason: String },

    // ── Config ───────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(crimson::config),
        help("Check {path}, or run `crimson config init` to start over.")
    )]
    Config { message: String, path: String },

    #[error("No API key for the advisory service")]
    #[diagnostic(
        code(crimson::no_credentials),
        help(
            "Set GEMINI_API_KEY, or run `crimson config set-api-key`.\n\
             Without a key the advisor runs offline with stock guidance."
        )
    )]
    NoCredentials,

    #[error("System keyring unavailable: {reason}")]
    #[diagnostic(
        code(crimson::keyring),
        help("Use `crimson config set-api-key --plaintext` to store the key in the config file.")
    )]
    Keyring { reason: String },

    // ── Runtime ──────────────────────────────────────────────────────
    #[error("The session controller stopped unexpectedly")]
    #[diagnostic(code(crimson::controller_stopped), help("Re-run with -vv for details."))]
    ControllerStopped,

    #[error("Internal error: {0}")]
    #[diagnostic(code(crimson::internal))]
    Internal(String),

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(crimson::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnknownEndpoint { id } => CliError::NotFound { identifier: id },
            CoreError::InvalidCatalog { reason } => CliError::Validation {
                field: "servers".into(),
                reason,
            },
            CoreError::Config { message } => CliError::Config {
                message,
                path: crimson_config::config_path().display().to_string(),
            },
            CoreError::ControllerStopped => CliError::ControllerStopped,
            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials => CliError::NoCredentials,
            ConfigError::Keyring(reason) => CliError::Keyring { reason },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
                path: crimson_config::config_path().display().to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_endpoint_is_not_found() {
        let err = CliError::from(CoreError::UnknownEndpoint { id: "99".into() });
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
        assert_eq!(err.to_string(), "No endpoint with id '99'");
    }

    #[test]
    fn validation_is_a_usage_error() {
        let err = CliError::from(ConfigError::Validation {
            field: "connection.window_capacity".into(),
            reason: "must be at least 1".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }

    #[test]
    fn stopped_controller_is_general() {
        assert_eq!(
            CliError::from(CoreError::ControllerStopped).exit_code(),
            exit_code::GENERAL
        );
    }
}
