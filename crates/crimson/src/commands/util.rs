//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use bytesize::ByteSize;
use indicatif::{ProgressBar, ProgressStyle};

use crimson_core::{Catalog, Endpoint, EndpointId};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

/// Look up an endpoint by id, mapping a miss to `NotFound`.
pub fn resolve_endpoint(catalog: &Catalog, identifier: &str) -> Result<Arc<Endpoint>, CliError> {
    let id = EndpointId::from(identifier);
    catalog.get(&id).cloned().ok_or_else(|| CliError::NotFound {
        identifier: id.to_string(),
    })
}

/// Spinner on stderr while waiting on the advisor. Hidden when stderr is
/// not a terminal, in quiet mode, or for machine-readable output.
pub fn spinner(message: &str, global: &GlobalOpts) -> ProgressBar {
    let interactive = std::io::stderr().is_terminal()
        && !global.quiet
        && matches!(global.output, OutputFormat::Table);
    if !interactive {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.to_owned());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

pub fn format_bytes(bytes: u64) -> String {
    ByteSize::b(bytes).to_string()
}

/// Whole-second duration, e.g. `1m 5s`.
pub fn format_elapsed(elapsed: Duration) -> String {
    humantime::format_duration(Duration::from_secs(elapsed.as_secs())).to_string()
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}
