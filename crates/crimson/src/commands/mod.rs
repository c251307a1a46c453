//! Command dispatch: bridges CLI args -> controller calls -> output formatting.

pub mod advise;
pub mod config_cmd;
pub mod connect;
pub mod recommend;
pub mod servers;
pub mod util;

use crimson_core::Controller;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a controller-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Advise(args) => advise::handle(controller, args, global).await,
        Command::Recommend => recommend::handle(controller, global).await,
        Command::Connect(args) => connect::handle(controller, args, global).await,
        // Handled before a controller is started
        Command::Servers(_) | Command::Config(_) | Command::Completions(_) => Err(
            CliError::Internal("command does not need a controller".into()),
        ),
    }
}
