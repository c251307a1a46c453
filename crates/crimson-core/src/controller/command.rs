// ── Command API ──
//
// State mutations flow through a `Command` enum sent to the controller
// loop. Each envelope carries a oneshot channel for the result, so
// callers observe the outcome without touching the state record.

use std::sync::Arc;

use tokio::sync::oneshot;

use super::state::ToggleOutcome;
use crate::error::CoreError;
use crate::model::{Endpoint, EndpointId};

/// A command envelope sent through the command channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: oneshot::Sender<Result<CommandResult, CoreError>>,
}

/// Every mutation the controller accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Connect when disconnected, disconnect when connected.
    Toggle,
    /// Change the selected endpoint and fetch fresh advice for it.
    SelectEndpoint { id: EndpointId },
}

/// Result of a successfully routed command.
#[derive(Debug, Clone)]
pub enum CommandResult {
    Toggled(ToggleOutcome),
    Selected(Arc<Endpoint>),
}
