// ── Advisory text as seen by observers ──

use serde::{Deserialize, Serialize};
use strum::Display;

use super::endpoint::EndpointId;

/// Returned whenever the advisory service cannot produce text.
pub const FALLBACK_ADVICE: &str =
    "Ensure Multi-Hop is enabled for maximum privacy when connecting to high-load servers.";

/// Shown while a fetch for the selected endpoint is outstanding.
pub const PENDING_ADVICE: &str = "Analyzing server security...";

/// Shown before any fetch has been issued.
pub const IDLE_ADVICE: &str = "Initializing security protocols...";

/// Where a piece of advisory text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AdviceOrigin {
    /// Produced by the model.
    Generated,
    /// Substituted after a failed or unavailable request.
    Fallback,
}

/// Result of one advisory request. Never an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    pub text: String,
    pub origin: AdviceOrigin,
}

impl Advisory {
    pub fn generated(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: AdviceOrigin::Generated,
        }
    }

    pub fn fallback() -> Self {
        Self {
            text: FALLBACK_ADVICE.to_owned(),
            origin: AdviceOrigin::Fallback,
        }
    }
}

/// Advice slot of the state record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AdviceState {
    #[default]
    Idle,
    Pending {
        endpoint: EndpointId,
    },
    Ready {
        endpoint: EndpointId,
        text: String,
        origin: AdviceOrigin,
    },
}

impl AdviceState {
    /// Text a dashboard would render for this slot.
    pub fn display_text(&self) -> &str {
        match self {
            Self::Idle => IDLE_ADVICE,
            Self::Pending { .. } => PENDING_ADVICE,
            Self::Ready { text, .. } => text,
        }
    }

    /// Endpoint this advice belongs to, if any fetch has been issued.
    pub fn endpoint(&self) -> Option<&EndpointId> {
        match self {
            Self::Idle => None,
            Self::Pending { endpoint } | Self::Ready { endpoint, .. } => Some(endpoint),
        }
    }

    pub fn is_ready_for(&self, id: &EndpointId) -> bool {
        matches!(self, Self::Ready { endpoint, .. } if endpoint == id)
    }
}
