//! Connection lifecycle and dashboard state for CrimsonGuard.
//!
//! This crate owns the domain model and the reactive state record that
//! front ends (the `crimson` CLI today) observe and drive:
//!
//! - **[`Controller`]** — Cheap-to-clone facade over a single-writer event
//!   loop. [`toggle()`](Controller::toggle) walks the four-phase connection
//!   cycle, [`select()`](Controller::select) changes the endpoint and kicks
//!   off a fresh advisory fetch. Timed transitions and traffic sampling run
//!   inside the loop.
//!
//! - **[`Snapshot`] / [`StateStream`]** — Immutable views of the state record
//!   published over a `tokio::sync::watch` channel, plus discrete [`Event`]s
//!   over `broadcast`.
//!
//! - **[`Advisor`]** — Boundary to the generative advisory service.
//!   [`GeminiAdvisor`] talks to the Generative Language API through
//!   `crimson-api`; [`OfflineAdvisor`] always yields the fallback text.
//!   Failures never surface as errors, and stale results are discarded by
//!   generation.
//!
//! - **[`TrafficSource`]** — The only source of randomness: session
//!   addresses and bandwidth readings. [`SyntheticTraffic`] draws them from
//!   a seeded RNG.
//!
//! - **Domain model** ([`model`]) — `Endpoint`, `ConnectionPhase`,
//!   `Session`, `TrafficSample`, and advice types.

pub mod advisory;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod sampler;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use advisory::{
    Advisor, AdvisoryRequest, FALLBACK_REASONING, GeminiAdvisor, OfflineAdvisor, Recommendation,
    build_advisor,
};
pub use catalog::Catalog;
pub use config::{AdvisorConfig, ControllerConfig, RateRange, TlsVerification, TrafficProfile};
pub use controller::{Command, CommandResult, Controller, Event, Snapshot, ToggleOutcome};
pub use error::CoreError;
pub use sampler::{SyntheticTraffic, TrafficSource};
pub use stream::{EndpointFilter, StateStream};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    AdviceOrigin, AdviceState, Advisory, ConnectionPhase, Coordinates, Endpoint, EndpointId,
    FALLBACK_ADVICE, PENDING_ADVICE, PhaseTrigger, Session, TrafficReading, TrafficSample,
    TrafficWindow,
};
