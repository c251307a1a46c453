// ── Domain model ──
//
// Plain data types shared by the controller, the advisory boundary,
// and observers. Nothing here schedules or performs I/O.

pub mod advice;
pub mod endpoint;
pub mod phase;
pub mod session;
pub mod traffic;

pub use advice::{
    AdviceOrigin, AdviceState, Advisory, FALLBACK_ADVICE, IDLE_ADVICE, PENDING_ADVICE,
};
pub use endpoint::{Coordinates, Endpoint, EndpointId};
pub use phase::{ConnectionPhase, PhaseTrigger};
pub use session::Session;
pub use traffic::{TrafficReading, TrafficSample, TrafficWindow};
