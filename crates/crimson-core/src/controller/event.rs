// ── Discrete change notifications ──
//
// The snapshot channel only ever holds the latest state; these events
// let observers see every individual step (each sample, each phase).

use serde::Serialize;
use uuid::Uuid;

use crate::model::{AdviceOrigin, ConnectionPhase, EndpointId, Session, TrafficSample};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    PhaseChanged {
        from: ConnectionPhase,
        to: ConnectionPhase,
    },
    /// A toggle arrived during a timed transition and was dropped.
    ToggleIgnored { phase: ConnectionPhase },
    SessionOpened { session: Session },
    SessionClosed { id: Uuid },
    SampleRecorded { sample: TrafficSample },
    SelectionChanged { endpoint: EndpointId },
    AdviceUpdated {
        endpoint: EndpointId,
        origin: AdviceOrigin,
    },
}
