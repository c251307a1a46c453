// ── The state record ──
//
// One owned struct holding phase, session, traffic window, selection,
// and advice. Only the controller loop mutates it; observers see
// immutable `Snapshot`s. Every method here is synchronous so the
// transition rules can be exercised without a runtime.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::Catalog;
use crate::error::CoreError;
use crate::model::{
    AdviceState, Advisory, ConnectionPhase, Endpoint, EndpointId, PhaseTrigger, Session,
    TrafficSample, TrafficWindow,
};
use crate::sampler::TrafficSource;

/// Result of a toggle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ToggleOutcome {
    Accepted {
        from: ConnectionPhase,
        to: ConnectionPhase,
    },
    /// A timed transition is in progress; nothing changed.
    Ignored { phase: ConnectionPhase },
}

/// Immutable view of the state record at one revision.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// Bumped on every published change.
    pub revision: u64,
    pub phase: ConnectionPhase,
    pub session: Option<Session>,
    /// Oldest first.
    pub traffic: Vec<TrafficSample>,
    pub selected: Arc<Endpoint>,
    pub advice: AdviceState,
}

impl Snapshot {
    pub fn advice_text(&self) -> &str {
        self.advice.display_text()
    }
}

#[derive(Debug)]
pub(crate) struct DashboardState {
    catalog: Catalog,
    phase: ConnectionPhase,
    session: Option<Session>,
    window: TrafficWindow,
    selected: Arc<Endpoint>,
    advice: AdviceState,
    revision: u64,
}

impl DashboardState {
    pub(crate) fn new(catalog: Catalog, window_capacity: usize) -> Self {
        let selected = Arc::clone(catalog.first());
        Self {
            catalog,
            phase: ConnectionPhase::Disconnected,
            session: None,
            window: TrafficWindow::new(window_capacity),
            selected,
            advice: AdviceState::Idle,
            revision: 0,
        }
    }

    pub(crate) fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub(crate) fn selected(&self) -> &Arc<Endpoint> {
        &self.selected
    }

    pub(crate) fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn window(&self) -> &TrafficWindow {
        &self.window
    }

    // ── Phase cycle ──────────────────────────────────────────────────

    /// Apply a user toggle. Ignored while a timed transition is running.
    pub(crate) fn toggle(&mut self) -> ToggleOutcome {
        let from = self.phase;
        match from.next(PhaseTrigger::Toggle) {
            Some(to) => {
                self.phase = to;
                ToggleOutcome::Accepted { from, to }
            }
            None => ToggleOutcome::Ignored { phase: from },
        }
    }

    /// Complete the outstanding timed transition.
    ///
    /// Entering `Connected` opens a session against the current
    /// selection; entering `Disconnected` destroys it and empties the
    /// window. Returns the new phase, or `None` if no timed transition
    /// was pending.
    pub(crate) fn complete_transition(
        &mut self,
        now: DateTime<Utc>,
        source: &mut dyn TrafficSource,
    ) -> Option<ConnectionPhase> {
        let to = self.phase.next(PhaseTrigger::TimerElapsed)?;
        match to {
            ConnectionPhase::Connected => {
                let address = source.assign_address(&self.selected);
                self.window.clear();
                self.session = Some(Session::open(self.selected.id.clone(), address, now));
            }
            ConnectionPhase::Disconnected => {
                self.session = None;
                self.window.clear();
            }
            ConnectionPhase::Connecting | ConnectionPhase::Disconnecting => {}
        }
        self.phase = to;
        Some(to)
    }

    // ── Traffic ──────────────────────────────────────────────────────

    /// Append a sample. Refused unless connected with a live session.
    pub(crate) fn record_sample(&mut self, sample: TrafficSample, period: Duration) -> bool {
        if !self.phase.is_connected() {
            return false;
        }
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        session.record(&sample, period);
        self.window.push(sample);
        true
    }

    // ── Selection and advice ─────────────────────────────────────────

    /// Point the selection at `id`. Phase and session are untouched.
    pub(crate) fn select(&mut self, id: &EndpointId) -> Result<Arc<Endpoint>, CoreError> {
        let endpoint = Arc::clone(self.catalog.require(id)?);
        self.selected = Arc::clone(&endpoint);
        Ok(endpoint)
    }

    pub(crate) fn advice_pending(&mut self, endpoint: EndpointId) {
        self.advice = AdviceState::Pending { endpoint };
    }

    pub(crate) fn advice_ready(&mut self, endpoint: EndpointId, advisory: Advisory) {
        self.advice = AdviceState::Ready {
            endpoint,
            text: advisory.text,
            origin: advisory.origin,
        };
    }

    // ── Publication ──────────────────────────────────────────────────

    pub(crate) fn snapshot(&mut self) -> Snapshot {
        self.revision = self.revision.wrapping_add(1);
        Snapshot {
            revision: self.revision,
            phase: self.phase,
            session: self.session.clone(),
            traffic: self.window.to_vec(),
            selected: Arc::clone(&self.selected),
            advice: self.advice.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;
    use crate::model::{AdviceOrigin, Endpoint, TrafficReading};

    /// Fixed address, constant readings.
    struct Scripted;

    impl TrafficSource for Scripted {
        fn assign_address(&mut self, _endpoint: &Endpoint) -> Ipv4Addr {
            Ipv4Addr::new(185, 0, 0, 12)
        }

        fn sample(&mut self) -> TrafficReading {
            TrafficReading {
                upload_mbps: 2.0,
                download_mbps: 10.0,
            }
        }
    }

    fn state() -> DashboardState {
        DashboardState::new(Catalog::builtin().unwrap(), 20)
    }

    fn tick(state: &mut DashboardState) -> bool {
        let sample = TrafficSample::new(Utc::now(), Scripted.sample());
        state.record_sample(sample, Duration::from_secs(1))
    }

    fn connect(state: &mut DashboardState) {
        state.toggle();
        state.complete_transition(Utc::now(), &mut Scripted);
    }

    #[test]
    fn starts_disconnected_with_first_endpoint_selected() {
        let s = state();
        assert_eq!(s.phase(), ConnectionPhase::Disconnected);
        assert_eq!(s.selected().id.as_str(), "1");
        assert!(s.session().is_none());
    }

    #[test]
    fn toggle_sequence_never_skips_a_phase() {
        let mut s = state();
        let mut phases = vec![s.phase()];
        // Three toggles per timer, so most of them land on transitional phases.
        for _ in 0..4 {
            for _ in 0..3 {
                s.toggle();
                phases.push(s.phase());
            }
            s.complete_transition(Utc::now(), &mut Scripted);
            phases.push(s.phase());
        }
        for pair in phases.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            assert!(
                a == b
                    || a.next(PhaseTrigger::Toggle) == Some(b)
                    || a.next(PhaseTrigger::TimerElapsed) == Some(b),
                "illegal transition {a} -> {b}"
            );
        }
    }

    #[test]
    fn toggle_ignored_while_transitional() {
        let mut s = state();
        assert_eq!(
            s.toggle(),
            ToggleOutcome::Accepted {
                from: ConnectionPhase::Disconnected,
                to: ConnectionPhase::Connecting
            }
        );
        assert_eq!(
            s.toggle(),
            ToggleOutcome::Ignored {
                phase: ConnectionPhase::Connecting
            }
        );
        assert_eq!(s.phase(), ConnectionPhase::Connecting);
    }

    #[test]
    fn session_created_on_connect_with_zero_counters() {
        let mut s = state();
        let now = Utc::now();
        s.toggle();
        assert!(s.session().is_none());
        assert_eq!(
            s.complete_transition(now, &mut Scripted),
            Some(ConnectionPhase::Connected)
        );

        let session = s.session().unwrap();
        assert_eq!(session.started_at, now);
        assert_eq!(session.total_bytes(), 0);
        assert_eq!(session.address, Ipv4Addr::new(185, 0, 0, 12));
        assert_eq!(session.endpoint_id.as_str(), "1");
    }

    #[test]
    fn session_survives_disconnecting_and_dies_on_disconnected() {
        let mut s = state();
        connect(&mut s);
        for _ in 0..5 {
            tick(&mut s);
        }

        s.toggle();
        assert_eq!(s.phase(), ConnectionPhase::Disconnecting);
        assert!(s.session().is_some());

        s.complete_transition(Utc::now(), &mut Scripted);
        assert_eq!(s.phase(), ConnectionPhase::Disconnected);
        assert!(s.session().is_none());
        assert!(s.window().is_empty());
    }

    #[test]
    fn samples_refused_outside_connected() {
        let mut s = state();
        assert!(!tick(&mut s));
        s.toggle();
        assert!(!tick(&mut s));
        s.complete_transition(Utc::now(), &mut Scripted);
        assert!(tick(&mut s));
        s.toggle();
        assert!(!tick(&mut s));
        assert_eq!(s.window().len(), 1);
    }

    #[test]
    fn window_capped_at_capacity() {
        let mut s = state();
        connect(&mut s);
        for _ in 0..25 {
            tick(&mut s);
        }
        assert_eq!(s.window().len(), 20);
        assert_eq!(s.session().unwrap().uploaded_bytes, 25 * 250_000);
    }

    #[test]
    fn timer_without_pending_transition_is_noop() {
        let mut s = state();
        assert_eq!(s.complete_transition(Utc::now(), &mut Scripted), None);
        assert_eq!(s.phase(), ConnectionPhase::Disconnected);
    }

    #[test]
    fn selection_is_independent_of_phase() {
        let mut s = state();
        connect(&mut s);
        let session_before = s.session().cloned();

        let picked = s.select(&"7".into()).unwrap();
        assert_eq!(picked.city, "London");
        assert_eq!(s.phase(), ConnectionPhase::Connected);
        assert_eq!(s.session().cloned(), session_before);

        s.toggle();
        s.complete_transition(Utc::now(), &mut Scripted);
        assert_eq!(s.selected().id.as_str(), "7");
    }

    #[test]
    fn unknown_selection_changes_nothing() {
        let mut s = state();
        let err = s.select(&"nope".into()).unwrap_err();
        assert!(matches!(err, CoreError::UnknownEndpoint { .. }));
        assert_eq!(s.selected().id.as_str(), "1");
    }

    #[test]
    fn snapshot_revision_increases() {
        let mut s = state();
        s.advice_pending("1".into());
        let a = s.snapshot();
        s.advice_ready("1".into(), Advisory::fallback());
        let b = s.snapshot();
        assert!(b.revision > a.revision);
        assert_eq!(b.advice_text(), crate::model::FALLBACK_ADVICE);
        assert!(matches!(
            b.advice,
            AdviceState::Ready {
                origin: AdviceOrigin::Fallback,
                ..
            }
        ));
    }
}
