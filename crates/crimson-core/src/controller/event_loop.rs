// ── Controller event loop ──
//
// The single writer. One task owns the state record and multiplexes
// commands, the phase timer, the sampling interval, and advisory
// completions. Leaving `Connected` drops the interval in the same step,
// so no sample can land after the phase changes.

use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior, Sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use super::command::{Command, CommandEnvelope, CommandResult};
use super::event::Event;
use super::state::{DashboardState, Snapshot, ToggleOutcome};
use crate::advisory::{Advisor, AdvisoryRequest, AdvisoryTracker};
use crate::config::ControllerConfig;
use crate::error::CoreError;
use crate::model::{Advisory, ConnectionPhase, Endpoint, EndpointId, TrafficSample};
use crate::sampler::TrafficSource;

/// An advisory fetch that finished, tagged with the generation it served.
struct AdviceCompletion {
    generation: u64,
    endpoint: EndpointId,
    advisory: Advisory,
}

pub(super) struct EventLoop {
    config: ControllerConfig,
    state: DashboardState,
    source: Box<dyn TrafficSource>,
    advisor: Arc<dyn Advisor>,
    tracker: AdvisoryTracker,
    snapshot_tx: watch::Sender<Arc<Snapshot>>,
    event_tx: broadcast::Sender<Event>,
    advice_tx: mpsc::UnboundedSender<AdviceCompletion>,
    advice_rx: mpsc::UnboundedReceiver<AdviceCompletion>,
    /// Armed only in `Connecting` and `Disconnecting`.
    phase_timer: Option<Pin<Box<Sleep>>>,
    /// Present only in `Connected`.
    sampler: Option<Interval>,
}

impl EventLoop {
    pub(super) fn new(
        config: ControllerConfig,
        state: DashboardState,
        source: Box<dyn TrafficSource>,
        advisor: Arc<dyn Advisor>,
        snapshot_tx: watch::Sender<Arc<Snapshot>>,
        event_tx: broadcast::Sender<Event>,
    ) -> Self {
        let (advice_tx, advice_rx) = mpsc::unbounded_channel();
        Self {
            config,
            state,
            source,
            advisor,
            tracker: AdvisoryTracker::new(),
            snapshot_tx,
            event_tx,
            advice_tx,
            advice_rx,
            phase_timer: None,
            sampler: None,
        }
    }

    /// Kick off advice for the initial selection. Must run inside a runtime.
    pub(super) fn prime(&mut self) {
        self.request_advice();
        self.publish();
    }

    pub(super) async fn run(
        mut self,
        mut commands: mpsc::Receiver<CommandEnvelope>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = phase_deadline(&mut self.phase_timer) => self.on_phase_timer(),
                () = sample_tick(&mut self.sampler) => self.on_sample_tick(),
                Some(done) = self.advice_rx.recv() => self.on_advice(done),
                envelope = commands.recv() => {
                    let Some(envelope) = envelope else { break };
                    let result = self.route(envelope.command);
                    let _ = envelope.response_tx.send(result);
                }
            }
        }

        self.tracker.abort_outstanding();
        debug!("controller loop stopped");
    }

    // ── Commands ─────────────────────────────────────────────────────

    fn route(&mut self, command: Command) -> Result<CommandResult, CoreError> {
        match command {
            Command::Toggle => Ok(CommandResult::Toggled(self.toggle())),
            Command::SelectEndpoint { id } => self.select(&id).map(CommandResult::Selected),
        }
    }

    fn toggle(&mut self) -> ToggleOutcome {
        let outcome = self.state.toggle();
        match outcome {
            ToggleOutcome::Accepted { from, to } => {
                match to {
                    ConnectionPhase::Connecting => self.arm_timer(self.config.connect_delay),
                    ConnectionPhase::Disconnecting => {
                        self.sampler = None;
                        self.arm_timer(self.config.disconnect_delay);
                    }
                    ConnectionPhase::Connected | ConnectionPhase::Disconnected => {}
                }
                info!(%from, %to, "phase changed");
                self.emit(Event::PhaseChanged { from, to });
                self.publish();
            }
            ToggleOutcome::Ignored { phase } => {
                debug!(%phase, "toggle ignored during timed transition");
                self.emit(Event::ToggleIgnored { phase });
            }
        }
        outcome
    }

    fn select(&mut self, id: &EndpointId) -> Result<Arc<Endpoint>, CoreError> {
        let endpoint = self.state.select(id)?;
        debug!(id = %endpoint.id, city = %endpoint.city, "endpoint selected");
        self.emit(Event::SelectionChanged {
            endpoint: endpoint.id.clone(),
        });
        self.request_advice();
        self.publish();
        Ok(endpoint)
    }

    // ── Timers ───────────────────────────────────────────────────────

    fn arm_timer(&mut self, delay: std::time::Duration) {
        self.phase_timer = Some(Box::pin(tokio::time::sleep(delay)));
    }

    fn on_phase_timer(&mut self) {
        self.phase_timer = None;

        let from = self.state.phase();
        let closing = self.state.session().map(|s| s.id);
        let Some(to) = self
            .state
            .complete_transition(Utc::now(), self.source.as_mut())
        else {
            return;
        };

        info!(%from, %to, "phase changed");
        self.emit(Event::PhaseChanged { from, to });

        match to {
            ConnectionPhase::Connected => {
                self.start_sampler();
                if let Some(session) = self.state.session().cloned() {
                    info!(
                        session = %session.id,
                        address = %session.address,
                        endpoint = %session.endpoint_id,
                        "session opened"
                    );
                    self.emit(Event::SessionOpened { session });
                }
            }
            ConnectionPhase::Disconnected => {
                if let Some(id) = closing {
                    info!(session = %id, "session closed");
                    self.emit(Event::SessionClosed { id });
                }
            }
            ConnectionPhase::Connecting | ConnectionPhase::Disconnecting => {}
        }

        self.publish();
    }

    fn start_sampler(&mut self) {
        let period = self.config.sample_period;
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.sampler = Some(interval);
    }

    fn on_sample_tick(&mut self) {
        let sample = TrafficSample::new(Utc::now(), self.source.sample());
        if !self.state.record_sample(sample, self.config.sample_period) {
            self.sampler = None;
            return;
        }
        trace!(
            up = sample.upload_mbps,
            down = sample.download_mbps,
            "traffic sample"
        );
        self.emit(Event::SampleRecorded { sample });
        self.publish();
    }

    // ── Advisory ─────────────────────────────────────────────────────

    fn request_advice(&mut self) {
        let endpoint = Arc::clone(self.state.selected());
        let generation = self.tracker.begin();
        self.state.advice_pending(endpoint.id.clone());

        let advisor = Arc::clone(&self.advisor);
        let tx = self.advice_tx.clone();
        let task = tokio::spawn(async move {
            let advisory = advisor.advise(AdvisoryRequest::from(endpoint.as_ref())).await;
            let _ = tx.send(AdviceCompletion {
                generation,
                endpoint: endpoint.id.clone(),
                advisory,
            });
        });
        self.tracker.attach(generation, task.abort_handle());
        debug!(generation, "advisory fetch started");
    }

    fn on_advice(&mut self, done: AdviceCompletion) {
        if !self.tracker.accept(done.generation) {
            debug!(
                generation = done.generation,
                current = self.tracker.current(),
                endpoint = %done.endpoint,
                "discarding stale advisory"
            );
            return;
        }

        let origin = done.advisory.origin;
        debug!(endpoint = %done.endpoint, %origin, "advisory applied");
        self.state.advice_ready(done.endpoint.clone(), done.advisory);
        self.emit(Event::AdviceUpdated {
            endpoint: done.endpoint,
            origin,
        });
        self.publish();
    }

    // ── Publication ──────────────────────────────────────────────────

    fn emit(&self, event: Event) {
        let _ = self.event_tx.send(event);
    }

    fn publish(&mut self) {
        self.snapshot_tx.send_replace(Arc::new(self.state.snapshot()));
    }
}

async fn phase_deadline(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => pending().await,
    }
}

async fn sample_tick(sampler: &mut Option<Interval>) {
    match sampler {
        Some(interval) => {
            interval.tick().await;
        }
        None => pending().await,
    }
}
