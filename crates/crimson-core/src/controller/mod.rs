// ── Controller abstraction ──
//
// Cheap-to-clone handle around the single-writer event loop. Mutations
// go through the command channel; reads come straight from the latest
// published snapshot.

mod command;
mod event;
mod event_loop;
mod state;

use std::sync::Arc;

use tokio::sync::{Mutex, broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::advisory::{Advisor, Recommendation};
use crate::catalog::Catalog;
use crate::config::ControllerConfig;
use crate::error::CoreError;
use crate::model::{ConnectionPhase, Endpoint, EndpointId};
use crate::sampler::{SyntheticTraffic, TrafficSource};
use crate::stream::StateStream;

pub use command::{Command, CommandResult};
pub use event::Event;
pub use state::{Snapshot, ToggleOutcome};

use command::CommandEnvelope;
use event_loop::EventLoop;
use state::DashboardState;

const COMMAND_CHANNEL_SIZE: usize = 64;
const EVENT_CHANNEL_SIZE: usize = 256;

// ── Controller ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. The background loop
/// exits on [`shutdown()`](Self::shutdown) or once every clone has been
/// dropped.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ControllerConfig,
    catalog: Catalog,
    advisor: Arc<dyn Advisor>,
    snapshot_rx: watch::Receiver<Arc<Snapshot>>,
    event_tx: broadcast::Sender<Event>,
    command_tx: mpsc::Sender<CommandEnvelope>,
    cancel: CancellationToken,
    task_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Controller {
    /// Validate `config`, spawn the event loop, and start fetching advice
    /// for the first catalog entry.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(
        config: ControllerConfig,
        catalog: Catalog,
        advisor: Arc<dyn Advisor>,
        source: Box<dyn TrafficSource>,
    ) -> Result<Self, CoreError> {
        config.validate()?;

        let mut state = DashboardState::new(catalog.clone(), config.window_capacity);
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(state.snapshot()));
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let cancel = CancellationToken::new();

        let mut event_loop = EventLoop::new(
            config.clone(),
            state,
            source,
            Arc::clone(&advisor),
            snapshot_tx,
            event_tx.clone(),
        );
        event_loop.prime();
        let handle = tokio::spawn(event_loop.run(command_rx, cancel.clone()));

        debug!(endpoints = catalog.len(), "controller started");

        Ok(Self {
            inner: Arc::new(ControllerInner {
                config,
                catalog,
                advisor,
                snapshot_rx,
                event_tx,
                command_tx,
                cancel,
                task_handle: Mutex::new(Some(handle)),
            }),
        })
    }

    /// [`start`](Self::start) with random traffic drawn from `config.traffic`.
    pub fn synthetic(
        config: ControllerConfig,
        catalog: Catalog,
        advisor: Arc<dyn Advisor>,
    ) -> Result<Self, CoreError> {
        let source = Box::new(SyntheticTraffic::new(config.traffic));
        Self::start(config, catalog, advisor, source)
    }

    /// Access the controller configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Route a command through the event loop and wait for its result.
    pub async fn execute(&self, command: Command) -> Result<CommandResult, CoreError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.inner
            .command_tx
            .send(CommandEnvelope {
                command,
                response_tx,
            })
            .await
            .map_err(|_| CoreError::ControllerStopped)?;
        response_rx.await.map_err(|_| CoreError::ControllerStopped)?
    }

    /// Connect or disconnect. Ignored while a timed transition is running.
    pub async fn toggle(&self) -> Result<ToggleOutcome, CoreError> {
        match self.execute(Command::Toggle).await? {
            CommandResult::Toggled(outcome) => Ok(outcome),
            other => Err(unexpected(&other)),
        }
    }

    /// Select an endpoint and start fetching advice for it.
    pub async fn select(&self, id: impl Into<EndpointId>) -> Result<Arc<Endpoint>, CoreError> {
        let id = id.into();
        match self.execute(Command::SelectEndpoint { id }).await? {
            CommandResult::Selected(endpoint) => Ok(endpoint),
            other => Err(unexpected(&other)),
        }
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Latest published state.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.snapshot_rx.borrow().clone()
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.inner.snapshot_rx.borrow().phase
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> StateStream {
        StateStream::new(self.inner.snapshot_rx.clone())
    }

    /// Subscribe to discrete events (phase changes, samples, advice).
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.inner.event_tx.subscribe()
    }

    /// Resolve once the phase equals `phase`.
    pub async fn wait_for_phase(&self, phase: ConnectionPhase) -> Result<Arc<Snapshot>, CoreError> {
        self.subscribe()
            .wait_for(|s| s.phase == phase)
            .await
            .ok_or(CoreError::ControllerStopped)
    }

    /// Resolve once advice for `id` has been applied.
    pub async fn wait_for_advice(&self, id: &EndpointId) -> Result<Arc<Snapshot>, CoreError> {
        self.subscribe()
            .wait_for(|s| s.advice.is_ready_for(id))
            .await
            .ok_or(CoreError::ControllerStopped)
    }

    /// Ask the advisor for the best catalog endpoint. Does not change
    /// the selection.
    pub async fn recommend(&self) -> Recommendation {
        let endpoints = self.inner.catalog.endpoints();
        let pick = self.inner.advisor.recommend(&endpoints).await;
        if self.inner.catalog.contains(&pick.endpoint_id) {
            pick
        } else {
            Recommendation::fallback(&endpoints)
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Stop the event loop and abort any outstanding advisory fetch.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let handle = self.inner.task_handle.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        debug!("controller shut down");
    }
}

fn unexpected(result: &CommandResult) -> CoreError {
    CoreError::Internal(format!("unexpected command result: {result:?}"))
}
