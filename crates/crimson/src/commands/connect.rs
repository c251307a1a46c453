//! Simulated session: connect, stream phases and traffic, disconnect.
//!
//! The controller owns every transition; this handler only toggles and
//! prints what the event stream reports. A stop request (duration elapsed
//! or Ctrl-C) that arrives while still connecting is held until the
//! session is up, since toggles during a timed transition are ignored.

use std::pin::Pin;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{Sleep, sleep};

use crimson_core::{
    ConnectionPhase, Controller, EndpointId, Event, Session, Snapshot, ToggleOutcome,
};

use crate::cli::{ConnectArgs, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Rendering ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename = "summary")]
struct SessionSummary {
    endpoint: EndpointId,
    duration_secs: u64,
    uploaded_bytes: u64,
    downloaded_bytes: u64,
}

impl SessionSummary {
    fn from_session(session: &Session) -> Self {
        let elapsed = session.uptime(Utc::now()).to_std().unwrap_or_default();
        Self {
            endpoint: session.endpoint_id.clone(),
            duration_secs: elapsed.as_secs(),
            uploaded_bytes: session.uploaded_bytes,
            downloaded_bytes: session.downloaded_bytes,
        }
    }
}

struct EventPrinter {
    format: OutputFormat,
    quiet: bool,
    color: bool,
}

impl EventPrinter {
    fn new(global: &GlobalOpts) -> Self {
        Self {
            format: global.output,
            quiet: global.quiet,
            color: output::should_color(global.color),
        }
    }

    fn structured(&self) -> bool {
        !matches!(self.format, OutputFormat::Table | OutputFormat::Plain)
    }

    /// Serialize one record. JSON formats stream one object per line.
    fn record<T: Serialize>(&self, value: &T) -> Result<(), CliError> {
        let out = match self.format {
            OutputFormat::Yaml => format!("---\n{}", output::render_yaml(value)?.trim_end()),
            _ => output::render_json(value, true)?,
        };
        output::print_output(&out, self.quiet);
        Ok(())
    }

    fn line(&self, text: &str) {
        let stamp = chrono::Local::now().format("%H:%M:%S");
        output::print_output(&format!("[{stamp}] {text}"), self.quiet);
    }

    fn event(&self, event: &Event, snapshot: &Snapshot) -> Result<(), CliError> {
        if self.structured() {
            return self.record(event);
        }

        match event {
            Event::PhaseChanged { to, .. } => {
                let label = output::phase_label(*to, self.color);
                match to {
                    ConnectionPhase::Connecting | ConnectionPhase::Connected => {
                        self.line(&format!("{label} {}", snapshot.selected.location()));
                    }
                    _ => self.line(&label),
                }
            }
            Event::SessionOpened { session } => {
                self.line(&format!("assigned address {}", session.address));
            }
            Event::SampleRecorded { sample } => {
                self.line(&format!(
                    "up {:>5.2} Mbps  down {:>5.2} Mbps",
                    sample.upload_mbps, sample.download_mbps
                ));
            }
            Event::AdviceUpdated { .. } => {
                self.line(&format!("advisor: {}", snapshot.advice_text()));
            }
            Event::ToggleIgnored { .. }
            | Event::SessionClosed { .. }
            | Event::SelectionChanged { .. } => {}
        }
        Ok(())
    }

    fn summary(&self, session: &Session) -> Result<(), CliError> {
        let summary = SessionSummary::from_session(session);
        if self.structured() {
            return self.record(&summary);
        }
        let text = format!(
            "session closed after {}  sent {}  received {}",
            util::format_elapsed(Duration::from_secs(summary.duration_secs)),
            util::format_bytes(summary.uploaded_bytes),
            util::format_bytes(summary.downloaded_bytes),
        );
        output::print_output(&output::heading(&text, self.color), self.quiet);
        Ok(())
    }
}

// ── Handler ──────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: ConnectArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Some(ref id) = args.server {
        let endpoint = util::resolve_endpoint(controller.catalog(), id)?;
        controller.select(endpoint.id.clone()).await?;
    }

    let printer = EventPrinter::new(global);
    let mut events = controller.events();

    match controller.toggle().await? {
        ToggleOutcome::Accepted { .. } => {}
        ToggleOutcome::Ignored { phase } => {
            return Err(CliError::Internal(format!(
                "fresh controller refused to connect from {phase}"
            )));
        }
    }

    let mut deadline: Option<Pin<Box<Sleep>>> = None;
    let mut stop_requested = false;
    let mut last_session: Option<Session> = None;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            received = events.recv() => {
                let event = match received {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "event stream lagged");
                        continue;
                    }
                    Err(RecvError::Closed) => return Err(CliError::ControllerStopped),
                };

                let snapshot = controller.snapshot();
                printer.event(&event, &snapshot)?;

                match event {
                    Event::PhaseChanged { to: ConnectionPhase::Connected, .. } => {
                        if stop_requested {
                            controller.toggle().await?;
                        } else if let Some(secs) = args.duration {
                            deadline = Some(Box::pin(sleep(Duration::from_secs(secs))));
                        }
                    }
                    Event::PhaseChanged { to: ConnectionPhase::Disconnected, .. } => break,
                    Event::SessionOpened { session } => last_session = Some(session),
                    Event::SampleRecorded { .. } => {
                        if let Some(session) = snapshot.session.clone() {
                            last_session = Some(session);
                        }
                    }
                    _ => {}
                }
            }

            () = until(&mut deadline) => {
                deadline = None;
                tracing::debug!("session duration elapsed");
                request_stop(controller, &mut stop_requested).await?;
            }

            signal = &mut ctrl_c, if !stop_requested => {
                signal?;
                tracing::info!("interrupted, disconnecting");
                request_stop(controller, &mut stop_requested).await?;
            }
        }
    }

    if let Some(session) = last_session {
        printer.summary(&session)?;
    }
    Ok(())
}

/// Disconnect now if connected; otherwise the `Connected` handler does it.
async fn request_stop(controller: &Controller, stop_requested: &mut bool) -> Result<(), CliError> {
    if *stop_requested {
        return Ok(());
    }
    *stop_requested = true;
    if controller.phase() == ConnectionPhase::Connected {
        controller.toggle().await?;
    }
    Ok(())
}

async fn until(deadline: &mut Option<Pin<Box<Sleep>>>) {
    match deadline {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}
