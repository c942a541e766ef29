//! The session: one owner for mode, detection state and current track
//!
//! Every inbound event is handled on the session task. Service calls are
//! spawned and their replies come back through the same channel, so the
//! session state is never touched from anywhere else.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::events::SessionEvent;
use crate::playback::{ContinuityPolicy, PlaybackDriver};
use crate::service::{DetectionService, ServiceError, ServiceReply};
use crate::surface::{Affordances, RenderSurface};

use super::detection::{DetectionController, ServiceCall, READY_STATUS};
use super::mode::{ModeSelector, SelectionMode};

pub struct Session<S, R> {
    mode: ModeSelector,
    detection: DetectionController,
    policy: ContinuityPolicy,
    driver: PlaybackDriver,
    surface: R,
    service: Arc<S>,
    /// Sender into our own inbox, for service call completions
    completion_tx: mpsc::Sender<SessionEvent>,
}

impl<S, R> Session<S, R>
where
    S: DetectionService,
    R: RenderSurface,
{
    pub fn new(
        service: Arc<S>,
        surface: R,
        driver: PlaybackDriver,
        completion_tx: mpsc::Sender<SessionEvent>,
    ) -> Self {
        Self {
            mode: ModeSelector::new(),
            detection: DetectionController::new(),
            policy: ContinuityPolicy::new(),
            driver,
            surface,
            service,
            completion_tx,
        }
    }

    /// Paint the initial surface: queue highlighted, start available, ready
    pub fn init(&self) {
        self.surface.set_active_mode(self.mode.mode());
        self.surface.detection_changed(self.detection.state());
        self.surface.set_affordances(Affordances::READY);
        self.surface.set_status(READY_STATUS);
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode.mode()
    }

    #[cfg(test)]
    pub fn detection_state(&self) -> super::DetectionState {
        self.detection.state()
    }

    #[cfg(test)]
    pub fn current_track(&self) -> Option<&crate::playback::PlaybackTrack> {
        self.policy.current()
    }

    /// Process events until the inbox closes
    pub async fn run(&mut self, mut rx: mpsc::Receiver<SessionEvent>) {
        info!(mode = %self.mode(), "session started");

        while let Some(event) = rx.recv().await {
            if let Some(call) = self.handle(event) {
                self.dispatch(call);
            }
        }

        info!("session stopped");
    }

    /// Apply one event. Returns the service call it requires, if any.
    pub fn handle(&mut self, event: SessionEvent) -> Option<ServiceCall> {
        debug!(%event, "session event");

        match event {
            SessionEvent::ModeSelected { mode } => {
                let wants_start = self.mode.select(mode, self.detection.state(), &self.surface);
                if wants_start {
                    self.detection.request_start(&self.surface)
                } else {
                    None
                }
            }
            SessionEvent::StartRequested => self.detection.request_start(&self.surface),
            SessionEvent::StopRequested => self.detection.request_stop(&self.surface),
            SessionEvent::StartCompleted { reply } => {
                self.detection.complete_start(reply, &self.surface);
                None
            }
            SessionEvent::StopCompleted { reply } => {
                self.detection.complete_stop(reply, &self.surface);
                None
            }
            SessionEvent::Track { emotion, song } => {
                self.policy
                    .on_track_event(&emotion, &song, &mut self.driver, &self.surface);
                None
            }
            SessionEvent::Status { text } => {
                self.surface.set_status(&text);
                None
            }
            SessionEvent::Alert { text } => {
                self.surface.alert(&text);
                None
            }
            SessionEvent::PhaseReported { source, phase } => {
                self.driver.observe_phase(&source, phase);
                None
            }
            SessionEvent::DeviceError { message } => {
                self.driver.report_error(&message);
                None
            }
        }
    }

    /// Issue a service call without blocking the loop; the reply is posted
    /// back as a completion event
    fn dispatch(&self, call: ServiceCall) {
        let service = Arc::clone(&self.service);
        let tx = self.completion_tx.clone();

        tokio::spawn(async move {
            let event = match call {
                ServiceCall::Start => SessionEvent::StartCompleted {
                    reply: into_reply(service.start().await),
                },
                ServiceCall::Stop => SessionEvent::StopCompleted {
                    reply: into_reply(service.stop().await),
                },
            };

            if tx.send(event).await.is_err() {
                warn!(?call, "session closed before the service reply was delivered");
            }
        });
    }
}

/// Transport failures count as a rejected call carrying the error text
fn into_reply(result: Result<ServiceReply, ServiceError>) -> ServiceReply {
    result.unwrap_or_else(|e| {
        warn!(error = %e, "detection service call failed");
        ServiceReply::error(e.to_string())
    })
}
