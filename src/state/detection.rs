//! Detection lifecycle state machine
//!
//! Idle -> Starting -> Active -> Stopping -> Idle. Start is only accepted
//! from Idle and stop only from Active, so at most one service call is ever
//! in flight.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::service::ServiceReply;
use crate::surface::{Affordances, RenderSurface};

/// Status line shown while nothing is running
pub const READY_STATUS: &str = "Ready";
/// Status line shown while a start call is in flight
pub const STARTING_STATUS: &str = "Starting detection...";
/// Status line shown while a stop call is in flight
pub const STOPPING_STATUS: &str = "Stopping...";
/// Alert shown when the service rejects a start without saying why
pub const START_FAILED_ALERT: &str = "Failed to start detection";

/// The four detection lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionState {
    /// Not running, start allowed
    Idle,
    /// Start call in flight
    Starting,
    /// Service is detecting and pushing track events
    Active,
    /// Stop call in flight
    Stopping,
}

impl Default for DetectionState {
    fn default() -> Self {
        Self::Idle
    }
}

impl std::fmt::Display for DetectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectionState::Idle => write!(f, "Idle"),
            DetectionState::Starting => write!(f, "Starting"),
            DetectionState::Active => write!(f, "Active"),
            DetectionState::Stopping => write!(f, "Stopping"),
        }
    }
}

/// A call the session must make to the detection service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceCall {
    Start,
    Stop,
}

/// Owns `DetectionState`; the only place it changes
#[derive(Debug, Default)]
pub struct DetectionController {
    state: DetectionState,
    /// When the current state was entered
    state_entered_at: Option<Instant>,
}

impl DetectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DetectionState {
        self.state
    }

    /// Begin a start if idle. Returns the call to issue, or `None` when the
    /// request is ignored.
    pub fn request_start(&mut self, ui: &impl RenderSurface) -> Option<ServiceCall> {
        if self.state != DetectionState::Idle {
            debug!(state = %self.state, "start ignored, detection not idle");
            return None;
        }

        self.transition_to(DetectionState::Starting, ui);
        ui.set_affordances(Affordances::STARTING);
        ui.set_status(STARTING_STATUS);
        Some(ServiceCall::Start)
    }

    /// Apply the outcome of the start call
    pub fn complete_start(&mut self, reply: ServiceReply, ui: &impl RenderSurface) {
        if self.state != DetectionState::Starting {
            warn!(state = %self.state, "start reply arrived outside Starting, ignoring");
            return;
        }

        if reply.is_success() {
            self.transition_to(DetectionState::Active, ui);
            ui.set_affordances(Affordances::RUNNING);
            return;
        }

        let message = reply.message().unwrap_or(START_FAILED_ALERT).to_owned();
        warn!(%message, "detection service rejected start");

        self.transition_to(DetectionState::Idle, ui);
        ui.set_affordances(Affordances::READY);
        ui.alert(&message);
    }

    /// Begin a stop if active. Returns the call to issue, or `None` when the
    /// request is ignored.
    pub fn request_stop(&mut self, ui: &impl RenderSurface) -> Option<ServiceCall> {
        if self.state != DetectionState::Active {
            debug!(state = %self.state, "stop ignored, detection not active");
            return None;
        }

        self.transition_to(DetectionState::Stopping, ui);
        ui.set_status(STOPPING_STATUS);
        Some(ServiceCall::Stop)
    }

    /// Apply the outcome of the stop call.
    ///
    /// A rejected stop means the service is still detecting, so the state
    /// returns to Active and the status line is left alone.
    pub fn complete_stop(&mut self, reply: ServiceReply, ui: &impl RenderSurface) {
        if self.state != DetectionState::Stopping {
            warn!(state = %self.state, "stop reply arrived outside Stopping, ignoring");
            return;
        }

        if reply.is_success() {
            self.transition_to(DetectionState::Idle, ui);
            ui.set_affordances(Affordances::READY);
            ui.set_status(READY_STATUS);
            return;
        }

        warn!(
            message = reply.message().unwrap_or("none"),
            "detection service rejected stop, assuming still active"
        );
        self.transition_to(DetectionState::Active, ui);
    }

    fn transition_to(&mut self, new_state: DetectionState, ui: &impl RenderSurface) {
        let old_state = self.state;
        let duration_ms = self
            .state_entered_at
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0);

        info!(
            from = %old_state,
            to = %new_state,
            duration_ms = duration_ms,
            "detection transition"
        );

        self.state = new_state;
        self.state_entered_at = if new_state != DetectionState::Idle {
            Some(Instant::now())
        } else {
            None
        };

        ui.detection_changed(new_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Notification;
    use crate::surface::BroadcastSurface;
    use tokio::sync::broadcast;

    fn create_controller() -> (
        DetectionController,
        BroadcastSurface,
        broadcast::Receiver<Notification>,
    ) {
        let (tx, rx) = broadcast::channel(64);
        (DetectionController::new(), BroadcastSurface::new(tx), rx)
    }

    fn drain(rx: &mut broadcast::Receiver<Notification>) -> Vec<Notification> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    fn status(text: &str) -> Notification {
        Notification::StatusChanged { text: text.into() }
    }

    fn affordances(a: Affordances) -> Notification {
        Notification::Affordances {
            start_enabled: a.start_enabled,
            stop_enabled: a.stop_enabled,
        }
    }

    #[test]
    fn test_initial_state() {
        let (dc, _, _) = create_controller();
        assert_eq!(dc.state(), DetectionState::Idle);
    }

    #[test]
    fn test_request_start_from_idle() {
        let (mut dc, ui, mut rx) = create_controller();

        assert_eq!(dc.request_start(&ui), Some(ServiceCall::Start));
        assert_eq!(dc.state(), DetectionState::Starting);

        let notes = drain(&mut rx);
        assert!(notes.contains(&affordances(Affordances::STARTING)));
        assert_eq!(notes.last(), Some(&status(STARTING_STATUS)));
    }

    #[test]
    fn test_repeated_start_issues_one_call() {
        let (mut dc, ui, _rx) = create_controller();

        let calls: Vec<_> = (0..5).filter_map(|_| dc.request_start(&ui)).collect();
        assert_eq!(calls, vec![ServiceCall::Start]);

        dc.complete_start(ServiceReply::success(), &ui);
        assert_eq!(dc.request_start(&ui), None);
        assert_eq!(dc.state(), DetectionState::Active);
    }

    #[test]
    fn test_start_ignored_while_stopping() {
        let (mut dc, ui, _rx) = create_controller();
        dc.request_start(&ui);
        dc.complete_start(ServiceReply::success(), &ui);
        assert_eq!(dc.request_stop(&ui), Some(ServiceCall::Stop));

        assert_eq!(dc.request_start(&ui), None);
        assert_eq!(dc.state(), DetectionState::Stopping);
    }

    #[test]
    fn test_start_success() {
        let (mut dc, ui, mut rx) = create_controller();
        dc.request_start(&ui);
        drain(&mut rx);

        dc.complete_start(ServiceReply::success(), &ui);

        assert_eq!(dc.state(), DetectionState::Active);
        let notes = drain(&mut rx);
        assert_eq!(notes.last(), Some(&affordances(Affordances::RUNNING)));
    }

    #[test]
    fn test_start_failure_alerts_service_message() {
        let (mut dc, ui, mut rx) = create_controller();
        dc.request_start(&ui);
        drain(&mut rx);

        dc.complete_start(ServiceReply::error("camera unavailable"), &ui);

        assert_eq!(dc.state(), DetectionState::Idle);
        let notes = drain(&mut rx);
        assert!(notes.contains(&affordances(Affordances::READY)));
        assert_eq!(
            notes.last(),
            Some(&Notification::Alert {
                text: "camera unavailable".into()
            })
        );
    }

    #[test]
    fn test_start_failure_without_message_uses_default() {
        let (mut dc, ui, mut rx) = create_controller();
        dc.request_start(&ui);
        drain(&mut rx);

        let reply = ServiceReply {
            status: crate::service::ReplyStatus::Error,
            message: None,
        };
        dc.complete_start(reply, &ui);

        assert_eq!(
            drain(&mut rx).last(),
            Some(&Notification::Alert {
                text: START_FAILED_ALERT.into()
            })
        );
    }

    #[test]
    fn test_stop_ignored_unless_active() {
        let (mut dc, ui, _rx) = create_controller();
        assert_eq!(dc.request_stop(&ui), None);

        dc.request_start(&ui);
        assert_eq!(dc.request_stop(&ui), None);
        assert_eq!(dc.state(), DetectionState::Starting);
    }

    #[test]
    fn test_full_cycle() {
        let (mut dc, ui, mut rx) = create_controller();
        dc.request_start(&ui);
        dc.complete_start(ServiceReply::success(), &ui);

        assert_eq!(dc.request_stop(&ui), Some(ServiceCall::Stop));
        assert_eq!(dc.state(), DetectionState::Stopping);
        assert_eq!(dc.request_stop(&ui), None);
        drain(&mut rx);

        dc.complete_stop(ServiceReply::success(), &ui);

        assert_eq!(dc.state(), DetectionState::Idle);
        let notes = drain(&mut rx);
        assert!(notes.contains(&affordances(Affordances::READY)));
        assert_eq!(notes.last(), Some(&status(READY_STATUS)));
    }

    #[test]
    fn test_stop_failure_reverts_to_active() {
        let (mut dc, ui, mut rx) = create_controller();
        dc.request_start(&ui);
        dc.complete_start(ServiceReply::success(), &ui);
        dc.request_stop(&ui);
        drain(&mut rx);

        dc.complete_stop(ServiceReply::error("device busy"), &ui);

        assert_eq!(dc.state(), DetectionState::Active);
        let notes = drain(&mut rx);
        assert_eq!(
            notes,
            vec![Notification::DetectionChanged {
                state: DetectionState::Active
            }]
        );
        assert_eq!(dc.request_stop(&ui), Some(ServiceCall::Stop));
    }

    #[test]
    fn test_stray_completion_ignored() {
        let (mut dc, ui, _rx) = create_controller();
        dc.complete_start(ServiceReply::success(), &ui);
        dc.complete_stop(ServiceReply::success(), &ui);
        assert_eq!(dc.state(), DetectionState::Idle);
    }
}
