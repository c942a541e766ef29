//! Surface that publishes every render call as a `Notification`
//!
//! Subscribed IPC clients draw whatever arrives; the daemon keeps no
//! widget state of its own.

use tokio::sync::broadcast;
use tracing::debug;

use crate::events::Notification;
use crate::state::{DetectionState, SelectionMode};

use super::{display_label, Affordances, NotificationSink, RenderSurface};

/// Render surface backed by a broadcast channel
#[derive(Debug, Clone)]
pub struct BroadcastSurface {
    tx: broadcast::Sender<Notification>,
}

impl BroadcastSurface {
    pub fn new(tx: broadcast::Sender<Notification>) -> Self {
        Self { tx }
    }

    fn emit(&self, notification: Notification) {
        debug!(%notification, "emitting notification");
        // No receivers just means nobody is watching yet
        let _ = self.tx.send(notification);
    }
}

impl NotificationSink for BroadcastSurface {
    fn set_status(&self, text: &str) {
        self.emit(Notification::StatusChanged {
            text: text.to_owned(),
        });
    }

    fn alert(&self, text: &str) {
        self.emit(Notification::Alert {
            text: text.to_owned(),
        });
    }
}

impl RenderSurface for BroadcastSurface {
    fn set_emotion(&self, label: &str) {
        self.emit(Notification::EmotionChanged {
            label: label.to_owned(),
            display: display_label(label),
        });
    }

    fn set_song(&self, song: &str) {
        self.emit(Notification::SongChanged {
            song: song.to_owned(),
        });
    }

    fn set_active_mode(&self, mode: SelectionMode) {
        self.emit(Notification::ModeChanged { mode });
    }

    fn set_affordances(&self, affordances: Affordances) {
        self.emit(Notification::Affordances {
            start_enabled: affordances.start_enabled,
            stop_enabled: affordances.stop_enabled,
        });
    }

    fn detection_changed(&self, state: DetectionState) {
        self.emit(Notification::DetectionChanged { state });
    }
}
