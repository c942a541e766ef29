//! Selection mode tracking

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::surface::RenderSurface;

use super::DetectionState;

/// How the next song gets picked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Play through the queue in order
    Queue,
    /// Follow the detected emotion
    Emotion,
    /// Shuffle
    Random,
}

impl Default for SelectionMode {
    fn default() -> Self {
        Self::Queue
    }
}

impl std::fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionMode::Queue => write!(f, "queue"),
            SelectionMode::Emotion => write!(f, "emotion"),
            SelectionMode::Random => write!(f, "random"),
        }
    }
}

/// Owns the active selection mode
#[derive(Debug, Default)]
pub struct ModeSelector {
    mode: SelectionMode,
}

impl ModeSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Switch to `mode` unconditionally and highlight it.
    ///
    /// Returns true when the switch should kick off detection: entering
    /// Emotion mode while detection is neither running nor starting.
    pub fn select(
        &mut self,
        mode: SelectionMode,
        detection: DetectionState,
        ui: &impl RenderSurface,
    ) -> bool {
        let previous = self.mode;
        self.mode = mode;

        info!(from = %previous, to = %mode, "selection mode changed");
        ui.set_active_mode(mode);

        mode == SelectionMode::Emotion
            && !matches!(detection, DetectionState::Active | DetectionState::Starting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Notification;
    use crate::surface::BroadcastSurface;
    use tokio::sync::broadcast;

    fn create_surface() -> (BroadcastSurface, broadcast::Receiver<Notification>) {
        let (tx, rx) = broadcast::channel(16);
        (BroadcastSurface::new(tx), rx)
    }

    #[test]
    fn test_initial_mode() {
        assert_eq!(ModeSelector::new().mode(), SelectionMode::Queue);
    }

    #[test]
    fn test_select_highlights_mode() {
        let (surface, mut rx) = create_surface();
        let mut selector = ModeSelector::new();

        let start = selector.select(SelectionMode::Random, DetectionState::Idle, &surface);

        assert!(!start);
        assert_eq!(selector.mode(), SelectionMode::Random);
        assert_eq!(
            rx.try_recv().unwrap(),
            Notification::ModeChanged {
                mode: SelectionMode::Random
            }
        );
    }

    #[test]
    fn test_emotion_triggers_start_when_idle() {
        let (surface, _rx) = create_surface();
        let mut selector = ModeSelector::new();
        assert!(selector.select(SelectionMode::Emotion, DetectionState::Idle, &surface));
    }

    #[test]
    fn test_emotion_skips_start_when_running() {
        let (surface, _rx) = create_surface();
        let mut selector = ModeSelector::new();

        assert!(!selector.select(SelectionMode::Emotion, DetectionState::Active, &surface));
        assert!(!selector.select(SelectionMode::Emotion, DetectionState::Starting, &surface));
        assert_eq!(selector.mode(), SelectionMode::Emotion);
    }

    #[test]
    fn test_mode_serialization() {
        let json = serde_json::to_string(&SelectionMode::Emotion).unwrap();
        assert_eq!(json, "\"emotion\"");
    }
}
