//! Presentation surface contracts
//!
//! The session never draws anything itself. It hands text, highlights and
//! button availability to a surface and moves on.

mod broadcast;

use crate::state::{DetectionState, SelectionMode};

pub use broadcast::BroadcastSurface;

/// Status line and blocking alerts
pub trait NotificationSink {
    /// Replace the status line verbatim. Last write wins.
    fn set_status(&self, text: &str);

    /// Show a blocking, user-acknowledged alert
    fn alert(&self, text: &str);
}

/// Everything else the session renders
pub trait RenderSurface: NotificationSink {
    fn set_emotion(&self, label: &str);

    fn set_song(&self, song: &str);

    /// Highlight exactly the given mode
    fn set_active_mode(&self, mode: SelectionMode);

    fn set_affordances(&self, affordances: Affordances);

    fn detection_changed(&self, state: DetectionState);
}

/// Which of the start/stop buttons can be pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Affordances {
    pub start_enabled: bool,
    pub stop_enabled: bool,
}

impl Affordances {
    /// Idle: only start
    pub const READY: Self = Self {
        start_enabled: true,
        stop_enabled: false,
    };

    /// A start call is in flight: neither
    pub const STARTING: Self = Self {
        start_enabled: false,
        stop_enabled: false,
    };

    /// Detection running: only stop
    pub const RUNNING: Self = Self {
        start_enabled: false,
        stop_enabled: true,
    };
}

impl Default for Affordances {
    fn default() -> Self {
        Self::READY
    }
}

/// Upper-case the first letter of an emotion label for display
pub fn display_label(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
