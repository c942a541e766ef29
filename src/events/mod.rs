//! Events flowing into and out of the session
//!
//! `SessionEvent` is everything the session loop consumes: user intents,
//! detection service pushes, service call completions and audio device
//! reports. `Notification` is everything the session renders outward to
//! subscribed surface clients.

use serde::{Deserialize, Serialize};

use crate::playback::PlaybackPhase;
use crate::service::ServiceReply;
use crate::state::{DetectionState, SelectionMode};

/// Inbound events, processed one at a time on the session task
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// User picked a selection mode
    ModeSelected { mode: SelectionMode },

    /// User pressed the start button
    StartRequested,

    /// User pressed the stop button
    StopRequested,

    /// Detection service chose a song for a detected emotion
    Track { emotion: String, song: String },

    /// Detection service pushed a status line
    Status { text: String },

    /// Detection service pushed an alert
    Alert { text: String },

    /// The in-flight start call returned
    StartCompleted { reply: ServiceReply },

    /// The in-flight stop call returned
    StopCompleted { reply: ServiceReply },

    /// The audio device reported its phase for the source it was playing
    PhaseReported { source: String, phase: PlaybackPhase },

    /// The audio device reported a playback error
    DeviceError { message: String },
}

impl std::fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionEvent::ModeSelected { mode } => write!(f, "MODE_SELECTED ({})", mode),
            SessionEvent::StartRequested => write!(f, "START_REQUESTED"),
            SessionEvent::StopRequested => write!(f, "STOP_REQUESTED"),
            SessionEvent::Track { emotion, song } => {
                write!(f, "TRACK ({}: {})", emotion, song)
            }
            SessionEvent::Status { .. } => write!(f, "STATUS"),
            SessionEvent::Alert { .. } => write!(f, "ALERT"),
            SessionEvent::StartCompleted { reply } => {
                write!(f, "START_COMPLETED ({})", reply.status)
            }
            SessionEvent::StopCompleted { reply } => {
                write!(f, "STOP_COMPLETED ({})", reply.status)
            }
            SessionEvent::PhaseReported { source, phase } => {
                write!(f, "PHASE_REPORTED ({}: {})", source, phase)
            }
            SessionEvent::DeviceError { .. } => write!(f, "DEVICE_ERROR"),
        }
    }
}

/// A single step of the playback restart sequence, forwarded to a surface
/// that owns the actual audio element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlaybackCommand {
    Stop,
    SeekToStart,
    SetSource { source: String },
    Load,
    Play,
}

/// Outbound render updates pushed to subscribed clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// Status line replaced
    StatusChanged { text: String },

    /// Detected emotion changed
    EmotionChanged {
        /// Raw label as pushed by the service, usable as a style key
        label: String,
        /// Label with its first letter upper-cased
        display: String,
    },

    /// Song label changed
    SongChanged { song: String },

    /// Active selection mode highlight
    ModeChanged { mode: SelectionMode },

    /// Start/stop button availability
    Affordances {
        start_enabled: bool,
        stop_enabled: bool,
    },

    /// Detection lifecycle moved
    DetectionChanged { state: DetectionState },

    /// Blocking, user-acknowledged alert
    Alert { text: String },

    /// Playback instruction for a remote audio element
    Playback { command: PlaybackCommand },
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notification::StatusChanged { text } => write!(f, "STATUS_CHANGED ({})", text),
            Notification::EmotionChanged { label, .. } => write!(f, "EMOTION_CHANGED ({})", label),
            Notification::SongChanged { song } => write!(f, "SONG_CHANGED ({})", song),
            Notification::ModeChanged { mode } => write!(f, "MODE_CHANGED ({})", mode),
            Notification::Affordances {
                start_enabled,
                stop_enabled,
            } => write!(
                f,
                "AFFORDANCES (start={}, stop={})",
                start_enabled, stop_enabled
            ),
            Notification::DetectionChanged { state } => {
                write!(f, "DETECTION_CHANGED ({})", state)
            }
            Notification::Alert { text } => write!(f, "ALERT ({})", text),
            Notification::Playback { command } => write!(f, "PLAYBACK ({:?})", command),
        }
    }
}
