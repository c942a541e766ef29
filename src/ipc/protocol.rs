//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian length.
//! Surface clients send user intents and playback reports, the detection
//! service sends its pushes, and subscribed clients receive `Notification`s.

use serde::{Deserialize, Serialize};

use crate::events::{Notification, SessionEvent};
use crate::playback::PlaybackPhase;
use crate::state::{DetectionState, SelectionMode, READY_STATUS};

/// Requests from clients to the daemon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Ping to check connectivity
    Ping,

    /// Request a session status snapshot
    GetStatus,

    /// Subscribe to render notifications
    Subscribe,

    /// User selected a mode
    SetMode { mode: SelectionMode },

    /// User pressed start
    StartDetection,

    /// User pressed stop
    StopDetection,

    /// Detection service picked a song
    Track { emotion: String, song: String },

    /// Detection service status line
    Status { text: String },

    /// Detection service alert
    Alert { text: String },

    /// Remote audio element phase report, naming the source it applies to
    PlaybackPhase { source: String, phase: PlaybackPhase },

    /// Remote audio element error report
    PlaybackError { message: String },
}

impl Request {
    /// The session event this request carries, if it is one
    pub fn into_session_event(self) -> Option<SessionEvent> {
        let event = match self {
            Request::Ping | Request::GetStatus | Request::Subscribe => return None,
            Request::SetMode { mode } => SessionEvent::ModeSelected { mode },
            Request::StartDetection => SessionEvent::StartRequested,
            Request::StopDetection => SessionEvent::StopRequested,
            Request::Track { emotion, song } => SessionEvent::Track { emotion, song },
            Request::Status { text } => SessionEvent::Status { text },
            Request::Alert { text } => SessionEvent::Alert { text },
            Request::PlaybackPhase { source, phase } => {
                SessionEvent::PhaseReported { source, phase }
            }
            Request::PlaybackError { message } => SessionEvent::DeviceError { message },
        };
        Some(event)
    }
}

/// Responses from daemon to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Session status snapshot
    Status(SessionStatus),

    /// Pong response to ping
    Pong,

    /// Subscription confirmed
    Subscribed,

    /// Event queued for the session
    Accepted,

    /// Error response
    Error { code: String, message: String },
}

/// Snapshot of what the surface currently shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    /// Daemon version
    pub version: String,

    /// Active selection mode
    pub mode: SelectionMode,

    /// Detection lifecycle state
    pub detection: DetectionState,

    /// Last rendered emotion label
    pub emotion: Option<String>,

    /// Last rendered song
    pub song: Option<String>,

    /// Current status line
    pub status: String,

    /// Uptime in seconds
    pub uptime_secs: u64,
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            mode: SelectionMode::default(),
            detection: DetectionState::default(),
            emotion: None,
            song: None,
            status: READY_STATUS.to_string(),
            uptime_secs: 0,
        }
    }
}

impl SessionStatus {
    /// Fold a rendered notification into the snapshot
    pub fn apply(&mut self, notification: &Notification) {
        match notification {
            Notification::StatusChanged { text } => self.status = text.clone(),
            Notification::EmotionChanged { label, .. } => self.emotion = Some(label.clone()),
            Notification::SongChanged { song } => self.song = Some(song.clone()),
            Notification::ModeChanged { mode } => self.mode = *mode,
            Notification::DetectionChanged { state } => self.detection = *state,
            Notification::Affordances { .. }
            | Notification::Alert { .. }
            | Notification::Playback { .. } => {}
        }
    }
}
