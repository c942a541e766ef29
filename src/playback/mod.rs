//! Playback: continuity policy, driver and audio device backends
//!
//! The policy decides whether a track event restarts audio. The driver runs
//! the restart sequence against whichever `AudioDevice` backend is
//! configured.

mod driver;
#[cfg(feature = "audio")]
mod local;
mod policy;
mod remote;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::config::PlaybackBackend;
use crate::events::Notification;

pub use driver::PlaybackDriver;
#[cfg(feature = "audio")]
pub use local::RodioDevice;
pub use policy::ContinuityPolicy;
#[cfg(test)]
pub use policy::PlaybackTrack;
pub use remote::RemoteDevice;

/// Where the audio device is in its own lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackPhase {
    NotStarted,
    Playing,
    Paused,
    Ended,
}

impl Default for PlaybackPhase {
    fn default() -> Self {
        Self::NotStarted
    }
}

impl std::fmt::Display for PlaybackPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackPhase::NotStarted => write!(f, "NotStarted"),
            PlaybackPhase::Playing => write!(f, "Playing"),
            PlaybackPhase::Paused => write!(f, "Paused"),
            PlaybackPhase::Ended => write!(f, "Ended"),
        }
    }
}

/// Errors raised by an audio device
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("no source set on the audio device")]
    NoSource,

    #[cfg(feature = "audio")]
    #[error("failed to open {path}: {source}")]
    Open {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "audio")]
    #[error("failed to decode audio: {0}")]
    Decode(String),

    #[error("song identifier {0:?} escapes the songs directory")]
    InvalidIdentifier(String),

    #[error("audio backend error: {0}")]
    Backend(String),
}

/// An audio output the driver can steer
pub trait AudioDevice {
    fn stop(&mut self) -> Result<(), PlaybackError>;

    fn seek_to_start(&mut self) -> Result<(), PlaybackError>;

    fn set_source(&mut self, source: &Path) -> Result<(), PlaybackError>;

    fn load(&mut self) -> Result<(), PlaybackError>;

    fn play(&mut self) -> Result<(), PlaybackError>;

    /// Current phase, read at decision time
    fn phase(&self) -> PlaybackPhase;

    /// Record a phase reported from outside for `source`. Backends that can
    /// query their own output ignore this.
    fn observe_phase(&mut self, _source: &Path, _phase: PlaybackPhase) {}
}

/// Open the configured backend
pub fn open_device(
    backend: PlaybackBackend,
    notifications: broadcast::Sender<Notification>,
) -> anyhow::Result<Box<dyn AudioDevice>> {
    match backend {
        PlaybackBackend::Remote => Ok(Box::new(RemoteDevice::new(notifications))),
        #[cfg(feature = "audio")]
        PlaybackBackend::Local => Ok(Box::new(RodioDevice::open()?)),
        #[cfg(not(feature = "audio"))]
        PlaybackBackend::Local => {
            anyhow::bail!("local playback needs the daemon built with the `audio` feature")
        }
    }
}
