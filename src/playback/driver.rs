//! Mechanical restart sequence against an audio device

use std::path::{Component, Path, PathBuf};

use tracing::{error, info};

use super::{AudioDevice, PlaybackError, PlaybackPhase};

/// Drives an `AudioDevice` through stop, seek, load and play
pub struct PlaybackDriver {
    device: Box<dyn AudioDevice>,
    /// Song identifiers are resolved relative to this directory
    songs_dir: PathBuf,
}

impl PlaybackDriver {
    pub fn new(device: Box<dyn AudioDevice>, songs_dir: PathBuf) -> Self {
        Self { device, songs_dir }
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.device.phase()
    }

    /// Path the device is given for a song identifier. Only plain relative
    /// names are accepted, so the result stays under the songs directory.
    pub fn resolve(&self, identifier: &str) -> Result<PathBuf, PlaybackError> {
        let relative = Path::new(identifier);
        let plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !plain || relative.as_os_str().is_empty() {
            return Err(PlaybackError::InvalidIdentifier(identifier.to_owned()));
        }
        Ok(self.songs_dir.join(relative))
    }

    /// Stop whatever is playing and start `identifier` from the beginning.
    ///
    /// Device errors are logged and end the sequence early; they never
    /// propagate into session state. An identifier that does not resolve
    /// leaves the device untouched.
    pub fn restart(&mut self, identifier: &str) {
        let source = match self.resolve(identifier) {
            Ok(source) => source,
            Err(e) => {
                error!(error = %e, "refusing to play song");
                return;
            }
        };
        match self.run_sequence(&source) {
            Ok(()) => info!(song = identifier, "playback started"),
            Err(e) => error!(error = %e, ?source, "audio device error"),
        }
    }

    fn run_sequence(&mut self, source: &Path) -> Result<(), PlaybackError> {
        self.device.stop()?;
        self.device.seek_to_start()?;
        self.device.set_source(source)?;
        self.device.load()?;
        self.device.play()
    }

    pub fn observe_phase(&mut self, source: &str, phase: PlaybackPhase) {
        self.device.observe_phase(Path::new(source), phase);
    }

    /// Log an error signalled by the device itself. No recovery.
    pub fn report_error(&self, message: &str) {
        error!(message, "audio device reported an error");
    }
}
