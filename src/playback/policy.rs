//! Playback continuity policy
//!
//! A repeated "play this song" for the song that is already playing is
//! swallowed so the audio does not stutter. Anything else restarts from the
//! top, including the same song once it has paused or ended.

use tracing::{debug, warn};

use crate::surface::RenderSurface;

use super::{PlaybackDriver, PlaybackPhase};

/// Prefix of the status line rendered for every track event
pub const TRACK_STATUS_PREFIX: &str = "Playing";

/// What is currently loaded on the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackTrack {
    /// Song reference, the only field compared
    pub identifier: String,
    /// Informational
    pub emotion_label: String,
}

impl PlaybackTrack {
    fn is_same_song(&self, identifier: &str) -> bool {
        self.identifier == identifier
    }
}

/// Outcome of a continuity check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Leave the device alone
    Suppress,
    /// Run the full restart sequence
    Restart,
}

/// Owns the current `PlaybackTrack`
#[derive(Debug, Default)]
pub struct ContinuityPolicy {
    current: Option<PlaybackTrack>,
}

impl ContinuityPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn current(&self) -> Option<&PlaybackTrack> {
        self.current.as_ref()
    }

    /// Decide what to do with a track event given the device phase. A
    /// restart records the new track.
    pub fn decide(&mut self, emotion: &str, song: &str, phase: PlaybackPhase) -> Decision {
        if let Some(current) = &self.current {
            if current.is_same_song(song) && phase == PlaybackPhase::Playing {
                debug!(
                    song,
                    started_for = %current.emotion_label,
                    "same song already playing, skipping reload"
                );
                return Decision::Suppress;
            }
        }

        self.current = Some(PlaybackTrack {
            identifier: song.to_owned(),
            emotion_label: emotion.to_owned(),
        });
        Decision::Restart
    }

    /// Render the event, then restart playback unless it is redundant.
    ///
    /// Events with a blank song are dropped before anything is rendered. A
    /// blank emotion label is rendered as is.
    pub fn on_track_event(
        &mut self,
        emotion: &str,
        song: &str,
        driver: &mut PlaybackDriver,
        ui: &impl RenderSurface,
    ) {
        if song.trim().is_empty() {
            warn!(emotion, "dropping track event without a song");
            return;
        }
        if emotion.trim().is_empty() {
            warn!(song, "track event carries a blank emotion label");
        }

        ui.set_emotion(emotion);
        ui.set_song(song);
        ui.set_status(&format!("{} {} music", TRACK_STATUS_PREFIX, emotion));

        match self.decide(emotion, song, driver.phase()) {
            Decision::Suppress => {}
            Decision::Restart => driver.restart(song),
        }
    }
}
