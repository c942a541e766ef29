//! Audio device living on the surface side
//!
//! Each command goes out as a `playback` notification for a subscribed
//! client that owns the real audio element. That client reports its phase
//! back with `playback_phase` requests naming the source they are about.
//! Reports for any other source are stale and ignored; until a matching one
//! arrives the phase is the one the last command implies.

use std::path::{Path, PathBuf};

use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::events::{Notification, PlaybackCommand};

use super::{AudioDevice, PlaybackError, PlaybackPhase};

pub struct RemoteDevice {
    notifications: broadcast::Sender<Notification>,
    source: Option<PathBuf>,
    phase: PlaybackPhase,
}

impl RemoteDevice {
    pub fn new(notifications: broadcast::Sender<Notification>) -> Self {
        Self {
            notifications,
            source: None,
            phase: PlaybackPhase::NotStarted,
        }
    }

    fn send(&self, command: PlaybackCommand) -> Result<(), PlaybackError> {
        trace!(?command, "forwarding playback command");
        self.notifications
            .send(Notification::Playback { command })
            .map(|_| ())
            .map_err(|_| PlaybackError::Backend("no surface is listening".into()))
    }
}

impl AudioDevice for RemoteDevice {
    fn stop(&mut self) -> Result<(), PlaybackError> {
        self.send(PlaybackCommand::Stop)?;
        if self.phase == PlaybackPhase::Playing {
            self.phase = PlaybackPhase::Paused;
        }
        Ok(())
    }

    fn seek_to_start(&mut self) -> Result<(), PlaybackError> {
        self.send(PlaybackCommand::SeekToStart)
    }

    fn set_source(&mut self, source: &Path) -> Result<(), PlaybackError> {
        self.send(PlaybackCommand::SetSource {
            source: source.display().to_string(),
        })?;
        self.source = Some(source.to_owned());
        Ok(())
    }

    fn load(&mut self) -> Result<(), PlaybackError> {
        if self.source.is_none() {
            return Err(PlaybackError::NoSource);
        }
        self.send(PlaybackCommand::Load)?;
        self.phase = PlaybackPhase::NotStarted;
        Ok(())
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        if self.source.is_none() {
            return Err(PlaybackError::NoSource);
        }
        self.send(PlaybackCommand::Play)?;
        self.phase = PlaybackPhase::Playing;
        Ok(())
    }

    fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    fn observe_phase(&mut self, source: &Path, phase: PlaybackPhase) {
        if self.source.as_deref() != Some(source) {
            debug!(?source, %phase, "ignoring phase report for a previous source");
            return;
        }
        self.phase = phase;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::{ContinuityPolicy, PlaybackDriver};
    use crate::surface::BroadcastSurface;

    fn commands(rx: &mut broadcast::Receiver<Notification>) -> Vec<PlaybackCommand> {
        std::iter::from_fn(|| rx.try_recv().ok())
            .filter_map(|n| match n {
                Notification::Playback { command } => Some(command),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_forwards_commands() {
        let (tx, mut rx) = broadcast::channel(16);
        let mut device = RemoteDevice::new(tx);

        device.stop().unwrap();
        device.seek_to_start().unwrap();
        device.set_source(Path::new("songs/sunny.mp3")).unwrap();
        device.load().unwrap();
        device.play().unwrap();

        assert_eq!(
            commands(&mut rx),
            vec![
                PlaybackCommand::Stop,
                PlaybackCommand::SeekToStart,
                PlaybackCommand::SetSource {
                    source: "songs/sunny.mp3".into()
                },
                PlaybackCommand::Load,
                PlaybackCommand::Play,
            ]
        );
        assert_eq!(device.phase(), PlaybackPhase::Playing);
    }

    #[test]
    fn test_reported_phase_wins() {
        let (tx, _rx) = broadcast::channel(16);
        let mut device = RemoteDevice::new(tx);
        device.set_source(Path::new("a.mp3")).unwrap();
        device.play().unwrap();

        device.observe_phase(Path::new("a.mp3"), PlaybackPhase::Ended);
        assert_eq!(device.phase(), PlaybackPhase::Ended);
    }

    #[test]
    fn test_stale_phase_report_is_ignored() {
        let (tx, _rx) = broadcast::channel(16);
        let mut device = RemoteDevice::new(tx);
        device.set_source(Path::new("a.mp3")).unwrap();
        device.play().unwrap();
        device.set_source(Path::new("b.mp3")).unwrap();
        device.play().unwrap();

        device.observe_phase(Path::new("a.mp3"), PlaybackPhase::Ended);
        assert_eq!(device.phase(), PlaybackPhase::Playing);
    }

    #[test]
    fn test_late_report_for_previous_song_does_not_restart_current() {
        let (tx, mut rx) = broadcast::channel(64);
        let surface = BroadcastSurface::new(tx.clone());
        let device = RemoteDevice::new(tx);
        let mut driver = PlaybackDriver::new(Box::new(device), PathBuf::from("songs"));
        let mut policy = ContinuityPolicy::new();

        policy.on_track_event("happy", "a.mp3", &mut driver, &surface);
        policy.on_track_event("sad", "b.mp3", &mut driver, &surface);
        driver.observe_phase("songs/a.mp3", PlaybackPhase::Ended);
        policy.on_track_event("sad", "b.mp3", &mut driver, &surface);

        let plays = commands(&mut rx)
            .into_iter()
            .filter(|c| *c == PlaybackCommand::Play)
            .count();
        assert_eq!(plays, 2);
    }

    #[test]
    fn test_play_without_source() {
        let (tx, _rx) = broadcast::channel(16);
        let mut device = RemoteDevice::new(tx);
        assert!(matches!(device.play(), Err(PlaybackError::NoSource)));
    }

    #[test]
    fn test_no_listener_is_an_error() {
        let (tx, rx) = broadcast::channel(16);
        drop(rx);
        let mut device = RemoteDevice::new(tx);
        assert!(matches!(device.stop(), Err(PlaybackError::Backend(_))));
    }
}
