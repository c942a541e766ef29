//! In-memory fakes shared by unit tests

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::playback::{AudioDevice, PlaybackError, PlaybackPhase};
use crate::service::{DetectionService, ServiceError, ServiceReply};

/// One call made on a `FakeDevice`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceOp {
    Stop,
    SeekToStart,
    SetSource(PathBuf),
    Load,
    Play,
}

#[derive(Debug, Default)]
struct DeviceLog {
    ops: Vec<DeviceOp>,
    source: Option<PathBuf>,
    phase: PlaybackPhase,
    fail_on_load: bool,
}

/// Audio device that records every call. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct FakeDevice {
    log: Arc<Mutex<DeviceLog>>,
}

impl FakeDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> Vec<DeviceOp> {
        self.log.lock().unwrap().ops.clone()
    }

    pub fn count(&self, op: &DeviceOp) -> usize {
        self.log.lock().unwrap().ops.iter().filter(|o| *o == op).count()
    }

    pub fn clear_ops(&self) {
        self.log.lock().unwrap().ops.clear();
    }

    pub fn set_phase(&self, phase: PlaybackPhase) {
        self.log.lock().unwrap().phase = phase;
    }

    pub fn fail_on_load(&self) {
        self.log.lock().unwrap().fail_on_load = true;
    }

    fn record(&self, op: DeviceOp) {
        self.log.lock().unwrap().ops.push(op);
    }
}

impl AudioDevice for FakeDevice {
    fn stop(&mut self) -> Result<(), PlaybackError> {
        self.record(DeviceOp::Stop);
        Ok(())
    }

    fn seek_to_start(&mut self) -> Result<(), PlaybackError> {
        self.record(DeviceOp::SeekToStart);
        Ok(())
    }

    fn set_source(&mut self, source: &Path) -> Result<(), PlaybackError> {
        self.record(DeviceOp::SetSource(source.to_owned()));
        self.log.lock().unwrap().source = Some(source.to_owned());
        Ok(())
    }

    fn load(&mut self) -> Result<(), PlaybackError> {
        self.record(DeviceOp::Load);
        if self.log.lock().unwrap().fail_on_load {
            return Err(PlaybackError::Backend("fake load failure".into()));
        }
        Ok(())
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        self.record(DeviceOp::Play);
        self.set_phase(PlaybackPhase::Playing);
        Ok(())
    }

    fn phase(&self) -> PlaybackPhase {
        self.log.lock().unwrap().phase
    }

    fn observe_phase(&mut self, source: &Path, phase: PlaybackPhase) {
        let mut log = self.log.lock().unwrap();
        if log.source.as_deref() == Some(source) {
            log.phase = phase;
        }
    }
}

/// Detection service answering from a scripted queue, success once empty
#[derive(Debug, Default)]
pub struct FakeService {
    starts: AtomicUsize,
    stops: AtomicUsize,
    replies: Mutex<VecDeque<ServiceReply>>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(replies: impl IntoIterator<Item = ServiceReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> ServiceReply {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(ServiceReply::success)
    }
}

impl DetectionService for FakeService {
    async fn start(&self) -> Result<ServiceReply, ServiceError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(self.next_reply())
    }

    async fn stop(&self) -> Result<ServiceReply, ServiceError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(self.next_reply())
    }
}
