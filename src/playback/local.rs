//! Local audio output through rodio

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tracing::info;

use super::{AudioDevice, PlaybackError, PlaybackPhase};

/// Plays songs on the default output device
pub struct RodioDevice {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    sink: Option<Sink>,
    source: Option<PathBuf>,
}

impl RodioDevice {
    pub fn open() -> Result<Self, PlaybackError> {
        let (stream, stream_handle) =
            OutputStream::try_default().map_err(|e| PlaybackError::Backend(e.to_string()))?;

        info!("local audio output opened");

        Ok(Self {
            _stream: stream,
            stream_handle,
            sink: None,
            source: None,
        })
    }
}

impl AudioDevice for RodioDevice {
    fn stop(&mut self) -> Result<(), PlaybackError> {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        Ok(())
    }

    fn seek_to_start(&mut self) -> Result<(), PlaybackError> {
        if let Some(sink) = &self.sink {
            sink.try_seek(Duration::ZERO)
                .map_err(|e| PlaybackError::Backend(e.to_string()))?;
        }
        Ok(())
    }

    fn set_source(&mut self, source: &Path) -> Result<(), PlaybackError> {
        self.source = Some(source.to_owned());
        Ok(())
    }

    fn load(&mut self) -> Result<(), PlaybackError> {
        let path = self.source.as_ref().ok_or(PlaybackError::NoSource)?;

        let file = File::open(path).map_err(|source| PlaybackError::Open {
            path: path.clone(),
            source,
        })?;
        let decoder =
            Decoder::new(BufReader::new(file)).map_err(|e| PlaybackError::Decode(e.to_string()))?;

        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| PlaybackError::Backend(e.to_string()))?;
        sink.pause();
        sink.append(decoder);

        if let Some(old) = self.sink.replace(sink) {
            old.stop();
        }
        Ok(())
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        let sink = self.sink.as_ref().ok_or(PlaybackError::NoSource)?;
        sink.play();
        Ok(())
    }

    fn phase(&self) -> PlaybackPhase {
        match &self.sink {
            None => PlaybackPhase::NotStarted,
            Some(sink) if sink.empty() => PlaybackPhase::Ended,
            Some(sink) if sink.is_paused() => PlaybackPhase::Paused,
            Some(_) => PlaybackPhase::Playing,
        }
    }
}
