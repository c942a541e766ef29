//! Configuration loading and management

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

/// Where audio is actually produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackBackend {
    /// Forward playback commands to a subscribed surface client
    Remote,
    /// Play through the local output device (feature `audio`)
    Local,
}

impl FromStr for PlaybackBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(Self::Remote),
            "local" => Ok(Self::Local),
            other => bail!("unknown playback backend {:?}, expected remote or local", other),
        }
    }
}

impl std::fmt::Display for PlaybackBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackBackend::Remote => write!(f, "remote"),
            PlaybackBackend::Local => write!(f, "local"),
        }
    }
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Socket the detection service listens on
    pub service_socket_path: PathBuf,

    /// Directory song identifiers are resolved against
    pub songs_dir: PathBuf,

    /// Directory for runtime data
    pub data_dir: PathBuf,

    pub playback: PlaybackBackend,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any variable source
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let home = lookup("HOME").context("HOME is not set")?;
        let data_dir = PathBuf::from(&home)
            .join(".local")
            .join("share")
            .join("emotune");

        let path_or = |key: &str, default: PathBuf| lookup(key).map(PathBuf::from).unwrap_or(default);

        let socket_path = path_or("EMOTUNE_SOCKET", data_dir.join("daemon.sock"));
        let service_socket_path = path_or("EMOTUNE_SERVICE_SOCKET", data_dir.join("detector.sock"));
        let songs_dir = path_or("EMOTUNE_SONGS_DIR", data_dir.join("songs"));

        let playback = match lookup("EMOTUNE_PLAYBACK") {
            Some(value) => value
                .parse::<PlaybackBackend>()
                .context("invalid EMOTUNE_PLAYBACK")?,
            None => PlaybackBackend::Remote,
        };

        Ok(Self {
            socket_path,
            service_socket_path,
            songs_dir,
            data_dir,
            playback,
        })
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}
