//! Detection service contract
//!
//! The emotion detector and song selector live in a separate process. This
//! module only knows how to ask it to start or stop, and what it answers.

mod client;

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::ipc::FrameError;

pub use client::SocketDetectionService;

/// Outcome reported by the detection service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyStatus {
    Success,
    Error,
}

impl std::fmt::Display for ReplyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplyStatus::Success => write!(f, "success"),
            ReplyStatus::Error => write!(f, "error"),
        }
    }
}

/// Reply to a start or stop call: `{"status": "success"|"error", "message"?}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceReply {
    pub status: ReplyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ServiceReply {
    #[cfg(test)]
    pub fn success() -> Self {
        Self {
            status: ReplyStatus::Success,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ReplyStatus::Error,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ReplyStatus::Success
    }

    /// The service message, if it carried a non-blank one
    pub fn message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}

/// Errors talking to the detection service
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("detection service unreachable at {path}: {source}")]
    Connect {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("detection service exchange failed: {0}")]
    Frame(#[from] FrameError),

    #[error("detection service closed the connection without replying")]
    NoReply,
}

/// The external detection-and-selection service
///
/// Both calls are awaited to completion; there is no cancellation.
pub trait DetectionService: Send + Sync + 'static {
    /// Ask the service to begin detecting emotions and pushing track events
    fn start(&self) -> impl Future<Output = Result<ServiceReply, ServiceError>> + Send;

    /// Ask the service to stop detecting
    fn stop(&self) -> impl Future<Output = Result<ServiceReply, ServiceError>> + Send;
}
