//! Unix socket client for the detection service
//!
//! One connection per call: connect, send a framed request, read one framed
//! reply, hang up.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::net::UnixStream;
use tracing::debug;

use crate::ipc::codec;

use super::{DetectionService, ServiceError, ServiceReply};

/// Requests understood by the detection service
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServiceRequest {
    Start,
    Stop,
}

/// Detection service reached over a Unix domain socket
#[derive(Debug, Clone)]
pub struct SocketDetectionService {
    socket_path: PathBuf,
}

impl SocketDetectionService {
    pub fn new(socket_path: &Path) -> Self {
        Self {
            socket_path: socket_path.to_owned(),
        }
    }

    async fn call(&self, request: ServiceRequest) -> Result<ServiceReply, ServiceError> {
        let mut stream =
            UnixStream::connect(&self.socket_path)
                .await
                .map_err(|source| ServiceError::Connect {
                    path: self.socket_path.display().to_string(),
                    source,
                })?;

        debug!(?request, "calling detection service");
        codec::write_frame(&mut stream, &request).await?;

        let reply: ServiceReply = codec::read_frame(&mut stream)
            .await?
            .ok_or(ServiceError::NoReply)?;

        debug!(?request, status = %reply.status, "detection service replied");
        Ok(reply)
    }
}

impl DetectionService for SocketDetectionService {
    async fn start(&self) -> Result<ServiceReply, ServiceError> {
        self.call(ServiceRequest::Start).await
    }

    async fn stop(&self) -> Result<ServiceReply, ServiceError> {
        self.call(ServiceRequest::Stop).await
    }
}
