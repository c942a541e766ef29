//! Unix domain socket server for IPC
//!
//! Accepts surface clients and the detection service on one socket.
//! Requests that carry a session event are queued to the session loop;
//! subscribed connections additionally get every `Notification` pushed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::events::{Notification, SessionEvent};

use super::codec::{self, FrameError};
use super::protocol::{Request, Response, SessionStatus};

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: Option<UnixListener>,
    state: Arc<RwLock<ServerState>>,
    shutdown_tx: broadcast::Sender<()>,
    /// Inbox of the session loop
    session_tx: mpsc::Sender<SessionEvent>,
    /// Render notifications fanned out to subscribers
    notifications: broadcast::Sender<Notification>,
}

/// Shared server state
struct ServerState {
    status: SessionStatus,
    start_time: std::time::Instant,
}

/// What each client handler needs
#[derive(Clone)]
struct ClientContext {
    state: Arc<RwLock<ServerState>>,
    session_tx: mpsc::Sender<SessionEvent>,
    notifications: broadcast::Sender<Notification>,
}

type SharedWriter = Arc<Mutex<OwnedWriteHalf>>;

impl Server {
    /// Create a new IPC server
    pub fn new(
        socket_path: &Path,
        session_tx: mpsc::Sender<SessionEvent>,
        notifications: broadcast::Sender<Notification>,
    ) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // Set socket permissions to owner-only (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        let state = Arc::new(RwLock::new(ServerState {
            status: SessionStatus::default(),
            start_time: std::time::Instant::now(),
        }));

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener: Some(listener),
            state,
            shutdown_tx,
            session_tx,
            notifications,
        })
    }

    /// Mirror a rendered notification into the status snapshot
    pub async fn apply(&self, notification: &Notification) {
        let mut server_state = self.state.write().await;
        server_state.status.apply(notification);
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        let listener = self.listener.as_ref().context("server not initialized")?;

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let ctx = ClientContext {
                        state: Arc::clone(&self.state),
                        session_tx: self.session_tx.clone(),
                        notifications: self.notifications.clone(),
                    };
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = Self::handle_client(stream, ctx) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Handle a single client connection
    async fn handle_client(stream: UnixStream, ctx: ClientContext) -> Result<()> {
        let (mut reader, writer) = stream.into_split();
        let writer: SharedWriter = Arc::new(Mutex::new(writer));
        let mut forwarder: Option<JoinHandle<()>> = None;

        let result: Result<()> = loop {
            let body = match codec::read_frame_bytes(&mut reader).await {
                Ok(Some(body)) => body,
                Ok(None) => {
                    debug!("client disconnected");
                    break Ok(());
                }
                Err(FrameError::TooLarge(len)) => {
                    warn!(len, "message too large, disconnecting");
                    break Ok(());
                }
                Err(e) => break Err(e.into()),
            };

            let (response, subscribe) = match serde_json::from_slice::<Request>(&body) {
                Ok(request) => {
                    debug!(?request, "received request");
                    Self::process_request(request, &ctx).await
                }
                Err(e) => {
                    warn!(error = %e, "malformed request");
                    let response = Response::Error {
                        code: "bad_request".into(),
                        message: e.to_string(),
                    };
                    (response, false)
                }
            };

            if let Err(e) = codec::write_frame(&mut *writer.lock().await, &response).await {
                break Err(e.into());
            }

            if subscribe && forwarder.is_none() {
                debug!("client subscribed to notifications");
                forwarder = Some(Self::forward_notifications(
                    ctx.notifications.subscribe(),
                    Arc::clone(&writer),
                ));
            }
        };

        if let Some(task) = forwarder {
            task.abort();
        }
        result
    }

    /// Push every notification to a subscribed client until it goes away
    fn forward_notifications(
        mut rx: broadcast::Receiver<Notification>,
        writer: SharedWriter,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(notification) => {
                        let mut writer = writer.lock().await;
                        if let Err(e) = codec::write_frame(&mut *writer, &notification).await {
                            debug!(error = %e, "subscriber went away");
                            break;
                        }
                    }
                    // Dropped frames may include playback commands, so an
                    // audio client can fall out of step with the device phase
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        error!(
                            skipped = n,
                            "subscriber lagged, notifications and playback commands dropped"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Process a request and return a response
    /// Returns (Response, should_subscribe)
    async fn process_request(request: Request, ctx: &ClientContext) -> (Response, bool) {
        match request {
            Request::Ping => (Response::Pong, false),

            Request::GetStatus => {
                let mut state = ctx.state.write().await;
                state.status.uptime_secs = state.start_time.elapsed().as_secs();
                (Response::Status(state.status.clone()), false)
            }

            Request::Subscribe => (Response::Subscribed, true),

            other => {
                let Some(event) = other.into_session_event() else {
                    let response = Response::Error {
                        code: "unsupported".into(),
                        message: "request carries no session event".into(),
                    };
                    return (response, false);
                };

                match ctx.session_tx.send(event).await {
                    Ok(()) => (Response::Accepted, false),
                    Err(_) => {
                        error!("session loop is gone, dropping event");
                        let response = Response::Error {
                            code: "unavailable".into(),
                            message: "session is not running".into(),
                        };
                        (response, false)
                    }
                }
            }
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        // Remove socket file
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}
