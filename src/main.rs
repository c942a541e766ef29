//! emotune-daemon: session controller for emotion-driven music playback
//!
//! This daemon sits between a presentation surface and an external
//! emotion detection service and provides:
//! - Selection mode tracking (queue, emotion, random)
//! - Detection lifecycle state machine (Idle, Starting, Active, Stopping)
//! - Playback continuity policy for incoming track events
//! - IPC server for surface clients and the detection service
//!
//! Out of scope: detecting emotions, choosing songs, decoding audio
//! (beyond the optional local backend).

mod config;
mod events;
mod ipc;
mod lifecycle;
mod playback;
mod service;
mod state;
mod surface;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::events::{Notification, SessionEvent};
use crate::ipc::Server;
use crate::lifecycle::ShutdownSignal;
use crate::playback::PlaybackDriver;
use crate::service::SocketDetectionService;
use crate::state::Session;
use crate::surface::BroadcastSurface;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "emotune-daemon starting"
    );

    // Load configuration
    let config = Config::load()?;
    config.ensure_dirs()?;
    info!(
        socket = ?config.socket_path,
        service = ?config.service_socket_path,
        songs = ?config.songs_dir,
        playback = %config.playback,
        "configuration loaded"
    );

    // Create shutdown signal handler
    let shutdown = ShutdownSignal::new();

    // Create channels for inter-component communication
    // IPC clients and service replies -> session
    let (session_tx, session_rx) = mpsc::channel::<SessionEvent>(64);
    // Session -> subscribed clients
    let (notify_tx, _notify_rx) = broadcast::channel::<Notification>(128);

    // Mirror of everything rendered, kept for status snapshots
    let mut mirror_rx = notify_tx.subscribe();

    let device = playback::open_device(config.playback, notify_tx.clone())?;
    let driver = PlaybackDriver::new(device, config.songs_dir.clone());
    let service = Arc::new(SocketDetectionService::new(&config.service_socket_path));
    let surface = BroadcastSurface::new(notify_tx.clone());

    // Create the session
    let mut session = Session::new(service, surface, driver, session_tx.clone());

    // Create IPC server
    let server = Server::new(&config.socket_path, session_tx, notify_tx)?;
    let server_for_events = &server;

    session.init();

    info!("daemon initialized, entering main loop");

    // Main event loop
    tokio::select! {
        // Run the session (processes intents, pushes and replies)
        _ = session.run(session_rx) => {
            info!("session exited");
        }

        // Run the IPC server (accepts client connections)
        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        // Keep the status snapshot in step with what was rendered
        _ = async {
            loop {
                match mirror_rx.recv().await {
                    Ok(notification) => {
                        server_for_events.apply(&notification).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "notification mirror lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        } => {
            info!("notification mirror exited");
        }

        // Wait for shutdown signal
        _ = async {
            if let Err(e) = shutdown.wait().await {
                error!(?e, "failed to register signal handlers, running until killed");
                std::future::pending::<()>().await;
            }
        } => {
            info!("shutdown signal received");
        }
    }

    // Cleanup
    info!("shutting down...");

    server.shutdown().await;

    info!("emotune-daemon stopped");

    Ok(())
}
