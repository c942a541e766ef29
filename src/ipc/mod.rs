//! IPC module for daemon-client communication

pub mod codec;
mod protocol;
mod server;

pub use codec::FrameError;
pub use server::Server;
