//! Session state module
//!
//! Three pieces of mutable state, each with a single owner:
//! - SelectionMode: owned by the mode selector
//! - DetectionState: owned by the detection controller
//! - PlaybackTrack: owned by the playback continuity policy
//!
//! `Session` holds all three and is the only thing that drives them.

mod detection;
mod mode;
mod session;

pub use detection::{DetectionState, READY_STATUS};
pub use mode::SelectionMode;
pub use session::Session;
