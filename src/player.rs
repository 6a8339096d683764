//! Playback coordination.
//!
//! [`Coordinator`] is the one object the host constructs at startup and
//! hands to whatever needs to control playback. It owns the track registry,
//! the transport state machine, exactly one active adapter and exactly one
//! sync timer. Deferred effects (engine callbacks, navigation resumes) carry
//! the generation of the adapter they were meant for and are dropped when
//! that adapter is no longer the active one.

mod coordinator;
mod registry;
mod sync;
mod transport;
mod types;

pub use coordinator::Coordinator;
pub use sync::TimeDisplay;
pub use transport::TransportStatus;
pub use types::{LoopMode, PlaybackInfo};
