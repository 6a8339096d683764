//! Application view model used by the TUI and the runtime.
//!
//! `App` lives in `app::model` and holds the list cursor, the filter and the
//! follow-playback flag. Playback state is read from the coordinator's
//! playback handle, never stored here.

mod model;

pub use model::*;

#[cfg(test)]
mod tests;
