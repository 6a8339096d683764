//! Error types for legato.
//!
//! Adapter failures are normalized into [`PlaybackError`] before they reach the
//! transport; provider-specific codes never leave the adapter layer.

use thiserror::Error;

/// Normalized playback failure reported by a player adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlaybackError {
    /// The source is missing, malformed or cannot be decoded.
    #[error("source is not playable")]
    SourceInvalid,

    /// The provider refused to embed the item, even with relaxed options.
    #[error("embedding is not permitted for this item")]
    EmbedNotPermitted,

    /// The underlying engine could not be created or never became ready.
    #[error("player failed to initialize")]
    InitializationFailed,

    /// The platform blocked the start of playback (e.g. autoplay policy).
    #[error("playback was rejected by the platform")]
    PlaybackRejected,
}

impl PlaybackError {
    /// Whether the transport may retry this failure without user action.
    pub fn is_recoverable(self) -> bool {
        matches!(self, Self::PlaybackRejected)
    }
}

/// Why a navigation request left the coordinator unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoopReason {
    /// The registry holds no tracks.
    EmptyRegistry,
    /// No track is selected, so there is nothing to move from.
    NoSelection,
    /// Already at the first or last track.
    Boundary,
    /// No track with this id exists in the registry.
    UnknownTrack(String),
}

impl std::fmt::Display for NoopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyRegistry => write!(f, "registry is empty"),
            Self::NoSelection => write!(f, "no track selected"),
            Self::Boundary => write!(f, "already at the registry boundary"),
            Self::UnknownTrack(id) => write!(f, "unknown track id {id:?}"),
        }
    }
}

/// Main error type for legato operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Navigation had no effect.
    #[error("navigation no-op: {0}")]
    NavigationNoop(NoopReason),

    /// Adapter failure surfaced to the caller.
    #[error(transparent)]
    Playback(#[from] PlaybackError),

    /// The track catalog could not be read.
    #[error("catalog error: {0}")]
    Catalog(String),

    /// Configuration failed to load.
    #[error("config error: {0}")]
    Config(#[from] ::config::ConfigError),

    /// The log file could not be set up.
    #[error("logging setup failed: {0}")]
    Logging(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for legato operations.
pub type Result<T> = std::result::Result<T, Error>;
