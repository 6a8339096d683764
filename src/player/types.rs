//! Small shared player types: loop mode and the playback snapshot handed to
//! the UI and MPRIS.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::adapter::AdapterKind;
use crate::config::LoopModeSetting;

use super::transport::TransportStatus;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum LoopMode {
    /// Stop after the last track.
    #[default]
    NoLoop,
    /// Wrap around to the first track.
    LoopAll,
    /// Repeat the current track when it ends.
    LoopOne,
}

impl LoopMode {
    pub fn cycle(self) -> Self {
        match self {
            Self::NoLoop => Self::LoopAll,
            Self::LoopAll => Self::LoopOne,
            Self::LoopOne => Self::NoLoop,
        }
    }
}

impl From<LoopModeSetting> for LoopMode {
    fn from(setting: LoopModeSetting) -> Self {
        match setting {
            LoopModeSetting::NoLoop => Self::NoLoop,
            LoopModeSetting::LoopAll => Self::LoopAll,
            LoopModeSetting::LoopOne => Self::LoopOne,
        }
    }
}

impl fmt::Display for LoopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoLoop => write!(f, "no loop"),
            Self::LoopAll => write!(f, "loop all"),
            Self::LoopOne => write!(f, "loop one"),
        }
    }
}

/// Runtime playback information shared with the UI and MPRIS.
#[derive(Debug, Clone)]
pub struct PlaybackInfo {
    pub track_id: Option<String>,
    /// Registry index of the current track.
    pub index: Option<usize>,
    pub status: TransportStatus,
    pub adapter: Option<AdapterKind>,
    pub elapsed: Duration,
    pub total: Option<Duration>,
    pub volume: f32,
    pub loop_mode: LoopMode,
    /// Why the last navigation request did nothing, until the next selection.
    pub notice: Option<String>,
}

impl PlaybackInfo {
    pub fn playing(&self) -> bool {
        self.status == TransportStatus::Playing
    }
}

impl Default for PlaybackInfo {
    fn default() -> Self {
        Self {
            track_id: None,
            index: None,
            status: TransportStatus::Idle,
            adapter: None,
            elapsed: Duration::ZERO,
            total: None,
            volume: 1.0,
            loop_mode: LoopMode::default(),
            notice: None,
        }
    }
}

pub type PlaybackHandle = Arc<Mutex<PlaybackInfo>>;
