use std::fmt;

use crate::error::PlaybackError;

/// Coordinator-level playback status.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransportStatus {
    /// No track selected.
    Idle,
    /// A track is selected and not playing.
    Ready,
    Playing,
    /// Playback failed; only a new selection or a retry leaves this state.
    Suspended(PlaybackError),
}

impl fmt::Display for TransportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "stopped"),
            Self::Ready => write!(f, "paused"),
            Self::Playing => write!(f, "playing"),
            Self::Suspended(_) => write!(f, "unplayable"),
        }
    }
}

/// Transport state machine.
///
/// Only tracks status, the start handshake and volume. It never talks to an
/// adapter; the coordinator does that based on what these methods return.
#[derive(Debug)]
pub struct Transport {
    status: TransportStatus,
    volume: f32,
    /// `play()` was forwarded and the adapter has not confirmed yet.
    awaiting_start: bool,
    play_retries: u32,
    retries_left: u32,
}

impl Transport {
    pub fn new(volume: f32, play_retries: u32) -> Self {
        Self {
            status: TransportStatus::Idle,
            volume: clamp_volume(volume, 1.0),
            awaiting_start: false,
            play_retries,
            retries_left: play_retries,
        }
    }

    pub fn status(&self) -> TransportStatus {
        self.status
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn awaiting_start(&self) -> bool {
        self.awaiting_start
    }

    /// Store a volume clamped to `[0, 1]` and return it.
    pub fn set_volume(&mut self, volume: f32) -> f32 {
        self.volume = clamp_volume(volume, self.volume);
        self.volume
    }

    /// A track was selected: `Idle | Ready | Playing | Suspended -> Ready`.
    pub fn select(&mut self) {
        self.status = TransportStatus::Ready;
        self.awaiting_start = false;
        self.retries_left = self.play_retries;
    }

    /// Registry emptied or explicit deselect.
    pub fn clear(&mut self) {
        self.status = TransportStatus::Idle;
        self.awaiting_start = false;
    }

    /// Returns `true` when the play request must be forwarded to the adapter.
    pub fn request_play(&mut self) -> bool {
        if self.status != TransportStatus::Ready || self.awaiting_start {
            return false;
        }
        self.awaiting_start = true;
        true
    }

    /// Returns `true` when the pause must be forwarded to the adapter.
    pub fn request_pause(&mut self) -> bool {
        match self.status {
            TransportStatus::Playing => {
                self.status = TransportStatus::Ready;
                true
            }
            TransportStatus::Ready if self.awaiting_start => {
                self.awaiting_start = false;
                true
            }
            _ => false,
        }
    }

    /// The adapter confirmed playback. Returns `true` on `Ready -> Playing`.
    pub fn confirm_started(&mut self) -> bool {
        if self.status != TransportStatus::Ready {
            return false;
        }
        self.status = TransportStatus::Playing;
        self.awaiting_start = false;
        self.retries_left = self.play_retries;
        true
    }

    /// Playback stopped without a `pause()` call (engine pause or track end).
    pub fn stopped(&mut self) -> bool {
        if self.status != TransportStatus::Playing {
            return false;
        }
        self.status = TransportStatus::Ready;
        true
    }

    /// Use one silent retry after a rejected start, if any remain.
    ///
    /// A rejection while `Playing` (the engine was rebuilt underneath us)
    /// drops back to `Ready` with the start pending again.
    pub fn take_retry(&mut self) -> bool {
        let playing = self.status == TransportStatus::Playing;
        if self.retries_left == 0 || !(self.awaiting_start || playing) {
            return false;
        }
        self.retries_left -= 1;
        if playing {
            self.status = TransportStatus::Ready;
            self.awaiting_start = true;
        }
        true
    }

    pub fn suspend(&mut self, err: PlaybackError) {
        if self.status == TransportStatus::Idle {
            return;
        }
        self.status = TransportStatus::Suspended(err);
        self.awaiting_start = false;
    }
}

fn clamp_volume(volume: f32, fallback: f32) -> f32 {
    if volume.is_nan() {
        return fallback;
    }
    volume.clamp(0.0, 1.0)
}
