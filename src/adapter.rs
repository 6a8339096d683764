//! Player adapters: one control surface over two very different engines.
//!
//! [`select_adapter`] is the only place that looks at the shape of a track's
//! source. Everything downstream talks to a `Box<dyn PlayerAdapter>`.
//!
//! Each adapter instance runs its own small state machine:
//!
//! ```text
//! Unloaded -> Loading -> Ready -> (Playing | Paused) -> Destroyed
//!                  \________\___________\______-> Errored
//! ```
//!
//! Control calls that arrive before `Ready` are kept as pending intents (one
//! slot per operation kind, last write wins) and replayed once the engine
//! reports readiness.

mod embedded_video;
mod inline_audio;

use std::fmt;
use std::rc::Rc;

use url::Url;

use crate::config::EmbedSettings;
use crate::engine::{EngineEvent, Engines, EventSink};
use crate::error::PlaybackError;

pub use embedded_video::EmbeddedVideoAdapter;
pub use inline_audio::InlineAudioAdapter;

/// Which adapter variant drives a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    InlineAudio,
    EmbeddedVideo,
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InlineAudio => write!(f, "audio"),
            Self::EmbeddedVideo => write!(f, "video"),
        }
    }
}

/// Pick the adapter variant for a playable source.
///
/// Video references are `youtube:` URIs, links on the provider's hosts and
/// bare video ids. Everything else is treated as a direct media source.
pub fn select_adapter(source: &str) -> AdapterKind {
    let source = source.trim();
    if embedded_video::is_bare_video_id(source) {
        return AdapterKind::EmbeddedVideo;
    }

    match Url::parse(source) {
        Ok(url) if url.scheme() == "youtube" => AdapterKind::EmbeddedVideo,
        Ok(url) if url.host_str().is_some_and(is_video_host) => AdapterKind::EmbeddedVideo,
        _ => AdapterKind::InlineAudio,
    }
}

pub(crate) fn is_video_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host == "youtu.be"
        || host == "youtube.com"
        || host.ends_with(".youtube.com")
        || host == "youtube-nocookie.com"
        || host.ends_with(".youtube-nocookie.com")
}

/// Lifecycle of one adapter instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    Unloaded,
    Loading,
    Ready,
    Playing,
    Paused,
    Destroyed,
    Errored(PlaybackError),
}

impl AdapterState {
    /// The engine has finished loading and accepts control calls.
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Ready | Self::Playing | Self::Paused)
    }

    /// No further control calls or events have any effect.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Destroyed | Self::Errored(_))
    }
}

/// What an adapter reports upward after handling an engine event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdapterSignal {
    Ready { duration: Option<f64> },
    Started,
    Paused,
    Ended,
    Failed(PlaybackError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransportIntent {
    Play,
    Pause,
}

/// Control calls buffered until the engine is ready.
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct PendingIntents {
    pub transport: Option<TransportIntent>,
    pub seek: Option<f64>,
    pub volume: Option<f32>,
}

impl PendingIntents {
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}

/// Clamp a seek target to `[0, duration]`, or to `>= 0` while the duration is unknown.
pub(crate) fn clamp_position(position: f64, duration: Option<f64>) -> f64 {
    let position = if position.is_finite() { position.max(0.0) } else { 0.0 };
    match duration {
        Some(d) if d.is_finite() && d > 0.0 => position.min(d),
        _ => position,
    }
}

/// Uniform control surface over a playback engine.
pub trait PlayerAdapter {
    fn kind(&self) -> AdapterKind;

    /// Generation assigned by the coordinator; engine events carry it.
    fn generation(&self) -> u64;

    fn state(&self) -> AdapterState;

    /// Point the engine at `source`. The only call that changes the source.
    fn load(&mut self, source: &str) -> Result<(), PlaybackError>;

    fn play(&mut self);

    fn pause(&mut self);

    /// Seek to `position` seconds.
    fn seek(&mut self, position: f64);

    /// Volume in `[0, 1]`.
    fn set_volume(&mut self, volume: f32);

    /// Current position in seconds, `None` while unavailable.
    fn position(&self) -> Option<f64>;

    /// Total duration in seconds, `None` while unknown.
    fn duration(&self) -> Option<f64>;

    /// Translate an engine event from engine `instance` into a signal.
    fn handle_event(&mut self, instance: u32, event: EngineEvent) -> Option<AdapterSignal>;

    /// Release the engine. Every later call is a no-op.
    fn destroy(&mut self);
}

/// Everything needed to build adapters of either kind.
#[derive(Clone)]
pub struct AdapterContext {
    pub engines: Rc<dyn Engines>,
    pub events: EventSink,
    pub embed: EmbedSettings,
}

/// Build the adapter for `source`, bound to `generation`.
pub fn create_adapter(
    source: &str,
    generation: u64,
    ctx: &AdapterContext,
) -> Box<dyn PlayerAdapter> {
    let events = ctx.events.for_generation(generation);
    match select_adapter(source) {
        AdapterKind::InlineAudio => Box::new(InlineAudioAdapter::new(
            generation,
            ctx.engines.clone(),
            events,
        )),
        AdapterKind::EmbeddedVideo => Box::new(EmbeddedVideoAdapter::new(
            generation,
            ctx.engines.clone(),
            events,
            ctx.embed.clone(),
        )),
    }
}
