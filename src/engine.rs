//! Playback engines the adapters drive, and the event channel they report on.
//!
//! Engines are external collaborators: an inline audio element for direct
//! media sources and an embedded video widget for catalog items that only
//! exist as a video link. They never call back into the coordinator
//! directly; everything they have to say goes through an [`EventSink`] and
//! is picked up by `Coordinator::pump`.

use std::sync::mpsc::{self, Receiver, Sender};

use thiserror::Error;

/// Media error codes reported by an audio element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaErrorCode {
    /// Fetching was aborted (usually because the source was replaced).
    Aborted,
    Network,
    Decode,
    SrcNotSupported,
}

/// Why an element refused a `play()` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayRejection {
    /// Autoplay policy or missing user gesture.
    NotAllowed,
    /// The source cannot be played at all.
    NotSupported,
    /// The request was interrupted by a new load or a pause.
    Aborted,
}

/// Events emitted by an [`AudioElement`].
#[derive(Debug, Clone, PartialEq)]
pub enum ElementEvent {
    LoadedMetadata,
    Playing,
    Paused,
    Ended,
    Error(MediaErrorCode),
    PlayRejected(PlayRejection),
}

/// Player states reported by a [`VideoWidget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Cued,
}

/// Events emitted by a [`VideoWidget`]: the `onReady`, `onStateChange`,
/// `onError` and `onAutoplayBlocked` hooks.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    Ready,
    StateChange(WidgetState),
    /// Raw provider error code.
    Error(i32),
    AutoplayBlocked,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Element(ElementEvent),
    Widget(WidgetEvent),
}

/// An engine event tagged with the adapter generation and engine instance
/// that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub generation: u64,
    pub instance: u32,
    pub event: EngineEvent,
}

/// Sending half handed to an engine when it is created.
#[derive(Debug, Clone)]
pub struct EventSink {
    generation: u64,
    instance: u32,
    tx: Sender<Envelope>,
}

impl EventSink {
    /// Create a channel whose sink is not yet bound to an adapter.
    pub fn channel() -> (Self, Receiver<Envelope>) {
        let (tx, rx) = mpsc::channel();
        (
            Self {
                generation: 0,
                instance: 0,
                tx,
            },
            rx,
        )
    }

    /// A sink bound to adapter `generation`.
    pub fn for_generation(&self, generation: u64) -> Self {
        Self {
            generation,
            instance: 0,
            tx: self.tx.clone(),
        }
    }

    /// A sink bound to engine `instance` of the same adapter.
    pub fn for_instance(&self, instance: u32) -> Self {
        Self {
            generation: self.generation,
            instance,
            tx: self.tx.clone(),
        }
    }

    #[cfg(test)]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[cfg(test)]
    pub fn instance(&self) -> u32 {
        self.instance
    }

    /// Report an event. Events sent after the coordinator is gone are dropped.
    pub fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(Envelope {
            generation: self.generation,
            instance: self.instance,
            event,
        });
    }

    pub fn element(&self, event: ElementEvent) {
        self.emit(EngineEvent::Element(event));
    }

    pub fn widget(&self, event: WidgetEvent) {
        self.emit(EngineEvent::Widget(event));
    }
}

/// Options passed to the widget provider at construction time.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbedOptions {
    pub host: String,
    pub origin: Option<String>,
    pub autoplay: bool,
    pub controls: bool,
    pub playsinline: bool,
    pub enable_js_api: bool,
}

impl EmbedOptions {
    /// The reconfiguration tried once after the provider refuses to embed:
    /// privacy host, no announced origin.
    pub fn relaxed(&self, relaxed_host: &str) -> Self {
        Self {
            host: relaxed_host.to_string(),
            origin: None,
            ..self.clone()
        }
    }
}

/// Engine construction failed.
#[derive(Debug, Clone, Error)]
#[error("engine unavailable: {0}")]
pub struct EngineFault(pub String);

/// An inline audio element playing a direct media source.
pub trait AudioElement {
    /// Replace the source. Completion is reported with `LoadedMetadata` or `Error`.
    fn set_src(&mut self, url: &str);
    /// Request playback. Confirmed with `Playing` or refused with `PlayRejected`.
    fn play(&mut self);
    fn pause(&mut self);
    fn current_time(&self) -> Option<f64>;
    fn set_current_time(&mut self, secs: f64);
    fn duration(&self) -> Option<f64>;
    fn set_volume(&mut self, volume: f32);
    /// Drop the source and release any output resources.
    fn release(&mut self);
}

/// An embedded third-party video player.
pub trait VideoWidget {
    fn play_video(&mut self);
    fn pause_video(&mut self);
    fn seek_to(&mut self, secs: f64, allow_seek_ahead: bool);
    fn player_state(&self) -> Option<WidgetState>;
    fn current_time(&self) -> Option<f64>;
    fn duration(&self) -> Option<f64>;
    /// Volume in percent, 0 to 100.
    fn set_volume(&mut self, percent: u8);
    fn destroy(&mut self);
}

/// Factory for the engines behind both adapter variants.
pub trait Engines {
    fn create_audio_element(&self, events: EventSink) -> Result<Box<dyn AudioElement>, EngineFault>;

    fn construct_widget(
        &self,
        container: &str,
        video_id: &str,
        options: &EmbedOptions,
        events: EventSink,
    ) -> Result<Box<dyn VideoWidget>, EngineFault>;
}
