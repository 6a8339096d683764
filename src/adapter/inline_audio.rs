use std::rc::Rc;

use log::{debug, warn};

use crate::engine::{
    AudioElement, ElementEvent, EngineEvent, Engines, EventSink, MediaErrorCode, PlayRejection,
};
use crate::error::PlaybackError;

use super::{
    AdapterKind, AdapterSignal, AdapterState, PendingIntents, PlayerAdapter, TransportIntent,
    clamp_position,
};

/// Adapter over an inline audio element, used for direct media sources.
pub struct InlineAudioAdapter {
    generation: u64,
    engines: Rc<dyn Engines>,
    events: EventSink,
    element: Option<Box<dyn AudioElement>>,
    state: AdapterState,
    pending: PendingIntents,
    volume: f32,
}

impl InlineAudioAdapter {
    pub fn new(generation: u64, engines: Rc<dyn Engines>, events: EventSink) -> Self {
        Self {
            generation,
            engines,
            events,
            element: None,
            state: AdapterState::Unloaded,
            pending: PendingIntents::default(),
            volume: 1.0,
        }
    }

    fn fail(&mut self, err: PlaybackError) -> PlaybackError {
        warn!("audio adapter {}: {err}", self.generation);
        self.pending = PendingIntents::default();
        self.state = AdapterState::Errored(err);
        err
    }

    fn replay_pending(&mut self) {
        let pending = self.pending.take();
        let duration = self.duration();
        let Some(element) = self.element.as_mut() else {
            return;
        };

        if let Some(pos) = pending.seek {
            element.set_current_time(clamp_position(pos, duration));
        }
        match pending.transport {
            Some(TransportIntent::Play) => element.play(),
            Some(TransportIntent::Pause) => element.pause(),
            None => {}
        }
    }

    fn media_error(code: MediaErrorCode) -> Option<PlaybackError> {
        match code {
            MediaErrorCode::Aborted => None,
            MediaErrorCode::Network => Some(PlaybackError::InitializationFailed),
            MediaErrorCode::Decode | MediaErrorCode::SrcNotSupported => {
                Some(PlaybackError::SourceInvalid)
            }
        }
    }
}

impl PlayerAdapter for InlineAudioAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::InlineAudio
    }

    fn generation(&self) -> u64 {
        self.generation
    }

    fn state(&self) -> AdapterState {
        self.state
    }

    fn load(&mut self, source: &str) -> Result<(), PlaybackError> {
        match self.state {
            AdapterState::Destroyed => return Ok(()),
            AdapterState::Errored(err) => return Err(err),
            _ => {}
        }

        let source = source.trim();
        if source.is_empty() {
            return Err(self.fail(PlaybackError::SourceInvalid));
        }

        if self.element.is_none() {
            match self
                .engines
                .create_audio_element(self.events.for_instance(0))
            {
                Ok(element) => self.element = Some(element),
                Err(e) => {
                    warn!("audio adapter {}: {e}", self.generation);
                    return Err(self.fail(PlaybackError::InitializationFailed));
                }
            }
        }

        if let Some(element) = self.element.as_mut() {
            element.set_volume(self.volume);
            element.set_src(source);
        }
        debug!("audio adapter {}: loading {source}", self.generation);
        self.state = AdapterState::Loading;
        Ok(())
    }

    fn play(&mut self) {
        match self.state {
            AdapterState::Unloaded | AdapterState::Loading => {
                self.pending.transport = Some(TransportIntent::Play);
            }
            AdapterState::Ready | AdapterState::Paused => {
                if let Some(element) = self.element.as_mut() {
                    element.play();
                }
            }
            AdapterState::Playing | AdapterState::Destroyed | AdapterState::Errored(_) => {}
        }
    }

    fn pause(&mut self) {
        match self.state {
            AdapterState::Unloaded | AdapterState::Loading => {
                self.pending.transport = Some(TransportIntent::Pause);
            }
            AdapterState::Ready | AdapterState::Paused | AdapterState::Playing => {
                if let Some(element) = self.element.as_mut() {
                    element.pause();
                }
            }
            AdapterState::Destroyed | AdapterState::Errored(_) => {}
        }
    }

    fn seek(&mut self, position: f64) {
        if self.state.is_terminal() {
            return;
        }
        if !self.state.is_ready() {
            self.pending.seek = Some(position);
            return;
        }
        let target = clamp_position(position, self.duration());
        if let Some(element) = self.element.as_mut() {
            element.set_current_time(target);
        }
    }

    fn set_volume(&mut self, volume: f32) {
        if self.state.is_terminal() {
            return;
        }
        self.volume = volume;
        if let Some(element) = self.element.as_mut() {
            element.set_volume(volume);
        }
    }

    fn position(&self) -> Option<f64> {
        if !self.state.is_ready() {
            return None;
        }
        self.element
            .as_ref()
            .and_then(|e| e.current_time())
            .filter(|t| t.is_finite())
    }

    fn duration(&self) -> Option<f64> {
        if !self.state.is_ready() {
            return None;
        }
        self.element
            .as_ref()
            .and_then(|e| e.duration())
            .filter(|d| d.is_finite() && *d > 0.0)
    }

    fn handle_event(&mut self, instance: u32, event: EngineEvent) -> Option<AdapterSignal> {
        if self.state.is_terminal() || instance != 0 {
            return None;
        }
        let EngineEvent::Element(event) = event else {
            debug!("audio adapter {}: ignoring widget event", self.generation);
            return None;
        };

        match event {
            ElementEvent::LoadedMetadata => {
                if self.state != AdapterState::Loading {
                    return None;
                }
                self.state = AdapterState::Ready;
                self.replay_pending();
                Some(AdapterSignal::Ready {
                    duration: self.duration(),
                })
            }
            ElementEvent::Playing => {
                if !self.state.is_ready() {
                    return None;
                }
                self.state = AdapterState::Playing;
                Some(AdapterSignal::Started)
            }
            ElementEvent::Paused => {
                if self.state != AdapterState::Playing {
                    return None;
                }
                self.state = AdapterState::Paused;
                Some(AdapterSignal::Paused)
            }
            ElementEvent::Ended => {
                self.state = AdapterState::Paused;
                Some(AdapterSignal::Ended)
            }
            ElementEvent::Error(code) => {
                let err = Self::media_error(code)?;
                Some(AdapterSignal::Failed(self.fail(err)))
            }
            ElementEvent::PlayRejected(PlayRejection::Aborted) => None,
            ElementEvent::PlayRejected(PlayRejection::NotAllowed) => {
                Some(AdapterSignal::Failed(PlaybackError::PlaybackRejected))
            }
            ElementEvent::PlayRejected(PlayRejection::NotSupported) => Some(AdapterSignal::Failed(
                self.fail(PlaybackError::SourceInvalid),
            )),
        }
    }

    fn destroy(&mut self) {
        if self.state == AdapterState::Destroyed {
            return;
        }
        if let Some(mut element) = self.element.take() {
            element.release();
        }
        self.pending = PendingIntents::default();
        self.state = AdapterState::Destroyed;
        debug!("audio adapter {}: destroyed", self.generation);
    }
}
