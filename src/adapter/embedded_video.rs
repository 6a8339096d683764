use std::rc::Rc;
use std::sync::LazyLock;

use log::{debug, info, warn};
use regex::Regex;
use url::Url;

use crate::config::EmbedSettings;
use crate::engine::{EmbedOptions, EngineEvent, Engines, EventSink, VideoWidget, WidgetEvent, WidgetState};
use crate::error::PlaybackError;

use super::{
    AdapterKind, AdapterSignal, AdapterState, PendingIntents, PlayerAdapter, TransportIntent,
    clamp_position, is_video_host,
};

static VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("Invalid Regex"));

pub(super) fn is_bare_video_id(reference: &str) -> bool {
    VIDEO_ID.is_match(reference)
}

/// Extract and validate the video id from a reference.
///
/// Accepts bare ids, `youtube:<id>`, `youtu.be/<id>` and the provider's
/// watch, embed, shorts, live and `/v/` links. Search result links and
/// anything that does not yield a well-formed id are `SourceInvalid`.
pub fn parse_video_id(reference: &str) -> Result<String, PlaybackError> {
    let reference = reference.trim();
    let candidate = match Url::parse(reference) {
        Ok(url) => video_id_from_url(&url).ok_or(PlaybackError::SourceInvalid)?,
        Err(_) => reference.to_string(),
    };

    if VIDEO_ID.is_match(&candidate) {
        Ok(candidate)
    } else {
        Err(PlaybackError::SourceInvalid)
    }
}

fn video_id_from_url(url: &Url) -> Option<String> {
    if url.scheme() == "youtube" {
        return Some(url.path().trim_matches('/').to_string());
    }

    let host = url.host_str().filter(|h| is_video_host(h))?;
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());

    if host.eq_ignore_ascii_case("youtu.be") {
        return segments.next().map(str::to_string);
    }

    match segments.next()? {
        "watch" => url
            .query_pairs()
            .find(|(k, _)| k == "v")
            .map(|(_, v)| v.into_owned()),
        "embed" | "shorts" | "live" | "v" => segments.next().map(str::to_string),
        // `/results?search_query=...` is a search fallback, not a playable item.
        _ => None,
    }
}

/// Map a provider error code onto the playback taxonomy.
fn widget_error(code: i32) -> PlaybackError {
    match code {
        2 | 100 => PlaybackError::SourceInvalid,
        101 | 150 | 153 => PlaybackError::EmbedNotPermitted,
        _ => PlaybackError::InitializationFailed,
    }
}

/// Adapter over an embedded video widget, used for video-only catalog items.
pub struct EmbeddedVideoAdapter {
    generation: u64,
    engines: Rc<dyn Engines>,
    events: EventSink,
    settings: EmbedSettings,
    widget: Option<Box<dyn VideoWidget>>,
    /// Engine instance counter; bumped on every widget construction.
    instance: u32,
    video_id: Option<String>,
    relaxed_attempted: bool,
    state: AdapterState,
    pending: PendingIntents,
    volume: f32,
}

impl EmbeddedVideoAdapter {
    pub fn new(
        generation: u64,
        engines: Rc<dyn Engines>,
        events: EventSink,
        settings: EmbedSettings,
    ) -> Self {
        Self {
            generation,
            engines,
            events,
            settings,
            widget: None,
            instance: 0,
            video_id: None,
            relaxed_attempted: false,
            state: AdapterState::Unloaded,
            pending: PendingIntents::default(),
            volume: 1.0,
        }
    }

    pub fn video_id(&self) -> Option<&str> {
        self.video_id.as_deref()
    }

    fn base_options(&self) -> EmbedOptions {
        EmbedOptions {
            host: self.settings.host.clone(),
            origin: self.settings.origin.clone(),
            autoplay: false,
            controls: self.settings.controls,
            playsinline: true,
            enable_js_api: true,
        }
    }

    fn fail(&mut self, err: PlaybackError) -> PlaybackError {
        warn!("video adapter {}: {err}", self.generation);
        if let Some(mut widget) = self.widget.take() {
            widget.destroy();
        }
        self.pending = PendingIntents::default();
        self.state = AdapterState::Errored(err);
        err
    }

    fn construct(&mut self, options: &EmbedOptions) -> Result<(), PlaybackError> {
        let Some(video_id) = self.video_id.clone() else {
            return Err(self.fail(PlaybackError::SourceInvalid));
        };

        self.instance += 1;
        let events = self.events.for_instance(self.instance);
        match self
            .engines
            .construct_widget(&self.settings.container, &video_id, options, events)
        {
            Ok(widget) => {
                self.widget = Some(widget);
                self.state = AdapterState::Loading;
                Ok(())
            }
            Err(e) => {
                warn!("video adapter {}: {e}", self.generation);
                Err(self.fail(PlaybackError::InitializationFailed))
            }
        }
    }

    /// Tear the refused widget down and try once more with relaxed options.
    fn reconfigure(&mut self) -> Option<AdapterSignal> {
        self.relaxed_attempted = true;
        if self.state == AdapterState::Playing && self.pending.transport.is_none() {
            self.pending.transport = Some(TransportIntent::Play);
        }
        if let Some(mut widget) = self.widget.take() {
            widget.destroy();
        }

        let options = self.base_options().relaxed(&self.settings.relaxed_host);
        info!(
            "video adapter {}: embed refused, retrying via {}",
            self.generation, options.host
        );
        match self.construct(&options) {
            Ok(()) => None,
            Err(err) => Some(AdapterSignal::Failed(err)),
        }
    }

    fn replay_pending(&mut self) {
        let pending = self.pending.take();
        let duration = self.duration();
        let volume = pending.volume.unwrap_or(self.volume);
        let Some(widget) = self.widget.as_mut() else {
            return;
        };

        if let Some(pos) = pending.seek {
            widget.seek_to(clamp_position(pos, duration), true);
        }
        widget.set_volume(volume_percent(volume));
        match pending.transport {
            Some(TransportIntent::Play) => widget.play_video(),
            Some(TransportIntent::Pause) => widget.pause_video(),
            None => {}
        }
    }
}

fn volume_percent(volume: f32) -> u8 {
    (volume.clamp(0.0, 1.0) * 100.0).round() as u8
}

impl PlayerAdapter for EmbeddedVideoAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::EmbeddedVideo
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

        let video_id = match parse_video_id(source) {
            Ok(id) => id,
            Err(err) => {
                debug!("video adapter {}: unplayable reference {source:?}", self.generation);
                return Err(self.fail(err));
            }
        };

        if let Some(mut widget) = self.widget.take() {
            widget.destroy();
        }
        self.video_id = Some(video_id);
        self.relaxed_attempted = false;
        let options = self.base_options();
        self.construct(&options)
    }

    fn play(&mut self) {
        match self.state {
            AdapterState::Unloaded | AdapterState::Loading => {
                self.pending.transport = Some(TransportIntent::Play);
            }
            AdapterState::Ready | AdapterState::Paused => {
                if let Some(widget) = self.widget.as_mut() {
                    widget.play_video();
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
                if let Some(widget) = self.widget.as_mut() {
                    widget.pause_video();
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
        if let Some(widget) = self.widget.as_mut() {
            widget.seek_to(target, true);
        }
    }

    fn set_volume(&mut self, volume: f32) {
        if self.state.is_terminal() {
            return;
        }
        self.volume = volume;
        if !self.state.is_ready() {
            self.pending.volume = Some(volume);
            return;
        }
        if let Some(widget) = self.widget.as_mut() {
            widget.set_volume(volume_percent(volume));
        }
    }

    fn position(&self) -> Option<f64> {
        if !self.state.is_ready() {
            return None;
        }
        self.widget
            .as_ref()
            .and_then(|w| w.current_time())
            .filter(|t| t.is_finite())
    }

    fn duration(&self) -> Option<f64> {
        if !self.state.is_ready() {
            return None;
        }
        self.widget
            .as_ref()
            .and_then(|w| w.duration())
            .filter(|d| d.is_finite() && *d > 0.0)
    }

    fn handle_event(&mut self, instance: u32, event: EngineEvent) -> Option<AdapterSignal> {
        if self.state.is_terminal() {
            return None;
        }
        if instance != self.instance {
            debug!(
                "video adapter {}: dropping event from replaced widget {instance}",
                self.generation
            );
            return None;
        }
        let EngineEvent::Widget(event) = event else {
            return None;
        };

        match event {
            WidgetEvent::Ready => {
                if self.state != AdapterState::Loading {
                    return None;
                }
                self.state = AdapterState::Ready;
                self.replay_pending();
                Some(AdapterSignal::Ready {
                    duration: self.duration(),
                })
            }
            WidgetEvent::StateChange(WidgetState::Playing) => {
                if !self.state.is_ready() {
                    return None;
                }
                self.state = AdapterState::Playing;
                Some(AdapterSignal::Started)
            }
            WidgetEvent::StateChange(WidgetState::Paused) => {
                if self.state != AdapterState::Playing {
                    return None;
                }
                self.state = AdapterState::Paused;
                Some(AdapterSignal::Paused)
            }
            WidgetEvent::StateChange(WidgetState::Ended) => {
                if !self.state.is_ready() {
                    return None;
                }
                self.state = AdapterState::Paused;
                Some(AdapterSignal::Ended)
            }
            WidgetEvent::StateChange(_) => None,
            WidgetEvent::Error(code) => {
                let err = widget_error(code);
                if err == PlaybackError::EmbedNotPermitted && !self.relaxed_attempted {
                    return self.reconfigure();
                }
                Some(AdapterSignal::Failed(self.fail(err)))
            }
            WidgetEvent::AutoplayBlocked => {
                Some(AdapterSignal::Failed(PlaybackError::PlaybackRejected))
            }
        }
    }

    fn destroy(&mut self) {
        if self.state == AdapterState::Destroyed {
            return;
        }
        if let Some(mut widget) = self.widget.take() {
            widget.destroy();
        }
        self.pending = PendingIntents::default();
        self.state = AdapterState::Destroyed;
        debug!("video adapter {}: destroyed", self.generation);
    }
}
