//! `AudioElement` over a rodio `Sink`.

use std::cell::RefCell;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use lofty::prelude::*;
use log::{debug, warn};
use rodio::{Decoder, OutputStream, Sink, Source};
use url::Url;

use crate::engine::{AudioElement, ElementEvent, EventSink, MediaErrorCode, PlayRejection};

/// Where a direct source points, as far as a desktop player can tell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaLocation {
    Local(PathBuf),
    /// Remote media; no streaming decoder is wired in.
    Remote(String),
}

pub fn resolve_source(source: &str) -> MediaLocation {
    match Url::parse(source) {
        Ok(url) if url.scheme() == "file" => match url.to_file_path() {
            Ok(path) => MediaLocation::Local(path),
            Err(()) => MediaLocation::Remote(source.to_string()),
        },
        // Single letters are Windows drive prefixes, not schemes.
        Ok(url) if url.scheme().len() > 1 => MediaLocation::Remote(source.to_string()),
        _ => MediaLocation::Local(PathBuf::from(source)),
    }
}

fn probe_duration(path: &Path) -> Option<f64> {
    let tagged = lofty::read_from_path(path).ok()?;
    let secs = tagged.properties().duration().as_secs_f64();
    (secs > 0.0).then_some(secs)
}

fn decode(path: &Path) -> Result<Decoder<BufReader<File>>, MediaErrorCode> {
    let file = File::open(path).map_err(|e| {
        warn!("failed to open {}: {e}", path.display());
        MediaErrorCode::SrcNotSupported
    })?;
    Decoder::new(BufReader::new(file)).map_err(|e| {
        warn!("failed to decode {}: {e}", path.display());
        MediaErrorCode::Decode
    })
}

/// Hands out a fresh sink for each source.
pub(super) type SinkFactory = Box<dyn Fn() -> Sink>;

/// State shared between the element handed to an adapter and the engines'
/// service pass.
pub(super) struct ElementState {
    events: EventSink,
    sink: Option<Sink>,
    /// File behind `sink`, decoded again once the sink has played it out.
    path: Option<PathBuf>,
    duration: Option<f64>,
    volume: f32,
    /// Playback was requested and has not ended or been paused since.
    playing: bool,
}

impl ElementState {
    /// Report `Ended` once the sink drains.
    pub(super) fn service(&mut self) {
        let drained = self.sink.as_ref().is_some_and(Sink::empty);
        if self.playing && drained {
            self.playing = false;
            self.events.element(ElementEvent::Ended);
        }
    }

    /// A sink that played its source to the end has nothing left to seek in
    /// or resume, so queue the file again from the start, paused.
    /// Returns `true` when a fresh decoder was queued.
    fn requeue_if_drained(&mut self) -> bool {
        let (Some(sink), Some(path)) = (self.sink.as_ref(), self.path.as_ref()) else {
            return false;
        };
        if !sink.empty() {
            return false;
        }
        match decode(path) {
            Ok(source) => {
                debug!("requeueing {}", path.display());
                sink.pause();
                sink.append(source);
                true
            }
            Err(code) => {
                self.events.element(ElementEvent::Error(code));
                false
            }
        }
    }
}

pub(super) struct RodioElement {
    new_sink: SinkFactory,
    state: Rc<RefCell<ElementState>>,
}

impl RodioElement {
    pub(super) fn new(stream: Rc<OutputStream>, events: EventSink) -> Self {
        Self::with_sink_factory(Box::new(move || Sink::connect_new(stream.mixer())), events)
    }

    pub(super) fn with_sink_factory(new_sink: SinkFactory, events: EventSink) -> Self {
        Self {
            new_sink,
            state: Rc::new(RefCell::new(ElementState {
                events,
                sink: None,
                path: None,
                duration: None,
                volume: 1.0,
                playing: false,
            })),
        }
    }

    pub(super) fn shared(&self) -> Rc<RefCell<ElementState>> {
        self.state.clone()
    }

    fn open(&self, path: &Path) -> Result<(Sink, Option<f64>), MediaErrorCode> {
        let source = decode(path)?;
        let duration = source
            .total_duration()
            .map(|d| d.as_secs_f64())
            .filter(|d| *d > 0.0)
            .or_else(|| probe_duration(path));

        let sink = (self.new_sink)();
        sink.pause();
        sink.append(source);
        Ok((sink, duration))
    }
}

impl AudioElement for RodioElement {
    fn set_src(&mut self, url: &str) {
        let opened = match resolve_source(url) {
            MediaLocation::Local(path) => self.open(&path).map(|(sink, d)| (sink, d, path)),
            MediaLocation::Remote(url) => {
                warn!("remote media is not supported by the desktop backend: {url}");
                Err(MediaErrorCode::Network)
            }
        };

        let mut state = self.state.borrow_mut();
        if let Some(old) = state.sink.take() {
            old.stop();
            if state.playing {
                state
                    .events
                    .element(ElementEvent::PlayRejected(PlayRejection::Aborted));
            } else {
                state.events.element(ElementEvent::Error(MediaErrorCode::Aborted));
            }
        }
        state.playing = false;
        match opened {
            Ok((sink, duration, path)) => {
                sink.set_volume(state.volume);
                state.sink = Some(sink);
                state.path = Some(path);
                state.duration = duration;
                state.events.element(ElementEvent::LoadedMetadata);
            }
            Err(code) => {
                state.path = None;
                state.duration = None;
                state.events.element(ElementEvent::Error(code));
            }
        }
    }

    fn play(&mut self) {
        let mut state = self.state.borrow_mut();
        state.requeue_if_drained();
        let Some(sink) = state.sink.as_ref() else {
            state
                .events
                .element(ElementEvent::PlayRejected(PlayRejection::NotSupported));
            return;
        };
        sink.play();
        state.playing = true;
        state.events.element(ElementEvent::Playing);
    }

    fn pause(&mut self) {
        let mut state = self.state.borrow_mut();
        let Some(sink) = state.sink.as_ref() else {
            return;
        };
        sink.pause();
        state.playing = false;
        state.events.element(ElementEvent::Paused);
    }

    fn current_time(&self) -> Option<f64> {
        let state = self.state.borrow();
        state.sink.as_ref().map(|s| s.get_pos().as_secs_f64())
    }

    fn set_current_time(&mut self, secs: f64) {
        let mut state = self.state.borrow_mut();
        let requeued = state.requeue_if_drained();
        let Some(sink) = state.sink.as_ref() else {
            return;
        };
        // A requeued decoder already starts at zero.
        if requeued && secs <= 0.0 {
            return;
        }
        if let Err(e) = sink.try_seek(Duration::from_secs_f64(secs.max(0.0))) {
            debug!("seek to {secs:.1}s failed: {e}");
        }
    }

    fn duration(&self) -> Option<f64> {
        self.state.borrow().duration
    }

    fn set_volume(&mut self, volume: f32) {
        let mut state = self.state.borrow_mut();
        state.volume = volume;
        if let Some(sink) = state.sink.as_ref() {
            sink.set_volume(volume);
        }
    }

    fn release(&mut self) {
        let mut state = self.state.borrow_mut();
        if let Some(sink) = state.sink.take() {
            sink.stop();
        }
        state.path = None;
        state.playing = false;
    }
}
