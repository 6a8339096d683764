use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::mpsc::Receiver;

use rodio::Sink;
use rodio::queue::SourcesQueueOutput;

use super::*;
use crate::config::EmbedSettings;
use crate::engine::{ElementEvent, EngineEvent, Envelope, MediaErrorCode, PlayRejection, WidgetEvent, WidgetState};

fn options() -> EmbedOptions {
    let embed = EmbedSettings::default();
    EmbedOptions {
        host: embed.host,
        origin: embed.origin,
        autoplay: false,
        controls: false,
        playsinline: true,
        enable_js_api: true,
    }
}

#[test]
fn resolve_source_distinguishes_local_and_remote() {
    assert_eq!(
        resolve_source("/music/a.mp3"),
        MediaLocation::Local(PathBuf::from("/music/a.mp3"))
    );
    assert_eq!(
        resolve_source("relative/b.flac"),
        MediaLocation::Local(PathBuf::from("relative/b.flac"))
    );
    assert_eq!(
        resolve_source("https://cdn.example.com/a.mp3"),
        MediaLocation::Remote("https://cdn.example.com/a.mp3".to_string())
    );
    #[cfg(unix)]
    assert_eq!(
        resolve_source("file:///music/My%20Song.ogg"),
        MediaLocation::Local(PathBuf::from("/music/My Song.ogg"))
    );
}

#[test]
fn missing_output_device_fails_element_construction() {
    let engines = DesktopEngines::with_stream(None);
    let (events, _rx) = EventSink::channel();
    assert!(engines.create_audio_element(events).is_err());
}

#[test]
fn headless_widget_reports_ready_on_service() {
    let engines = DesktopEngines::with_stream(None);
    let (events, rx) = EventSink::channel();
    let _widget = engines
        .construct_widget("legato-video", "dQw4w9WgXcQ", &options(), events.for_instance(1))
        .unwrap();
    assert!(rx.try_recv().is_err());

    engines.service();
    let envelope = rx.try_recv().unwrap();
    assert_eq!(envelope.instance, 1);
    assert_eq!(envelope.event, EngineEvent::Widget(WidgetEvent::Ready));

    engines.service();
    assert!(rx.try_recv().is_err(), "ready is delivered once");
}

#[test]
fn headless_widget_keeps_position() {
    let engines = DesktopEngines::with_stream(None);
    let (events, rx) = EventSink::channel();
    let mut widget = engines
        .construct_widget("legato-video", "dQw4w9WgXcQ", &options(), events)
        .unwrap();
    engines.service();

    widget.seek_to(90.0, true);
    assert_eq!(widget.current_time(), Some(90.0));
    assert_eq!(widget.duration(), None);

    widget.play_video();
    widget.play_video();
    assert_eq!(widget.player_state(), Some(WidgetState::Playing));
    widget.pause_video();
    assert_eq!(widget.player_state(), Some(WidgetState::Paused));
    assert!(widget.current_time().unwrap() >= 90.0);

    let events: Vec<_> = rx.try_iter().map(|e| e.event).collect();
    assert_eq!(
        events,
        vec![
            EngineEvent::Widget(WidgetEvent::Ready),
            EngineEvent::Widget(WidgetEvent::StateChange(WidgetState::Playing)),
            EngineEvent::Widget(WidgetEvent::StateChange(WidgetState::Paused)),
        ]
    );
}

#[test]
fn destroyed_widgets_are_forgotten() {
    let engines = DesktopEngines::with_stream(None);
    let (events, rx) = EventSink::channel();
    let mut widget = engines
        .construct_widget("legato-video", "dQw4w9WgXcQ", &options(), events)
        .unwrap();
    assert_eq!(engines.live_engines(), 1);

    widget.destroy();
    engines.service();
    assert!(rx.try_recv().is_err(), "no ready after destroy");

    drop(widget);
    engines.service();
    assert_eq!(engines.live_engines(), 0);
}

/// A rodio element on detached sinks, whose output the test plays out by hand.
struct DetachedElement {
    element: RodioElement,
    outputs: Rc<RefCell<Vec<SourcesQueueOutput>>>,
    rx: Receiver<Envelope>,
}

impl DetachedElement {
    fn new() -> Self {
        let outputs = Rc::new(RefCell::new(Vec::new()));
        let captured = outputs.clone();
        let (events, rx) = EventSink::channel();
        let element = RodioElement::with_sink_factory(
            Box::new(move || {
                let (sink, output) = Sink::new();
                captured.borrow_mut().push(output);
                sink
            }),
            events,
        );
        Self {
            element,
            outputs,
            rx,
        }
    }

    fn events(&self) -> Vec<ElementEvent> {
        self.rx
            .try_iter()
            .filter_map(|env| match env.event {
                EngineEvent::Element(event) => Some(event),
                EngineEvent::Widget(_) => None,
            })
            .collect()
    }

    /// Pull samples from the newest sink the way an output device would.
    fn play_out(&self) {
        if let Some(output) = self.outputs.borrow_mut().last_mut() {
            output.by_ref().take(20_000).for_each(drop);
        }
    }

    fn service(&self) {
        self.element.shared().borrow_mut().service();
    }
}

/// 0.1s of 8 kHz mono 16-bit PCM.
fn write_wav(path: &Path) {
    const RATE: u32 = 8_000;
    const SAMPLES: u32 = 800;
    let data_len = SAMPLES * 2;

    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVEfmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&RATE.to_le_bytes());
    bytes.extend_from_slice(&(RATE * 2).to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    for i in 0..SAMPLES {
        let sample: i16 = if i % 20 < 10 { 8_000 } else { -8_000 };
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    fs::write(path, bytes).unwrap();
}

fn wav_in(dir: &tempfile::TempDir, name: &str) -> String {
    let path = dir.path().join(name);
    write_wav(&path);
    path.to_string_lossy().into_owned()
}

#[test]
fn set_src_maps_load_failures() {
    let dir = tempfile::tempdir().unwrap();
    let garbage = dir.path().join("noise.mp3");
    fs::write(&garbage, b"definitely not audio").unwrap();

    let mut e = DetachedElement::new();
    e.element.set_src(&dir.path().join("missing.ogg").to_string_lossy());
    e.element.set_src(&garbage.to_string_lossy());
    e.element.set_src("https://cdn.example.com/a.mp3");
    assert_eq!(
        e.events(),
        vec![
            ElementEvent::Error(MediaErrorCode::SrcNotSupported),
            ElementEvent::Error(MediaErrorCode::Decode),
            ElementEvent::Error(MediaErrorCode::Network),
        ]
    );
    assert_eq!(e.element.duration(), None);

    e.element.play();
    assert_eq!(
        e.events(),
        vec![ElementEvent::PlayRejected(PlayRejection::NotSupported)]
    );
}

#[test]
fn set_src_loads_local_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut e = DetachedElement::new();
    e.element.set_src(&wav_in(&dir, "a.wav"));

    assert_eq!(e.events(), vec![ElementEvent::LoadedMetadata]);
    let duration = e.element.duration().unwrap();
    assert!((duration - 0.1).abs() < 0.01, "duration {duration}");
    assert_eq!(e.element.current_time(), Some(0.0));
}

#[test]
fn replacing_a_source_aborts_the_old_one() {
    let dir = tempfile::tempdir().unwrap();
    let a = wav_in(&dir, "a.wav");
    let b = wav_in(&dir, "b.wav");
    let mut e = DetachedElement::new();

    e.element.set_src(&a);
    e.element.set_src(&b);
    assert_eq!(
        e.events(),
        vec![
            ElementEvent::LoadedMetadata,
            ElementEvent::Error(MediaErrorCode::Aborted),
            ElementEvent::LoadedMetadata,
        ]
    );

    e.element.play();
    e.element.set_src(&a);
    assert_eq!(
        e.events(),
        vec![
            ElementEvent::Playing,
            ElementEvent::PlayRejected(PlayRejection::Aborted),
            ElementEvent::LoadedMetadata,
        ]
    );
}

#[test]
fn drained_sink_reports_ended_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut e = DetachedElement::new();
    e.element.set_src(&wav_in(&dir, "a.wav"));
    e.element.play();

    e.service();
    assert_eq!(
        e.events(),
        vec![ElementEvent::LoadedMetadata, ElementEvent::Playing]
    );

    e.play_out();
    e.service();
    e.service();
    assert_eq!(e.events(), vec![ElementEvent::Ended]);
}

#[test]
fn paused_sink_is_not_ended() {
    let dir = tempfile::tempdir().unwrap();
    let mut e = DetachedElement::new();
    e.element.set_src(&wav_in(&dir, "a.wav"));
    e.element.play();
    e.element.pause();
    e.play_out();
    e.service();
    assert_eq!(
        e.events(),
        vec![
            ElementEvent::LoadedMetadata,
            ElementEvent::Playing,
            ElementEvent::Paused,
        ]
    );
}

#[test]
fn rewind_after_end_plays_the_file_again() {
    let dir = tempfile::tempdir().unwrap();
    let mut e = DetachedElement::new();
    e.element.set_src(&wav_in(&dir, "a.wav"));
    e.element.play();
    e.play_out();
    e.service();
    e.events();

    // What repeat-one does once a track ends.
    e.element.set_current_time(0.0);
    e.element.play();
    e.service();
    assert_eq!(e.events(), vec![ElementEvent::Playing], "fresh audio is queued");

    e.play_out();
    e.service();
    assert_eq!(e.events(), vec![ElementEvent::Ended]);
}

#[test]
fn play_after_end_plays_the_file_again() {
    let dir = tempfile::tempdir().unwrap();
    let mut e = DetachedElement::new();
    e.element.set_src(&wav_in(&dir, "a.wav"));
    e.element.play();
    e.play_out();
    e.service();
    e.events();

    e.element.play();
    e.service();
    assert_eq!(e.events(), vec![ElementEvent::Playing]);

    e.play_out();
    e.service();
    assert_eq!(e.events(), vec![ElementEvent::Ended]);
}

#[test]
fn released_element_does_not_requeue() {
    let dir = tempfile::tempdir().unwrap();
    let mut e = DetachedElement::new();
    e.element.set_src(&wav_in(&dir, "a.wav"));
    e.element.play();
    e.play_out();
    e.element.release();
    e.events();

    e.element.play();
    assert_eq!(
        e.events(),
        vec![ElementEvent::PlayRejected(PlayRejection::NotSupported)]
    );
    assert_eq!(e.element.current_time(), None);
}
