//! Recording engines for tests.
//!
//! Every engine the coordinator creates is kept as a probe so tests can
//! inspect the calls it received and inject events through its sink, the
//! same way a real element or widget would report back.

use std::cell::RefCell;
use std::rc::Rc;

use crate::engine::{
    AudioElement, ElementEvent, EmbedOptions, EngineFault, Engines, EventSink, VideoWidget,
    WidgetEvent, WidgetState,
};
use crate::library::Track;

pub struct ElementProbe {
    pub sink: EventSink,
    pub calls: Vec<String>,
    pub src: Option<String>,
    pub time: Option<f64>,
    pub duration: Option<f64>,
    pub volume: f32,
    pub released: bool,
}

pub struct WidgetProbe {
    pub sink: EventSink,
    pub container: String,
    pub video_id: String,
    pub options: EmbedOptions,
    pub calls: Vec<String>,
    pub time: Option<f64>,
    pub duration: Option<f64>,
    pub volume: u8,
    pub destroyed: bool,
}

struct FakeElement(Rc<RefCell<ElementProbe>>);

impl AudioElement for FakeElement {
    fn set_src(&mut self, url: &str) {
        let mut p = self.0.borrow_mut();
        p.calls.push(format!("set_src:{url}"));
        p.src = Some(url.to_string());
        p.time = Some(0.0);
    }

    fn play(&mut self) {
        self.0.borrow_mut().calls.push("play".into());
    }

    fn pause(&mut self) {
        self.0.borrow_mut().calls.push("pause".into());
    }

    fn current_time(&self) -> Option<f64> {
        self.0.borrow().time
    }

    fn set_current_time(&mut self, secs: f64) {
        let mut p = self.0.borrow_mut();
        p.calls.push(format!("seek:{secs}"));
        p.time = Some(secs);
    }

    fn duration(&self) -> Option<f64> {
        self.0.borrow().duration
    }

    fn set_volume(&mut self, volume: f32) {
        self.0.borrow_mut().volume = volume;
    }

    fn release(&mut self) {
        let mut p = self.0.borrow_mut();
        p.calls.push("release".into());
        p.released = true;
    }
}

struct FakeWidget(Rc<RefCell<WidgetProbe>>);

impl VideoWidget for FakeWidget {
    fn play_video(&mut self) {
        self.0.borrow_mut().calls.push("play".into());
    }

    fn pause_video(&mut self) {
        self.0.borrow_mut().calls.push("pause".into());
    }

    fn seek_to(&mut self, secs: f64, _allow_seek_ahead: bool) {
        let mut p = self.0.borrow_mut();
        p.calls.push(format!("seek:{secs}"));
        p.time = Some(secs);
    }

    fn player_state(&self) -> Option<WidgetState> {
        None
    }

    fn current_time(&self) -> Option<f64> {
        self.0.borrow().time
    }

    fn duration(&self) -> Option<f64> {
        self.0.borrow().duration
    }

    fn set_volume(&mut self, percent: u8) {
        self.0.borrow_mut().volume = percent;
    }

    fn destroy(&mut self) {
        let mut p = self.0.borrow_mut();
        p.calls.push("destroy".into());
        p.destroyed = true;
    }
}

/// Engines that record every element and widget they hand out.
pub struct FakeEngines {
    pub elements: RefCell<Vec<Rc<RefCell<ElementProbe>>>>,
    pub widgets: RefCell<Vec<Rc<RefCell<WidgetProbe>>>>,
    pub fail_elements: RefCell<bool>,
    pub fail_widgets: RefCell<bool>,
    /// Duration reported by new engines.
    pub media_duration: RefCell<Option<f64>>,
}

impl Default for FakeEngines {
    fn default() -> Self {
        Self {
            elements: RefCell::new(Vec::new()),
            widgets: RefCell::new(Vec::new()),
            fail_elements: RefCell::new(false),
            fail_widgets: RefCell::new(false),
            media_duration: RefCell::new(Some(240.0)),
        }
    }
}

impl FakeEngines {
    pub fn element(&self, i: usize) -> Rc<RefCell<ElementProbe>> {
        self.elements.borrow()[i].clone()
    }

    pub fn widget(&self, i: usize) -> Rc<RefCell<WidgetProbe>> {
        self.widgets.borrow()[i].clone()
    }

    pub fn element_count(&self) -> usize {
        self.elements.borrow().len()
    }

    pub fn widget_count(&self) -> usize {
        self.widgets.borrow().len()
    }

    pub fn emit_element(&self, i: usize, event: ElementEvent) {
        let sink = self.element(i).borrow().sink.clone();
        sink.element(event);
    }

    pub fn emit_widget(&self, i: usize, event: WidgetEvent) {
        let sink = self.widget(i).borrow().sink.clone();
        sink.widget(event);
    }

    pub fn element_calls(&self, i: usize, call: &str) -> usize {
        self.element(i)
            .borrow()
            .calls
            .iter()
            .filter(|c| c.as_str() == call)
            .count()
    }

    pub fn widget_calls(&self, i: usize, call: &str) -> usize {
        self.widget(i)
            .borrow()
            .calls
            .iter()
            .filter(|c| c.as_str() == call)
            .count()
    }
}

impl Engines for FakeEngines {
    fn create_audio_element(&self, events: EventSink) -> Result<Box<dyn AudioElement>, EngineFault> {
        if *self.fail_elements.borrow() {
            return Err(EngineFault("no audio output".into()));
        }
        let probe = Rc::new(RefCell::new(ElementProbe {
            sink: events,
            calls: Vec::new(),
            src: None,
            time: None,
            duration: *self.media_duration.borrow(),
            volume: 1.0,
            released: false,
        }));
        self.elements.borrow_mut().push(probe.clone());
        Ok(Box::new(FakeElement(probe)))
    }

    fn construct_widget(
        &self,
        container: &str,
        video_id: &str,
        options: &EmbedOptions,
        events: EventSink,
    ) -> Result<Box<dyn VideoWidget>, EngineFault> {
        if *self.fail_widgets.borrow() {
            return Err(EngineFault("widget script failed to load".into()));
        }
        let probe = Rc::new(RefCell::new(WidgetProbe {
            sink: events,
            container: container.to_string(),
            video_id: video_id.to_string(),
            options: options.clone(),
            calls: Vec::new(),
            time: Some(0.0),
            duration: *self.media_duration.borrow(),
            volume: 100,
            destroyed: false,
        }));
        self.widgets.borrow_mut().push(probe.clone());
        Ok(Box::new(FakeWidget(probe)))
    }
}

pub fn track(id: &str, source: &str) -> Track {
    Track {
        id: id.to_string(),
        name: format!("Track {id}"),
        desc: "Artist".to_string(),
        user: Some("user-1".to_string()),
        source: source.to_string(),
        image: None,
        duration: "4:00".to_string(),
        display: format!("Artist - Track {id}"),
    }
}
