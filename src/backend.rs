//! Desktop engines: rodio for direct media files, a headless clock for video
//! references.
//!
//! Engines never block. Anything that would be a callback in a browser
//! (metadata loaded, playback ended, widget ready) is posted to the event
//! sink, either straight away or from [`DesktopEngines::service`], which the
//! runtime calls once per loop iteration.

mod headless_widget;
mod rodio_element;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::warn;
use rodio::{OutputStream, OutputStreamBuilder};

use crate::engine::{AudioElement, EmbedOptions, EngineFault, Engines, EventSink, VideoWidget};

use headless_widget::{HeadlessWidget, WidgetClock};
use rodio_element::{ElementState, RodioElement};

pub use rodio_element::{MediaLocation, resolve_source};

pub struct DesktopEngines {
    stream: Option<Rc<OutputStream>>,
    elements: RefCell<Vec<Weak<RefCell<ElementState>>>>,
    widgets: RefCell<Vec<Weak<RefCell<WidgetClock>>>>,
}

impl DesktopEngines {
    /// Open the default output device. Without one, audio elements fail to
    /// construct and the affected tracks are reported unplayable.
    pub fn new() -> Self {
        let stream = match OutputStreamBuilder::open_default_stream() {
            Ok(mut stream) => {
                // rodio logs to stderr when the stream is dropped, which would
                // scribble over the TUI.
                stream.log_on_drop(false);
                Some(Rc::new(stream))
            }
            Err(e) => {
                warn!("no audio output device: {e}");
                None
            }
        };
        Self::with_stream(stream)
    }

    fn with_stream(stream: Option<Rc<OutputStream>>) -> Self {
        Self {
            stream,
            elements: RefCell::new(Vec::new()),
            widgets: RefCell::new(Vec::new()),
        }
    }

    /// Deliver deferred engine events and drop engines nobody holds anymore.
    pub fn service(&self) {
        self.elements.borrow_mut().retain(|weak| match weak.upgrade() {
            Some(state) => {
                state.borrow_mut().service();
                true
            }
            None => false,
        });
        self.widgets.borrow_mut().retain(|weak| match weak.upgrade() {
            Some(clock) => {
                clock.borrow_mut().service();
                true
            }
            None => false,
        });
    }

    /// Engines still alive; released ones disappear on the next service pass.
    #[cfg(test)]
    pub fn live_engines(&self) -> usize {
        self.elements.borrow().len() + self.widgets.borrow().len()
    }
}

impl Engines for DesktopEngines {
    fn create_audio_element(&self, events: EventSink) -> Result<Box<dyn AudioElement>, EngineFault> {
        let Some(stream) = self.stream.clone() else {
            return Err(EngineFault("no audio output device".into()));
        };
        let element = RodioElement::new(stream, events);
        self.elements
            .borrow_mut()
            .push(Rc::downgrade(&element.shared()));
        Ok(Box::new(element))
    }

    fn construct_widget(
        &self,
        container: &str,
        video_id: &str,
        options: &EmbedOptions,
        events: EventSink,
    ) -> Result<Box<dyn VideoWidget>, EngineFault> {
        let widget = HeadlessWidget::new(container, video_id, &options.host, events);
        self.widgets
            .borrow_mut()
            .push(Rc::downgrade(&widget.shared()));
        Ok(Box::new(widget))
    }
}

#[cfg(test)]
mod tests;
