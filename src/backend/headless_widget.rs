//! Stand-in video widget for hosts without an embed surface.
//!
//! It follows the widget lifecycle (ready, state changes, destroy) and keeps
//! a wall-clock position so the transport and the time display behave the
//! same as with a real embed. No media is decoded.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use log::info;

use crate::engine::{EventSink, VideoWidget, WidgetEvent, WidgetState};

pub(super) struct WidgetClock {
    events: EventSink,
    state: WidgetState,
    /// Position at the last play/pause/seek.
    offset: f64,
    started_at: Option<Instant>,
    volume: u8,
    pending_ready: bool,
}

impl WidgetClock {
    fn position(&self) -> f64 {
        self.offset
            + self
                .started_at
                .map_or(0.0, |t| t.elapsed().as_secs_f64())
    }

    /// Deliver the deferred `Ready`, like the provider's script finishing its load.
    pub(super) fn service(&mut self) {
        if self.pending_ready {
            self.pending_ready = false;
            self.state = WidgetState::Cued;
            self.events.widget(WidgetEvent::Ready);
        }
    }

    fn set_state(&mut self, state: WidgetState) {
        self.state = state;
        self.events.widget(WidgetEvent::StateChange(state));
    }
}

pub(super) struct HeadlessWidget {
    clock: Rc<RefCell<WidgetClock>>,
}

impl HeadlessWidget {
    pub(super) fn new(container: &str, video_id: &str, host: &str, events: EventSink) -> Self {
        info!("video {video_id} from {host} mounted headless in #{container}");
        Self {
            clock: Rc::new(RefCell::new(WidgetClock {
                events,
                state: WidgetState::Unstarted,
                offset: 0.0,
                started_at: None,
                volume: 100,
                pending_ready: true,
            })),
        }
    }

    pub(super) fn shared(&self) -> Rc<RefCell<WidgetClock>> {
        self.clock.clone()
    }
}

impl VideoWidget for HeadlessWidget {
    fn play_video(&mut self) {
        let mut clock = self.clock.borrow_mut();
        if clock.state == WidgetState::Playing {
            return;
        }
        clock.started_at = Some(Instant::now());
        clock.set_state(WidgetState::Playing);
    }

    fn pause_video(&mut self) {
        let mut clock = self.clock.borrow_mut();
        if clock.state != WidgetState::Playing {
            return;
        }
        clock.offset = clock.position();
        clock.started_at = None;
        clock.set_state(WidgetState::Paused);
    }

    fn seek_to(&mut self, secs: f64, _allow_seek_ahead: bool) {
        let mut clock = self.clock.borrow_mut();
        clock.offset = secs.max(0.0);
        if clock.started_at.is_some() {
            clock.started_at = Some(Instant::now());
        }
    }

    fn player_state(&self) -> Option<WidgetState> {
        Some(self.clock.borrow().state)
    }

    fn current_time(&self) -> Option<f64> {
        Some(self.clock.borrow().position())
    }

    fn duration(&self) -> Option<f64> {
        None
    }

    fn set_volume(&mut self, percent: u8) {
        self.clock.borrow_mut().volume = percent.min(100);
    }

    fn destroy(&mut self) {
        let mut clock = self.clock.borrow_mut();
        clock.started_at = None;
        clock.pending_ready = false;
    }
}
