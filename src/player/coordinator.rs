use std::rc::Rc;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use log::{debug, info, trace, warn};

use crate::adapter::{
    AdapterContext, AdapterKind, AdapterSignal, AdapterState, PlayerAdapter, create_adapter,
};
use crate::config::Settings;
use crate::engine::{Engines, Envelope, EventSink};
use crate::error::{Error, NoopReason, PlaybackError, Result};
use crate::library::Track;

use super::registry::{Direction, Registry};
use super::sync::{SyncLoop, TimeDisplay};
use super::transport::{Transport, TransportStatus};
use super::types::{LoopMode, PlaybackHandle, PlaybackInfo};

/// A deferred "start playing once ready" left behind by navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingResume {
    generation: u64,
    track_id: String,
}

/// Owns the registry, the transport, the single active adapter and the
/// single poll timer. UI code only ever talks to this type.
pub struct Coordinator {
    registry: Registry,
    transport: Transport,
    ctx: AdapterContext,
    events: Receiver<Envelope>,
    adapter: Option<Box<dyn PlayerAdapter>>,
    generation: u64,
    pending_resume: Option<PendingResume>,
    sync: SyncLoop,
    ready_timeout: Option<Duration>,
    loading_since: Option<Instant>,
    loop_mode: LoopMode,
    last_noop: Option<NoopReason>,
    time: Option<TimeDisplay>,
    playback: PlaybackHandle,
}

impl Coordinator {
    pub fn new(settings: &Settings, engines: Rc<dyn Engines>) -> Self {
        let (events, rx) = EventSink::channel();
        let ready_timeout = match settings.adapters.ready_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };

        let coordinator = Self {
            registry: Registry::new(),
            transport: Transport::new(settings.playback.volume, settings.adapters.play_retries),
            ctx: AdapterContext {
                engines,
                events,
                embed: settings.adapters.embed.clone(),
            },
            events: rx,
            adapter: None,
            generation: 0,
            pending_resume: None,
            sync: SyncLoop::new(Duration::from_millis(settings.sync.interval_ms)),
            ready_timeout,
            loading_since: None,
            loop_mode: settings.playback.loop_mode.into(),
            last_noop: None,
            time: None,
            playback: Arc::new(Mutex::new(PlaybackInfo::default())),
        };
        coordinator.publish();
        coordinator
    }

    // ---- queries ----

    pub fn playback_handle(&self) -> PlaybackHandle {
        self.playback.clone()
    }

    pub fn status(&self) -> TransportStatus {
        self.transport.status()
    }

    pub fn active_adapter_kind(&self) -> Option<AdapterKind> {
        self.adapter.as_ref().map(|a| a.kind())
    }

    pub fn position(&self) -> Option<f64> {
        self.adapter.as_ref().and_then(|a| a.position())
    }

    pub fn volume(&self) -> f32 {
        self.transport.volume()
    }

    // ---- registry ----

    /// Replace the track list, keeping the selection if its id survives.
    pub fn load(&mut self, tracks: Vec<Track>) {
        let kept = self.registry.load(tracks);
        if !kept || self.registry.selected().is_none() {
            if self.adapter.is_some() {
                debug!("selection dropped by registry reload");
            }
            self.teardown();
            self.registry.clear_selection();
            self.transport.clear();
        }
        info!("registry loaded with {} tracks", self.registry.len());
        self.publish();
    }

    /// Make `id` the current track without starting playback.
    pub fn select_by_id(&mut self, id: &str) -> Result<()> {
        let Some(index) = self.registry.index_of(id) else {
            return Err(self.noop(NoopReason::UnknownTrack(id.to_string())));
        };
        self.activate(index);
        Ok(())
    }

    /// Select `id` and start playing it.
    pub fn play_by_id(&mut self, id: &str) -> Result<()> {
        self.select_by_id(id)?;
        self.play();
        Ok(())
    }

    pub fn deselect(&mut self) {
        self.teardown();
        self.registry.clear_selection();
        self.transport.clear();
        self.publish();
    }

    pub fn next(&mut self) -> Result<()> {
        self.navigate(Direction::Next, false)
    }

    pub fn previous(&mut self) -> Result<()> {
        self.navigate(Direction::Previous, false)
    }

    // ---- transport ----

    pub fn play(&mut self) {
        match self.transport.status() {
            TransportStatus::Ready => {}
            TransportStatus::Idle => {
                debug!("play ignored: no track selected");
                return;
            }
            TransportStatus::Suspended(err) => {
                debug!("play ignored: suspended ({err})");
                return;
            }
            TransportStatus::Playing => return,
        }
        if !self.transport.request_play() {
            return;
        }
        self.pending_resume = None;
        if let Some(adapter) = self.adapter.as_mut() {
            adapter.play();
        }
        self.publish();
    }

    pub fn pause(&mut self) {
        let resume_cancelled = self.pending_resume.take().is_some();
        if !self.transport.request_pause() {
            if resume_cancelled {
                debug!("pending resume cancelled by pause");
            }
            return;
        }
        if let Some(adapter) = self.adapter.as_mut() {
            adapter.pause();
        }
        self.sync.stop();
        self.publish();
    }

    pub fn toggle(&mut self) {
        if self.transport.status() == TransportStatus::Playing
            || self.transport.awaiting_start()
            || self.pending_resume.is_some()
        {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Seek the current track to `position` seconds.
    pub fn seek(&mut self, position: f64) {
        if matches!(
            self.transport.status(),
            TransportStatus::Idle | TransportStatus::Suspended(_)
        ) {
            return;
        }
        let Some(adapter) = self.adapter.as_mut() else {
            return;
        };
        adapter.seek(position.max(0.0));
        self.refresh_time();
    }

    /// Scrub relative to the current position.
    pub fn seek_by(&mut self, delta: f64) {
        let base = self
            .position()
            .or(self.time.map(|t| t.elapsed))
            .unwrap_or(0.0);
        self.seek(base + delta);
    }

    /// Set the volume, clamped to `[0, 1]`. Returns the stored value.
    pub fn set_volume(&mut self, volume: f32) -> f32 {
        let volume = self.transport.set_volume(volume);
        if let Some(adapter) = self.adapter.as_mut() {
            adapter.set_volume(volume);
        }
        self.publish();
        volume
    }

    pub fn set_loop_mode(&mut self, mode: LoopMode) {
        self.loop_mode = mode;
        self.publish();
    }

    pub fn cycle_loop_mode(&mut self) -> LoopMode {
        self.set_loop_mode(self.loop_mode.cycle());
        self.loop_mode
    }

    /// Leave `Suspended` by rebuilding the adapter for the current track and
    /// asking it to play.
    pub fn retry(&mut self) {
        if !matches!(self.transport.status(), TransportStatus::Suspended(_)) {
            return;
        }
        let Some(index) = self.registry.selected_index() else {
            return;
        };
        info!("retrying track {index}");
        self.activate(index);
        self.play();
    }

    /// Release the active adapter. The registry is kept.
    pub fn shutdown(&mut self) {
        self.teardown();
        self.transport.clear();
        self.publish();
    }

    // ---- event handling ----

    /// Drain engine events in arrival order. Returns how many were read.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(envelope) = self.events.try_recv() {
            handled += 1;
            self.dispatch(envelope);
        }
        handled
    }

    /// Drive time-based work: the readiness timeout and the sync loop.
    /// Returns the fresh time display when a sample was taken.
    pub fn tick(&mut self, now: Instant) -> Option<TimeDisplay> {
        self.check_ready_timeout(now);

        if !self.sync.poll(now) {
            return None;
        }
        let sample = self.sample_time();
        match sample {
            Some(time) => {
                self.time = Some(time);
                self.publish();
            }
            None => trace!("sync tick missed: position unavailable"),
        }
        sample
    }

    fn dispatch(&mut self, envelope: Envelope) {
        let Some(adapter) = self.adapter.as_mut() else {
            trace!("dropping event with no active adapter");
            return;
        };
        if adapter.generation() != envelope.generation {
            debug!(
                "dropping event from retired adapter {} (active {})",
                envelope.generation,
                adapter.generation()
            );
            return;
        }
        let Some(signal) = adapter.handle_event(envelope.instance, envelope.event) else {
            return;
        };
        self.on_signal(envelope.generation, signal);
        self.publish();
    }

    fn on_signal(&mut self, generation: u64, signal: AdapterSignal) {
        match signal {
            AdapterSignal::Ready { duration } => {
                self.loading_since = None;
                if let Some(time) = self.time.as_mut() {
                    time.total = duration.or(time.total);
                }
                self.resume_if_pending(generation);
            }
            AdapterSignal::Started => {
                if self.transport.confirm_started() && self.sync.start() {
                    trace!("sync loop armed (start #{})", self.sync.starts());
                }
            }
            AdapterSignal::Paused => {
                if self.transport.stopped() {
                    self.sync.stop();
                }
            }
            AdapterSignal::Ended => {
                self.transport.stopped();
                self.sync.stop();
                self.advance_after_end();
            }
            AdapterSignal::Failed(err) if err.is_recoverable() && self.transport.take_retry() => {
                info!("{err}, retrying");
                self.sync.stop();
                if let Some(adapter) = self.adapter.as_mut() {
                    adapter.play();
                }
            }
            AdapterSignal::Failed(err) => self.suspend(err),
        }
    }

    fn resume_if_pending(&mut self, generation: u64) {
        let Some(resume) = self.pending_resume.take() else {
            return;
        };
        let current = self.registry.selected().map(|t| t.id.as_str());
        if resume.generation != generation || current != Some(resume.track_id.as_str()) {
            debug!("discarding stale resume for {}", resume.track_id);
            return;
        }
        self.play();
    }

    fn advance_after_end(&mut self) {
        match self.loop_mode {
            LoopMode::LoopOne => {
                if let Some(adapter) = self.adapter.as_mut() {
                    adapter.seek(0.0);
                }
                self.play();
            }
            LoopMode::LoopAll | LoopMode::NoLoop => {
                let wrap = self.loop_mode == LoopMode::LoopAll;
                match self.registry.neighbour(Direction::Next, wrap) {
                    Ok(index) => {
                        self.activate(index);
                        self.arm_resume();
                    }
                    Err(reason) => debug!("end of registry: {reason}"),
                }
            }
        }
    }

    fn check_ready_timeout(&mut self, now: Instant) {
        let Some(timeout) = self.ready_timeout else {
            return;
        };
        let loading = matches!(
            self.adapter.as_ref().map(|a| a.state()),
            Some(AdapterState::Unloaded | AdapterState::Loading)
        );
        if !loading {
            self.loading_since = None;
            return;
        }

        let since = *self.loading_since.get_or_insert(now);
        if now.duration_since(since) < timeout {
            return;
        }
        warn!("adapter not ready after {timeout:?}, giving up");
        if let Some(adapter) = self.adapter.as_mut() {
            adapter.destroy();
        }
        self.suspend(PlaybackError::InitializationFailed);
        self.publish();
    }

    // ---- internals ----

    fn navigate(&mut self, direction: Direction, wrap: bool) -> Result<()> {
        let index = match self.registry.neighbour(direction, wrap) {
            Ok(index) => index,
            Err(reason) => return Err(self.noop(reason)),
        };
        let resume = self.playback_active();
        self.activate(index);
        if resume {
            self.arm_resume();
        }
        Ok(())
    }

    /// Playing, or about to be.
    fn playback_active(&self) -> bool {
        self.transport.status() == TransportStatus::Playing
            || self.transport.awaiting_start()
            || self.pending_resume.is_some()
    }

    fn arm_resume(&mut self) {
        if self.transport.status() != TransportStatus::Ready {
            return;
        }
        let (Some(adapter), Some(track)) = (self.adapter.as_ref(), self.registry.selected()) else {
            return;
        };
        self.pending_resume = Some(PendingResume {
            generation: adapter.generation(),
            track_id: track.id.clone(),
        });
    }

    /// Tear down the current adapter and bring one up for track `index`.
    fn activate(&mut self, index: usize) {
        self.teardown();
        let Some(track) = self.registry.select(index) else {
            return;
        };
        let source = track.source.clone();
        let hint = track.duration_hint().map(|s| s as f64);
        debug!("selecting track {} ({})", track.id, track.display);

        self.generation += 1;
        let mut adapter = create_adapter(&source, self.generation, &self.ctx);
        adapter.set_volume(self.transport.volume());
        self.transport.select();
        self.last_noop = None;
        self.time = TimeDisplay::sample(Some(0.0), hint);

        if let Err(err) = adapter.load(&source) {
            self.transport.suspend(err);
        }
        debug!("{} adapter {} active", adapter.kind(), adapter.generation());
        self.adapter = Some(adapter);
        self.publish();
    }

    fn teardown(&mut self) {
        if let Some(mut adapter) = self.adapter.take() {
            debug!("tearing down {} adapter {}", adapter.kind(), adapter.generation());
            adapter.destroy();
        }
        self.sync.stop();
        self.pending_resume = None;
        self.loading_since = None;
        self.time = None;
    }

    fn suspend(&mut self, err: PlaybackError) {
        warn!("playback suspended: {err}");
        self.transport.suspend(err);
        self.sync.stop();
        self.pending_resume = None;
        self.loading_since = None;
    }

    fn noop(&mut self, reason: NoopReason) -> Error {
        match reason {
            NoopReason::UnknownTrack(_) => warn!("navigation no-op: {reason}"),
            _ => debug!("navigation no-op: {reason}"),
        }
        self.last_noop = Some(reason.clone());
        self.publish();
        Error::NavigationNoop(reason)
    }

    fn sample_time(&self) -> Option<TimeDisplay> {
        let adapter = self.adapter.as_ref()?;
        let total = adapter
            .duration()
            .or(self.time.and_then(|t| t.total));
        TimeDisplay::sample(adapter.position(), total)
    }

    fn refresh_time(&mut self) {
        if let Some(time) = self.sample_time() {
            self.time = Some(time);
        }
        self.publish();
    }

    fn publish(&self) {
        let Ok(mut info) = self.playback.lock() else {
            return;
        };
        let track = self.registry.selected();
        info.track_id = track.map(|t| t.id.clone());
        info.index = self.registry.selected_index();
        info.status = self.transport.status();
        info.adapter = self.active_adapter_kind();
        info.elapsed = self
            .time
            .map(|t| Duration::from_secs_f64(t.elapsed))
            .unwrap_or(Duration::ZERO);
        info.total = self
            .time
            .and_then(|t| t.total)
            .map(Duration::from_secs_f64);
        info.volume = self.transport.volume();
        info.loop_mode = self.loop_mode;
        info.notice = self.last_noop.as_ref().map(ToString::to_string);
    }
}

/// Read-only inspection used by the coordinator tests.
#[cfg(test)]
impl Coordinator {
    pub fn tracks(&self) -> &[Track] {
        self.registry.tracks()
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.registry.selected()
    }

    pub fn adapter_state(&self) -> Option<AdapterState> {
        self.adapter.as_ref().map(|a| a.state())
    }

    /// The most recent navigation request that changed nothing.
    pub fn last_noop(&self) -> Option<&NoopReason> {
        self.last_noop.as_ref()
    }

    pub fn time(&self) -> Option<TimeDisplay> {
        self.time
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn sync_running(&self) -> bool {
        self.sync.is_running()
    }

    pub fn sync_starts(&self) -> u64 {
        self.sync.starts()
    }
}
