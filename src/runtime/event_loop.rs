use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::debug;
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::App;
use crate::backend::DesktopEngines;
use crate::config;
use crate::error::Result;
use crate::mpris::{ControlCmd, MprisHandle};
use crate::player::{Coordinator, PlaybackInfo, TransportStatus};
use crate::runtime::mpris_sync::update_mpris;
use crate::ui;

const INPUT_POLL: Duration = Duration::from_millis(50);

/// State tracked by the runtime event loop across iterations.
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
    /// Last-known playing index as emitted to MPRIS.
    pub last_mpris_index: Option<usize>,
    /// Last-known transport status as emitted to MPRIS.
    pub last_mpris_status: TransportStatus,
}

impl EventLoopState {
    pub fn new(info: &PlaybackInfo) -> Self {
        Self {
            pending_gg: false,
            last_mpris_index: info.index,
            last_mpris_status: info.status,
        }
    }
}

/// Everything one loop iteration touches.
pub struct Session<'a> {
    pub settings: &'a config::Settings,
    pub coordinator: &'a mut Coordinator,
    pub engines: &'a DesktopEngines,
    pub app: &'a mut App,
    pub mpris: &'a MprisHandle,
}

impl Session<'_> {
    fn snapshot(&self) -> PlaybackInfo {
        let handle = self.coordinator.playback_handle();
        let info = handle.lock().map(|info| info.clone()).unwrap_or_default();
        info
    }

    /// Advance engines and the coordinator, then mirror the result into the
    /// view model.
    fn service(&mut self, state: &mut EventLoopState) -> PlaybackInfo {
        self.engines.service();
        self.coordinator.pump();
        self.coordinator.tick(Instant::now());

        let info = self.snapshot();
        self.app.sync_with_playback(&info);

        // Media keys and auto-advance change playback without a key press here.
        if info.index != state.last_mpris_index || info.status != state.last_mpris_status {
            update_mpris(self.mpris, self.app, &info);
            state.last_mpris_index = info.index;
            state.last_mpris_status = info.status;
        }
        self.mpris.set_position(info.elapsed);
        info
    }

    /// Start the track under the cursor unless it is already playing.
    fn play_cursor(&mut self) {
        let Some(track) = self.app.cursor_track() else {
            return;
        };
        let id = track.id.clone();
        let cursor = self.app.cursor;
        let info = self.snapshot();
        if info.playing() && info.index == Some(cursor) {
            return;
        }
        self.app.follow_after_start(cursor);
        log_noop(self.coordinator.play_by_id(&id));
    }

    fn play(&mut self) {
        if self.coordinator.status() == TransportStatus::Idle {
            self.play_cursor();
        } else {
            self.coordinator.play();
        }
    }

    fn toggle(&mut self) {
        if self.coordinator.status() == TransportStatus::Idle {
            self.play_cursor();
        } else {
            self.coordinator.toggle();
        }
    }

    fn follow(&mut self) {
        if !self.app.filter_mode {
            self.app.follow_playback_on();
        }
    }

    fn quit(&mut self) {
        self.coordinator.shutdown();
        self.mpris.set_playback(TransportStatus::Idle);
    }
}

fn log_noop(result: Result<()>) {
    if let Err(e) = result {
        debug!("{e}");
    }
}

/// Main terminal event loop: drives the coordinator, draws the UI and handles
/// input and MPRIS commands. Returns `Ok(())` when shutdown is requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    session: &mut Session<'_>,
    control_tx: &mpsc::Sender<ControlCmd>,
    control_rx: &mpsc::Receiver<ControlCmd>,
    state: &mut EventLoopState,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    loop {
        let info = session.service(state);

        let visible = session.app.visible_indices();
        let settings = session.settings;
        let app = &*session.app;
        terminal.draw(|f| ui::draw(f, app, &info, &visible, &settings.ui, &settings.controls))?;

        while let Ok(cmd) = control_rx.try_recv() {
            if handle_control_cmd(cmd, session) {
                return Ok(());
            }
        }

        if event::poll(INPUT_POLL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, session, control_tx, state) {
                    return Ok(());
                }
            }
        }
    }
}

/// Apply a remote or key-forwarded command. Returns `true` on quit.
fn handle_control_cmd(cmd: ControlCmd, session: &mut Session<'_>) -> bool {
    match cmd {
        ControlCmd::Quit => {
            session.quit();
            return true;
        }
        ControlCmd::Play => {
            session.follow();
            session.play();
        }
        ControlCmd::Pause => {
            session.follow();
            session.coordinator.pause();
        }
        ControlCmd::PlayPause => {
            session.follow();
            session.toggle();
        }
        ControlCmd::Stop => {
            session.follow();
            session.coordinator.pause();
            session.coordinator.seek(0.0);
        }
        ControlCmd::Next => {
            session.follow();
            log_noop(session.coordinator.next());
        }
        ControlCmd::Prev => {
            session.follow();
            log_noop(session.coordinator.previous());
        }
        ControlCmd::Seek(micros) => {
            session.coordinator.seek_by(micros as f64 / 1_000_000.0);
        }
    }
    false
}

/// Returns `true` when the user asked to quit.
fn handle_key_event(
    key: KeyEvent,
    session: &mut Session<'_>,
    control_tx: &mpsc::Sender<ControlCmd>,
    state: &mut EventLoopState,
) -> bool {
    let app = &mut *session.app;

    if app.filter_mode {
        state.pending_gg = false;
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => app.clear_filter(),
            KeyCode::Backspace => app.pop_filter_char(),
            KeyCode::Char('j' | 'n') if ctrl => {
                app.follow_playback_off();
                app.cursor_down();
            }
            KeyCode::Char('k' | 'p') if ctrl => {
                app.follow_playback_off();
                app.cursor_up();
            }
            KeyCode::Char(c) if !c.is_control() => app.push_filter_char(c),
            KeyCode::Enter => {
                if app.visible_indices().is_empty() {
                    return false;
                }
                app.exit_filter_mode();
                session.play_cursor();
            }
            _ => {}
        }
        return false;
    }

    if key.code != KeyCode::Char('g') {
        state.pending_gg = false;
    }

    let scrub = session.settings.controls.scrub_seconds as f64;
    let volume_step = session.settings.controls.volume_step;

    match key.code {
        KeyCode::Char('q') => {
            session.quit();
            return true;
        }
        KeyCode::Char('/') => app.enter_filter_mode(),
        KeyCode::Char('r') => {
            let mode = session.coordinator.cycle_loop_mode();
            debug!("loop mode: {mode}");
        }
        KeyCode::Char('R') => session.coordinator.retry(),
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                app.follow_playback_off();
                app.cursor_first();
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => {
            app.follow_playback_off();
            app.cursor_last();
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.follow_playback_off();
            app.cursor_down();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.follow_playback_off();
            app.cursor_up();
        }
        KeyCode::Enter => session.play_cursor(),
        KeyCode::Char('p' | ' ') => {
            let _ = control_tx.send(ControlCmd::PlayPause);
        }
        KeyCode::Char('l') => {
            let _ = control_tx.send(ControlCmd::Next);
        }
        KeyCode::Char('h') => {
            let _ = control_tx.send(ControlCmd::Prev);
        }
        KeyCode::Char('L') => session.coordinator.seek_by(scrub),
        KeyCode::Char('H') => session.coordinator.seek_by(-scrub),
        KeyCode::Char('+' | '=') => {
            let volume = session.coordinator.volume();
            session.coordinator.set_volume(volume + volume_step);
        }
        KeyCode::Char('-') => {
            let volume = session.coordinator.volume();
            session.coordinator.set_volume(volume - volume_step);
        }
        KeyCode::Char('K') => app.toggle_metadata_window(),
        _ => {}
    }

    false
}
