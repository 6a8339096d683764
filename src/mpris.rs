//! MPRIS (D-Bus) remote control surface.
//!
//! The service runs on its own thread. It only sends `ControlCmd`s back to the
//! runtime and reads a small shared snapshot; the coordinator never leaves the
//! UI thread.

use std::collections::HashMap;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_io::{Timer, block_on};
use url::Url;
use zbus::{Connection, interface};
use zvariant::{OwnedObjectPath, OwnedValue, Value};

use crate::library::Track;
use crate::player::TransportStatus;

const BUS_NAME: &str = "org.mpris.MediaPlayer2.legato";
const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const NOTIFY_POLL: Duration = Duration::from_millis(200);

#[derive(Clone, Debug, PartialEq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
    /// Relative seek in microseconds.
    Seek(i64),
}

#[derive(Debug, Default)]
struct SharedState {
    playback: &'static str,
    title: Option<String>,
    artist: Vec<String>,
    url: Option<String>,
    art_url: Option<String>,
    length_micros: Option<i64>,
    position_micros: i64,
    track_id: Option<OwnedObjectPath>,
}

fn playback_status_str(status: TransportStatus) -> &'static str {
    match status {
        TransportStatus::Playing => "Playing",
        TransportStatus::Ready => "Paused",
        TransportStatus::Idle | TransportStatus::Suspended(_) => "Stopped",
    }
}

/// `file://` URL for absolute local paths, the source as-is otherwise.
fn track_url(source: &str) -> String {
    let path = Path::new(source);
    if path.is_absolute() {
        if let Ok(url) = Url::from_file_path(path) {
            return url.to_string();
        }
    }
    source.to_string()
}

pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<()>,
}

impl MprisHandle {
    pub fn set_playback(&self, status: TransportStatus) {
        let status = playback_status_str(status);
        let changed = match self.state.lock() {
            Ok(mut s) if s.playback != status => {
                s.playback = status;
                true
            }
            _ => false,
        };
        if changed {
            let _ = self.notify.send(());
        }
    }

    pub fn set_track_metadata(&self, index: Option<usize>, track: Option<&Track>) {
        if let Ok(mut s) = self.state.lock() {
            match track {
                Some(t) => {
                    s.title = Some(t.name.clone());
                    s.artist = if t.desc.trim().is_empty() {
                        Vec::new()
                    } else {
                        vec![t.desc.clone()]
                    };
                    s.url = Some(track_url(&t.source));
                    s.art_url = t.image.clone();
                    s.length_micros = t
                        .duration_hint()
                        .and_then(|secs| i64::try_from(secs).ok())
                        .and_then(|secs| secs.checked_mul(1_000_000));
                    s.track_id = index.and_then(|i| {
                        OwnedObjectPath::try_from(format!("{OBJECT_PATH}/track/{i}")).ok()
                    });
                }
                None => {
                    s.title = None;
                    s.artist.clear();
                    s.url = None;
                    s.art_url = None;
                    s.length_micros = None;
                    s.position_micros = 0;
                    s.track_id = None;
                }
            }
        }
        let _ = self.notify.send(());
    }

    /// Position is polled by clients; no change signal is sent.
    pub fn set_position(&self, elapsed: Duration) {
        if let Ok(mut s) = self.state.lock() {
            s.position_micros = i64::try_from(elapsed.as_micros()).unwrap_or(i64::MAX);
        }
    }
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {}

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "legato"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string(), "https".to_string(), "youtube".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        let _ = self.tx.send(ControlCmd::Next);
    }

    fn previous(&self) {
        let _ = self.tx.send(ControlCmd::Prev);
    }

    fn play(&self) {
        let _ = self.tx.send(ControlCmd::Play);
    }

    fn pause(&self) {
        let _ = self.tx.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        let _ = self.tx.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        let _ = self.tx.send(ControlCmd::Stop);
    }

    fn seek(&self, offset: i64) {
        let _ = self.tx.send(ControlCmd::Seek(offset));
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        match self.state.lock() {
            Ok(s) if !s.playback.is_empty() => s.playback,
            _ => "Stopped",
        }
    }

    #[zbus(property)]
    fn position(&self) -> i64 {
        self.state.lock().map(|s| s.position_micros).unwrap_or(0)
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        let mut insert = |key: &str, value: Value<'_>| {
            if let Ok(v) = OwnedValue::try_from(value) {
                map.insert(key.to_string(), v);
            }
        };

        if let Some(id) = &s.track_id {
            insert("mpris:trackid", Value::from(id.clone().into_inner()));
        }
        if let Some(title) = &s.title {
            insert("xesam:title", Value::from(title.clone()));
        }
        if !s.artist.is_empty() {
            insert("xesam:artist", Value::from(s.artist.clone()));
        }
        if let Some(url) = &s.url {
            insert("xesam:url", Value::from(url.clone()));
        }
        if let Some(art) = &s.art_url {
            insert("mpris:artUrl", Value::from(art.clone()));
        }
        if let Some(length) = s.length_micros {
            insert("mpris:length", Value::from(length));
        }
        map
    }
}

/// Start the MPRIS service thread. Failures are logged and leave the player
/// without a D-Bus surface.
pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify_tx, notify_rx) = mpsc::channel::<()>();

    let state_for_thread = state.clone();
    std::thread::spawn(move || {
        block_on(serve(tx, state_for_thread, notify_rx));
    });

    MprisHandle {
        state,
        notify: notify_tx,
    }
}

async fn serve(tx: Sender<ControlCmd>, state: Arc<Mutex<SharedState>>, notify: Receiver<()>) {
    let connection = match Connection::session().await {
        Ok(c) => c,
        Err(e) => {
            log::warn!("mpris: failed to connect to session bus: {e}");
            return;
        }
    };

    if let Err(e) = connection.request_name(BUS_NAME).await {
        log::warn!("mpris: failed to acquire {BUS_NAME}: {e}");
        return;
    }

    let object_server = connection.object_server();

    if let Err(e) = object_server
        .at(OBJECT_PATH, RootIface { tx: tx.clone() })
        .await
    {
        log::warn!("mpris: failed to register root iface: {e}");
        return;
    }

    if let Err(e) = object_server
        .at(OBJECT_PATH, PlayerIface { tx, state })
        .await
    {
        log::warn!("mpris: failed to register player iface: {e}");
        return;
    }

    let player = match object_server
        .interface::<_, PlayerIface>(OBJECT_PATH)
        .await
    {
        Ok(iface) => iface,
        Err(e) => {
            log::warn!("mpris: player iface lookup failed: {e}");
            return;
        }
    };
    log::info!("mpris: serving {BUS_NAME}");

    loop {
        Timer::after(NOTIFY_POLL).await;

        let mut dirty = false;
        loop {
            match notify.try_recv() {
                Ok(()) => dirty = true,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return,
            }
        }
        if !dirty {
            continue;
        }

        let iface = player.get().await;
        let emitter = player.signal_emitter();
        if let Err(e) = iface.playback_status_changed(emitter).await {
            log::debug!("mpris: PlaybackStatus signal failed: {e}");
        }
        if let Err(e) = iface.metadata_changed(emitter).await {
            log::debug!("mpris: Metadata signal failed: {e}");
        }
    }
}
