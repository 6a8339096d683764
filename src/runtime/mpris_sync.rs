use crate::app::App;
use crate::mpris::MprisHandle;
use crate::player::PlaybackInfo;

/// Push the current track and transport status to MPRIS.
pub fn update_mpris(mpris: &MprisHandle, app: &App, info: &PlaybackInfo) {
    let track = info.index.and_then(|i| app.tracks.get(i));
    mpris.set_track_metadata(info.index, track);
    mpris.set_playback(info.status);
}
