use crate::config::TrackDisplayField;

use super::model::Track;

/// Build a display string for a track according to the provided `fields` and separator.
///
/// Empty fields are skipped; when nothing is produced the track name is used.
pub fn display_from_fields(track: &Track, fields: &[TrackDisplayField], sep: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    for f in fields {
        let part = match f {
            TrackDisplayField::Display => Some(track.display.as_str()),
            TrackDisplayField::Name => Some(track.name.as_str()),
            TrackDisplayField::Desc => Some(track.desc.as_str()),
            TrackDisplayField::User => track.user.as_deref(),
            TrackDisplayField::Duration => Some(track.duration.as_str()),
            TrackDisplayField::Source => Some(track.source.as_str()),
        };
        if let Some(p) = part.map(str::trim).filter(|s| !s.is_empty()) {
            parts.push(p.to_string());
        }
    }

    if parts.is_empty() {
        track.name.clone()
    } else {
        parts.join(sep)
    }
}
