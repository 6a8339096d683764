use std::collections::HashSet;
use std::fs;
use std::path::Path;

use log::{debug, warn};
use serde::Deserialize;

use crate::config::LibrarySettings;
use crate::error::Result;

use super::display::display_from_fields;
use super::model::Track;

/// A catalog export: either a bare array or the `{ "songs": [...] }` envelope
/// returned by the song list endpoint.
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    List(Vec<Track>),
    Envelope { songs: Vec<Track> },
}

/// Read a catalog export from `path`.
///
/// Track order is preserved. Entries with a duplicate id are dropped (first one
/// wins) so that ids stay unique within the registry.
pub fn load_catalog(path: &Path, settings: &LibrarySettings) -> Result<Vec<Track>> {
    let raw = fs::read_to_string(path)?;
    let tracks = parse_catalog(&raw, settings)?;
    debug!("loaded {} tracks from {}", tracks.len(), path.display());
    Ok(tracks)
}

pub(super) fn parse_catalog(raw: &str, settings: &LibrarySettings) -> Result<Vec<Track>> {
    let doc: CatalogDocument = serde_json::from_str(raw)?;
    let tracks = match doc {
        CatalogDocument::List(t) => t,
        CatalogDocument::Envelope { songs } => songs,
    };

    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(tracks.len());
    for mut track in tracks {
        if !seen.insert(track.id.clone()) {
            warn!("catalog: dropping duplicate track id {:?}", track.id);
            continue;
        }
        track.display = display_from_fields(
            &track,
            &settings.display_fields,
            &settings.display_separator,
        );
        out.push(track);
    }
    Ok(out)
}
