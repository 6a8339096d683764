//! Track library: the session's track records and the sources they come from.
//!
//! Tracks arrive either from a catalog export (the JSON the REST layer
//! serves) or from scanning a local directory of audio files.

mod catalog;
mod display;
mod model;
mod scan;

use std::path::Path;

pub use catalog::load_catalog;
pub use display::display_from_fields;
pub use model::Track;
pub use scan::scan;

use crate::config::LibrarySettings;
use crate::error::{Error, Result};

/// Load tracks from `path`: a directory is scanned, a file is read as a catalog.
pub fn load_library(path: &Path, settings: &LibrarySettings) -> Result<Vec<Track>> {
    if path.is_dir() {
        Ok(scan(path, settings))
    } else if path.is_file() {
        load_catalog(path, settings)
    } else {
        Err(Error::Catalog(format!("{} does not exist", path.display())))
    }
}

#[cfg(test)]
mod tests;
