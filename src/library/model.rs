use serde::Deserialize;

/// A playable catalog entry.
///
/// The serde shape follows the song documents served by the REST layer, so a
/// catalog export can be deserialized directly.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Track {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    /// Artist or free-form description text.
    #[serde(default)]
    pub desc: String,
    /// Owning user reference.
    #[serde(default)]
    pub user: Option<String>,
    /// Direct media URL/path or a third-party video reference.
    #[serde(alias = "file")]
    pub source: String,
    #[serde(default)]
    pub image: Option<String>,
    /// Textual duration as shown in listings, e.g. `"3:45"`.
    #[serde(default)]
    pub duration: String,
    /// Precomputed list label, filled in by the library loaders.
    #[serde(skip)]
    pub display: String,
}

impl Track {
    /// Parse the textual duration into whole seconds.
    ///
    /// Accepts `m:ss`, `h:mm:ss` and plain seconds.
    pub fn duration_hint(&self) -> Option<u64> {
        let text = self.duration.trim();
        if text.is_empty() {
            return None;
        }

        let mut total: u64 = 0;
        let mut parts = 0;
        for part in text.split(':') {
            let v: u64 = part.trim().parse().ok()?;
            if parts > 0 && v >= 60 {
                return None;
            }
            total = total.checked_mul(60)?.checked_add(v)?;
            parts += 1;
        }

        if parts > 3 { None } else { Some(total) }
    }
}
