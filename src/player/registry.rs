use crate::error::NoopReason;
use crate::library::Track;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Ordered track list for the session plus the current selection.
#[derive(Debug, Default)]
pub struct Registry {
    tracks: Vec<Track>,
    selected: Option<usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the track list.
    ///
    /// The selection follows its track id into the new list. Returns `false`
    /// when a previous selection had to be dropped.
    pub fn load(&mut self, tracks: Vec<Track>) -> bool {
        let selected_id = self.selected().map(|t| t.id.clone());
        self.tracks = tracks;
        self.selected = selected_id.as_deref().and_then(|id| self.index_of(id));
        selected_id.is_none() || self.selected.is_some()
    }

    #[cfg(test)]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    pub fn selected(&self) -> Option<&Track> {
        self.selected.and_then(|i| self.tracks.get(i))
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn select(&mut self, index: usize) -> Option<&Track> {
        if index >= self.tracks.len() {
            return None;
        }
        self.selected = Some(index);
        self.tracks.get(index)
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Index of the track next to the selection.
    ///
    /// With `wrap` set the list is treated as a ring; otherwise stepping past
    /// either end is a [`NoopReason::Boundary`].
    pub fn neighbour(&self, direction: Direction, wrap: bool) -> Result<usize, NoopReason> {
        if self.is_empty() {
            return Err(NoopReason::EmptyRegistry);
        }
        let current = self.selected.ok_or(NoopReason::NoSelection)?;
        let last = self.tracks.len() - 1;

        match direction {
            Direction::Next if current < last => Ok(current + 1),
            Direction::Next if wrap => Ok(0),
            Direction::Previous if current > 0 => Ok(current - 1),
            Direction::Previous if wrap => Ok(last),
            _ => Err(NoopReason::Boundary),
        }
    }
}
