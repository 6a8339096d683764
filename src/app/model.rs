//! The TUI view model: the list cursor, the filter and "follow playback".
//!
//! Playback itself lives in the coordinator; `App` only decides which row the
//! cursor is on and which rows are visible.

use crate::library::Track;
use crate::player::PlaybackInfo;

/// Libraries larger than this get their labels lowercased once up front so
/// filtering does not redo it on every keystroke.
const LOWERED_LABELS_THRESHOLD: usize = 100;

pub struct App {
    pub tracks: Vec<Track>,
    /// Registry index under the cursor.
    pub cursor: usize,

    lowered_labels: Option<Vec<String>>,

    /// Cursor jumps to whatever is playing.
    pub follow_playback: bool,
    /// Index the user just started; following resumes once playback reports it.
    pub pending_follow: Option<usize>,

    pub filter_mode: bool,
    pub filter_query: String,

    /// Where the tracks came from (directory or catalog file).
    pub source_label: Option<String>,
    pub metadata_window: bool,
}

impl App {
    pub fn new(tracks: Vec<Track>) -> Self {
        let lowered_labels = (tracks.len() > LOWERED_LABELS_THRESHOLD)
            .then(|| tracks.iter().map(|t| t.display.to_lowercase()).collect());

        Self {
            tracks,
            cursor: 0,
            lowered_labels,
            follow_playback: true,
            pending_follow: None,
            filter_mode: false,
            filter_query: String::new(),
            source_label: None,
            metadata_window: false,
        }
    }

    pub fn set_source_label(&mut self, label: String) {
        self.source_label = Some(label);
    }

    pub fn toggle_metadata_window(&mut self) {
        self.metadata_window = !self.metadata_window;
    }

    pub fn cursor_track(&self) -> Option<&Track> {
        self.tracks.get(self.cursor)
    }

    pub fn follow_playback_on(&mut self) {
        self.follow_playback = true;
    }

    pub fn follow_playback_off(&mut self) {
        self.follow_playback = false;
        self.pending_follow = None;
    }

    /// Follow playback again, but only once `index` is reported as current.
    pub fn follow_after_start(&mut self, index: usize) {
        self.follow_playback = true;
        self.pending_follow = Some(index);
    }

    /// Move the cursor to the current track when following playback.
    pub fn sync_with_playback(&mut self, info: &PlaybackInfo) {
        if !self.follow_playback || self.filter_mode {
            return;
        }
        let Some(index) = info.index else {
            return;
        };
        match self.pending_follow {
            Some(pending) if pending != index => return,
            Some(_) => self.pending_follow = None,
            None => {}
        }
        if self.cursor != index {
            self.set_cursor(index);
        }
    }

    /// Registry indices in display order, after filtering.
    pub fn visible_indices(&self) -> Vec<usize> {
        let query = self.filter_query.trim();
        if query.is_empty() {
            return (0..self.tracks.len()).collect();
        }

        match self.lowered_labels.as_deref() {
            Some(lowered) => {
                let query = query.to_lowercase();
                (0..self.tracks.len())
                    .filter(|&i| subsequence_positions(&lowered[i], &query, false).is_some())
                    .collect()
            }
            None => (0..self.tracks.len())
                .filter(|&i| fuzzy_match_positions(&self.tracks[i].display, query).is_some())
                .collect(),
        }
    }

    /// Character positions of `query` inside the label of track `index`.
    pub fn match_positions(&self, index: usize, query: &str) -> Option<Vec<usize>> {
        match self.lowered_labels.as_deref() {
            Some(lowered) => subsequence_positions(&lowered[index], &query.to_lowercase(), false),
            None => fuzzy_match_positions(&self.tracks[index].display, query),
        }
    }

    pub fn set_cursor(&mut self, index: usize) {
        self.cursor = index;
        self.ensure_cursor_visible();
    }

    /// Move the cursor one visible row down, wrapping at the end.
    pub fn cursor_down(&mut self) {
        if let Some(next) = self.step_from(self.cursor, true) {
            self.cursor = next;
        }
    }

    /// Move the cursor one visible row up, wrapping at the top.
    pub fn cursor_up(&mut self) {
        if let Some(prev) = self.step_from(self.cursor, false) {
            self.cursor = prev;
        }
    }

    pub fn cursor_first(&mut self) {
        if let Some(&first) = self.visible_indices().first() {
            self.cursor = first;
        }
    }

    pub fn cursor_last(&mut self) {
        if let Some(&last) = self.visible_indices().last() {
            self.cursor = last;
        }
    }

    /// Visible neighbour of `from`; an index outside the view snaps to the
    /// first (forward) or last (backward) visible row.
    pub fn step_from(&self, from: usize, forward: bool) -> Option<usize> {
        let visible = self.visible_indices();
        let last = visible.len().checked_sub(1)?;
        let pos = visible.iter().position(|&i| i == from);
        let target = match (pos, forward) {
            (Some(p), true) if p == last => 0,
            (Some(p), true) => p + 1,
            (Some(0), false) => last,
            (Some(p), false) => p - 1,
            (None, true) => 0,
            (None, false) => last,
        };
        Some(visible[target])
    }

    pub fn enter_filter_mode(&mut self) {
        self.filter_mode = true;
        self.follow_playback_off();
        self.ensure_cursor_visible();
    }

    pub fn exit_filter_mode(&mut self) {
        self.filter_mode = false;
    }

    pub fn clear_filter(&mut self) {
        self.filter_query.clear();
        self.filter_mode = false;
        self.ensure_cursor_visible();
    }

    pub fn push_filter_char(&mut self, c: char) {
        self.filter_query.push(c);
        self.ensure_cursor_visible();
    }

    pub fn pop_filter_char(&mut self) {
        self.filter_query.pop();
        self.ensure_cursor_visible();
    }

    fn ensure_cursor_visible(&mut self) {
        let visible = self.visible_indices();
        match visible.first() {
            None => self.cursor = 0,
            Some(&first) if !visible.contains(&self.cursor) => self.cursor = first,
            Some(_) => {}
        }
    }
}

/// Case-insensitive subsequence match of `query` in `label`.
///
/// Returns the char positions in `label` that matched, or `None`.
pub fn fuzzy_match_positions(label: &str, query: &str) -> Option<Vec<usize>> {
    subsequence_positions(label, query, true)
}

fn subsequence_positions(label: &str, query: &str, fold_case: bool) -> Option<Vec<usize>> {
    let fold = |c: char| if fold_case { c.to_ascii_lowercase() } else { c };
    let mut positions = Vec::with_capacity(query.len());
    let mut label_chars = label.chars().enumerate();

    for qc in query.chars().map(fold) {
        let (i, _) = label_chars.find(|&(_, lc)| fold(lc) == qc)?;
        positions.push(i);
    }
    Some(positions)
}
