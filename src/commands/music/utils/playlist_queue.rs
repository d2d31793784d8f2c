//! The shared playlist: an append-only list of references plus a cursor that
//! marks the entry currently selected for playback.

use tracing::debug;

/// A reference exactly as a user supplied it (a URL or a search term).
pub type PlaylistEntry = String;

/// Ordered playlist with a playback cursor.
///
/// Entries are never removed as they play; history is everything before the
/// cursor. The cursor always satisfies `0 <= cursor <= len`, and the entry at
/// the cursor is the current one while `cursor < len`.
#[derive(Debug, Default, Clone)]
pub struct PlaylistQueue {
    entries: Vec<PlaylistEntry>,
    cursor: usize,
}

impl PlaylistQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reference to the end of the playlist. The cursor does not move.
    pub fn append(&mut self, reference: impl Into<PlaylistEntry>) {
        let reference = reference.into();
        debug!("Appending '{}' at position {}", reference, self.entries.len());
        self.entries.push(reference);
    }

    /// The entry at the cursor, if the playlist is not exhausted.
    pub fn current_entry(&self) -> Option<&PlaylistEntry> {
        self.entries.get(self.cursor)
    }

    /// Move the cursor forward by one. Stops at `len` (playlist exhausted).
    pub fn advance(&mut self) {
        if self.cursor < self.entries.len() {
            self.cursor += 1;
        } else {
            debug!("Advance requested on an exhausted playlist, cursor stays at {}", self.cursor);
        }
    }

    /// Move the cursor back by `n`, saturating at the first entry.
    pub fn rewind_by(&mut self, n: usize) {
        self.cursor = self.cursor.saturating_sub(n);
    }

    /// Empty the playlist and reset the cursor.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    pub fn has_previous(&self) -> bool {
        self.cursor > 0
    }

    pub fn has_next(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries after the current one, in playback order.
    pub fn upcoming(&self) -> &[PlaylistEntry] {
        let start = (self.cursor + 1).min(self.entries.len());
        &self.entries[start..]
    }
}
