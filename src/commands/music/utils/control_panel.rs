//! Pure projections of the playback session into what the control panel shows.
//! Nothing here is stored; every view is recomputed from the session.

use super::playback_session::{MAX_VOLUME, MIN_VOLUME, PlaybackSession, PlaybackState};
use super::playlist_queue::{PlaylistEntry, PlaylistQueue};

/// Which transport controls are usable right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlPanelState {
    pub previous_enabled: bool,
    pub next_enabled: bool,
    pub volume_down_enabled: bool,
    pub volume_up_enabled: bool,
    /// The state button shows "pause" while playing and "play" otherwise.
    pub state_button_is_pause: bool,
}

impl ControlPanelState {
    pub fn project(queue: &PlaylistQueue, state: PlaybackState, volume: f64) -> Self {
        Self {
            previous_enabled: queue.has_previous(),
            next_enabled: queue.has_next(),
            volume_down_enabled: volume > MIN_VOLUME,
            volume_up_enabled: volume < MAX_VOLUME,
            state_button_is_pause: state == PlaybackState::Playing,
        }
    }
}

/// Everything the rendering layer receives after a state change.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelView {
    pub content: String,
    pub controls: ControlPanelState,
    pub state: PlaybackState,
    pub current: Option<PlaylistEntry>,
    pub volume: f64,
}

impl PanelView {
    pub fn project(session: &PlaybackSession) -> Self {
        let queue = session.queue();
        let state = session.state();
        Self {
            content: panel_content(session),
            controls: ControlPanelState::project(queue, state, session.volume()),
            state,
            current: session.current_reference().cloned(),
            volume: session.volume(),
        }
    }
}

fn panel_content(session: &PlaybackSession) -> String {
    if let Some(notice) = session.notice() {
        return notice.to_string();
    }

    let queue = session.queue();
    match (session.state(), session.current_reference()) {
        (PlaybackState::Loading, Some(reference)) => format!("Loading audio: {}", reference),
        (PlaybackState::Playing, Some(reference)) => format!("Now playing: {}", reference),
        (PlaybackState::Paused, Some(reference)) => format!("Paused: {}", reference),
        (state, _) => match queue.current_entry() {
            None if queue.is_empty() => "Playlist is empty.".to_string(),
            None => "Playlist finished.".to_string(),
            Some(next) if state == PlaybackState::Stopped => format!("Stopped. Next up: {}", next),
            Some(next) => format!("Ready to play: {}", next),
        },
    }
}

/// The current entry and what follows it, for `/showlist`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistSnapshot {
    pub current: Option<PlaylistEntry>,
    pub upcoming: Vec<PlaylistEntry>,
}

impl PlaylistSnapshot {
    pub fn project(session: &PlaybackSession) -> Self {
        let queue = session.queue();
        Self {
            current: session
                .current_reference()
                .or_else(|| queue.current_entry())
                .cloned(),
            upcoming: queue.upcoming().to_vec(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.upcoming.is_empty()
    }
}
