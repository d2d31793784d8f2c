//! The playback state machine.
//!
//! A `PlaybackSession` owns the playlist, the resolver and the transport, and is
//! only ever driven from one task (see `music_manager`). The two slow operations,
//! resolving a stream and playing it to the end, run on spawned tasks that report
//! back through `SessionEvent`s. Every such task is tagged with the generation
//! that started it; interrupting playback bumps the generation so late reports
//! from an interrupted stream or an abandoned resolution are dropped.
//!
//! Cursor rules while a stream is active: the cursor points at the playing
//! entry, and an interrupted stream counts as finished (the cursor moves past
//! it). `stop` then rewinds by one so the same entry is current again, and
//! `skip_previous` rewinds by two to land on the entry before it.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::audio_resolver::AudioResolver;
use super::music_manager::{MusicError, MusicResult};
use super::playlist_queue::{PlaylistEntry, PlaylistQueue};
use super::voice_transport::VoiceTransport;
use poise::serenity_prelude::{ChannelId, GuildId};

pub const MIN_VOLUME: f64 = 0.0;
pub const MAX_VOLUME: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing playing; initial state and where an exhausted playlist ends up.
    Idle,
    /// Resolving the current entry's stream.
    Loading,
    Playing,
    Paused,
    /// Nothing playing after an explicit stop; the voice connection is gone.
    Stopped,
}

impl PlaybackState {
    /// Whether a playback loop is running (a stream is resolving, playing or paused).
    pub fn is_active(self) -> bool {
        matches!(self, Self::Loading | Self::Playing | Self::Paused)
    }
}

/// Reports from the tasks a session spawns.
#[derive(Debug)]
pub enum SessionEvent {
    Resolved {
        generation: u64,
        reference: PlaylistEntry,
        result: MusicResult<String>,
    },
    StreamFinished {
        generation: u64,
        result: MusicResult<()>,
    },
}

/// Clamp to the allowed range and round to one decimal place.
pub fn clamp_volume(volume: f64) -> f64 {
    ((volume * 10.0).round() / 10.0).clamp(MIN_VOLUME, MAX_VOLUME)
}

pub struct PlaybackSession {
    queue: PlaylistQueue,
    resolver: AudioResolver,
    transport: Arc<dyn VoiceTransport>,
    events: mpsc::UnboundedSender<SessionEvent>,
    state: PlaybackState,
    current_reference: Option<PlaylistEntry>,
    volume: f64,
    generation: u64,
    /// Failure message shown on the panel until the next transition.
    notice: Option<String>,
}

impl PlaybackSession {
    pub fn new(
        resolver: AudioResolver,
        transport: Arc<dyn VoiceTransport>,
        events: mpsc::UnboundedSender<SessionEvent>,
        volume: f64,
    ) -> Self {
        Self {
            queue: PlaylistQueue::new(),
            resolver,
            transport,
            events,
            state: PlaybackState::Idle,
            current_reference: None,
            volume: clamp_volume(volume),
            generation: 0,
            notice: None,
        }
    }

    pub fn queue(&self) -> &PlaylistQueue {
        &self.queue
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_reference(&self) -> Option<&PlaylistEntry> {
        self.current_reference.as_ref()
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.state == PlaybackState::Loading
    }

    pub async fn connect(&mut self, guild_id: GuildId, channel_id: ChannelId) -> MusicResult<()> {
        self.transport.connect(guild_id, channel_id).await
    }

    pub fn enqueue(&mut self, reference: impl Into<PlaylistEntry>) {
        self.queue.append(reference);
    }

    /// Start the playback loop from the current entry.
    ///
    /// A no-op while a loop is already running. Fails with `InvalidTransition`
    /// when nothing is queued at the cursor.
    pub async fn start(&mut self) -> MusicResult<()> {
        if self.state.is_active() {
            info!("Start requested while {:?}, playback loop already running", self.state);
            return Ok(());
        }

        let Some(reference) = self.queue.current_entry().cloned() else {
            info!(
                "Nothing to play (cursor {}, length {})",
                self.queue.cursor(),
                self.queue.len()
            );
            return Err(MusicError::InvalidTransition("nothing to play".to_string()));
        };

        self.require_connection().await?;
        self.begin_loading(reference);
        Ok(())
    }

    pub async fn pause(&mut self) -> MusicResult<()> {
        self.require_connection().await?;
        if self.state != PlaybackState::Playing {
            return Err(MusicError::InvalidTransition(format!(
                "cannot pause while {:?}",
                self.state
            )));
        }
        self.transport.pause().await?;
        self.state = PlaybackState::Paused;
        info!("Paused '{}'", self.current_label());
        Ok(())
    }

    pub async fn resume(&mut self) -> MusicResult<()> {
        self.require_connection().await?;
        if self.state != PlaybackState::Paused {
            return Err(MusicError::InvalidTransition(format!(
                "cannot resume while {:?}",
                self.state
            )));
        }
        if !self.transport.is_playing().await {
            self.transport.resume().await?;
        }
        self.state = PlaybackState::Playing;
        info!("Resumed '{}'", self.current_label());
        Ok(())
    }

    pub async fn toggle_pause(&mut self) -> MusicResult<()> {
        match self.state {
            PlaybackState::Paused => self.resume().await,
            _ => self.pause().await,
        }
    }

    /// Move to the entry after the one that was playing and start it.
    pub async fn skip_next(&mut self) -> MusicResult<()> {
        self.require_connection().await?;
        self.notice = None;
        if !self.interrupt().await {
            self.queue.advance();
        }
        self.start().await
    }

    /// Move to the entry before the one that was playing and start it.
    pub async fn skip_previous(&mut self) -> MusicResult<()> {
        self.require_connection().await?;
        self.notice = None;
        if self.interrupt().await {
            self.queue.rewind_by(2);
        } else {
            self.queue.rewind_by(1);
        }
        self.start().await
    }

    /// Stop playback and leave the voice channel. The interrupted entry stays
    /// current so the next `start` plays it again.
    pub async fn stop(&mut self) -> MusicResult<()> {
        self.require_connection().await?;
        if self.interrupt().await {
            self.queue.rewind_by(1);
        }
        self.state = PlaybackState::Stopped;
        self.notice = None;
        info!("Stopped playback, cursor at {}", self.queue.cursor());
        self.transport.disconnect().await
    }

    /// Interrupt anything playing and empty the playlist. The voice connection stays.
    pub async fn clear(&mut self) {
        self.interrupt().await;
        self.queue.clear();
        self.state = PlaybackState::Idle;
        self.notice = None;
        info!("Playlist cleared");
    }

    /// Apply `delta` to the volume, clamped to `[0.0, 2.0]` and rounded to one decimal.
    pub async fn set_volume(&mut self, delta: f64) -> f64 {
        self.volume = clamp_volume(self.volume + delta);
        info!("Volume set to {}", self.volume);

        if matches!(self.state, PlaybackState::Playing | PlaybackState::Paused) {
            if let Err(e) = self.transport.set_volume(self.volume as f32).await {
                warn!("Failed to apply volume {} to the stream: {}", self.volume, e);
            }
        }
        self.volume
    }

    /// Apply a report from a spawned task. Stale reports are dropped; failures
    /// leave the session Idle with the failed entry still current.
    pub async fn handle_event(&mut self, event: SessionEvent) -> MusicResult<()> {
        match event {
            SessionEvent::Resolved {
                generation,
                reference,
                result,
            } => {
                if generation != self.generation || self.state != PlaybackState::Loading {
                    debug!("Dropping stale resolution of '{}'", reference);
                    return Ok(());
                }
                match result {
                    Ok(stream_url) => self.begin_playing(stream_url).await,
                    Err(e) => {
                        warn!("Could not resolve '{}': {}", reference, e);
                        self.state = PlaybackState::Idle;
                        self.current_reference = None;
                        self.notice = Some(format!(
                            "Could not load audio, please check the input: {}",
                            reference
                        ));
                        Err(e)
                    }
                }
            }
            SessionEvent::StreamFinished { generation, result } => {
                if generation != self.generation
                    || !matches!(self.state, PlaybackState::Playing | PlaybackState::Paused)
                {
                    debug!("Dropping completion of an interrupted stream");
                    return Ok(());
                }
                match result {
                    Ok(()) => {
                        info!("Finished '{}'", self.current_label());
                        self.advance_after_finish();
                        Ok(())
                    }
                    Err(e) => {
                        error!("Stream for '{}' failed: {}", self.current_label(), e);
                        self.notice = Some(format!("Playback failed: {}", self.current_label()));
                        self.state = PlaybackState::Idle;
                        self.current_reference = None;
                        Err(e)
                    }
                }
            }
        }
    }

    async fn require_connection(&self) -> MusicResult<()> {
        if self.transport.is_connected().await {
            Ok(())
        } else {
            Err(MusicError::NotConnected)
        }
    }

    fn current_label(&self) -> &str {
        self.current_reference.as_deref().unwrap_or("<none>")
    }

    fn begin_loading(&mut self, reference: PlaylistEntry) {
        self.generation += 1;
        self.state = PlaybackState::Loading;
        self.current_reference = Some(reference.clone());
        self.notice = None;
        info!("Loading '{}' (position {})", reference, self.queue.cursor());

        let generation = self.generation;
        let resolver = self.resolver.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = resolver.resolve_one(&reference).await;
            let _ = events.send(SessionEvent::Resolved {
                generation,
                reference,
                result,
            });
        });
    }

    /// Hand the stream to the transport before entering Playing, so any action
    /// applied after this returns finds the stream registered.
    async fn begin_playing(&mut self, stream_url: String) -> MusicResult<()> {
        let completion = match self.transport.play(&stream_url, self.volume as f32).await {
            Ok(completion) => completion,
            Err(e) => {
                error!("Could not start stream for '{}': {}", self.current_label(), e);
                self.notice = Some(format!("Playback failed: {}", self.current_label()));
                self.state = PlaybackState::Idle;
                self.current_reference = None;
                return Err(e);
            }
        };
        self.state = PlaybackState::Playing;
        info!("Now playing '{}'", self.current_label());

        let generation = self.generation;
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = completion.await.unwrap_or(Ok(()));
            let _ = events.send(SessionEvent::StreamFinished { generation, result });
        });
        Ok(())
    }

    fn advance_after_finish(&mut self) {
        self.queue.advance();
        match self.queue.current_entry().cloned() {
            Some(next) => self.begin_loading(next),
            None => {
                info!("Playlist exhausted");
                self.state = PlaybackState::Idle;
                self.current_reference = None;
            }
        }
    }

    /// Cut off whatever the loop is doing. Returns true when an active stream
    /// was interrupted, in which case the cursor has moved past it.
    async fn interrupt(&mut self) -> bool {
        let interrupted = match self.state {
            PlaybackState::Playing | PlaybackState::Paused => {
                self.generation += 1;
                if let Err(e) = self.transport.stop().await {
                    warn!("Error stopping stream '{}': {}", self.current_label(), e);
                }
                self.queue.advance();
                true
            }
            PlaybackState::Loading => {
                self.generation += 1;
                debug!("Abandoning resolution of '{}'", self.current_label());
                false
            }
            PlaybackState::Idle | PlaybackState::Stopped => return false,
        };
        self.state = PlaybackState::Idle;
        self.current_reference = None;
        interrupted
    }
}
