use poise::serenity_prelude as serenity;
use serenity::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use super::audio_resolver::AudioResolver;
use super::control_panel::{PanelView, PlaylistSnapshot};
use super::playback_session::{PlaybackSession, SessionEvent};
use super::playlist_queue::PlaylistEntry;
use super::voice_transport::VoiceTransport;
use crate::commands::music::audio_sources::SearchResult;

/// Errors that can occur during music operations
#[derive(Error, Debug)]
pub enum MusicError {
    #[error("Not in a guild")]
    NotInGuild,

    #[error("User is not in a voice channel")]
    UserNotInVoiceChannel,

    #[error("Failed to get voice manager")]
    NoVoiceManager,

    #[error("Failed to join voice channel: {0}")]
    JoinError(String),

    #[error("Bot is not in a voice channel")]
    NotConnected,

    #[error("Could not load audio: {0}")]
    ResolutionFailed(String),

    #[error("Playback error: {0}")]
    TransportError(String),

    #[error("Not possible right now: {0}")]
    InvalidTransition(String),

    #[error("Music controller is not running")]
    ControllerUnavailable,
}

/// Result type for music operations
pub type MusicResult<T> = Result<T, MusicError>;

const MAILBOX_CAPACITY: usize = 64;

/// Receives a fresh view after every change the controller makes. Runs on its
/// own task; when views arrive faster than they render, only the latest is kept.
#[async_trait]
pub trait PanelRenderer: Send + Sync {
    async fn render(&self, view: PanelView);
}

/// Actions that change playback. While a stream is resolving these wait in
/// arrival order until the resolution settles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlAction {
    Connect {
        guild_id: GuildId,
        channel_id: ChannelId,
    },
    Start,
    Pause,
    Resume,
    TogglePause,
    SkipNext,
    SkipPrevious,
    Stop,
    Clear,
    AdjustVolume(f64),
}

/// What `/play` reports back after appending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnqueueReceipt {
    /// 1-based position of the new entry in the playlist.
    pub position: usize,
    /// The entry currently loading, playing or paused, if any.
    pub now_playing: Option<PlaylistEntry>,
}

type Responder<T> = oneshot::Sender<T>;

enum Request {
    Control {
        action: ControlAction,
        respond_to: Responder<MusicResult<PanelView>>,
    },
    Enqueue {
        reference: PlaylistEntry,
        respond_to: Responder<EnqueueReceipt>,
    },
    Panel {
        respond_to: Responder<PanelView>,
    },
    Playlist {
        respond_to: Responder<PlaylistSnapshot>,
    },
}

impl Request {
    fn is_control(&self) -> bool {
        matches!(self, Request::Control { .. })
    }
}

/// Owns the playback session and serializes every change to it.
///
/// Requests arrive on a bounded mailbox; the session's spawned tasks report on
/// a separate event channel. Both are drained by a single task, so the session
/// never needs a lock. Panel views go out through a watch channel to a render
/// task, so a slow Discord edit never holds up the mailbox.
pub struct MusicManager {
    session: PlaybackSession,
    views: watch::Sender<Option<PanelView>>,
    requests: mpsc::Receiver<Request>,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    /// Control actions held while Loading, plus any enqueue that arrived after
    /// one of them. Replayed in arrival order.
    deferred: VecDeque<Request>,
}

impl MusicManager {
    /// Start the controller on its own task and return a handle to it.
    pub fn spawn(
        resolver: AudioResolver,
        transport: Arc<dyn VoiceTransport>,
        renderer: Arc<dyn PanelRenderer>,
        default_volume: f64,
    ) -> MusicHandle {
        let (request_tx, requests) = mpsc::channel(MAILBOX_CAPACITY);
        let (event_tx, events) = mpsc::unbounded_channel();
        let (views, view_rx) = watch::channel(None);
        tokio::spawn(render_views(renderer, view_rx));

        let manager = Self {
            session: PlaybackSession::new(resolver.clone(), transport, event_tx, default_volume),
            views,
            requests,
            events,
            deferred: VecDeque::new(),
        };
        tokio::spawn(manager.run());

        MusicHandle {
            requests: request_tx,
            resolver,
        }
    }

    async fn run(mut self) {
        info!("Music controller started");
        loop {
            tokio::select! {
                Some(event) = self.events.recv() => self.on_event(event).await,
                request = self.requests.recv() => match request {
                    Some(request) => self.on_request(request).await,
                    None => break,
                },
            }
        }
        info!("All music handles dropped, controller stopping");
    }

    async fn on_request(&mut self, request: Request) {
        if self.must_wait(&request) {
            debug!("Deferring request until the current resolution settles");
            self.deferred.push_back(request);
        } else {
            self.serve(request).await;
        }
    }

    /// Controls wait out a resolution. Playlist appends also wait when anything
    /// is already deferred, so they never overtake an earlier `Clear`.
    fn must_wait(&self, request: &Request) -> bool {
        match request {
            Request::Control { .. } => self.session.is_loading() || !self.deferred.is_empty(),
            Request::Enqueue { .. } => !self.deferred.is_empty(),
            Request::Panel { .. } | Request::Playlist { .. } => false,
        }
    }

    async fn serve(&mut self, request: Request) {
        match request {
            Request::Control { action, respond_to } => self.apply(action, respond_to).await,
            Request::Enqueue {
                reference,
                respond_to,
            } => {
                info!("Appending '{}' to the playlist", reference);
                self.session.enqueue(reference);
                let now_playing = if self.session.state().is_active() {
                    self.session.current_reference().cloned()
                } else {
                    None
                };
                let _ = respond_to.send(EnqueueReceipt {
                    position: self.session.queue().len(),
                    now_playing,
                });
                self.render();
            }
            Request::Panel { respond_to } => {
                let _ = respond_to.send(PanelView::project(&self.session));
            }
            Request::Playlist { respond_to } => {
                let _ = respond_to.send(PlaylistSnapshot::project(&self.session));
            }
        }
    }

    async fn on_event(&mut self, event: SessionEvent) {
        if let Err(e) = self.session.handle_event(event).await {
            warn!("Playback loop stopped: {}", e);
        }
        self.render();
        self.replay_deferred().await;
    }

    /// Serve deferred requests in order until a control action meets a new resolution.
    async fn replay_deferred(&mut self) {
        while let Some(next) = self.deferred.front() {
            if next.is_control() && self.session.is_loading() {
                break;
            }
            if let Some(request) = self.deferred.pop_front() {
                self.serve(request).await;
            }
        }
    }

    async fn apply(&mut self, action: ControlAction, respond_to: Responder<MusicResult<PanelView>>) {
        debug!("Applying {:?} in state {:?}", action, self.session.state());
        let result = match action {
            ControlAction::Connect {
                guild_id,
                channel_id,
            } => self.session.connect(guild_id, channel_id).await,
            ControlAction::Start => self.session.start().await,
            ControlAction::Pause => self.session.pause().await,
            ControlAction::Resume => self.session.resume().await,
            ControlAction::TogglePause => self.session.toggle_pause().await,
            ControlAction::SkipNext => self.session.skip_next().await,
            ControlAction::SkipPrevious => self.session.skip_previous().await,
            ControlAction::Stop => self.session.stop().await,
            ControlAction::Clear => {
                self.session.clear().await;
                Ok(())
            }
            ControlAction::AdjustVolume(delta) => {
                self.session.set_volume(delta).await;
                Ok(())
            }
        };

        if let Err(e) = &result {
            info!("{:?} rejected: {}", action, e);
        }
        let view = self.render();
        let _ = respond_to.send(result.map(|()| view));
    }

    fn render(&self) -> PanelView {
        let view = PanelView::project(&self.session);
        self.views.send_replace(Some(view.clone()));
        view
    }
}

/// Render every view the controller publishes, skipping ones superseded
/// before the renderer got to them. Ends when the controller stops.
async fn render_views(renderer: Arc<dyn PanelRenderer>, mut views: watch::Receiver<Option<PanelView>>) {
    while views.changed().await.is_ok() {
        let view = views.borrow_and_update().clone();
        if let Some(view) = view {
            renderer.render(view).await;
        }
    }
    debug!("Panel render task stopped");
}

/// Cloneable front door to the controller task.
#[derive(Clone)]
pub struct MusicHandle {
    requests: mpsc::Sender<Request>,
    resolver: AudioResolver,
}

impl MusicHandle {
    async fn request<T>(&self, build: impl FnOnce(Responder<T>) -> Request) -> MusicResult<T> {
        let (respond_to, response) = oneshot::channel();
        self.requests
            .send(build(respond_to))
            .await
            .map_err(|_| MusicError::ControllerUnavailable)?;
        response.await.map_err(|_| MusicError::ControllerUnavailable)
    }

    async fn control(&self, action: ControlAction) -> MusicResult<PanelView> {
        self.request(|respond_to| Request::Control { action, respond_to })
            .await?
    }

    pub async fn connect(&self, guild_id: GuildId, channel_id: ChannelId) -> MusicResult<PanelView> {
        self.control(ControlAction::Connect {
            guild_id,
            channel_id,
        })
        .await
    }

    pub async fn enqueue(&self, reference: impl Into<PlaylistEntry>) -> MusicResult<EnqueueReceipt> {
        let reference = reference.into();
        self.request(|respond_to| Request::Enqueue {
            reference,
            respond_to,
        })
        .await
    }

    pub async fn start(&self) -> MusicResult<PanelView> {
        self.control(ControlAction::Start).await
    }

    pub async fn pause(&self) -> MusicResult<PanelView> {
        self.control(ControlAction::Pause).await
    }

    pub async fn resume(&self) -> MusicResult<PanelView> {
        self.control(ControlAction::Resume).await
    }

    pub async fn toggle_pause(&self) -> MusicResult<PanelView> {
        self.control(ControlAction::TogglePause).await
    }

    pub async fn skip_next(&self) -> MusicResult<PanelView> {
        self.control(ControlAction::SkipNext).await
    }

    pub async fn skip_previous(&self) -> MusicResult<PanelView> {
        self.control(ControlAction::SkipPrevious).await
    }

    pub async fn stop(&self) -> MusicResult<PanelView> {
        self.control(ControlAction::Stop).await
    }

    pub async fn clear(&self) -> MusicResult<PanelView> {
        self.control(ControlAction::Clear).await
    }

    pub async fn adjust_volume(&self, delta: f64) -> MusicResult<PanelView> {
        self.control(ControlAction::AdjustVolume(delta)).await
    }

    pub async fn panel(&self) -> MusicResult<PanelView> {
        self.request(|respond_to| Request::Panel { respond_to }).await
    }

    pub async fn playlist(&self) -> MusicResult<PlaylistSnapshot> {
        self.request(|respond_to| Request::Playlist { respond_to })
            .await
    }

    /// Search without touching playback state.
    pub async fn search(&self, keyword: &str, limit: usize) -> MusicResult<Vec<SearchResult>> {
        self.resolver.search(keyword, limit).await
    }

    /// Whether the playlist has something to resume at the cursor.
    pub async fn has_pending_entry(&self) -> MusicResult<bool> {
        let snapshot = self.playlist().await?;
        Ok(snapshot.current.is_some())
    }

    /// True while a stream is loading, playing or paused.
    pub async fn is_active(&self) -> MusicResult<bool> {
        Ok(self.panel().await?.state.is_active())
    }
}
