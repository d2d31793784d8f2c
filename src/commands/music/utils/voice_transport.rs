//! The voice transport seam and its songbird implementation.

use poise::serenity_prelude as serenity;
use serenity::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use songbird::input::{HttpRequest, Input};
use songbird::tracks::{PlayMode, TrackHandle};
use songbird::{Call, Event, EventContext, Songbird, TrackEvent};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex, oneshot};
use tracing::{debug, error, info, warn};

use super::music_manager::{MusicError, MusicResult};

/// Completes with the outcome of a started stream once it ends, fails or is
/// stopped. A dropped sender means the call was torn down underneath the
/// stream and counts as a normal end.
pub type StreamCompletion = oneshot::Receiver<MusicResult<()>>;

/// Everything the playback session needs from a voice connection.
///
/// `play` returns as soon as the stream is registered, so a `pause`, `stop` or
/// `set_volume` issued right after it acts on that stream. Waiting for the end
/// happens on the returned `StreamCompletion`.
#[async_trait]
pub trait VoiceTransport: Send + Sync {
    async fn connect(&self, guild_id: GuildId, channel_id: ChannelId) -> MusicResult<()>;
    async fn is_connected(&self) -> bool;
    async fn play(&self, stream_url: &str, volume: f32) -> MusicResult<StreamCompletion>;
    async fn pause(&self) -> MusicResult<()>;
    async fn resume(&self) -> MusicResult<()>;
    async fn stop(&self) -> MusicResult<()>;
    async fn set_volume(&self, volume: f32) -> MusicResult<()>;
    async fn disconnect(&self) -> MusicResult<()>;
    async fn is_playing(&self) -> bool;
}

/// Songbird backed transport bound to whichever guild it last connected in.
pub struct SongbirdTransport {
    songbird: Arc<Songbird>,
    http_client: reqwest::Client,
    guild_id: Mutex<Option<GuildId>>,
    current: Mutex<Option<TrackHandle>>,
}

impl SongbirdTransport {
    pub fn new(songbird: Arc<Songbird>, http_client: reqwest::Client) -> Self {
        Self {
            songbird,
            http_client,
            guild_id: Mutex::new(None),
            current: Mutex::new(None),
        }
    }

    async fn call(&self) -> MusicResult<Arc<Mutex<Call>>> {
        let guild_id = self.guild_id.lock().await.ok_or(MusicError::NotConnected)?;
        self.songbird.get(guild_id).ok_or(MusicError::NotConnected)
    }

    async fn current_track(&self) -> MusicResult<TrackHandle> {
        self.current
            .lock()
            .await
            .clone()
            .ok_or_else(|| MusicError::TransportError("No stream is playing".to_string()))
    }
}

#[async_trait]
impl VoiceTransport for SongbirdTransport {
    async fn connect(&self, guild_id: GuildId, channel_id: ChannelId) -> MusicResult<()> {
        if let Some(call) = self.songbird.get(guild_id) {
            if call.lock().await.current_channel() == Some(channel_id.into()) {
                debug!("Already connected to channel {} in guild {}", channel_id, guild_id);
                *self.guild_id.lock().await = Some(guild_id);
                return Ok(());
            }
        }

        info!("Joining voice channel {} in guild {}", channel_id, guild_id);
        self.songbird.join(guild_id, channel_id).await.map_err(|e| {
            error!(
                "Failed to join voice channel {} for guild {}: {}",
                channel_id, guild_id, e
            );
            MusicError::JoinError(e.to_string())
        })?;

        *self.guild_id.lock().await = Some(guild_id);
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        match self.call().await {
            Ok(call) => call.lock().await.current_channel().is_some(),
            Err(_) => false,
        }
    }

    async fn play(&self, stream_url: &str, volume: f32) -> MusicResult<StreamCompletion> {
        let call = self.call().await?;
        let input: Input = HttpRequest::new(self.http_client.clone(), stream_url.to_string()).into();

        let (done_tx, done_rx) = oneshot::channel();
        let notifier = StreamEndNotifier {
            done: Arc::new(StdMutex::new(Some(done_tx))),
        };

        // Held across the start so a concurrent `stop` sees either the old stream or this one.
        let mut current = self.current.lock().await;
        let handle = call.lock().await.play_only_input(input);
        if let Err(e) = prepare_track(&handle, volume, notifier) {
            let _ = handle.stop();
            return Err(e);
        }
        *current = Some(handle.clone());

        debug!("Stream {} started at volume {}", handle.uuid(), volume);
        Ok(done_rx)
    }

    async fn pause(&self) -> MusicResult<()> {
        self.current_track()
            .await?
            .pause()
            .map_err(|e| MusicError::TransportError(e.to_string()))
    }

    async fn resume(&self) -> MusicResult<()> {
        self.current_track()
            .await?
            .play()
            .map_err(|e| MusicError::TransportError(e.to_string()))
    }

    async fn stop(&self) -> MusicResult<()> {
        let Some(track) = self.current.lock().await.take() else {
            return Ok(());
        };
        match track.stop() {
            Ok(_) | Err(songbird::error::ControlError::Finished) => Ok(()),
            Err(e) => Err(MusicError::TransportError(e.to_string())),
        }
    }

    async fn set_volume(&self, volume: f32) -> MusicResult<()> {
        self.current_track()
            .await?
            .set_volume(volume)
            .map_err(|e| MusicError::TransportError(e.to_string()))
    }

    async fn disconnect(&self) -> MusicResult<()> {
        let guild_id = self.guild_id.lock().await.take().ok_or(MusicError::NotConnected)?;
        self.current.lock().await.take();

        if self.songbird.get(guild_id).is_none() {
            return Err(MusicError::NotConnected);
        }
        info!("Leaving voice channel in guild {}", guild_id);
        self.songbird
            .remove(guild_id)
            .await
            .map_err(|e| MusicError::JoinError(format!("Failed to leave voice channel: {}", e)))
    }

    async fn is_playing(&self) -> bool {
        let Some(track) = self.current.lock().await.clone() else {
            return false;
        };
        track
            .get_info()
            .await
            .is_ok_and(|info| info.playing == PlayMode::Play)
    }
}

fn prepare_track(handle: &TrackHandle, volume: f32, notifier: StreamEndNotifier) -> MusicResult<()> {
    handle
        .set_volume(volume)
        .map_err(|e| MusicError::TransportError(e.to_string()))?;
    for event in [TrackEvent::End, TrackEvent::Error] {
        handle
            .add_event(Event::Track(event), notifier.clone())
            .map_err(|e| MusicError::TransportError(e.to_string()))?;
    }
    Ok(())
}

/// Completes a stream's `StreamCompletion` when its track ends or errors.
#[derive(Clone)]
struct StreamEndNotifier {
    done: Arc<StdMutex<Option<oneshot::Sender<MusicResult<()>>>>>,
}

#[async_trait]
impl songbird::EventHandler for StreamEndNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::Track(tracks) = ctx {
            let outcome = match tracks.first().map(|(state, _)| &state.playing) {
                Some(PlayMode::Errored(e)) => {
                    warn!("Stream failed: {:?}", e);
                    Err(MusicError::TransportError(format!("{:?}", e)))
                }
                _ => Ok(()),
            };

            let sender = match self.done.lock() {
                Ok(mut slot) => slot.take(),
                Err(poisoned) => poisoned.into_inner().take(),
            };
            if let Some(sender) = sender {
                let _ = sender.send(outcome);
            }
        }
        None
    }
}
