use poise::serenity_prelude as serenity;
use serenity::all::{CreateMessage, EditMessage};
use serenity::async_trait;
use serenity::model::id::{ChannelId, MessageId};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::button_controls::create_control_buttons;
use super::control_panel::PanelView;
use super::music_manager::PanelRenderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PanelTarget {
    channel_id: ChannelId,
    message_id: MessageId,
}

/// Keeps one Discord message in sync with the controller.
///
/// Renders edit the attached message; when the edit fails (message deleted,
/// permissions changed) a new panel is posted in the same channel and attached
/// in its place. Until `/panel` attaches a message, renders are dropped.
pub struct DiscordPanel {
    http: Arc<serenity::Http>,
    target: Mutex<Option<PanelTarget>>,
}

impl DiscordPanel {
    pub fn new(http: Arc<serenity::Http>) -> Self {
        Self {
            http,
            target: Mutex::new(None),
        }
    }

    pub async fn attach(&self, channel_id: ChannelId, message_id: MessageId) {
        let target = PanelTarget {
            channel_id,
            message_id,
        };
        let mut current = self.target.lock().await;
        if *current != Some(target) {
            debug!("Attaching panel message {} in channel {}", message_id, channel_id);
            *current = Some(target);
        }
    }

    async fn send_and_attach(&self, channel_id: ChannelId, view: &PanelView) {
        let message = CreateMessage::new()
            .content(&view.content)
            .components(create_control_buttons(&view.controls));

        match channel_id.send_message(self.http.clone(), message).await {
            Ok(message) => {
                info!("Posted a new panel message {}", message.id);
                self.attach(channel_id, message.id).await;
            }
            Err(e) => warn!("Failed to post panel message in channel {}: {}", channel_id, e),
        }
    }
}

#[async_trait]
impl PanelRenderer for DiscordPanel {
    async fn render(&self, view: PanelView) {
        let Some(target) = *self.target.lock().await else {
            debug!("No panel attached, dropping view: {}", view.content);
            return;
        };

        let edit = EditMessage::new()
            .content(&view.content)
            .components(create_control_buttons(&view.controls));

        match target
            .channel_id
            .edit_message(self.http.clone(), target.message_id, edit)
            .await
        {
            Ok(_) => debug!("Updated panel: {}", view.content),
            Err(e) => {
                debug!("Failed to update panel message ({}), sending a new one", e);
                self.send_and_attach(target.channel_id, &view).await;
            }
        }
    }
}
