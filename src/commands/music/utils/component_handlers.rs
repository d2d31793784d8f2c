use ::serenity::all::{ComponentInteraction, ComponentInteractionDataKind};
use poise::serenity_prelude::{self as serenity, Context};
use tracing::{error, info};

use super::button_controls as ids;
use super::embedded_messages;
use super::music_manager::MusicResult;
use super::playback_session::PlaybackState;
use crate::Data;
use crate::commands::music::queue_and_play;

type ButtonInteractionResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Handle a component interaction whose id starts with `music_`
pub async fn handle_interaction(
    ctx: &Context,
    interaction: &ComponentInteraction,
    data: &Data,
) -> ButtonInteractionResult {
    // Acknowledge first; the panel itself is updated by the controller's renderer
    interaction.defer(&ctx.http).await?;

    let custom_id = interaction.data.custom_id.as_str();
    if custom_id == ids::SELECT_AUDIO {
        return handle_select_audio(ctx, interaction, data).await;
    }

    // Whichever panel was clicked becomes the one kept up to date
    data.panel
        .attach(interaction.channel_id, interaction.message.id)
        .await;

    let music = &data.music;
    let step = data.config.volume_step;
    let result = match custom_id {
        ids::PLAY => handle_play(data).await,
        ids::PAUSE => music.pause().await.map(drop),
        ids::PREVIOUS => music.skip_previous().await.map(drop),
        ids::NEXT => music.skip_next().await.map(drop),
        ids::VOLUME_DOWN => music.adjust_volume(-step).await.map(drop),
        ids::VOLUME_UP => music.adjust_volume(step).await.map(drop),
        _ => {
            error!("Unknown button ID: {}", custom_id);
            return error_followup(ctx, interaction, "Unknown button action.").await;
        }
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) => error_followup(ctx, interaction, &e.to_string()).await,
    }
}

/// The state button shows "play" whenever nothing is playing: resume a
/// paused stream, otherwise start the loop from the cursor.
async fn handle_play(data: &Data) -> MusicResult<()> {
    let music = &data.music;
    if music.panel().await?.state == PlaybackState::Paused {
        music.resume().await?;
    } else {
        music.start().await?;
    }
    Ok(())
}

/// A result was picked from a `/search` menu
async fn handle_select_audio(
    ctx: &Context,
    interaction: &ComponentInteraction,
    data: &Data,
) -> ButtonInteractionResult {
    let reference = match &interaction.data.kind {
        ComponentInteractionDataKind::StringSelect { values } => values.first().cloned(),
        _ => None,
    };
    let (Some(reference), Some(guild_id)) = (reference, interaction.guild_id) else {
        return error_followup(ctx, interaction, "Nothing was selected.").await;
    };

    info!(
        "User {} selected '{}' from search results",
        interaction.user.id, reference
    );

    match queue_and_play(ctx, &data.music, guild_id, interaction.user.id, &reference).await {
        Ok(receipt) => {
            let reply = embedded_messages::added_to_playlist(&reference, &receipt);
            interaction
                .create_followup(
                    &ctx.http,
                    serenity::CreateInteractionResponseFollowup::new()
                        .embeds(reply.embeds)
                        .ephemeral(true),
                )
                .await?;
            Ok(())
        }
        Err(e) => error_followup(ctx, interaction, &e.to_string()).await,
    }
}

/// Send an ephemeral error followup message for failed interactions
async fn error_followup(
    ctx: &Context,
    interaction: &ComponentInteraction,
    content: &str,
) -> ButtonInteractionResult {
    interaction
        .create_followup(
            &ctx.http,
            serenity::CreateInteractionResponseFollowup::new()
                .content(content)
                .ephemeral(true),
        )
        .await?;
    Ok(())
}
