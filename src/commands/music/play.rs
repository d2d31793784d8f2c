use super::{queue_and_play, reply_on_error, utils::embedded_messages};
use crate::commands::music::utils::music_manager::MusicError;
use crate::{CommandResult, Context};
use tracing::info;

/// Add a song to the playlist and start playing
#[poise::command(slash_command, guild_only, category = "Music")]
pub async fn play(
    ctx: Context<'_>,
    #[description = "URL or search query"] url: String,
) -> CommandResult {
    info!("Received play command with reference: {}", url);
    let guild_id = ctx.guild_id().ok_or(MusicError::NotInGuild)?;

    // Resolution happens after the reply, but joining the channel can take a moment
    ctx.defer().await?;

    let result = queue_and_play(
        ctx.serenity_context(),
        &ctx.data().music,
        guild_id,
        ctx.author().id,
        &url,
    )
    .await;

    if reply_on_error(ctx, &result).await? {
        if let Ok(receipt) = &result {
            ctx.send(embedded_messages::added_to_playlist(&url, receipt))
                .await?;
        }
    }

    Ok(())
}
