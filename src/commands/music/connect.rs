use super::{channel_name, reply_on_error, user_voice_channel, utils::embedded_messages};
use crate::commands::music::utils::music_manager::{MusicError, MusicResult};
use crate::{CommandResult, Context};
use poise::serenity_prelude::{ChannelId, GuildId};
use tracing::info;

/// Join your voice channel and resume the playlist if anything is left
#[poise::command(slash_command, guild_only, category = "Music")]
pub async fn connect(ctx: Context<'_>) -> CommandResult {
    let guild_id = ctx.guild_id().ok_or(MusicError::NotInGuild)?;
    ctx.defer().await?;

    let result = connect_and_resume(ctx, guild_id).await;
    if reply_on_error(ctx, &result).await? {
        if let Ok((channel_id, resuming)) = &result {
            let name = channel_name(ctx.serenity_context(), guild_id, *channel_id);
            ctx.send(embedded_messages::connected(&name, resuming.as_deref()))
                .await?;
        }
    }

    Ok(())
}

async fn connect_and_resume(
    ctx: Context<'_>,
    guild_id: GuildId,
) -> MusicResult<(ChannelId, Option<String>)> {
    let music = &ctx.data().music;
    let channel_id = user_voice_channel(ctx.serenity_context(), guild_id, ctx.author().id)?;
    music.connect(guild_id, channel_id).await?;

    let resuming = music.playlist().await?.current;
    if resuming.is_some() && !music.is_active().await? {
        info!("Resuming playlist after connect");
        music.start().await?;
    }
    Ok((channel_id, resuming))
}
