use super::{reply_on_error, utils::embedded_messages};
use crate::{CommandResult, Context};

/// Stop playback and leave the voice channel
#[poise::command(slash_command, guild_only, category = "Music")]
pub async fn disconnect(ctx: Context<'_>) -> CommandResult {
    let result = ctx.data().music.stop().await;

    if reply_on_error(ctx, &result).await? {
        ctx.send(embedded_messages::disconnected()).await?;
    }

    Ok(())
}
