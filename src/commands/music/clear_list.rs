use super::{reply_on_error, utils::embedded_messages};
use crate::{CommandResult, Context};

/// Stop anything playing and empty the playlist
#[poise::command(slash_command, guild_only, category = "Music")]
pub async fn clear_list(ctx: Context<'_>) -> CommandResult {
    let result = ctx.data().music.clear().await;

    if reply_on_error(ctx, &result).await? {
        ctx.send(embedded_messages::playlist_cleared()).await?;
    }

    Ok(())
}
