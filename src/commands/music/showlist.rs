use super::{reply_on_error, utils::embedded_messages};
use crate::{CommandResult, Context};

/// Show the current entry and everything queued after it
#[poise::command(slash_command, guild_only, category = "Music")]
pub async fn showlist(ctx: Context<'_>) -> CommandResult {
    let result = ctx.data().music.playlist().await;

    if reply_on_error(ctx, &result).await? {
        if let Ok(snapshot) = &result {
            ctx.send(embedded_messages::playlist(snapshot)).await?;
        }
    }

    Ok(())
}
