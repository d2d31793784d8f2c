use super::{reply_on_error, utils::embedded_messages};
use crate::{CommandResult, Context};

/// Skip to the next entry in the playlist
#[poise::command(slash_command, guild_only, category = "Music")]
pub async fn skip(ctx: Context<'_>) -> CommandResult {
    let result = ctx.data().music.skip_next().await;

    if reply_on_error(ctx, &result).await? {
        if let Ok(view) = &result {
            ctx.send(embedded_messages::control_panel(view)).await?;
        }
    }

    Ok(())
}
