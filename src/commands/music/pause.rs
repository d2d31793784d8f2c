use super::{reply_on_error, utils::embedded_messages};
use crate::{CommandResult, Context};

/// Pause or resume the current track
#[poise::command(slash_command, guild_only, category = "Music")]
pub async fn pause(ctx: Context<'_>) -> CommandResult {
    let result = ctx.data().music.toggle_pause().await;

    if reply_on_error(ctx, &result).await? {
        if let Ok(view) = &result {
            ctx.send(embedded_messages::control_panel(view)).await?;
        }
    }

    Ok(())
}
