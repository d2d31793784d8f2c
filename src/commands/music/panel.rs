use super::{reply_on_error, utils::embedded_messages};
use crate::{CommandResult, Context};

/// Show the playback control panel
#[poise::command(slash_command, guild_only, category = "Music")]
pub async fn panel(ctx: Context<'_>) -> CommandResult {
    let data = ctx.data();
    let result = data.music.panel().await;

    if reply_on_error(ctx, &result).await? {
        if let Ok(view) = &result {
            let handle = ctx.send(embedded_messages::control_panel(view)).await?;
            let message = handle.message().await?;
            data.panel.attach(message.channel_id, message.id).await;
        }
    }

    Ok(())
}
