use super::{reply_on_error, utils::embedded_messages};
use crate::{CommandResult, Context};
use tracing::info;

/// Search for audio and pick one to play
#[poise::command(slash_command, guild_only, category = "Music")]
pub async fn search(
    ctx: Context<'_>,
    #[description = "Search keywords"] keyword: String,
    #[description = "Number of results to show"]
    #[min = 1]
    #[max = 25]
    max_count: Option<u32>,
) -> CommandResult {
    let data = ctx.data();
    let limit = max_count.map_or(data.config.search_limit, |count| count as usize);
    info!("Searching for '{}' with limit {}", keyword, limit);

    ctx.defer().await?;
    let result = data.music.search(&keyword, limit).await;

    if reply_on_error(ctx, &result).await? {
        if let Ok(results) = &result {
            ctx.send(embedded_messages::search_results(&keyword, results))
                .await?;
        }
    }

    Ok(())
}
