pub mod clear_list;
pub mod connect;
pub mod disconnect;
pub mod panel;
pub mod pause;
pub mod play;
pub mod search;
pub mod showlist;
pub mod skip;

pub mod audio_sources;
pub mod utils;

use poise::serenity_prelude as serenity;
use serenity::model::id::{ChannelId, GuildId, UserId};

use crate::Context;
use utils::embedded_messages;
use utils::music_manager::{EnqueueReceipt, MusicError, MusicHandle, MusicResult};

/// Find the voice channel `user_id` is sitting in, from the gateway cache.
pub fn user_voice_channel(
    ctx: &serenity::Context,
    guild_id: GuildId,
    user_id: UserId,
) -> MusicResult<ChannelId> {
    let guild = ctx.cache.guild(guild_id).ok_or(MusicError::NotInGuild)?;

    guild
        .voice_states
        .get(&user_id)
        .and_then(|voice_state| voice_state.channel_id)
        .ok_or(MusicError::UserNotInVoiceChannel)
}

/// Display name of a guild channel, falling back to its mention.
pub fn channel_name(ctx: &serenity::Context, guild_id: GuildId, channel_id: ChannelId) -> String {
    ctx.cache
        .guild(guild_id)
        .and_then(|guild| guild.channels.get(&channel_id).map(|c| c.name.clone()))
        .unwrap_or_else(|| format!("<#{}>", channel_id))
}

/// Join the user's voice channel, append `reference` and make sure playback is running.
pub async fn queue_and_play(
    ctx: &serenity::Context,
    music: &MusicHandle,
    guild_id: GuildId,
    user_id: UserId,
    reference: &str,
) -> MusicResult<EnqueueReceipt> {
    let channel_id = user_voice_channel(ctx, guild_id, user_id)?;
    music.connect(guild_id, channel_id).await?;
    let receipt = music.enqueue(reference).await?;
    music.start().await?;
    Ok(receipt)
}

/// Reply with the error if `result` failed. Returns whether it succeeded.
async fn reply_on_error<T>(ctx: Context<'_>, result: &MusicResult<T>) -> Result<bool, crate::Error> {
    match result {
        Ok(_) => Ok(true),
        Err(MusicError::UserNotInVoiceChannel) => {
            ctx.send(embedded_messages::user_not_in_voice_channel()).await?;
            Ok(false)
        }
        Err(e) => {
            ctx.send(embedded_messages::music_error(e)).await?;
            Ok(false)
        }
    }
}
