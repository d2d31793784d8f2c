//! rusty-tunes: a Discord bot that plays a shared playlist in a voice channel.
//!
//! The playback core lives in `commands::music::utils` and knows nothing about
//! Discord beyond ids: a `MusicManager` task owns the playlist and the playback
//! state machine, and the slash commands and panel buttons talk to it through a
//! cloneable `MusicHandle`.

use std::sync::Arc;

pub mod commands;
pub mod config;
pub mod events;

use commands::music::utils::music_manager::MusicHandle;
use commands::music::utils::panel_message::DiscordPanel;
use config::Config;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
pub type CommandResult = Result<(), Error>;

/// User data, which is stored and accessible in all command invocations
pub struct Data {
    pub music: MusicHandle,
    pub panel: Arc<DiscordPanel>,
    pub config: Config,
}
