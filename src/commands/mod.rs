//! This module aggregates all the command modules for the bot.

/// General purpose commands (e.g., ping).
pub mod general;
/// Voice-channel playback: the playlist controller and its slash commands.
pub mod music;
