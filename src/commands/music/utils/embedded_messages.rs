use poise::{CreateReply, serenity_prelude as serenity};
use serenity::all::CreateEmbed;

use super::button_controls::{create_control_buttons, create_search_menu, fits_search_menu};
use super::control_panel::{PanelView, PlaylistSnapshot};
use super::music_manager::{EnqueueReceipt, MusicError};
use crate::commands::music::audio_sources::SearchResult;

const SUCCESS: u32 = 0x00ff00;
const FAILURE: u32 = 0xff0000;

/// Create an ephemeral error reply
pub fn generic_error(message: &str) -> CreateReply {
    CreateReply::default()
        .embed(
            CreateEmbed::new()
                .title("❌ Error")
                .description(message)
                .color(FAILURE),
        )
        .ephemeral(true)
}

/// Error reply for a failed music operation
pub fn music_error(err: &MusicError) -> CreateReply {
    generic_error(&err.to_string())
}

/// Create an embed for when a user is not connected to a voice channel
pub fn user_not_in_voice_channel() -> CreateReply {
    generic_error("You are not connected to a voice channel")
}

/// The control panel as a reply: content plus the button row
pub fn control_panel(view: &PanelView) -> CreateReply {
    CreateReply::default()
        .content(&view.content)
        .components(create_control_buttons(&view.controls))
}

/// Reply for `/play`
pub fn added_to_playlist(reference: &str, receipt: &EnqueueReceipt) -> CreateReply {
    let embed = match &receipt.now_playing {
        Some(current) => CreateEmbed::new()
            .title("🎵 Added to Playlist")
            .description(format!(
                "Added to the playlist, waiting for: {}",
                current
            ))
            .field("Position", format!("`#{}`", receipt.position), true),
        None => CreateEmbed::new()
            .title("🎵 Loading")
            .description(format!("Loading audio: {}", reference)),
    };

    CreateReply::default().embed(embed.color(SUCCESS))
}

/// Search results with a select menu to pick one. Results that cannot be
/// offered in the menu are left out of the listing too.
pub fn search_results(keyword: &str, results: &[SearchResult]) -> CreateReply {
    let results: Vec<SearchResult> = results.iter().filter(|r| fits_search_menu(r)).cloned().collect();
    if results.is_empty() {
        return generic_error(&format!("No results found for: {}", keyword));
    }

    let description = results
        .iter()
        .enumerate()
        .map(|(index, result)| format!("{}. [{}]({})", index + 1, result.title, result.reference))
        .collect::<Vec<_>>()
        .join("\n");

    CreateReply::default()
        .embed(
            CreateEmbed::new()
                .title("🔎 Choose the audio to play")
                .description(description)
                .color(SUCCESS),
        )
        .components(create_search_menu(&results))
}

/// Create an embed for the playlist
pub fn playlist(snapshot: &PlaylistSnapshot) -> CreateReply {
    let mut description = String::new();

    match &snapshot.current {
        Some(current) => description.push_str(&format!("**🎵 Current**\n{}\n\n", current)),
        None => description.push_str("**🔇 Nothing playing**\n\n"),
    }

    if snapshot.upcoming.is_empty() {
        description.push_str("**📭 Nothing queued after it**");
    } else {
        description.push_str(&format!("**📋 Up next - {} entries**\n", snapshot.upcoming.len()));
        for (index, entry) in snapshot.upcoming.iter().enumerate() {
            description.push_str(&format!("{}. {}\n", index + 1, entry));
        }
    }

    CreateReply::default().embed(
        CreateEmbed::new()
            .title("🎵 Playlist")
            .description(description)
            .color(SUCCESS),
    )
}

/// Create an embed for when the bot joins a voice channel
pub fn connected(channel_name: &str, resuming: Option<&str>) -> CreateReply {
    let description = match resuming {
        Some(reference) => format!(
            "Connected to {}, resuming: {}",
            channel_name, reference
        ),
        None => format!("Connected to {}", channel_name),
    };

    CreateReply::default().embed(
        CreateEmbed::new()
            .title("🔊 Connected")
            .description(description)
            .color(SUCCESS),
    )
}

/// Create an embed for when the bot leaves a voice channel
pub fn disconnected() -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("👋 Disconnected")
            .description("Playback stopped and left the voice channel")
            .color(SUCCESS),
    )
}

/// Create an embed for when the playlist is cleared
pub fn playlist_cleared() -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("🗑️ Playlist Cleared")
            .description("The playlist is now empty")
            .color(SUCCESS),
    )
}
