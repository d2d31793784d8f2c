use serenity::all::{
    ButtonStyle, CreateActionRow, CreateButton, CreateSelectMenu, CreateSelectMenuKind,
    CreateSelectMenuOption, ReactionType,
};

use super::control_panel::ControlPanelState;
use crate::commands::music::audio_sources::SearchResult;

pub const PLAY: &str = "music_play";
pub const PAUSE: &str = "music_pause";
pub const PREVIOUS: &str = "music_previous";
pub const NEXT: &str = "music_next";
pub const VOLUME_DOWN: &str = "music_volume_down";
pub const VOLUME_UP: &str = "music_volume_up";
pub const SELECT_AUDIO: &str = "music_select_audio";

/// Discord caps select option labels and values at 100 characters.
const SELECT_FIELD_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ButtonSpec {
    custom_id: &'static str,
    label: &'static str,
    emoji: &'static str,
    primary: bool,
    disabled: bool,
}

fn control_layout(controls: &ControlPanelState) -> [ButtonSpec; 5] {
    let state_button = if controls.state_button_is_pause {
        ButtonSpec {
            custom_id: PAUSE,
            label: "Pause",
            emoji: "⏸️",
            primary: true,
            disabled: false,
        }
    } else {
        ButtonSpec {
            custom_id: PLAY,
            label: "Play",
            emoji: "▶️",
            primary: true,
            disabled: false,
        }
    };

    let secondary = |custom_id, label, emoji, enabled: bool| ButtonSpec {
        custom_id,
        label,
        emoji,
        primary: false,
        disabled: !enabled,
    };

    [
        state_button,
        secondary(PREVIOUS, "Previous", "⏮️", controls.previous_enabled),
        secondary(NEXT, "Next", "⏭️", controls.next_enabled),
        secondary(VOLUME_DOWN, "Vol -", "🔉", controls.volume_down_enabled),
        secondary(VOLUME_UP, "Vol +", "🔊", controls.volume_up_enabled),
    ]
}

/// The control panel's single row of buttons.
pub fn create_control_buttons(controls: &ControlPanelState) -> Vec<CreateActionRow> {
    let buttons = control_layout(controls)
        .into_iter()
        .map(|spec| {
            CreateButton::new(spec.custom_id)
                .emoji(ReactionType::Unicode(spec.emoji.to_string()))
                .style(if spec.primary {
                    ButtonStyle::Primary
                } else {
                    ButtonStyle::Secondary
                })
                .label(spec.label)
                .disabled(spec.disabled)
        })
        .collect();

    vec![CreateActionRow::Buttons(buttons)]
}

/// Whether `result` can be offered in the search menu. The option value is
/// the reference itself, so it must fit Discord's field limit.
pub fn fits_search_menu(result: &SearchResult) -> bool {
    result.reference.chars().count() <= SELECT_FIELD_LIMIT
}

/// A select menu listing search results; the chosen value is the result's reference.
/// Callers filter with `fits_search_menu` and never pass an empty slice.
pub fn create_search_menu(results: &[SearchResult]) -> Vec<CreateActionRow> {
    let options = results
        .iter()
        .map(|result| {
            CreateSelectMenuOption::new(
                truncate(&result.title, SELECT_FIELD_LIMIT),
                result.reference.clone(),
            )
        })
        .collect();

    let menu = CreateSelectMenu::new(SELECT_AUDIO, CreateSelectMenuKind::String { options })
        .placeholder("Choose the audio to play")
        .min_values(1)
        .max_values(1);

    vec![CreateActionRow::SelectMenu(menu)]
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(limit - 1).collect();
    truncated.push('…');
    truncated
}
