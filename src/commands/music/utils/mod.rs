// Playback core
pub mod audio_resolver;
pub mod control_panel;
pub mod music_manager;
pub mod playback_session;
pub mod playlist_queue;
pub mod voice_transport;

// Discord presentation
pub mod button_controls;
pub mod component_handlers;
pub mod embedded_messages;
pub mod panel_message;
