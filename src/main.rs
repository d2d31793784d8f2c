use ::serenity::all::ClientBuilder;
use dotenv::dotenv;
use poise::serenity_prelude as serenity;
use songbird::SerenityInit;
use std::env;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use rusty_tunes::commands::general::ping::*;
use rusty_tunes::commands::music::audio_sources::YtDlp;
use rusty_tunes::commands::music::utils::{
    audio_resolver::AudioResolver,
    music_manager::{MusicError, MusicManager},
    panel_message::DiscordPanel,
    voice_transport::SongbirdTransport,
};
use rusty_tunes::commands::music::{
    clear_list::*, connect::*, disconnect::*, panel::*, pause::*, play::*, search::*,
    showlist::*, skip::*,
};
use rusty_tunes::config::Config;
use rusty_tunes::{CommandResult, Context, Data, Error, events};

#[poise::command(slash_command, category = "General")]
async fn help(
    ctx: Context<'_>,
    #[description = "Specific command to show help about"]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> CommandResult {
    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration {
            show_context_menu_commands: true,
            ..Default::default()
        },
    )
    .await
    .map_err(|e| e.into())
}

#[poise::command(prefix_command, hide_in_help)]
async fn register(ctx: Context<'_>) -> Result<(), Error> {
    poise::builtins::register_application_commands_buttons(ctx)
        .await
        .map_err(|e| e.into())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize logging with debug level for our crate
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("rusty_tunes=debug,songbird=info,warn")),
        )
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_target(true)
        .with_ansi(true)
        .pretty()
        .init();

    dotenv().ok();

    let config = Config::load().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;
    info!("Using configuration: {:?}", config);

    let token = env::var("DISCORD_TOKEN").map_err(|_| {
        error!("DISCORD_TOKEN is not set");
        "Missing DISCORD_TOKEN"
    })?;

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_VOICE_STATES;

    let commands = vec![
        // Default commands
        register(),
        help(),
        // General commands
        ping(),
        // Music commands
        play(),
        search(),
        panel(),
        showlist(),
        connect(),
        disconnect(),
        clear_list(),
        pause(),
        skip(),
    ];

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands,
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some("!".into()),
                ..Default::default()
            },
            event_handler: |ctx, event, framework, data| {
                Box::pin(events::event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                let songbird = songbird::get(ctx).await.ok_or(MusicError::NoVoiceManager)?;
                let transport = Arc::new(SongbirdTransport::new(songbird, reqwest::Client::new()));
                let extractor = Arc::new(YtDlp::new(
                    config.ytdlp_path.clone(),
                    config.audio_format.clone(),
                ));
                let resolver = AudioResolver::new(extractor, config.resolve_timeout);
                let panel = Arc::new(DiscordPanel::new(ctx.http.clone()));
                let music =
                    MusicManager::spawn(resolver, transport, panel.clone(), config.default_volume);

                Ok(Data {
                    music,
                    panel,
                    config,
                })
            })
        });

    let mut client = ClientBuilder::new(token, intents)
        .framework(framework.build())
        .register_songbird()
        .await?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, shutting down");
            shard_manager.shutdown_all().await;
        }
    });

    client.start().await.map_err(Into::into)
}
