use poise::serenity_prelude as serenity;
use serenity::{FullEvent, Interaction};
use tracing::{error, info};

use crate::commands::music::utils::component_handlers;
use crate::{Data, Error};

/// Framework-wide event hook: logs readiness and routes music components.
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        FullEvent::Ready { data_about_bot } => {
            info!("Logged in as {}", data_about_bot.user.name);
        }
        FullEvent::InteractionCreate {
            interaction: Interaction::Component(component),
        } if component.data.custom_id.starts_with("music_") => {
            if let Err(e) = component_handlers::handle_interaction(ctx, component, data).await {
                error!("Error handling component interaction: {}", e);
            }
        }
        _ => (),
    }
    Ok(())
}
