use poise::{CreateReply, serenity_prelude as serenity};
use ::serenity::all::CreateEmbed;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::{CommandResult, Context};

/// Ping the bot and measure how long message edits take
#[poise::command(slash_command, category = "General")]
pub async fn ping(
    ctx: Context<'_>,
    #[description = "Number of round trips to average"]
    #[min = 1]
    #[max = 20]
    count: Option<u32>,
) -> CommandResult {
    let count = count.unwrap_or(5).max(1);

    let started = Instant::now();
    let reply = ctx.say("Measuring latency...").await?;
    let mut samples = vec![started.elapsed()];

    for round in 1..count {
        let started = Instant::now();
        reply
            .edit(
                ctx,
                CreateReply::default().content(format!("Measuring latency... {}", round)),
            )
            .await?;
        samples.push(started.elapsed());
    }

    let average = average_millis(&samples);
    debug!("Average round trip over {} samples: {:.2} ms", samples.len(), average);

    let shard_latency = get_shard_latency(&ctx).await.unwrap_or_default().as_millis();
    let embed = CreateEmbed::new()
        .title("Pong!")
        .field("Round Trip", format!("{:.2} ms", average), true)
        .field("API Latency", format!("{} ms", shard_latency), true);

    reply
        .edit(ctx, CreateReply::default().content("").embed(embed))
        .await?;

    Ok(())
}

fn average_millis(samples: &[Duration]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let total: Duration = samples.iter().sum();
    total.as_secs_f64() * 1000.0 / samples.len() as f64
}

async fn get_shard_latency(ctx: &Context<'_>) -> Option<Duration> {
    let manager = ctx.framework().shard_manager().clone();
    let runners = manager.runners.lock().await;

    // Latency is tracked per shard runner
    let runner = runners.get(&serenity::ShardId(ctx.serenity_context().shard_id.0))?;

    runner.latency
}
