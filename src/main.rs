mod config;
mod diff;
mod dispatch;
mod event;
mod format;
mod platform;
mod scheduler;
mod store;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::Bot;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::dispatch::EventDispatcher;
use crate::platform::telegram::TelegramNotifier;
use crate::scheduler::Scheduler;
use crate::store::ShadowStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,shadowbot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Optional TOML file; environment variables override it
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    if let Some(path) = &config_path {
        info!("Loading configuration from: {}", path.display());
    }
    let config = Config::load(config_path.as_deref()).context("Failed to load configuration")?;

    info!("Configuration loaded successfully");
    info!("  Operator: {}", config.operator_id);
    info!("  Message TTL: {}h", config.ttl.num_hours());
    info!("  Sweep schedule: {}", config.sweep_cron);

    let store = ShadowStore::new(config.ttl);

    let scheduler = Scheduler::new().await?;
    scheduler::tasks::register_sweep(&scheduler, store.clone(), &config.sweep_cron).await?;
    scheduler.start().await?;

    let bot = Bot::new(&config.bot_token);
    let notifier = Arc::new(TelegramNotifier::new(bot.clone()));
    let dispatcher = Arc::new(EventDispatcher::new(store, notifier, config.operator_id));

    info!("Bot is starting...");
    platform::telegram::run(bot, dispatcher).await?;

    scheduler.shutdown().await?;
    Ok(())
}
