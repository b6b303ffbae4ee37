//! ChatPulse Telegram Bot
//!
//! Main application entry point

use std::sync::Arc;
use std::time::Duration;

use chrono::FixedOffset;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{ChatMemberUpdated, Update};
use tracing::{error, info, warn};

use ChatPulse::{
    config::Settings,
    handlers::{chat_member, commands, Command},
    services::TelegramMemberCount,
    stats::{schedule, FixedOffsetClock, ReportService, StatsAggregator},
    storage::{JsonSnapshotStore, SnapshotStore},
    utils::logging,
};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging; the guard must outlive the dispatcher
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting ChatPulse Telegram Bot...");

    // Restore persisted membership state
    let store: Arc<dyn SnapshotStore> =
        Arc::new(JsonSnapshotStore::new(&settings.storage.snapshot_path));
    let registry = store.load().await?;
    info!(chats = registry.len(), "Membership snapshot restored");

    // Fixed-timezone clock for day boundaries
    let offset = FixedOffset::east_opt(settings.tracker.utc_offset_hours * 3600)
        .ok_or_else(|| anyhow::anyhow!("invalid UTC offset"))?;
    let clock = Arc::new(FixedOffsetClock::new(offset));

    // Initialize bot and the aggregation core
    let bot = Bot::new(&settings.bot.token);
    let counts = Arc::new(TelegramMemberCount::new(
        bot.clone(),
        Duration::from_secs(settings.tracker.lookup_timeout_seconds),
    ));
    let aggregator = Arc::new(StatsAggregator::new(registry, store, clock, counts));
    let reports = Arc::new(ReportService::new(aggregator.clone()));

    // Daily snapshot sweep at the configured local time
    tokio::spawn(schedule::run_sweep_loop(
        aggregator.clone(),
        offset,
        settings.tracker.sweep_hour,
        settings.tracker.sweep_minute,
    ));

    info!("Setting up bot handlers...");

    let settings_arc = Arc::new(settings);
    let handler = create_handler();

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![aggregator, reports, settings_arc])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd);
        })
        .enable_ctrlc_handler()
        .build();

    info!("ChatPulse bot is ready, starting polling...");

    dispatcher.dispatch().await;

    info!("ChatPulse bot has been shut down.");

    Ok(())
}

/// Create the main update handler
fn create_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    use teloxide::dispatching::UpdateFilterExt;

    dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(handle_commands),
        )
        .branch(
            // Membership transitions of chat members (not the bot itself)
            Update::filter_chat_member().endpoint(handle_chat_member_update),
        )
}

/// Handle bot commands
async fn handle_commands(
    bot: Bot,
    msg: Message,
    cmd: Command,
    reports: Arc<ReportService>,
    settings: Arc<Settings>,
) -> HandlerResult {
    let result = match cmd {
        Command::Start => commands::handle_start(bot, msg).await,
        Command::Help => commands::handle_help(bot, msg).await,
        Command::Today => commands::handle_today(bot, msg, reports).await,
        Command::Stats => commands::handle_stats(bot, msg, reports, settings).await,
    };

    if let Err(e) = result {
        error!(error = %e, "Error handling command");
        return Err(e.into());
    }

    Ok(())
}

/// Handle chat member updates
async fn handle_chat_member_update(
    update: ChatMemberUpdated,
    aggregator: Arc<StatsAggregator>,
) -> HandlerResult {
    if let Err(e) = chat_member::handle_chat_member_updated(update, aggregator).await {
        error!(error = %e, "Error handling chat member update");
        return Err(e.into());
    }

    Ok(())
}
