//! Command handlers
//!
//! Report commands exposed to chats: `/today` for the current chat and
//! `/stats` for an all-chat summary (admins only).

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::Message;
use teloxide::utils::command::BotCommands;
use tracing::info;

use crate::config::Settings;
use crate::stats::{ChatReport, ReportService};
use crate::utils::errors::{ChatPulseError, Result};

/// Bot commands
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "ChatPulse Bot Commands")]
pub enum Command {
    #[command(description = "Start the bot")]
    Start,
    #[command(description = "Show help information")]
    Help,
    #[command(description = "Membership stats for this chat")]
    Today,
    #[command(description = "Stats for all tracked chats (admin only)")]
    Stats,
}

/// Handle /start command
pub async fn handle_start(bot: Bot, msg: Message) -> Result<()> {
    let text = "👋 Hi! I'm ChatPulse.\n\n\
        Add me to a group and I'll keep track of who joins and leaves.\n\
        Use /today in a group to see today's membership stats.";

    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

/// Handle /help command
pub async fn handle_help(bot: Bot, msg: Message) -> Result<()> {
    let help_text = "🤖 ChatPulse Help\n\n\
        /start - Start the bot\n\
        /help - Show this help message\n\
        /today - Membership stats for this chat\n\
        /stats - Stats for all tracked chats (admin only)";

    bot.send_message(msg.chat.id, help_text).await?;
    Ok(())
}

/// Handle /today command
pub async fn handle_today(bot: Bot, msg: Message, reports: Arc<ReportService>) -> Result<()> {
    match reports.chat_report(msg.chat.id.0).await {
        Ok(report) => {
            bot.send_message(msg.chat.id, format_report(&report)).await?;
        }
        Err(ChatPulseError::ChatNotFound { .. }) => {
            bot.send_message(
                msg.chat.id,
                "No membership activity has been recorded for this chat yet.",
            )
            .await?;
        }
        Err(e) => return Err(e),
    }

    Ok(())
}

/// Handle /stats command (admin only)
pub async fn handle_stats(
    bot: Bot,
    msg: Message,
    reports: Arc<ReportService>,
    settings: Arc<Settings>,
) -> Result<()> {
    let user_id = msg.from.as_ref().map(|user| user.id.0 as i64).unwrap_or(0);
    if !settings.bot.admin_ids.contains(&user_id) {
        info!(user_id = user_id, "Rejected /stats from non-admin");
        bot.send_message(msg.chat.id, "This command is restricted to administrators.")
            .await?;
        return Ok(());
    }

    match reports.all_chat_reports().await {
        Ok(list) => {
            let text = list
                .iter()
                .map(format_report)
                .collect::<Vec<_>>()
                .join("\n\n");
            bot.send_message(msg.chat.id, text).await?;
        }
        Err(ChatPulseError::NoData) => {
            bot.send_message(msg.chat.id, "No chats are being tracked yet.")
                .await?;
        }
        Err(e) => return Err(e),
    }

    Ok(())
}

/// Render one chat report as a message
fn format_report(report: &ChatReport) -> String {
    let title = if report.title.is_empty() {
        format!("Chat {}", report.chat_id)
    } else {
        report.title.clone()
    };
    let midnight = report
        .midnight_count
        .map(|count| count.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    format!(
        "📊 {}\nMembers now: {}\nAt midnight: {}\nJoined today: +{}\nLeft today: -{}",
        title, report.current_count, midnight, report.joined_today, report.left_today
    )
}
