//! Telegram sink.

use crate::format::{announcement_link, trade_url};
use crate::{Notifier, NotifyError};
use async_trait::async_trait;
use listings_core::{ChangeEvent, ChangeKind, DimensionKind};
use std::fmt;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::html::escape;
use tracing::{debug, info};

#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot API token obtained from BotFather.
    pub bot_token: String,
    /// Chat (or channel) that receives the notifications.
    pub chat_id: i64,
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// Sends HTML messages to one Telegram chat.
pub struct TelegramNotifier {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            bot: Bot::new(&config.bot_token),
            chat_id: ChatId(config.chat_id),
        }
    }

    /// Check the token and that the bot can see the target chat.
    pub async fn verify(&self) -> Result<(), NotifyError> {
        let me = self.bot.get_me().await?;
        info!(username = %me.username(), "Telegram bot authenticated");

        self.bot.get_chat(self.chat_id).await?;
        info!(chat_id = self.chat_id.0, "Telegram chat reachable");
        Ok(())
    }

    /// Send a raw HTML message.
    pub async fn send_html(&self, text: &str) -> Result<(), NotifyError> {
        self.bot
            .send_message(self.chat_id, text)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn notify(&self, event: &ChangeEvent) -> Result<(), NotifyError> {
        let Some(text) = format_message(event) else {
            return Ok(());
        };
        self.send_html(&text).await?;
        debug!(identifier = %event.identifier, "Telegram message sent");
        Ok(())
    }
}

/// Render an event as a Telegram HTML message.
///
/// Returns `None` for events this sink does not announce.
pub fn format_message(event: &ChangeEvent) -> Option<String> {
    let identifier = escape(&event.identifier);

    match (event.dimension, event.kind) {
        (DimensionKind::Announcements, ChangeKind::Added) => {
            let (title, url) = announcement_link(event);
            Some(format!("📢 <a href='{}'>{}</a>\n", escape(&url), escape(title)))
        }
        (DimensionKind::Announcements, ChangeKind::Removed) => None,
        (_, ChangeKind::Added) => {
            let url = escape(&trade_url(&event.identifier));
            let mut text = format!(
                "💎 <u>Binance listed new asset (<a href='{}'>{}</a>)</u>\n",
                url, identifier
            );
            if let Some(info) = event.symbol_info() {
                text.push_str(&format!(
                    "\n- <b>Base Asset:</b> {}\n- <b>Quote Asset:</b> {}\n",
                    escape(&info.base_asset),
                    escape(&info.quote_asset)
                ));
            }
            Some(text)
        }
        (_, ChangeKind::Removed) => Some(format!(
            "🗑 <u>Binance removed asset ({})</u>\n",
            identifier
        )),
    }
}
