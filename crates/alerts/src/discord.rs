//! Discord sink.
//!
//! Talks to the Discord REST API directly; the bot only ever posts embeds,
//! so no gateway session is opened.

use crate::format::{announcement_link, trade_url};
use crate::{Notifier, NotifyError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use listings_core::{ChangeEvent, ChangeKind, DimensionKind};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

/// Binance yellow.
pub const EMBED_COLOR: u32 = 0xF3BA2F;

pub const EMBED_IMAGE_URL: &str =
    "https://t4.ftcdn.net/jpg/04/46/35/17/360_F_446351747_WHAenLH7njEwEAuDf3aJ7Q3WFX9FM18s.jpg";

#[derive(Clone)]
pub struct DiscordConfig {
    pub bot_token: String,
    /// Channels that receive every notification.
    pub channel_ids: Vec<String>,
    pub api_base: String,
    pub timeout: Duration,
}

impl DiscordConfig {
    pub fn new(bot_token: impl Into<String>, channel_ids: Vec<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            channel_ids,
            api_base: DISCORD_API_BASE.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("bot_token", &"<redacted>")
            .field("channel_ids", &self.channel_ids)
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedImage {
    pub url: String,
}

/// Subset of the Discord embed object used by this sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Embed {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Embed {
    fn new(title: String) -> Self {
        Self {
            title,
            description: None,
            url: None,
            color: EMBED_COLOR,
            image: None,
            timestamp: None,
        }
    }

    fn with_image(mut self) -> Self {
        self.image = Some(EmbedImage {
            url: EMBED_IMAGE_URL.to_string(),
        });
        self
    }

    pub fn with_timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at.to_rfc3339());
        self
    }
}

/// Render an event as a Discord embed.
///
/// Returns `None` for events this sink does not announce.
pub fn format_embed(event: &ChangeEvent) -> Option<Embed> {
    match (event.dimension, event.kind) {
        (DimensionKind::Announcements, ChangeKind::Added) => {
            let (title, url) = announcement_link(event);
            let mut embed = Embed::new(format!("📢 {}", title)).with_image();
            embed.url = Some(url);
            Some(embed)
        }
        (DimensionKind::Announcements, ChangeKind::Removed) => None,
        (_, ChangeKind::Added) => {
            let mut embed =
                Embed::new(format!("💎 Binance listed new asset ({})", event.identifier)).with_image();
            embed.url = Some(trade_url(&event.identifier));
            embed.description = event.symbol_info().map(|info| {
                format!(
                    "• **Base Asset:** {}\n• **Quote Asset:** {}\n",
                    info.base_asset, info.quote_asset
                )
            });
            Some(embed)
        }
        (_, ChangeKind::Removed) => Some(Embed::new(format!(
            "🗑 Binance removed asset ({})",
            event.identifier
        ))),
    }
}

#[derive(Debug, Deserialize)]
struct CurrentUser {
    id: String,
    username: String,
}

/// Posts embeds to a set of Discord channels.
pub struct DiscordNotifier {
    client: reqwest::Client,
    config: DiscordConfig,
}

impl DiscordNotifier {
    pub fn new(config: DiscordConfig) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.config.bot_token)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, NotifyError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::Discord {
            status: status.as_u16(),
            body,
        })
    }

    /// Check the bot token against `GET /users/@me`.
    pub async fn verify(&self) -> Result<(), NotifyError> {
        let url = format!("{}/users/@me", self.config.api_base);
        let response = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        let user: CurrentUser = Self::check(response).await?.json().await?;

        info!(
            id = %user.id,
            username = %user.username,
            channels = self.config.channel_ids.len(),
            "Discord bot authenticated"
        );
        Ok(())
    }

    /// Post one embed to one channel.
    pub async fn send_embed(&self, channel_id: &str, embed: &Embed) -> Result<(), NotifyError> {
        let url = format!("{}/channels/{}/messages", self.config.api_base, channel_id);
        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&json!({ "embeds": [embed] }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    fn name(&self) -> &str {
        "discord"
    }

    async fn notify(&self, event: &ChangeEvent) -> Result<(), NotifyError> {
        let Some(embed) = format_embed(event) else {
            return Ok(());
        };
        let embed = embed.with_timestamp(Utc::now());

        let results = join_all(
            self.config
                .channel_ids
                .iter()
                .map(|channel| self.send_embed(channel, &embed)),
        )
        .await;

        let mut failed = 0;
        for (channel, result) in self.config.channel_ids.iter().zip(results) {
            match result {
                Ok(()) => debug!(channel = %channel, identifier = %event.identifier, "Discord embed sent"),
                Err(e) => {
                    failed += 1;
                    warn!(channel = %channel, error = %e, "Failed to send Discord embed");
                }
            }
        }

        if failed > 0 {
            return Err(NotifyError::Partial {
                failed,
                total: self.config.channel_ids.len(),
            });
        }
        Ok(())
    }
}
