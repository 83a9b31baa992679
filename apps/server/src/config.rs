//! Application configuration, read once from the environment.

use listings_alerts::{DiscordConfig, TelegramConfig};
use listings_core::DimensionKind;
use listings_feeds::{BinanceConfig, MIN_RATE};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),
    #[error("Invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Polling settings of one dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DimensionSettings {
    pub kind: DimensionKind,
    pub enabled: bool,
    /// Cycles per second
    pub rate: f64,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub binance: BinanceConfig,
    /// Set when Telegram messages are enabled.
    pub telegram: Option<TelegramConfig>,
    /// Set when Discord messages are enabled.
    pub discord: Option<DiscordConfig>,
    pub dimensions: [DimensionSettings; 3],
    /// Snapshot directory.
    pub data_dir: PathBuf,
}

impl EnvConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut binance = BinanceConfig::default();
        if let Some(endpoint) = get("BINANCE_API_ENDPOINT") {
            binance.base_url = endpoint;
        }
        binance.api_key = get("BINANCE_API_KEY").or_else(|| get("BINANCE_API_Key"));

        let telegram = if required_bool(&get, "ENABLE_TELEGRAM_MESSAGES")? {
            let bot_token = get("TELEGRAM_BOT_TOKEN").ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?;
            let raw_chat_id = get("TELEGRAM_CHAT_ID").ok_or(ConfigError::Missing("TELEGRAM_CHAT_ID"))?;
            let chat_id = raw_chat_id.parse::<i64>().map_err(|_| ConfigError::Invalid {
                key: "TELEGRAM_CHAT_ID",
                value: raw_chat_id.clone(),
                reason: "expected an integer chat id",
            })?;
            Some(TelegramConfig { bot_token, chat_id })
        } else {
            None
        };

        let discord = if required_bool(&get, "ENABLE_DISCORD_MESSAGES")? {
            let bot_token = get("DISCORD_BOT_TOKEN").ok_or(ConfigError::Missing("DISCORD_BOT_TOKEN"))?;
            let channel_ids = parse_list(&get("DISCORD_CHANNEL_IDS").unwrap_or_default());
            if channel_ids.is_empty() {
                return Err(ConfigError::Missing("DISCORD_CHANNEL_IDS"));
            }
            Some(DiscordConfig::new(bot_token, channel_ids))
        } else {
            None
        };

        let dimensions = [
            dimension(&get, DimensionKind::Symbols, "TRACK_SYMBOLS", "SYMBOLS_POLL_RATE", 1.0)?,
            dimension(&get, DimensionKind::Assets, "TRACK_ASSETS", "ASSETS_POLL_RATE", 0.2)?,
            dimension(
                &get,
                DimensionKind::Announcements,
                "TRACK_ANNOUNCEMENTS",
                "ANNOUNCEMENTS_POLL_RATE",
                1.0,
            )?,
        ];

        Ok(Self {
            binance,
            telegram,
            discord,
            dimensions,
            data_dir: get("DATA_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("data")),
        })
    }

    pub fn enabled_dimensions(&self) -> impl Iterator<Item = &DimensionSettings> {
        self.dimensions.iter().filter(|d| d.enabled)
    }
}

fn dimension(
    get: &impl Fn(&str) -> Option<String>,
    kind: DimensionKind,
    track_key: &'static str,
    rate_key: &'static str,
    default_rate: f64,
) -> Result<DimensionSettings, ConfigError> {
    let enabled = match get(track_key) {
        Some(value) => parse_bool(track_key, &value)?,
        None => true,
    };
    let rate = match get(rate_key) {
        Some(value) => parse_rate(rate_key, &value)?,
        None => default_rate,
    };
    Ok(DimensionSettings { kind, enabled, rate })
}

fn required_bool(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<bool, ConfigError> {
    let value = get(key).ok_or(ConfigError::Missing(key))?;
    parse_bool(key, &value)
}

pub fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "expected true/false, 1/0 or yes/no",
        }),
    }
}

pub fn parse_rate(key: &'static str, value: &str) -> Result<f64, ConfigError> {
    match value.parse::<f64>() {
        Ok(rate) if rate.is_finite() && rate >= MIN_RATE => Ok(rate),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "expected at least 0.000001 cycles per second",
        }),
    }
}

/// Split a comma separated list, dropping blank entries.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
