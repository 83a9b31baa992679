//! Notification sinks for listing changes.
//!
//! This crate provides:
//! - The `Dispatcher`, which fans change events out to sinks in the background
//! - Telegram bot integration (HTML messages)
//! - Discord bot integration (embeds over the REST API)

pub mod discord;
pub mod format;
pub mod notifier;
pub mod telegram;

pub use discord::{DiscordConfig, DiscordNotifier, Embed};
pub use notifier::{Dispatcher, LogNotifier, Notifier, NotifyError};
pub use telegram::{TelegramConfig, TelegramNotifier};
