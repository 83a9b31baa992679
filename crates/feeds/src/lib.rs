//! Exchange market-data collection.
//!
//! This crate provides REST clients for the exchange's listing endpoints
//! and its announcements feed, plus the rate limiter that keeps polling
//! under the exchange's request limits.
//!
//! ## Architecture
//!
//! - `client` - `ExchangeClient` and `AnnouncementFeed` traits consumed by the pollers
//! - `binance` / `announcements` - Binance implementations
//! - `rate_limit` - token bucket gating each poll cycle

pub mod announcements;
pub mod binance;
pub mod client;
pub mod error;
pub mod rate_limit;

pub use announcements::{AnnouncementsConfig, BinanceAnnouncements, ARTICLE_WINDOW};
pub use binance::{BinanceClient, BinanceConfig, INVALID_SYMBOL_CODE};
pub use client::*;
pub use error::*;
pub use rate_limit::*;
