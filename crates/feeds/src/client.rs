//! Exchange-facing traits consumed by the pollers.

use crate::FeedResult;
use async_trait::async_trait;
use listings_core::{Article, Collection, Permission, SymbolInfo};

/// Market-data client for one exchange.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// List every symbol that currently has a price.
    async fn list_symbols(&self) -> FeedResult<Collection>;

    /// List the distinct base assets of symbols carrying `permission`.
    async fn list_base_assets(&self, permission: Permission) -> FeedResult<Collection>;

    /// Details of one symbol.
    ///
    /// Returns `FeedError::NotFound` while the exchange does not know the
    /// symbol yet (listing endpoints and exchange info are not updated
    /// atomically).
    async fn symbol_info(&self, symbol: &str) -> FeedResult<SymbolInfo>;
}

/// Source of exchange announcement articles.
#[async_trait]
pub trait AnnouncementFeed: Send + Sync {
    /// Most recent articles, newest first.
    async fn latest_articles(&self) -> FeedResult<Vec<Article>>;
}
