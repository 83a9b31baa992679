//! Tracked dimensions.
//!
//! A dimension bundles everything a poller needs to watch one category of
//! identifiers: where to fetch the collection, how to enrich an added
//! identifier and how to compare consecutive collections. The poller itself
//! is generic over dimensions.

use async_trait::async_trait;
use listings_core::{Article, Collection, DiffMode, DimensionKind, Enrichment, Permission};
use listings_feeds::{AnnouncementFeed, ExchangeClient, FeedResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[async_trait]
pub trait Dimension: Send + Sync {
    fn kind(&self) -> DimensionKind;

    /// Snapshot key in the store.
    fn key(&self) -> &'static str {
        self.kind().key()
    }

    fn diff_mode(&self) -> DiffMode {
        DiffMode::Cardinality
    }

    /// Current collection as reported by the exchange.
    async fn fetch(&self) -> FeedResult<Collection>;

    /// Metadata for an added identifier.
    ///
    /// `Ok(None)` means the dimension has no metadata to offer; a
    /// `FeedError::NotFound` means it may appear later and is worth a retry.
    async fn enrich(&self, identifier: &str) -> FeedResult<Option<Enrichment>>;
}

/// Trading pairs with a live price.
pub struct SymbolsDimension {
    client: Arc<dyn ExchangeClient>,
}

impl SymbolsDimension {
    pub fn new(client: Arc<dyn ExchangeClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Dimension for SymbolsDimension {
    fn kind(&self) -> DimensionKind {
        DimensionKind::Symbols
    }

    async fn fetch(&self) -> FeedResult<Collection> {
        self.client.list_symbols().await
    }

    async fn enrich(&self, identifier: &str) -> FeedResult<Option<Enrichment>> {
        let info = self.client.symbol_info(identifier).await?;
        Ok(Some(Enrichment::Symbol(info)))
    }
}

/// Base assets tradable under one permission class.
pub struct AssetsDimension {
    client: Arc<dyn ExchangeClient>,
    permission: Permission,
}

impl AssetsDimension {
    pub fn new(client: Arc<dyn ExchangeClient>, permission: Permission) -> Self {
        Self { client, permission }
    }
}

#[async_trait]
impl Dimension for AssetsDimension {
    fn kind(&self) -> DimensionKind {
        DimensionKind::Assets
    }

    async fn fetch(&self) -> FeedResult<Collection> {
        self.client.list_base_assets(self.permission).await
    }

    async fn enrich(&self, _identifier: &str) -> FeedResult<Option<Enrichment>> {
        Ok(None)
    }
}

/// Announcement article codes.
///
/// The feed is a window of the latest articles, so additions-only diffing
/// applies. Titles from the latest fetch serve as enrichment.
pub struct AnnouncementsDimension {
    feed: Arc<dyn AnnouncementFeed>,
    latest: Mutex<HashMap<String, Article>>,
}

impl AnnouncementsDimension {
    pub fn new(feed: Arc<dyn AnnouncementFeed>) -> Self {
        Self {
            feed,
            latest: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl Dimension for AnnouncementsDimension {
    fn kind(&self) -> DimensionKind {
        DimensionKind::Announcements
    }

    fn diff_mode(&self) -> DiffMode {
        DiffMode::AdditionsOnly
    }

    async fn fetch(&self) -> FeedResult<Collection> {
        let articles = self.feed.latest_articles().await?;
        let codes: Collection = articles.iter().map(|a| a.code.clone()).collect();

        if let Ok(mut latest) = self.latest.lock() {
            *latest = articles.into_iter().map(|a| (a.code.clone(), a)).collect();
        }

        Ok(codes)
    }

    async fn enrich(&self, identifier: &str) -> FeedResult<Option<Enrichment>> {
        let article = self
            .latest
            .lock()
            .ok()
            .and_then(|latest| latest.get(identifier).cloned());
        Ok(article.map(Enrichment::Announcement))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{MockAnnouncementFeed, MockExchangeClient};
    use listings_core::SymbolInfo;
    use listings_feeds::FeedError;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_symbols_dimension() {
        let client = Arc::new(MockExchangeClient::new());
        client.push_symbols(Ok(Collection::from(["BTCUSDT", "SOLUSDT"])));
        client.add_symbol_info(SymbolInfo::new("SOLUSDT", "SOL", "USDT"));

        let dimension = SymbolsDimension::new(client.clone());
        assert_eq!(dimension.key(), "symbols");
        assert_eq!(dimension.diff_mode(), DiffMode::Cardinality);
        assert_eq!(
            dimension.fetch().await.unwrap(),
            Collection::from(["BTCUSDT", "SOLUSDT"])
        );

        let enrichment = dimension.enrich("SOLUSDT").await.unwrap();
        assert_eq!(
            enrichment,
            Some(Enrichment::Symbol(SymbolInfo::new("SOLUSDT", "SOL", "USDT")))
        );
        assert!(matches!(
            dimension.enrich("NEWUSDT").await,
            Err(FeedError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_assets_dimension_uses_permission() {
        let client = Arc::new(MockExchangeClient::new());
        client.push_assets(Ok(Collection::from(["BTC", "ETH"])));

        let dimension = AssetsDimension::new(client.clone(), Permission::Spot);
        assert_eq!(dimension.key(), "assets");
        assert_eq!(dimension.fetch().await.unwrap(), Collection::from(["BTC", "ETH"]));
        assert_eq!(client.asset_permissions(), vec![Permission::Spot]);
        assert_eq!(dimension.enrich("ETH").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_announcements_dimension_caches_titles() {
        let feed = Arc::new(MockAnnouncementFeed::new());
        feed.push(Ok(vec![
            Article::new("c3", "Binance Will List Foo (FOO)"),
            Article::new("c2", "Binance Will List Bar (BAR)"),
        ]));

        let dimension = AnnouncementsDimension::new(feed);
        assert_eq!(dimension.diff_mode(), DiffMode::AdditionsOnly);
        assert_eq!(dimension.fetch().await.unwrap(), Collection::from(["c3", "c2"]));

        let enrichment = dimension.enrich("c3").await.unwrap();
        assert_eq!(
            enrichment,
            Some(Enrichment::Announcement(Article::new(
                "c3",
                "Binance Will List Foo (FOO)"
            )))
        );
        assert_eq!(dimension.enrich("unknown").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_announcements_failed_fetch_keeps_cache() {
        let feed = Arc::new(MockAnnouncementFeed::new());
        feed.push(Ok(vec![Article::new("c1", "First")]));
        feed.push(Err(FeedError::Http(503)));

        let dimension = AnnouncementsDimension::new(feed);
        dimension.fetch().await.unwrap();
        assert!(dimension.fetch().await.is_err());
        assert!(dimension.enrich("c1").await.unwrap().is_some());
    }
}
