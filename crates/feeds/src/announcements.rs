//! Binance announcements feed.
//!
//! Uses the unofficial CMS endpoint behind binance.com's announcement pages.
//! Catalog 48 is "New Cryptocurrency Listing".

use crate::{AnnouncementFeed, FeedError, FeedResult};
use async_trait::async_trait;
use listings_core::Article;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const DEFAULT_ANNOUNCEMENTS_URL: &str =
    "https://www.binance.com/bapi/composite/v1/public/cms/article/catalog/list/query";

/// Number of articles requested and kept per poll.
pub const ARTICLE_WINDOW: usize = 10;

#[derive(Debug, Clone)]
pub struct AnnouncementsConfig {
    pub endpoint: String,
    pub catalog_id: u32,
    pub timeout: Duration,
}

impl Default for AnnouncementsConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ANNOUNCEMENTS_URL.to_string(),
            catalog_id: 48,
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnnouncementsResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    data: Option<AnnouncementsData>,
}

#[derive(Debug, Deserialize)]
struct AnnouncementsData {
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    code: String,
    title: String,
    #[serde(default)]
    release_date: Option<i64>,
}

impl From<RawArticle> for Article {
    fn from(raw: RawArticle) -> Self {
        Article {
            code: raw.code,
            title: raw.title,
            release_date: raw.release_date,
        }
    }
}

/// Client for the Binance announcements endpoint.
pub struct BinanceAnnouncements {
    client: reqwest::Client,
    url: Url,
}

impl BinanceAnnouncements {
    pub fn new(config: AnnouncementsConfig) -> FeedResult<Self> {
        let url = build_url(&config)?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FeedError::InvalidConfig(e.to_string()))?;

        Ok(Self { client, url })
    }
}

fn build_url(config: &AnnouncementsConfig) -> FeedResult<Url> {
    let page_size = ARTICLE_WINDOW.to_string();
    let catalog_id = config.catalog_id.to_string();
    Ok(Url::parse_with_params(
        &config.endpoint,
        &[
            ("catalogId", catalog_id.as_str()),
            ("pageNo", "1"),
            ("pageSize", page_size.as_str()),
        ],
    )?)
}

fn parse_articles(body: &str) -> FeedResult<Vec<Article>> {
    let response: AnnouncementsResponse = serde_json::from_str(body)?;

    let Some(data) = response.data else {
        return Err(FeedError::ParseError(format!(
            "announcements response without data (success={}, message={:?})",
            response.success, response.message
        )));
    };

    Ok(data
        .articles
        .into_iter()
        .take(ARTICLE_WINDOW)
        .map(Article::from)
        .collect())
}

#[async_trait]
impl AnnouncementFeed for BinanceAnnouncements {
    async fn latest_articles(&self) -> FeedResult<Vec<Article>> {
        let response = self
            .client
            .get(self.url.clone())
            .header("Content-Type", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(FeedError::RateLimitExceeded);
        }
        if !status.is_success() {
            return Err(FeedError::Http(status.as_u16()));
        }

        let body = response.text().await?;
        let articles = parse_articles(&body)?;
        debug!("Binance: fetched {} announcements", articles.len());
        Ok(articles)
    }
}
