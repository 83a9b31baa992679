//! Binance REST market-data client.
//!
//! Only public endpoints are used; the API key is sent when configured so
//! requests count against the account's limits instead of the IP's.

use crate::{ExchangeClient, FeedError, FeedResult};
use async_trait::async_trait;
use listings_core::{Collection, Permission, SymbolInfo};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

/// Binance error code for an unknown symbol.
pub const INVALID_SYMBOL_CODE: i64 = -1121;

/// Binance client settings.
#[derive(Clone)]
pub struct BinanceConfig {
    /// REST base URL (e.g. "https://api4.binance.com")
    pub base_url: String,
    /// Optional API key sent as `X-MBX-APIKEY`
    pub api_key: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for BinanceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinanceConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api4.binance.com".to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TickerPrice {
    symbol: String,
}

#[derive(Debug, Deserialize)]
struct ExchangeInfo {
    symbols: Vec<ExchangeSymbol>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExchangeSymbol {
    symbol: String,
    status: String,
    base_asset: String,
    quote_asset: String,
}

impl From<ExchangeSymbol> for SymbolInfo {
    fn from(s: ExchangeSymbol) -> Self {
        SymbolInfo {
            symbol: s.symbol.into(),
            base_asset: s.base_asset.into(),
            quote_asset: s.quote_asset.into(),
            status: s.status.into(),
        }
    }
}

/// Error body returned by Binance on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: i64,
    msg: String,
}

/// Binance REST client.
pub struct BinanceClient {
    client: reqwest::Client,
    config: BinanceConfig,
}

impl BinanceClient {
    pub fn new(config: BinanceConfig) -> FeedResult<Self> {
        url::Url::parse(&config.base_url)?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FeedError::InvalidConfig(e.to_string()))?;

        Ok(Self { client, config })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> FeedResult<T> {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);

        let mut request = self.client.get(&url).query(query);
        if let Some(key) = &self.config.api_key {
            request = request.header("X-MBX-APIKEY", key);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &body));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Map a non-success response to a `FeedError`.
fn classify_error(status: StatusCode, body: &str) -> FeedError {
    // 418 is Binance's "IP banned after ignoring 429s"
    if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() == 418 {
        return FeedError::RateLimitExceeded;
    }

    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(err) => FeedError::Api {
            code: err.code,
            message: err.msg,
        },
        Err(_) => FeedError::Http(status.as_u16()),
    }
}

/// Distinct base assets of trading symbols, in first-seen order.
fn distinct_base_assets(symbols: Vec<ExchangeSymbol>) -> Collection {
    let mut seen = HashSet::new();
    symbols
        .into_iter()
        .filter(|s| s.status == "TRADING")
        .filter_map(|s| seen.insert(s.base_asset.clone()).then_some(s.base_asset))
        .collect()
}

#[async_trait]
impl ExchangeClient for BinanceClient {
    async fn list_symbols(&self) -> FeedResult<Collection> {
        let prices: Vec<TickerPrice> = self.get_json("/api/v3/ticker/price", &[]).await?;
        debug!("Binance: fetched {} symbol prices", prices.len());
        Ok(prices.into_iter().map(|p| p.symbol).collect())
    }

    async fn list_base_assets(&self, permission: Permission) -> FeedResult<Collection> {
        let info: ExchangeInfo = self
            .get_json("/api/v3/exchangeInfo", &[("permissions", permission.as_str())])
            .await?;
        let assets = distinct_base_assets(info.symbols);
        debug!("Binance: fetched {} {} base assets", assets.len(), permission);
        Ok(assets)
    }

    async fn symbol_info(&self, symbol: &str) -> FeedResult<SymbolInfo> {
        let info: ExchangeInfo = match self
            .get_json("/api/v3/exchangeInfo", &[("symbol", symbol)])
            .await
        {
            Ok(info) => info,
            Err(FeedError::Api { code, .. }) if code == INVALID_SYMBOL_CODE => {
                return Err(FeedError::NotFound(symbol.to_string()));
            }
            Err(e) => return Err(e),
        };

        info.symbols
            .into_iter()
            .next()
            .map(SymbolInfo::from)
            .ok_or_else(|| FeedError::NotFound(symbol.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const EXCHANGE_INFO: &str = r#"{
        "timezone": "UTC",
        "serverTime": 1700000000000,
        "symbols": [
            {"symbol": "ETHBTC", "status": "TRADING", "baseAsset": "ETH", "quoteAsset": "BTC", "permissions": ["SPOT"]},
            {"symbol": "ETHUSDT", "status": "TRADING", "baseAsset": "ETH", "quoteAsset": "USDT", "permissions": ["SPOT"]},
            {"symbol": "BTCUSDT", "status": "TRADING", "baseAsset": "BTC", "quoteAsset": "USDT", "permissions": ["SPOT"]},
            {"symbol": "LUNAUSDT", "status": "BREAK", "baseAsset": "LUNA", "quoteAsset": "USDT", "permissions": ["SPOT"]}
        ]
    }"#;

    #[test]
    fn test_distinct_base_assets() {
        let info: ExchangeInfo = serde_json::from_str(EXCHANGE_INFO).unwrap();
        let assets = distinct_base_assets(info.symbols);
        assert_eq!(assets, Collection::from(["ETH", "BTC"]));
    }

    #[test]
    fn test_exchange_symbol_into_symbol_info() {
        let info: ExchangeInfo = serde_json::from_str(EXCHANGE_INFO).unwrap();
        let symbol: SymbolInfo = info.symbols.into_iter().nth(1).unwrap().into();
        assert_eq!(symbol, SymbolInfo::new("ETHUSDT", "ETH", "USDT"));
    }

    #[test]
    fn test_ticker_price_parse() {
        let prices: Vec<TickerPrice> =
            serde_json::from_str(r#"[{"symbol":"BTCUSDT","price":"43000.01"},{"symbol":"ETHUSDT","price":"2300.5"}]"#)
                .unwrap();
        let symbols: Collection = prices.into_iter().map(|p| p.symbol).collect();
        assert_eq!(symbols, Collection::from(["BTCUSDT", "ETHUSDT"]));
    }

    #[test]
    fn test_classify_invalid_symbol() {
        let err = classify_error(
            StatusCode::BAD_REQUEST,
            r#"{"code":-1121,"msg":"Invalid symbol."}"#,
        );
        match err {
            FeedError::Api { code, message } => {
                assert_eq!(code, INVALID_SYMBOL_CODE);
                assert_eq!(message, "Invalid symbol.");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_rate_limit() {
        assert!(matches!(
            classify_error(StatusCode::TOO_MANY_REQUESTS, ""),
            FeedError::RateLimitExceeded
        ));
        assert!(matches!(
            classify_error(StatusCode::from_u16(418).unwrap(), ""),
            FeedError::RateLimitExceeded
        ));
    }

    #[test]
    fn test_classify_unparseable_body() {
        assert!(matches!(
            classify_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>"),
            FeedError::Http(502)
        ));
    }

    #[test]
    fn test_new_rejects_invalid_base_url() {
        let config = BinanceConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            BinanceClient::new(config),
            Err(FeedError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_config_debug_redacts_key() {
        let config = BinanceConfig {
            api_key: Some("secret-key".to_string()),
            ..Default::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("<redacted>"));
    }
}
