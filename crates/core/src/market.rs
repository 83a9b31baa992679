//! Exchange-side metadata attached to change events.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trading-permission class used to scope listing queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    #[default]
    Spot,
}

impl Permission {
    /// Wire name used in exchange query parameters.
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::Spot => "SPOT",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trading pair details (e.g. SOLUSDT = SOL / USDT).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolInfo {
    /// Exchange symbol (e.g., "SOLUSDT")
    pub symbol: CompactString,
    /// Base asset (e.g., "SOL")
    pub base_asset: CompactString,
    /// Quote asset (e.g., "USDT")
    pub quote_asset: CompactString,
    /// Exchange trading status (e.g., "TRADING", "BREAK")
    pub status: CompactString,
}

impl SymbolInfo {
    pub fn new(symbol: &str, base_asset: &str, quote_asset: &str) -> Self {
        Self {
            symbol: CompactString::new(symbol),
            base_asset: CompactString::new(base_asset),
            quote_asset: CompactString::new(quote_asset),
            status: CompactString::new("TRADING"),
        }
    }
}

/// Exchange announcement article.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Article {
    /// Article code, stable across title edits
    pub code: String,
    pub title: String,
    /// Publish time in milliseconds since epoch, when the feed provides it
    pub release_date: Option<i64>,
}

impl Article {
    pub fn new(code: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            title: title.into(),
            release_date: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_info_defaults_to_trading() {
        let info = SymbolInfo::new("SOLUSDT", "SOL", "USDT");
        assert_eq!(info.base_asset, "SOL");
        assert_eq!(info.status, "TRADING");
    }

    #[test]
    fn test_permission_wire_name() {
        assert_eq!(Permission::Spot.as_str(), "SPOT");
        assert_eq!(Permission::default(), Permission::Spot);
        assert_eq!(Permission::Spot.to_string(), "SPOT");
    }
}
