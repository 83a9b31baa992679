//! Links and labels shared by the sinks.

use listings_core::{ChangeEvent, ChangeKind, DimensionKind};

pub const BINANCE_TRADE_URL: &str = "https://www.binance.com/en/trade";
pub const BINANCE_ANNOUNCEMENT_URL: &str = "https://www.binance.com/en/support/announcement";

/// Trade page of a symbol or asset.
pub fn trade_url(identifier: &str) -> String {
    format!("{}/{}", BINANCE_TRADE_URL, identifier)
}

/// URL slug for an article title: lowercase words joined by hyphens.
///
/// Characters other than ASCII letters, digits and hyphens are dropped.
pub fn slugify(title: &str) -> String {
    title
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Announcement page of an article.
pub fn article_url(code: &str, title: &str) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        format!("{}/{}", BINANCE_ANNOUNCEMENT_URL, code)
    } else {
        format!("{}/{}-{}", BINANCE_ANNOUNCEMENT_URL, slug, code)
    }
}

/// Title and URL of an announcement event; the code stands in for a
/// missing title.
pub fn announcement_link(event: &ChangeEvent) -> (&str, String) {
    match event.article() {
        Some(article) => (article.title.as_str(), article_url(&article.code, &article.title)),
        None => (event.identifier.as_str(), article_url(&event.identifier, "")),
    }
}

/// One-line plain text summary, used for logs.
pub fn summary(event: &ChangeEvent) -> String {
    match (event.dimension, event.kind) {
        (DimensionKind::Announcements, _) => {
            let (title, url) = announcement_link(event);
            format!("New announcement: {} ({})", title, url)
        }
        (_, ChangeKind::Added) => match event.symbol_info() {
            Some(info) => format!(
                "Listed {} ({}/{})",
                event.identifier, info.base_asset, info.quote_asset
            ),
            None => format!("Listed {}", event.identifier),
        },
        (_, ChangeKind::Removed) => format!("Removed {}", event.identifier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use listings_core::{Article, Enrichment, SymbolInfo};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_trade_url() {
        assert_eq!(trade_url("SOLUSDT"), "https://www.binance.com/en/trade/SOLUSDT");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(
            slugify("Binance Will List Foo (FOO)"),
            "binance-will-list-foo-foo"
        );
        assert_eq!(slugify("  Notice   of Removal "), "notice-of-removal");
        assert_eq!(slugify("Launchpool: Earn-Rewards!"), "launchpool-earn-rewards");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn test_article_url() {
        assert_eq!(
            article_url("abc123", "Binance Will List Foo"),
            "https://www.binance.com/en/support/announcement/binance-will-list-foo-abc123"
        );
        assert_eq!(
            article_url("abc123", ""),
            "https://www.binance.com/en/support/announcement/abc123"
        );
    }

    #[test]
    fn test_summary() {
        let added = ChangeEvent::new(DimensionKind::Symbols, ChangeKind::Added, "SOLUSDT")
            .with_enrichment(Some(Enrichment::Symbol(SymbolInfo::new("SOLUSDT", "SOL", "USDT"))));
        assert_eq!(summary(&added), "Listed SOLUSDT (SOL/USDT)");

        let removed = ChangeEvent::new(DimensionKind::Assets, ChangeKind::Removed, "LUNA");
        assert_eq!(summary(&removed), "Removed LUNA");

        let article = ChangeEvent::new(DimensionKind::Announcements, ChangeKind::Added, "c1")
            .with_enrichment(Some(Enrichment::Announcement(Article::new("c1", "Hello World"))));
        assert_eq!(
            summary(&article),
            "New announcement: Hello World (https://www.binance.com/en/support/announcement/hello-world-c1)"
        );
    }
}
