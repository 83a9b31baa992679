//! Collections of identifiers observed for one tracked dimension.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Ordered list of identifiers (symbols, base assets or announcement codes).
///
/// Order is kept as the exchange returned it but is irrelevant for
/// comparison. Uniqueness is assumed, not enforced: duplicates would
/// skew the cardinality-based diff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection(Vec<String>);

impl Collection {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.0.iter().any(|s| s == identifier)
    }

    /// Membership view used for set comparisons.
    pub fn to_set(&self) -> HashSet<&str> {
        self.0.iter().map(String::as_str).collect()
    }

    /// True if both collections hold the same identifiers, ignoring order.
    pub fn same_members(&self, other: &Collection) -> bool {
        self.len() == other.len() && self.to_set() == other.to_set()
    }
}

impl From<Vec<String>> for Collection {
    fn from(ids: Vec<String>) -> Self {
        Self(ids)
    }
}

impl From<&[&str]> for Collection {
    fn from(ids: &[&str]) -> Self {
        Self(ids.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Collection {
    fn from(ids: [&str; N]) -> Self {
        Self(ids.iter().map(|s| s.to_string()).collect())
    }
}

impl FromIterator<String> for Collection {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Collection {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_collection_serializes_as_plain_array() {
        let collection = Collection::from(["BTCUSDT", "ETHUSDT"]);
        let json = serde_json::to_string(&collection).unwrap();
        assert_eq!(json, r#"["BTCUSDT","ETHUSDT"]"#);

        let parsed: Collection = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, collection);
    }

    #[test]
    fn test_same_members_ignores_order() {
        let a = Collection::from(["BTCUSDT", "ETHUSDT", "SOLUSDT"]);
        let b = Collection::from(["SOLUSDT", "BTCUSDT", "ETHUSDT"]);
        let c = Collection::from(["SOLUSDT", "BTCUSDT"]);

        assert!(a.same_members(&b));
        assert!(!a.same_members(&c));
        assert_ne!(a, b);
    }

    #[test]
    fn test_contains() {
        let collection = Collection::from(["BTC", "ETH"]);
        assert!(collection.contains("BTC"));
        assert!(!collection.contains("SOL"));
    }
}
