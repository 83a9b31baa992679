//! Change events produced by the pollers and consumed by the dispatcher.

use crate::{Article, SymbolInfo};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a single identifier's transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
}

impl ChangeKind {
    #[inline]
    pub fn is_removal(self) -> bool {
        matches!(self, ChangeKind::Removed)
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Added => f.write_str("added"),
            ChangeKind::Removed => f.write_str("removed"),
        }
    }
}

/// Independently polled category of identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionKind {
    /// Trading pairs (e.g. "SOLUSDT")
    Symbols,
    /// Base assets (e.g. "SOL")
    Assets,
    /// Announcement article codes
    Announcements,
}

impl DimensionKind {
    pub const ALL: [DimensionKind; 3] = [
        DimensionKind::Symbols,
        DimensionKind::Assets,
        DimensionKind::Announcements,
    ];

    /// Snapshot key for this dimension.
    pub fn key(self) -> &'static str {
        match self {
            DimensionKind::Symbols => "symbols",
            DimensionKind::Assets => "assets",
            DimensionKind::Announcements => "announcements",
        }
    }
}

impl fmt::Display for DimensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Optional metadata fetched for an added identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Enrichment {
    Symbol(SymbolInfo),
    Announcement(Article),
}

/// One detected identifier transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub dimension: DimensionKind,
    pub kind: ChangeKind,
    pub identifier: String,
    pub enrichment: Option<Enrichment>,
}

impl ChangeEvent {
    pub fn new(dimension: DimensionKind, kind: ChangeKind, identifier: impl Into<String>) -> Self {
        Self {
            dimension,
            kind,
            identifier: identifier.into(),
            enrichment: None,
        }
    }

    pub fn with_enrichment(mut self, enrichment: Option<Enrichment>) -> Self {
        self.enrichment = enrichment;
        self
    }

    pub fn symbol_info(&self) -> Option<&SymbolInfo> {
        match &self.enrichment {
            Some(Enrichment::Symbol(info)) => Some(info),
            _ => None,
        }
    }

    pub fn article(&self) -> Option<&Article> {
        match &self.enrichment {
            Some(Enrichment::Announcement(article)) => Some(article),
            _ => None,
        }
    }
}

/// Receiver of change events.
///
/// Implementations must return immediately and never fail the caller;
/// delivery happens in the background.
pub trait Dispatch: Send + Sync {
    fn dispatch(&self, event: ChangeEvent);
}
