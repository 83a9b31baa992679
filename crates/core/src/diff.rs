//! Set-diff engine.
//!
//! Compares the previous snapshot of a dimension with a fresh collection
//! and reports which identifiers were added or removed.
//!
//! The default [`DiffMode::Cardinality`] rule only looks at the direction
//! in which the collection size moved:
//!
//! - shrank: every identifier of `old` missing from `new` is `Removed`
//! - grew: every identifier of `new` missing from `old` is `Added`
//! - same size: nothing changed
//!
//! A simultaneous add and remove of equal count is therefore invisible, and
//! when the size moves only the dominant direction is reported.

use crate::{ChangeKind, Collection};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How a dimension compares consecutive collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiffMode {
    /// Direction decided by cardinality; see the module docs.
    #[default]
    Cardinality,
    /// Only identifiers new in `new` are reported, whatever the sizes.
    ///
    /// For sliding windows (latest N articles) where dropping out of the
    /// window is not a removal.
    AdditionsOnly,
}

/// Result of comparing two collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff {
    pub kind: ChangeKind,
    /// Changed identifiers in the order they appear in the scanned collection.
    pub changed: Vec<String>,
}

impl Diff {
    fn unchanged() -> Self {
        Self {
            kind: ChangeKind::Added,
            changed: Vec::new(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.changed.len()
    }
}

/// Compare `old` and `new` with the cardinality rule.
///
/// An empty `old` is a first run and yields an empty `Added` diff; callers
/// seed the snapshot instead of diffing.
pub fn diff(old: &Collection, new: &Collection) -> Diff {
    if old.is_empty() {
        return Diff::unchanged();
    }

    if old.len() > new.len() {
        Diff {
            kind: ChangeKind::Removed,
            changed: missing_from(old, new),
        }
    } else if old.len() < new.len() {
        Diff {
            kind: ChangeKind::Added,
            changed: missing_from(new, old),
        }
    } else {
        Diff::unchanged()
    }
}

/// Compare `old` and `new` using the given mode.
pub fn diff_with(mode: DiffMode, old: &Collection, new: &Collection) -> Diff {
    match mode {
        DiffMode::Cardinality => diff(old, new),
        DiffMode::AdditionsOnly => {
            if old.is_empty() {
                return Diff::unchanged();
            }
            Diff {
                kind: ChangeKind::Added,
                changed: missing_from(new, old),
            }
        }
    }
}

/// Identifiers of `scanned` that are absent from `other`, in `scanned` order.
fn missing_from(scanned: &Collection, other: &Collection) -> Vec<String> {
    let other: HashSet<&str> = other.to_set();
    scanned
        .iter()
        .filter(|id| !other.contains(id.as_str()))
        .cloned()
        .collect()
}
