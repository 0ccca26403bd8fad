//! Ordering for dotted version strings.
//!
//! WordPress component versions are plain dotted strings (`"6.4"`,
//! `"6.4.2"`). The catalog needs a total order over them twice: the
//! resolver's lowest-version tie-break, and the refresh manager's
//! newer-release comparison.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A dotted version string with numeric segment ordering.
///
/// Segments are compared numerically left to right; a version that is a
/// strict prefix of another orders first (`"1.2" < "1.2.1"`). Segments
/// that fail to parse as numbers fall back to byte comparison so the
/// order stays total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionNumber(String);

impl VersionNumber {
    /// Wrap a raw version string
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw version string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }
}

impl Ord for VersionNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        let mut lhs = self.segments();
        let mut rhs = other.segments();

        loop {
            match (lhs.next(), rhs.next()) {
                (Some(a), Some(b)) => {
                    let ord = match (a.parse::<u64>(), b.parse::<u64>()) {
                        (Ok(a), Ok(b)) => a.cmp(&b),
                        _ => a.cmp(b),
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                (Some(_), None) => return Ordering::Greater,
                (None, Some(_)) => return Ordering::Less,
                // Shared segments all equal; keep Ord consistent with Eq.
                (None, None) => return self.0.cmp(&other.0),
            }
        }
    }
}

impl PartialOrd for VersionNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for VersionNumber {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}
