//! Per-scan runtime evidence.
//!
//! These types are created per target and discarded once the report is
//! emitted; only the catalog outlives a scan.

use serde::{Deserialize, Serialize};

use super::version::VersionNumber;

/// A successfully fetched and hashed file.
///
/// Absence of a path from a capture means the probe for it failed or was
/// rejected; that is a non-signal, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedFile {
    /// Path relative to the component root, as probed
    pub path: String,

    /// Lowercase hex digest of the response body
    pub hash: String,
}

/// Everything one component's probes produced, emitted once all of the
/// component's probes have settled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCapture {
    /// Component key (e.g. `plugins/my-plugin`)
    pub key: String,

    /// Files that fetched and hashed successfully (never empty: captures
    /// without evidence are filtered out of the stream)
    pub files: Vec<FetchedFile>,
}

/// The version decision for one component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "state", content = "version")]
pub enum VersionDecision {
    /// Evidence narrowed the candidates to exactly one version, or the
    /// numerically lowest of the surviving candidates
    Resolved(VersionNumber),
    /// No evidence matched, or the evidence disagreed
    Unknown,
}

impl VersionDecision {
    /// The resolved version, if any
    #[must_use]
    pub const fn version(&self) -> Option<&VersionNumber> {
        match self {
            Self::Resolved(v) => Some(v),
            Self::Unknown => None,
        }
    }

    /// True if a concrete version was decided
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

impl std::fmt::Display for VersionDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resolved(v) => write!(f, "{v}"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Output of fingerprinting one component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedComponent {
    /// Component key
    pub key: String,

    /// The version decision
    pub version: VersionDecision,

    /// How many fetched files contributed matching evidence
    pub evidence_count: usize,
}

impl ResolvedComponent {
    /// True if this component should appear in a report: it produced at
    /// least one piece of matching evidence.
    #[must_use]
    pub const fn has_evidence(&self) -> bool {
        self.evidence_count > 0
    }
}
