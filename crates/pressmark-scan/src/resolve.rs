//! Version resolution by hash-set intersection.
//!
//! Each fetched file whose hash matches a catalog signature contributes
//! that signature's version set as evidence; the candidate set is the
//! intersection of all evidence. Intersection is commutative, so the
//! order in which probes completed never changes the outcome.

use std::collections::BTreeSet;

use pressmark_core::{FetchedFile, FileList, ResolvedComponent, VersionDecision, VersionNumber};
use tracing::debug;

/// Reduce one component's fetched files to a version decision.
///
/// Ties (more than one surviving candidate) resolve to the numerically
/// lowest version: the earliest version still consistent with all the
/// evidence. An empty candidate set, whether from disagreeing evidence
/// or from no matches at all, resolves to `Unknown`.
#[must_use]
pub fn resolve_component(list: &FileList, files: &[FetchedFile]) -> ResolvedComponent {
    let mut candidates: Option<BTreeSet<String>> = None;
    let mut evidence_count = 0;

    for fetched in files {
        let Some(record) = list.record_for(&fetched.path) else {
            continue;
        };
        let Some(signature) = record.signature_for(&fetched.hash) else {
            // file exists but its content is unknown to the catalog
            continue;
        };

        evidence_count += 1;
        candidates = Some(match candidates {
            None => signature.versions.clone(),
            Some(current) => current
                .intersection(&signature.versions)
                .cloned()
                .collect(),
        });
    }

    let version = candidates
        .and_then(|set| set.into_iter().map(VersionNumber::new).min())
        .map_or(VersionDecision::Unknown, VersionDecision::Resolved);

    debug!(
        key = %list.key,
        evidence = evidence_count,
        version = %version,
        "resolved component"
    );

    ResolvedComponent {
        key: list.key.clone(),
        version,
        evidence_count,
    }
}
