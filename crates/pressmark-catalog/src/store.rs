//! On-disk catalog layout.
//!
//! Catalog versions live in sibling directories named by release tag:
//!
//! ```text
//! <root>/
//!   signatures.json.gz      # last downloaded archive
//!   state.json              # refresh bookkeeping
//!   2.0.0/
//!     core.json
//!     plugins.json
//!     plugins-popular.json
//!     themes.json
//!   2.1.0/
//!     ...
//! ```
//!
//! Exactly one directory is "current": the maximum under the dotted
//! version order.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use pressmark_core::{FileListGroup, VersionNumber};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CatalogError, CatalogFieldError, CatalogResult};
use crate::schema::parse_document;

/// File name of the downloaded release archive
pub const ARCHIVE_NAME: &str = "signatures.json.gz";

/// File name of the refresh bookkeeping record
const STATE_NAME: &str = "state.json";

/// Which groups to load, and which catalog variants to pull in
#[derive(Debug, Clone)]
pub struct GroupRequest {
    /// Group key (`core`, `plugins`, `themes`)
    pub key: String,

    /// Also merge the `<key>-popular.json` variant
    pub include_popular: bool,

    /// Also merge the `<key>-vulnerable.json` variant
    pub include_vulnerable: bool,
}

impl GroupRequest {
    /// Request a group with no variants
    #[must_use]
    pub fn base(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            include_popular: false,
            include_vulnerable: false,
        }
    }

    /// Enable the popular variant
    #[must_use]
    pub const fn with_popular(mut self, include: bool) -> Self {
        self.include_popular = include;
        self
    }

    /// Enable the vulnerable variant
    #[must_use]
    pub const fn with_vulnerable(mut self, include: bool) -> Self {
        self.include_vulnerable = include;
        self
    }
}

/// Refresh bookkeeping persisted next to the version directories
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreState {
    /// When the archive was last downloaded
    pub fetched_at: DateTime<Utc>,
}

/// One group's load result: the merged group plus any field errors
#[derive(Debug)]
pub struct LoadReport {
    /// The merged group
    pub group: FileListGroup,

    /// Field-level problems encountered while loading
    pub errors: Vec<CatalogFieldError>,
}

/// A fully loaded catalog, shared read-only across a scan
#[derive(Debug)]
pub struct Catalog {
    /// Version directory the catalog was loaded from
    pub version: VersionNumber,

    /// Loaded groups, in request order
    pub groups: Vec<FileListGroup>,

    /// All field errors across all loaded documents
    pub load_errors: Vec<CatalogFieldError>,
}

impl Catalog {
    /// Look up a group by key
    #[must_use]
    pub fn group(&self, key: &str) -> Option<&FileListGroup> {
        self.groups.iter().find(|g| g.key == key)
    }

    /// Total number of components across all groups
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.groups.iter().map(FileListGroup::len).sum()
    }

    /// Total number of fingerprintable files across all groups
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.groups.iter().map(FileListGroup::file_count).sum()
    }
}

/// Handle to the on-disk catalog store
#[derive(Debug, Clone)]
pub struct CatalogStore {
    root: PathBuf,
}

impl CatalogStore {
    /// Open a store rooted at `root` (the directory need not exist yet)
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The store's root directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All version directories present on disk
    #[must_use]
    pub fn versions(&self) -> Vec<VersionNumber> {
        let Ok(entries) = fs::read_dir(&self.root) else {
            return Vec::new();
        };

        entries
            .filter_map(std::result::Result::ok)
            .filter(|e| e.path().is_dir())
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|name| name.starts_with(|c: char| c.is_ascii_digit()))
            .map(VersionNumber::new)
            .collect()
    }

    /// The current (highest) catalog version, if any exists
    #[must_use]
    pub fn current_version(&self) -> Option<VersionNumber> {
        self.versions().into_iter().max()
    }

    /// Directory holding one catalog version
    #[must_use]
    pub fn version_dir(&self, version: &VersionNumber) -> PathBuf {
        self.root.join(version.as_str())
    }

    /// Path of a group document within a version directory.
    ///
    /// `variant` is `None` for the base document, or the variant suffix
    /// (`popular`, `vulnerable`).
    #[must_use]
    pub fn group_file(
        &self,
        version: &VersionNumber,
        key: &str,
        variant: Option<&str>,
    ) -> PathBuf {
        let name = match variant {
            Some(suffix) => format!("{key}-{suffix}.json"),
            None => format!("{key}.json"),
        };
        self.version_dir(version).join(name)
    }

    /// True if every requested group's base document exists in `version`
    #[must_use]
    pub fn has_required_files(&self, version: &VersionNumber, requests: &[GroupRequest]) -> bool {
        requests
            .iter()
            .all(|r| self.group_file(version, &r.key, None).exists())
    }

    /// Path of the downloaded release archive
    #[must_use]
    pub fn archive_path(&self) -> PathBuf {
        self.root.join(ARCHIVE_NAME)
    }

    /// Read the refresh bookkeeping record, if present
    #[must_use]
    pub fn state(&self) -> Option<StoreState> {
        let payload = fs::read_to_string(self.root.join(STATE_NAME)).ok()?;
        serde_json::from_str(&payload).ok()
    }

    /// Persist the refresh bookkeeping record
    pub fn write_state(&self, state: &StoreState) -> CatalogResult<()> {
        let path = self.root.join(STATE_NAME);
        fs::create_dir_all(&self.root).map_err(|e| CatalogError::io(&self.root, e))?;
        let payload = serde_json::to_string_pretty(state)
            .map_err(|e| CatalogError::Refresh(e.to_string()))?;
        fs::write(&path, payload).map_err(|e| CatalogError::io(&path, e))
    }

    /// Load one group from the current version directory.
    ///
    /// The base document must decode; variant documents that fail to
    /// decode are reported as errors in the [`LoadReport`] and skipped,
    /// so a bad variant never takes down a scan.
    pub fn load_group(
        &self,
        version: &VersionNumber,
        request: &GroupRequest,
    ) -> CatalogResult<LoadReport> {
        let mut group = FileListGroup::new(request.key.clone());
        let mut errors = Vec::new();

        let base_path = self.group_file(version, &request.key, None);
        self.merge_document(&base_path, &mut group, &mut errors)?;

        let mut variants = Vec::new();
        if request.include_popular {
            variants.push("popular");
        }
        if request.include_vulnerable {
            variants.push("vulnerable");
        }

        for variant in variants {
            let path = self.group_file(version, &request.key, Some(variant));
            if !path.exists() {
                debug!(path = %path.display(), "variant document absent, skipping");
                continue;
            }
            if let Err(err) = self.merge_document(&path, &mut group, &mut errors) {
                errors.push(CatalogFieldError {
                    document: document_name(&path),
                    field: String::new(),
                    message: err.to_string(),
                });
            }
        }

        Ok(LoadReport { group, errors })
    }

    /// Load a full catalog from the current version
    pub fn load_catalog(&self, requests: &[GroupRequest]) -> CatalogResult<Catalog> {
        let version = self
            .current_version()
            .ok_or_else(|| CatalogError::Missing(self.root.display().to_string()))?;

        let mut groups = Vec::new();
        let mut load_errors = Vec::new();

        for request in requests {
            let report = self.load_group(&version, request)?;
            groups.push(report.group);
            load_errors.extend(report.errors);
        }

        Ok(Catalog {
            version,
            groups,
            load_errors,
        })
    }

    fn merge_document(
        &self,
        path: &Path,
        group: &mut FileListGroup,
        errors: &mut Vec<CatalogFieldError>,
    ) -> CatalogResult<()> {
        let payload = fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
        let outcome = parse_document(&document_name(path), &payload)?;

        for list in outcome.file_lists {
            group.merge(list);
        }
        errors.extend(outcome.errors);
        Ok(())
    }
}

fn document_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_doc(dir: &Path, name: &str, payload: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(name), payload).unwrap();
    }

    fn plugin_doc(key: &str) -> String {
        format!(
            r#"{{"key": "{key}", "files": [{{"path": "readme.txt", "signatures": [
                {{"hash": "aa", "versions": ["1.0"]}}
            ]}}]}}"#
        )
    }

    #[test]
    fn current_version_is_numeric_maximum() {
        let tmp = TempDir::new().unwrap();
        let store = CatalogStore::new(tmp.path());

        for v in ["2.9.0", "2.10.0", "2.2.1"] {
            fs::create_dir_all(tmp.path().join(v)).unwrap();
        }
        // non-version clutter must not be picked up
        fs::create_dir_all(tmp.path().join("tmp-extract")).unwrap();

        assert_eq!(store.current_version().unwrap().as_str(), "2.10.0");
    }

    #[test]
    fn missing_store_has_no_version() {
        let tmp = TempDir::new().unwrap();
        let store = CatalogStore::new(tmp.path().join("absent"));
        assert!(store.current_version().is_none());
        assert!(store.versions().is_empty());
    }

    #[test]
    fn load_group_merges_variants_first_wins() {
        let tmp = TempDir::new().unwrap();
        let store = CatalogStore::new(tmp.path());
        let version = VersionNumber::new("1.0.0");
        let dir = store.version_dir(&version);

        write_doc(&dir, "plugins.json", &plugin_doc("plugins/a"));
        write_doc(
            &dir,
            "plugins-popular.json",
            &format!(
                r#"{{"file_lists": [{}, {}]}}"#,
                plugin_doc("plugins/a"),
                plugin_doc("plugins/b")
            ),
        );

        let request = GroupRequest::base("plugins").with_popular(true);
        let report = store.load_group(&version, &request).unwrap();

        assert_eq!(report.group.len(), 2);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn bad_variant_is_reported_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let store = CatalogStore::new(tmp.path());
        let version = VersionNumber::new("1.0.0");
        let dir = store.version_dir(&version);

        write_doc(&dir, "plugins.json", &plugin_doc("plugins/a"));
        write_doc(&dir, "plugins-vulnerable.json", "{broken");

        let request = GroupRequest::base("plugins").with_vulnerable(true);
        let report = store.load_group(&version, &request).unwrap();

        assert_eq!(report.group.len(), 1);
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn load_catalog_requires_a_version() {
        let tmp = TempDir::new().unwrap();
        let store = CatalogStore::new(tmp.path());
        let err = store.load_catalog(&[GroupRequest::base("plugins")]).unwrap_err();
        assert!(matches!(err, CatalogError::Missing(_)));
    }

    #[test]
    fn loading_same_document_twice_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let store = CatalogStore::new(tmp.path());
        let version = VersionNumber::new("1.0.0");
        let dir = store.version_dir(&version);
        write_doc(&dir, "plugins.json", &plugin_doc("plugins/a"));

        let request = GroupRequest::base("plugins");
        let once = store.load_group(&version, &request).unwrap();

        // merging the same document again must not change the group
        let mut twice = store.load_group(&version, &request).unwrap();
        let outcome = parse_document(
            "plugins.json",
            &fs::read_to_string(dir.join("plugins.json")).unwrap(),
        )
        .unwrap();
        for list in outcome.file_lists {
            twice.group.merge(list);
        }

        assert_eq!(once.group.len(), twice.group.len());
    }
}
