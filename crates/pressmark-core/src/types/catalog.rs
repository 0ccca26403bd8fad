//! Signature catalog data model.
//!
//! The catalog maps a component (core, a plugin, a theme) to the static
//! files that identify it, and each file to the known hashes of its
//! historical contents. Catalog entities are loaded once per invocation
//! and are read-only for the duration of a scan.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Hash algorithm used for a file signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// MD5 (legacy catalogs)
    Md5,
    /// SHA-256
    Sha256,
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        Self::Md5
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Md5 => write!(f, "md5"),
            Self::Sha256 => write!(f, "sha256"),
        }
    }
}

/// One known content of a file: "if the file hashes to this, the
/// component is one of these versions."
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signature {
    /// Lowercase hex digest of the file content
    pub hash: String,

    /// Algorithm that produced the digest
    #[serde(default)]
    pub algorithm: HashAlgorithm,

    /// Versions that shipped a file with this exact content (never empty)
    pub versions: BTreeSet<String>,
}

impl Signature {
    /// True if `observed` (lowercase hex) matches this signature
    #[must_use]
    pub fn matches(&self, observed: &str) -> bool {
        self.hash.eq_ignore_ascii_case(observed)
    }
}

/// A fingerprintable file with all of its known signatures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Path relative to the component root (e.g. `wp-includes/version.php`)
    pub path: String,

    /// One signature per distinct historical content of this file
    #[serde(default)]
    pub signatures: Vec<Signature>,
}

impl FileRecord {
    /// Find the signature matching an observed hash, if any
    #[must_use]
    pub fn signature_for(&self, observed: &str) -> Option<&Signature> {
        self.signatures.iter().find(|s| s.matches(observed))
    }
}

/// All fingerprintable files of one component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileList {
    /// Component identifier, unique within its group (e.g. `plugins/my-plugin`)
    pub key: String,

    /// Who produced this file list (catalog provenance)
    #[serde(default)]
    pub producer: String,

    /// Files that identify the component
    #[serde(default)]
    pub files: Vec<FileRecord>,
}

impl FileList {
    /// Look up a file record by its relative path
    #[must_use]
    pub fn record_for(&self, path: &str) -> Option<&FileRecord> {
        self.files.iter().find(|f| f.path == path)
    }
}

/// A named group of file lists (core, plugins, themes), possibly merged
/// from several catalog documents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileListGroup {
    /// Group identifier (e.g. `plugins`)
    pub key: String,

    /// Member file lists, unique by key
    #[serde(default)]
    pub file_lists: Vec<FileList>,
}

impl FileListGroup {
    /// Create an empty group
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            file_lists: Vec::new(),
        }
    }

    /// Look up a file list by component key
    #[must_use]
    pub fn get_file_list(&self, key: &str) -> Option<&FileList> {
        self.file_lists.iter().find(|fl| fl.key == key)
    }

    /// Merge another file list into the group.
    ///
    /// Keys already present are skipped (first-loaded wins), which makes
    /// merging the same document twice a no-op.
    pub fn merge(&mut self, file_list: FileList) {
        if self.get_file_list(&file_list.key).is_none() {
            self.file_lists.push(file_list);
        }
    }

    /// Merge every file list of `other` into this group
    pub fn merge_group(&mut self, other: FileListGroup) {
        for fl in other.file_lists {
            self.merge(fl);
        }
    }

    /// Number of components in the group
    #[must_use]
    pub fn len(&self) -> usize {
        self.file_lists.len()
    }

    /// True if the group holds no components
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.file_lists.is_empty()
    }

    /// Total number of fingerprintable files across all components
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.file_lists.iter().map(|fl| fl.files.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_list(key: &str) -> FileList {
        FileList {
            key: key.into(),
            producer: "test".into(),
            files: vec![FileRecord {
                path: "readme.html".into(),
                signatures: vec![Signature {
                    hash: "aa".into(),
                    algorithm: HashAlgorithm::Md5,
                    versions: BTreeSet::from(["1.0".to_string()]),
                }],
            }],
        }
    }

    #[test]
    fn merge_skips_duplicate_keys() {
        let mut group = FileListGroup::new("plugins");
        group.merge(sample_list("plugins/a"));

        let mut replacement = sample_list("plugins/a");
        replacement.producer = "other".into();
        group.merge(replacement);

        assert_eq!(group.len(), 1);
        assert_eq!(group.get_file_list("plugins/a").unwrap().producer, "test");
    }

    #[test]
    fn merge_is_idempotent() {
        let mut once = FileListGroup::new("plugins");
        once.merge(sample_list("plugins/a"));
        once.merge(sample_list("plugins/b"));

        let mut twice = FileListGroup::new("plugins");
        for _ in 0..2 {
            twice.merge(sample_list("plugins/a"));
            twice.merge(sample_list("plugins/b"));
        }

        assert_eq!(once.len(), twice.len());
        let keys: Vec<_> = twice.file_lists.iter().map(|fl| fl.key.as_str()).collect();
        assert_eq!(keys, vec!["plugins/a", "plugins/b"]);
    }

    #[test]
    fn signature_match_ignores_case() {
        let sig = Signature {
            hash: "ABCDEF".into(),
            algorithm: HashAlgorithm::Md5,
            versions: BTreeSet::from(["1.0".to_string()]),
        };
        assert!(sig.matches("abcdef"));
        assert!(!sig.matches("abcdee"));
    }
}
