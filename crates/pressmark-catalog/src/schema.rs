//! Catalog document decoding with field-level validation.
//!
//! Documents are decoded leniently into raw shapes first, then walked
//! field by field. Every problem becomes a [`CatalogFieldError`] and the
//! walk continues, so one bad signature never discards a whole document.
//! Only JSON that cannot be decoded at all is a hard error.

use std::collections::BTreeSet;

use pressmark_core::{FileList, FileRecord, HashAlgorithm, Signature};
use serde::Deserialize;
use tracing::warn;

use crate::error::{CatalogError, CatalogFieldError, CatalogResult};

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    producer: Option<String>,
    #[serde(default)]
    files: Option<Vec<RawFileRecord>>,
    #[serde(default)]
    file_lists: Option<Vec<RawFileList>>,
}

#[derive(Debug, Deserialize)]
struct RawFileList {
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    producer: Option<String>,
    #[serde(default)]
    files: Option<Vec<RawFileRecord>>,
}

#[derive(Debug, Deserialize)]
struct RawFileRecord {
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    signatures: Vec<RawSignature>,
}

#[derive(Debug, Deserialize)]
struct RawSignature {
    #[serde(default)]
    hash: Option<String>,
    #[serde(default)]
    algorithm: Option<String>,
    #[serde(default)]
    versions: Vec<String>,
}

/// Everything a document yielded: the file lists that validated, plus
/// the field errors encountered along the way.
#[derive(Debug, Default)]
pub struct DocumentOutcome {
    /// File lists that passed validation
    pub file_lists: Vec<FileList>,

    /// Field-level problems (does not prevent the valid lists above)
    pub errors: Vec<CatalogFieldError>,
}

/// Decode and validate one catalog document.
///
/// `document` is the file name used in error reports. Accepts both the
/// single-list shape (`{key, producer, files}`) and the grouped shape
/// (`{key, file_lists: [..]}`).
pub fn parse_document(document: &str, payload: &str) -> CatalogResult<DocumentOutcome> {
    let raw: RawDocument =
        serde_json::from_str(payload).map_err(|e| CatalogError::Format {
            document: document.to_string(),
            message: e.to_string(),
        })?;

    let mut outcome = DocumentOutcome::default();

    if let Some(lists) = raw.file_lists {
        for (i, list) in lists.into_iter().enumerate() {
            let field = format!("file_lists[{i}]");
            validate_list(document, &field, list, &mut outcome);
        }
    } else {
        let list = RawFileList {
            key: raw.key,
            producer: raw.producer,
            files: raw.files,
        };
        validate_list(document, "", list, &mut outcome);
    }

    if !outcome.errors.is_empty() {
        warn!(
            document,
            errors = outcome.errors.len(),
            "catalog document had field errors"
        );
    }

    Ok(outcome)
}

fn validate_list(
    document: &str,
    prefix: &str,
    raw: RawFileList,
    outcome: &mut DocumentOutcome,
) {
    let join = |field: &str| {
        if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        }
    };

    let Some(key) = raw.key.filter(|k| !k.is_empty()) else {
        outcome.errors.push(CatalogFieldError {
            document: document.to_string(),
            field: join("key"),
            message: "missing or empty".into(),
        });
        return;
    };

    let mut files = Vec::new();
    for (i, record) in raw.files.unwrap_or_default().into_iter().enumerate() {
        let field = join(&format!("files[{i}]"));

        let Some(path) = record.path.filter(|p| !p.is_empty()) else {
            outcome.errors.push(CatalogFieldError {
                document: document.to_string(),
                field: format!("{field}.path"),
                message: "missing or empty".into(),
            });
            continue;
        };

        let mut signatures = Vec::new();
        for (j, sig) in record.signatures.into_iter().enumerate() {
            match validate_signature(sig) {
                Ok(signature) => signatures.push(signature),
                Err(message) => outcome.errors.push(CatalogFieldError {
                    document: document.to_string(),
                    field: format!("{field}.signatures[{j}]"),
                    message,
                }),
            }
        }

        files.push(FileRecord { path, signatures });
    }

    outcome.file_lists.push(FileList {
        key,
        producer: raw.producer.unwrap_or_default(),
        files,
    });
}

fn validate_signature(raw: RawSignature) -> Result<Signature, String> {
    let hash = raw
        .hash
        .filter(|h| !h.is_empty())
        .ok_or("hash missing or empty")?;

    if !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("hash {hash:?} is not hex"));
    }

    let algorithm = match raw.algorithm.as_deref() {
        None => HashAlgorithm::default(),
        Some("md5") => HashAlgorithm::Md5,
        Some("sha256") => HashAlgorithm::Sha256,
        Some(other) => return Err(format!("unknown algorithm {other:?}")),
    };

    let versions: BTreeSet<String> = raw.versions.into_iter().collect();
    if versions.is_empty() {
        return Err("versions is empty".into());
    }

    Ok(Signature {
        hash: hash.to_ascii_lowercase(),
        algorithm,
        versions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_list_document() {
        let payload = r#"{
            "key": "plugins/my-plugin",
            "producer": "pressmark",
            "files": [
                {"path": "readme.txt", "signatures": [
                    {"hash": "ABCDEF", "algorithm": "md5", "versions": ["1.0", "1.1"]}
                ]}
            ]
        }"#;

        let outcome = parse_document("plugins.json", payload).unwrap();
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.file_lists.len(), 1);

        let list = &outcome.file_lists[0];
        assert_eq!(list.key, "plugins/my-plugin");
        // hashes normalize to lowercase to match observed digests
        assert_eq!(list.files[0].signatures[0].hash, "abcdef");
        assert_eq!(list.files[0].signatures[0].versions.len(), 2);
    }

    #[test]
    fn parses_grouped_document() {
        let payload = r#"{
            "key": "plugins",
            "file_lists": [
                {"key": "plugins/a", "files": []},
                {"key": "plugins/b", "files": []}
            ]
        }"#;

        let outcome = parse_document("plugins.json", payload).unwrap();
        assert_eq!(outcome.file_lists.len(), 2);
    }

    #[test]
    fn field_errors_do_not_discard_valid_lists() {
        let payload = r#"{
            "file_lists": [
                {"key": "plugins/good", "files": [
                    {"path": "readme.txt", "signatures": [
                        {"hash": "aa", "versions": ["1.0"]}
                    ]}
                ]},
                {"files": []},
                {"key": "plugins/partial", "files": [
                    {"signatures": []},
                    {"path": "login.js", "signatures": [
                        {"hash": "not-hex!", "versions": ["1.0"]},
                        {"hash": "bb", "versions": []}
                    ]}
                ]}
            ]
        }"#;

        let outcome = parse_document("plugins.json", payload).unwrap();

        let keys: Vec<_> = outcome.file_lists.iter().map(|l| l.key.as_str()).collect();
        assert_eq!(keys, vec!["plugins/good", "plugins/partial"]);
        // missing key, missing path, bad hash, empty versions
        assert_eq!(outcome.errors.len(), 4);
        // the record with bad signatures survives, minus those signatures
        let partial = &outcome.file_lists[1];
        assert_eq!(partial.files.len(), 1);
        assert!(partial.files[0].signatures.is_empty());
    }

    #[test]
    fn undecodable_json_is_hard_error() {
        let err = parse_document("plugins.json", "{not json").unwrap_err();
        assert!(matches!(err, CatalogError::Format { .. }));
    }

    #[test]
    fn unknown_algorithm_is_field_error() {
        let payload = r#"{
            "key": "core/wordpress",
            "files": [{"path": "x.js", "signatures": [
                {"hash": "aa", "algorithm": "crc32", "versions": ["1.0"]}
            ]}]
        }"#;

        let outcome = parse_document("core.json", payload).unwrap();
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].message.contains("crc32"));
    }
}
