//! Strongly-typed catalog and evidence models.

mod catalog;
mod evidence;
mod version;

pub use catalog::{FileList, FileListGroup, FileRecord, HashAlgorithm, Signature};
pub use evidence::{ComponentCapture, FetchedFile, ResolvedComponent, VersionDecision};
pub use version::VersionNumber;
