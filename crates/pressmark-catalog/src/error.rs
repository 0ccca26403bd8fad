use thiserror::Error;

/// Result type alias for catalog operations
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// A single field-level schema problem in a catalog document.
///
/// Collected into lists so a partially malformed document still yields
/// every valid file list it contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFieldError {
    /// Document the problem was found in (file name)
    pub document: String,

    /// Dotted path of the offending field (e.g. `files[3].path`)
    pub field: String,

    /// What was wrong
    pub message: String,
}

impl std::fmt::Display for CatalogFieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}: {}", self.document, self.field, self.message)
    }
}

/// Errors from catalog loading and refreshing
#[derive(Error, Debug)]
pub enum CatalogError {
    /// A document could not be decoded at all
    #[error("catalog document {document} is not valid JSON: {message}")]
    Format {
        /// Offending document (file name)
        document: String,
        /// Decoder message
        message: String,
    },

    /// No usable catalog version exists on disk
    #[error("no catalog found under {0}; run an update first")]
    Missing(String),

    /// Downloading or extracting a new catalog release failed
    #[error("catalog refresh failed: {0}")]
    Refresh(String),

    /// Filesystem error
    #[error("catalog I/O error at {path}: {source}")]
    Io {
        /// Path involved
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl CatalogError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

impl From<CatalogError> for pressmark_core::PressmarkError {
    fn from(err: CatalogError) -> Self {
        Self::Catalog(err.to_string())
    }
}
