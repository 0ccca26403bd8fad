use thiserror::Error;

/// Result type alias for pressmark operations
pub type Result<T> = std::result::Result<T, PressmarkError>;

/// Errors that can occur while fingerprinting a target
#[derive(Error, Debug)]
pub enum PressmarkError {
    /// The target host stopped answering entirely; the scan cannot continue
    #[error("target host unreachable: {0}")]
    HostUnreachable(String),

    /// A probe was rejected by the target (unexpected status, oversized body)
    #[error("probe rejected for {path}: {reason}")]
    ProbeRejected {
        /// Relative path of the probed file
        path: String,
        /// Why the response was not usable as evidence
        reason: String,
    },

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Request timed out
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    /// JSON parsing/serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid URL
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Signature catalog could not be loaded or refreshed
    #[error("catalog error: {0}")]
    Catalog(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Generic internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl PressmarkError {
    /// Returns true if this condition aborts the whole scan
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::HostUnreachable(_))
    }

    /// Returns true if the error concerns only a single probed file
    #[must_use]
    pub const fn is_per_file(&self) -> bool {
        matches!(self, Self::ProbeRejected { .. })
    }
}
