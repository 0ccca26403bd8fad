//! WordPress component fingerprinting by signature catalog hash intersection.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use futures_util::StreamExt;
//! use pressmark::{
//!     catalog::{CatalogStore, GroupRequest},
//!     scan::{resolve_component, FetchOrchestrator, ProbeLog},
//!     HttpProber,
//! };
//!
//! #[tokio::main]
//! async fn main() -> pressmark::Result<()> {
//!     let store = CatalogStore::new("/var/lib/pressmark/catalog");
//!     let catalog = store.load_catalog(&[GroupRequest::base("plugins")])?;
//!
//!     let prober = Arc::new(HttpProber::new());
//!     let orchestrator = FetchOrchestrator::new(prober);
//!     let target = url::Url::parse("https://blog.example")?;
//!
//!     for group in &catalog.groups {
//!         let mut stream = orchestrator.scan(&target, group, ProbeLog::new())?;
//!         while let Some(capture) = stream.next().await {
//!             let capture = capture?;
//!             let list = group.get_file_list(&capture.key).expect("scheduled from group");
//!             let resolved = resolve_component(list, &capture.files);
//!             println!("{}: {}", resolved.key, resolved.version);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `default` - Uses rustls for TLS
//! - `rustls` - Use rustls for TLS (recommended)
//! - `native-tls` - Use system native TLS

// Re-export core types
pub use pressmark_core::*;

// Re-export the network capabilities
pub use pressmark_client::{
    HttpProber, HttpProberBuilder, Prober, ReleaseClient, ReleaseClientBuilder, RetryConfig,
};

// Catalog and engine under their own namespaces
pub use pressmark_catalog as catalog;
pub use pressmark_scan as scan;

// Re-export runtime for convenience
pub use serde;
pub use serde_json;
pub use tokio;
