//! Core types for the pressmark fingerprinting engine.
//!
//! This crate provides the foundational types used across the pressmark
//! workspace:
//!
//! - **Catalog model**: [`FileListGroup`], [`FileList`], [`Signature`] —
//!   the signature catalog loaded once per invocation and shared
//!   read-only across a scan
//! - **Evidence model**: [`ComponentCapture`], [`ResolvedComponent`] —
//!   per-scan runtime results
//! - **Errors**: [`PressmarkError`] with the fatal/non-fatal split the
//!   orchestrator relies on
//!
//! # Example
//!
//! ```rust,ignore
//! use pressmark_core::{FileListGroup, Result};
//!
//! fn component_count(group: &FileListGroup) -> usize {
//!     group.len()
//! }
//! ```

mod error;
pub mod types;

pub use error::{PressmarkError, Result};
pub use types::*;
