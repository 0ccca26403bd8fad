//! HTTP probe engine and catalog release client for pressmark.
//!
//! This crate provides the two network capabilities the engine consumes:
//! the [`Prober`] fetch capability driving target probes, and the
//! [`ReleaseClient`] used by the catalog refresh manager.

mod config;
mod hash;
mod prober;
mod release;

pub use config::RetryConfig;
pub use hash::digest_bytes;
pub use prober::{
    HttpProber, HttpProberBuilder, ProbeExpectation, ProbeFailure, ProbeResult, Prober,
    RejectReason,
};
pub use release::{Release, ReleaseAsset, ReleaseClient, ReleaseClientBuilder};
pub use pressmark_core::{PressmarkError, Result};
