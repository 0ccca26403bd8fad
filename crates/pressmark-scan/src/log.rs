//! Structured probe outcome collection.
//!
//! The orchestrator never logs probe failures into global state; the
//! caller hands it a [`ProbeLog`] and reads the events back after (or
//! during) the scan. Cloning is cheap and every clone shares the same
//! underlying buffer.

use std::sync::{Arc, Mutex};

use serde::Serialize;

/// One noteworthy non-fatal event during a scan
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum ProbeEvent {
    /// A single probe was rejected and contributed no evidence
    Rejection {
        /// Component whose file was probed
        component: String,
        /// Relative path of the probed file
        path: String,
        /// Why the probe was rejected
        reason: String,
    },

    /// A component was dropped because a rejection propagated
    /// (suppression disabled)
    ComponentAborted {
        /// The dropped component
        component: String,
        /// The propagated rejection
        reason: String,
    },
}

/// Shared, thread-safe event collector
#[derive(Debug, Clone, Default)]
pub struct ProbeLog {
    inner: Arc<Mutex<Vec<ProbeEvent>>>,
}

impl ProbeLog {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event
    pub fn record(&self, event: ProbeEvent) {
        if let Ok(mut events) = self.inner.lock() {
            events.push(event);
        }
    }

    /// Copy out everything recorded so far
    #[must_use]
    pub fn snapshot(&self) -> Vec<ProbeEvent> {
        self.inner.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Number of recorded events
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// True if nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
