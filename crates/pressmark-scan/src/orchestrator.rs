//! Concurrent fetch orchestration.
//!
//! For one target and one file-list group, the orchestrator fans out
//! one probe per catalog file per component, emits each component as
//! soon as all of its probes settle, and unwinds every in-flight task
//! when any probe classifies the host as unreachable.
//!
//! Components flow through a per-task state machine: scheduled →
//! running → completed, rejected (swallowed) or cancelled. Only
//! completed components with at least one fetched file reach the
//! output stream.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::future::join_all;
use futures_util::Stream;
use pressmark_client::{ProbeExpectation, ProbeFailure, Prober};
use pressmark_core::{ComponentCapture, FileList, FileListGroup, PressmarkError, Result};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, warn};
use url::Url;

use crate::log::{ProbeEvent, ProbeLog};

/// Capacity of the completion queue between component tasks and the
/// stream consumer
const COMPLETION_QUEUE_DEPTH: usize = 16;

/// Orchestrator policy knobs
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Swallow per-file rejections as "no evidence" (default). When
    /// disabled, a rejection aborts its component (but never the scan).
    pub suppress_rejections: bool,

    /// Cap on concurrently in-flight probes across all components
    pub max_concurrent_probes: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            suppress_rejections: true,
            max_concurrent_probes: 32,
        }
    }
}

/// Fans probes out over a target and streams completed components back
pub struct FetchOrchestrator<P> {
    prober: Arc<P>,
    options: ScanOptions,
}

impl<P: Prober + 'static> FetchOrchestrator<P> {
    /// Create an orchestrator with default options
    pub fn new(prober: Arc<P>) -> Self {
        Self::with_options(prober, ScanOptions::default())
    }

    /// Create an orchestrator with custom options
    pub const fn with_options(prober: Arc<P>, options: ScanOptions) -> Self {
        Self { prober, options }
    }

    /// Probe every component of `group` against `target`.
    ///
    /// Returns a lazy, finite, non-restartable stream of captures in
    /// completion order. Components with no files are never scheduled;
    /// components with no fetched files are filtered out. On a fatal
    /// host-unreachable classification the stream yields exactly one
    /// `Err` (after all other tasks are cancelled and drained) and
    /// then ends. Dropping the stream cancels the remaining work.
    pub fn scan(
        &self,
        target: &Url,
        group: &FileListGroup,
        log: ProbeLog,
    ) -> Result<CaptureStream> {
        let base = normalized_base(target)?;

        let scheduled: Vec<FileList> = group
            .file_lists
            .iter()
            .filter(|list| !list.files.is_empty())
            .cloned()
            .collect();

        debug!(
            base = %base,
            group = %group.key,
            scheduled = scheduled.len(),
            skipped = group.len() - scheduled.len(),
            "starting component fan-out"
        );

        let (tx, rx) = mpsc::channel(COMPLETION_QUEUE_DEPTH);
        let prober = Arc::clone(&self.prober);
        let options = self.options.clone();

        tokio::spawn(coordinate(prober, options, base, scheduled, log, tx));

        Ok(CaptureStream::new(rx))
    }
}

/// Drives the component tasks and owns the unwind policy.
///
/// A single coordinator consumes task completions, so the first fatal
/// outcome wins and later ones are drained silently; the caller can
/// never observe two fatal signals.
async fn coordinate<P: Prober + 'static>(
    prober: Arc<P>,
    options: ScanOptions,
    base: Url,
    scheduled: Vec<FileList>,
    log: ProbeLog,
    tx: mpsc::Sender<Result<ComponentCapture>>,
) {
    let semaphore = Arc::new(Semaphore::new(options.max_concurrent_probes));
    let mut tasks = JoinSet::new();

    for list in scheduled {
        tasks.spawn(run_component(
            Arc::clone(&prober),
            Arc::clone(&semaphore),
            base.clone(),
            list,
            options.suppress_rejections,
            log.clone(),
        ));
    }

    let mut fatal: Option<PressmarkError> = None;

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(Some(capture))) => {
                if tx.send(Ok(capture)).await.is_err() {
                    // consumer dropped the stream; stop early
                    debug!("capture stream dropped, cancelling remaining tasks");
                    break;
                }
            }
            Ok(Ok(None)) => {}
            Ok(Err(err)) => {
                fatal = Some(err);
                break;
            }
            Err(join_err) if join_err.is_cancelled() => {}
            Err(join_err) => {
                fatal = Some(PressmarkError::Internal(format!(
                    "component task failed: {join_err}"
                )));
                break;
            }
        }
    }

    // Unwind: cancel everything still in flight and drain the results
    // without propagating further errors.
    tasks.abort_all();
    while tasks.join_next().await.is_some() {}

    if let Some(err) = fatal {
        warn!(error = %err, "scan aborted");
        let _ = tx.send(Err(err)).await;
    }
}

/// One component's unit of work: probe all files concurrently, then
/// settle into a single outcome.
async fn run_component<P: Prober>(
    prober: Arc<P>,
    semaphore: Arc<Semaphore>,
    base: Url,
    list: FileList,
    suppress_rejections: bool,
    log: ProbeLog,
) -> Result<Option<ComponentCapture>> {
    let probes = list.files.iter().map(|record| {
        let prober = Arc::clone(&prober);
        let semaphore = Arc::clone(&semaphore);
        let base = base.clone();
        let key = list.key.clone();
        let log = log.clone();
        let path = record.path.clone();
        let algorithm = record
            .signatures
            .first()
            .map(|s| s.algorithm)
            .unwrap_or_default();

        async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| PressmarkError::Internal(e.to_string()))?;

            let url = base
                .join(path.trim_start_matches('/'))
                .map_err(|e| PressmarkError::InvalidUrl(format!("{path}: {e}")))?;

            let expectation = ProbeExpectation::new(path.clone(), algorithm);
            match prober.probe(&url, &expectation).await {
                Ok(file) => Ok(Some(file)),
                Err(ProbeFailure::HostUnreachable(msg)) => {
                    Err(PressmarkError::HostUnreachable(msg))
                }
                Err(ProbeFailure::Rejected(reason)) => {
                    log.record(ProbeEvent::Rejection {
                        component: key,
                        path: path.clone(),
                        reason: reason.to_string(),
                    });
                    if suppress_rejections {
                        Ok(None)
                    } else {
                        Err(PressmarkError::ProbeRejected {
                            path,
                            reason: reason.to_string(),
                        })
                    }
                }
            }
        }
    });

    let mut files = Vec::new();
    let mut rejection: Option<PressmarkError> = None;

    // Fatal classifications take precedence over unsuppressed
    // rejections even when both settle in the same batch.
    for outcome in join_all(probes).await {
        match outcome {
            Ok(Some(file)) => files.push(file),
            Ok(None) => {}
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => rejection = Some(err),
        }
    }

    if let Some(err) = rejection {
        log.record(ProbeEvent::ComponentAborted {
            component: list.key.clone(),
            reason: err.to_string(),
        });
        return Ok(None);
    }

    if files.is_empty() {
        Ok(None)
    } else {
        Ok(Some(ComponentCapture {
            key: list.key,
            files,
        }))
    }
}

/// Ensure the base URL can have catalog paths joined onto it
fn normalized_base(target: &Url) -> Result<Url> {
    if target.cannot_be_a_base() {
        return Err(PressmarkError::InvalidUrl(target.to_string()));
    }

    let mut base = target.clone();
    if !base.path().ends_with('/') {
        base.set_path(&format!("{}/", base.path()));
    }
    Ok(base)
}

/// Stream of completed component captures, in completion order
pub struct CaptureStream {
    inner: tokio_stream::wrappers::ReceiverStream<Result<ComponentCapture>>,
}

impl CaptureStream {
    fn new(rx: mpsc::Receiver<Result<ComponentCapture>>) -> Self {
        Self {
            inner: tokio_stream::wrappers::ReceiverStream::new(rx),
        }
    }
}

impl Stream for CaptureStream {
    type Item = Result<ComponentCapture>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
