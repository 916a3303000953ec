//! Bounded-parallel processing harness.
//!
//! Runs an async operation over a sequence with a concurrency limit,
//! preserving input order in the results. Failures are classified per item
//! (404s become [`ItemResult::NotFound`], other errors are recorded in the
//! result slot) and never abort the batch unless `fail_on_error` is set, in
//! which case the first failure cancels scheduling of the remaining items
//! and propagates.
//!
//! Progress is reported on every completion through an internal channel
//! drained by a logging task, so worker code never writes to the log
//! directly and output stays serialized regardless of the parallelism.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, Semaphore};
use tracing::{error, info, warn};

use crate::errors::ErrorClass;

/// Configuration of one harness run.
#[derive(Debug, Clone, Default)]
pub struct ProcessConfig {
    /// Maximum number of concurrently running operations. Zero is treated
    /// as one.
    pub parallel_limit: usize,
    /// Abort the batch on the first failure instead of recording it.
    pub fail_on_error: bool,
    /// External cancellation signal; prevents scheduling of new items.
    pub cancellation: Option<CancellationFlag>,
}

impl ProcessConfig {
    /// Strictly serial processing.
    pub fn serial(fail_on_error: bool) -> Self {
        Self {
            parallel_limit: 1,
            fail_on_error,
            cancellation: None,
        }
    }

    /// Processing with the given concurrency limit.
    pub fn with_limit(parallel_limit: usize, fail_on_error: bool) -> Self {
        Self {
            parallel_limit,
            fail_on_error,
            cancellation: None,
        }
    }
}

/// Cooperative cancellation signal shared between the harness and its
/// caller. Cancelling prevents scheduling of new items; items already past
/// their scheduling check run to completion.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of one processed item.
#[derive(Debug)]
pub enum ItemResult<O, E> {
    Valid(O),
    /// The remote reported 404 for this item; tolerated in lookups.
    NotFound,
    /// The item was never scheduled because the batch was cancelled.
    Cancelled,
    Failed(E),
}

impl<O, E> ItemResult<O, E> {
    pub fn is_valid(&self) -> bool {
        matches!(self, ItemResult::Valid(_))
    }

    pub fn into_valid(self) -> Option<O> {
        match self {
            ItemResult::Valid(output) => Some(output),
            _ => None,
        }
    }

    pub fn as_valid(&self) -> Option<&O> {
        match self {
            ItemResult::Valid(output) => Some(output),
            _ => None,
        }
    }
}

/// Processes `items` with at most `config.parallel_limit` concurrent
/// invocations of `operation`, returning one result slot per input item in
/// input order.
///
/// `describe` renders the item for progress and error reporting; `label`
/// names the batch in the log output.
pub async fn process_items<T, O, E, D, F, Fut>(
    label: &str,
    items: Vec<T>,
    config: &ProcessConfig,
    describe: D,
    operation: F,
) -> Result<Vec<ItemResult<O, E>>, E>
where
    E: ErrorClass + std::fmt::Display,
    D: Fn(&T) -> String,
    F: Fn(T) -> Fut,
    Fut: std::future::Future<Output = Result<O, E>>,
{
    let total = items.len();
    if total == 0 {
        return Ok(Vec::new());
    }

    let semaphore = Semaphore::new(config.parallel_limit.max(1));
    let external = config.cancellation.clone().unwrap_or_default();
    let aborted = CancellationFlag::new();
    let processed = AtomicUsize::new(0);
    let first_error: Mutex<Option<E>> = Mutex::new(None);

    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<(u8, String)>();
    let progress_label = label.to_string();
    let reporter = tokio::spawn(async move {
        while let Some((percent, item)) = progress_rx.recv().await {
            info!(batch = %progress_label, percent, item = %item, "processed");
        }
    });

    let tasks = items.into_iter().map(|item| {
        let semaphore = &semaphore;
        let external = &external;
        let aborted = &aborted;
        let processed = &processed;
        let first_error = &first_error;
        let describe = &describe;
        let operation = &operation;
        let progress_tx = progress_tx.clone();

        async move {
            let permit = match semaphore.acquire().await {
                Ok(permit) => permit,
                Err(_) => return ItemResult::Cancelled,
            };
            if external.is_cancelled() || aborted.is_cancelled() {
                return ItemResult::Cancelled;
            }

            let description = describe(&item);
            let result = match operation(item).await {
                Ok(output) => ItemResult::Valid(output),
                Err(err) if err.is_not_found() => {
                    warn!(batch = %label, item = %description, "item not found, skipping");
                    ItemResult::NotFound
                }
                Err(err) => {
                    error!(batch = %label, item = %description, error = %err, "item failed");
                    if config.fail_on_error {
                        aborted.cancel();
                        let mut slot = first_error.lock().unwrap();
                        if slot.is_none() {
                            *slot = Some(err);
                        }
                        ItemResult::Cancelled
                    } else {
                        ItemResult::Failed(err)
                    }
                }
            };
            drop(permit);

            let done = processed.fetch_add(1, Ordering::SeqCst) + 1;
            let percent = ((done * 100 + total / 2) / total) as u8;
            let _ = progress_tx.send((percent, description));

            result
        }
    });

    let results = futures::future::join_all(tasks).await;

    drop(progress_tx);
    let _ = reporter.await;

    if let Some(err) = first_error.lock().unwrap().take() {
        return Err(err);
    }
    Ok(results)
}
