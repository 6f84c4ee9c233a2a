//! Bounded-concurrency executor shared across batches.
//!
//! An [`Executor`] owns only admission capacity: a semaphore with `N` permits when
//! bounded, nothing when unbounded. Every admitted task holds an [`Admission`] until it
//! returns, so the cap holds across all batches running on the same executor.

use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info};

use crate::batch::run_batch;
use crate::config::ExecutorConfig;
use crate::context::Context;
use crate::error::{BatchError, ExecutorError};
use crate::metrics::{MetricsBackend, NoopMetrics};
use crate::task::Task;

/// Handle to a bounded worker pool. Clones share the same capacity.
#[derive(Clone)]
pub struct Executor {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    limit: Option<usize>,
    permits: Option<Arc<Semaphore>>,
    in_flight: AtomicUsize,
    closed: AtomicBool,
    metrics: Arc<dyn MetricsBackend>,
}

impl Executor {
    /// Creates an executor running at most `limit` tasks at once.
    ///
    /// `limit <= 0` means unbounded.
    pub fn new(limit: isize) -> Self {
        Self::from_config(&ExecutorConfig {
            max_in_flight: limit,
            ..ExecutorConfig::default()
        })
    }

    pub fn from_config(config: &ExecutorConfig) -> Self {
        let limit = config.limit();
        debug!(name = %config.name, ?limit, "executor created");
        Self {
            inner: Arc::new(Inner {
                name: config.name.clone(),
                limit,
                permits: limit.map(|n| Arc::new(Semaphore::new(n))),
                in_flight: AtomicUsize::new(0),
                closed: AtomicBool::new(false),
                metrics: Arc::new(NoopMetrics),
            }),
        }
    }

    /// Replaces the metrics backend. Only takes effect before the executor is shared.
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsBackend>) -> Self {
        match Arc::get_mut(&mut self.inner) {
            Some(inner) => inner.metrics = metrics,
            None => debug!(name = %self.inner.name, "executor already shared; metrics unchanged"),
        }
        self
    }

    /// An executor that closes itself when dropped.
    pub fn scoped(limit: isize) -> ScopedExecutor {
        ScopedExecutor(Self::new(limit))
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The concurrency cap, `None` when unbounded.
    pub fn limit(&self) -> Option<usize> {
        self.inner.limit
    }

    /// Tasks admitted and not yet finished, across all batches.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    pub(crate) fn metrics(&self) -> &dyn MetricsBackend {
        self.inner.metrics.as_ref()
    }

    /// Runs `tasks` fail-fast under a background context.
    pub async fn run(&self, tasks: Vec<Task>) -> Result<(), BatchError> {
        run_batch(&Context::background(), self, tasks).await
    }

    /// Runs `tasks` fail-fast under `ctx`.
    pub async fn run_ctx(&self, ctx: &Context, tasks: Vec<Task>) -> Result<(), BatchError> {
        run_batch(ctx, self, tasks).await
    }

    /// Releases admission capacity. Pending admissions fail with
    /// [`ExecutorError::Closed`]; tasks already running finish normally.
    ///
    /// Calling it again is a no-op.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(permits) = &self.inner.permits {
            permits.close();
        }
        info!(name = %self.inner.name, in_flight = self.in_flight(), "executor closed");
    }

    /// Waits for capacity to run one more task.
    pub(crate) async fn admit(&self) -> Result<Admission, ExecutorError> {
        if self.is_closed() {
            return Err(ExecutorError::Closed);
        }
        let permit = match &self.inner.permits {
            Some(permits) => Some(
                Arc::clone(permits)
                    .acquire_owned()
                    .await
                    .map_err(|_| ExecutorError::Closed)?,
            ),
            None => None,
        };

        self.inner.in_flight.fetch_add(1, Ordering::AcqRel);
        self.inner.metrics.record_task_admitted(&self.inner.name);
        Ok(Admission {
            _permit: permit,
            inner: Arc::clone(&self.inner),
        })
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("name", &self.inner.name)
            .field("limit", &self.inner.limit)
            .field("in_flight", &self.in_flight())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Capacity held by one running task; released on drop.
pub(crate) struct Admission {
    _permit: Option<OwnedSemaphorePermit>,
    inner: Arc<Inner>,
}

impl Drop for Admission {
    fn drop(&mut self) {
        self.inner.in_flight.fetch_sub(1, Ordering::AcqRel);
        self.inner.metrics.record_task_released(&self.inner.name);
    }
}

/// Executor owned by a single call; closed when dropped.
#[derive(Debug)]
pub struct ScopedExecutor(Executor);

impl Deref for ScopedExecutor {
    type Target = Executor;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Drop for ScopedExecutor {
    fn drop(&mut self) {
        self.0.close();
    }
}
