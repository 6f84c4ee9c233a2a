//! Metrics seam for executors.
//!
//! Backends observe batch lifecycle and task outcomes; [`NoopMetrics`] is used when
//! nothing is configured.

use std::time::Duration;

/// How a single task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskOutcome {
    Succeeded,
    Failed,
    Panicked,
}

impl TaskOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskOutcome::Succeeded => "succeeded",
            TaskOutcome::Failed => "failed",
            TaskOutcome::Panicked => "panicked",
        }
    }
}

/// How a whole batch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchOutcome {
    Succeeded,
    Failed,
    Canceled,
}

impl BatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchOutcome::Succeeded => "succeeded",
            BatchOutcome::Failed => "failed",
            BatchOutcome::Canceled => "canceled",
        }
    }
}

pub trait MetricsBackend: Send + Sync {
    fn record_batch_started(&self, executor: &str, tasks: usize);
    fn record_task_finished(&self, executor: &str, outcome: TaskOutcome);
    fn record_batch_finished(&self, executor: &str, outcome: BatchOutcome, elapsed: Duration);
    /// A task on `executor` was admitted. Paired with exactly one
    /// [`record_task_released`](Self::record_task_released); executors may share a name.
    fn record_task_admitted(&self, executor: &str);
    fn record_task_released(&self, executor: &str);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsBackend for NoopMetrics {
    fn record_batch_started(&self, _executor: &str, _tasks: usize) {}
    fn record_task_finished(&self, _executor: &str, _outcome: TaskOutcome) {}
    fn record_batch_finished(&self, _executor: &str, _outcome: BatchOutcome, _elapsed: Duration) {}
    fn record_task_admitted(&self, _executor: &str) {}
    fn record_task_released(&self, _executor: &str) {}
}
