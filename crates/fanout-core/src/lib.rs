//! Bounded-concurrency task execution with fail-fast cancellation.
//!
//! - [`Executor`]: reusable admission gate capping how many tasks run at once.
//! - [`Task`]: one-shot async unit of work receiving a [`Context`].
//! - [`run_batch`]: runs a batch of tasks, returning the first failure or
//!   cancellation and never a partial result.
//! - [`contain`]: converts a panicking task into [`BatchError::Panicked`].

mod batch;
pub use batch::run_batch;

mod config;
pub use config::ExecutorConfig;

mod context;
pub use context::Context;

mod error;
pub use error::{BatchError, BoxError, ContextError, ExecutorError};

mod executor;
pub use executor::{Executor, ScopedExecutor};

pub mod metrics;
pub use metrics::{BatchOutcome, MetricsBackend, NoopMetrics, TaskOutcome};

mod panic;
pub use panic::{PanicError, contain};

mod task;
pub use task::Task;

pub use tokio_util::sync::CancellationToken;

pub mod prelude {
    pub use crate::{BatchError, Context, Executor, ExecutorConfig, Task, run_batch};
}
