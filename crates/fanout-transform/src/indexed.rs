//! Shared core of the order-preserving transformers.
//!
//! Task `i` writes only slot `i` of a pre-sized array of write-once cells, so no lock
//! is taken on the hot path. Once the batch succeeds the slots are read back in index
//! order, whatever order the tasks finished in.

use std::future::Future;
use std::sync::{Arc, OnceLock};

use fanout_core::{BatchError, BoxError, Context, Executor, ExecutorError, Task, run_batch};
use tracing::trace;

pub(crate) async fn gather_indexed<I, T, E, F, Fut>(
    ctx: &Context,
    executor: &Executor,
    items: Vec<I>,
    f: F,
) -> Result<Vec<T>, BatchError>
where
    I: Send + 'static,
    T: Send + Sync + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(Context, I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    let slots: Arc<Vec<OnceLock<T>>> = Arc::new(items.iter().map(|_| OnceLock::new()).collect());
    let f = Arc::new(f);

    let tasks: Vec<Task> = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let slots = Arc::clone(&slots);
            let f = Arc::clone(&f);
            Task::new(move |ctx| async move {
                let value = f(ctx, item).await.map_err(Into::<BoxError>::into)?;
                let _ = slots[index].set(value);
                Ok::<(), BoxError>(())
            })
        })
        .collect();
    trace!(tasks = tasks.len(), executor = executor.name(), "indexed transform submitted");

    run_batch(ctx, executor, tasks).await?;
    let slots = Arc::try_unwrap(slots).map_err(|_| ExecutorError::Detached)?;
    slots
        .into_iter()
        .map(OnceLock::into_inner)
        .collect::<Option<Vec<T>>>()
        .ok_or_else(|| ExecutorError::Detached.into())
}

/// Collects a sub-collection inside the task that produced it, so lazy iterators run
/// concurrently and never while an output slot or lock is held.
pub(crate) async fn expand<R, U, E, Fut>(fut: Fut) -> Result<Vec<U>, E>
where
    R: IntoIterator<Item = U>,
    Fut: Future<Output = Result<R, E>>,
{
    fut.await.map(|sub| sub.into_iter().collect())
}
