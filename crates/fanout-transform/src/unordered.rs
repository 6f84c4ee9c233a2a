//! Shared core of the unordered transformers.
//!
//! Tasks merge their output into one container behind a mutex, locked only for the
//! merge itself. The container is taken out of the mutex once the batch succeeds.

use std::future::Future;
use std::sync::Arc;

use fanout_core::{BatchError, BoxError, Context, Executor, ExecutorError, Task, run_batch};
use parking_lot::Mutex;
use tracing::trace;

pub(crate) async fn gather<I, T, O, E, F, Fut, M>(
    ctx: &Context,
    executor: &Executor,
    items: impl IntoIterator<Item = I>,
    out: O,
    f: F,
    merge: M,
) -> Result<O, BatchError>
where
    I: Send + 'static,
    T: Send + 'static,
    O: Send + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(Context, I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    M: Fn(&mut O, T) + Send + Sync + 'static,
{
    let shared = Arc::new(Mutex::new(Some(out)));
    let f = Arc::new(f);
    let merge = Arc::new(merge);

    let tasks: Vec<Task> = items
        .into_iter()
        .map(|item| {
            let shared = Arc::clone(&shared);
            let merge = Arc::clone(&merge);
            let f = Arc::clone(&f);
            Task::new(move |ctx| async move {
                let produced = f(ctx, item).await.map_err(Into::<BoxError>::into)?;
                if let Some(out) = shared.lock().as_mut() {
                    merge(out, produced);
                }
                Ok::<(), BoxError>(())
            })
        })
        .collect();
    trace!(tasks = tasks.len(), executor = executor.name(), "unordered transform submitted");

    run_batch(ctx, executor, tasks).await?;
    let out = shared.lock().take();
    out.ok_or_else(|| ExecutorError::Detached.into())
}
