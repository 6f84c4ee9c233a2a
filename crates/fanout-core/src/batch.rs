//! Fail-fast batch runner.
//!
//! Tasks are admitted one at a time through the executor. While waiting for
//! admission the runner also watches the context and already-running tasks, so the
//! first failure or cancellation stops admission immediately. Tasks still running when
//! the batch ends are detached: they finish on their own and their results are dropped.

use std::time::Instant;

use tokio::task::{JoinError, JoinSet};
use tracing::{debug, instrument, trace};

use crate::context::Context;
use crate::error::{BatchError, ExecutorError};
use crate::executor::Executor;
use crate::metrics::{BatchOutcome, TaskOutcome};
use crate::panic::{PanicError, contain};
use crate::task::Task;

type Running = JoinSet<Result<(), BatchError>>;

/// Runs `tasks` on `executor` and returns the first failure, if any.
///
/// Every task receives a child of `ctx` that is cancelled as soon as the batch ends,
/// successfully or not.
#[instrument(level = "debug", skip_all, fields(executor = %executor.name(), tasks = tasks.len()))]
pub async fn run_batch(
    ctx: &Context,
    executor: &Executor,
    tasks: Vec<Task>,
) -> Result<(), BatchError> {
    if let Some(err) = ctx.err() {
        debug!(%err, "context done before batch start");
        return Err(BatchError::canceled(err));
    }
    if tasks.is_empty() {
        return Ok(());
    }

    let metrics = executor.metrics();
    let started = Instant::now();
    metrics.record_batch_started(executor.name(), tasks.len());

    let batch = ctx.child();
    let mut running = Running::new();
    let mut result = drive(&batch, executor, tasks, &mut running).await;
    batch.cancel();

    if let Err(BatchError::Canceled { panic, .. }) = &mut result {
        *panic = finished_panic(&mut running);
    }
    let abandoned = running.len();
    running.detach_all();

    let outcome = match &result {
        Ok(()) => BatchOutcome::Succeeded,
        Err(BatchError::Canceled { .. }) => BatchOutcome::Canceled,
        Err(_) => BatchOutcome::Failed,
    };
    let elapsed = started.elapsed();
    metrics.record_batch_finished(executor.name(), outcome, elapsed);

    match &result {
        Ok(()) => debug!(elapsed_ms = elapsed.as_millis() as u64, "batch completed"),
        Err(err) => debug!(%err, abandoned, outcome = outcome.as_str(), "batch aborted"),
    }
    result
}

async fn drive(
    ctx: &Context,
    executor: &Executor,
    tasks: Vec<Task>,
    running: &mut Running,
) -> Result<(), BatchError> {
    for task in tasks {
        let admission = loop {
            tokio::select! {
                biased;
                err = ctx.done() => return Err(BatchError::canceled(err)),
                Some(joined) = running.join_next(), if !running.is_empty() => {
                    settle(executor, joined)?
                }
                admission = executor.admit() => break admission?,
            }
        };

        trace!(task = task.name(), in_flight = executor.in_flight(), "task admitted");
        let task_ctx = ctx.clone();
        running.spawn(async move {
            let _admission = admission;
            contain(task.run(task_ctx)).await
        });
    }

    while !running.is_empty() {
        tokio::select! {
            biased;
            err = ctx.done() => return Err(BatchError::canceled(err)),
            Some(joined) = running.join_next() => settle(executor, joined)?,
        }
    }
    Ok(())
}

fn settle(
    executor: &Executor,
    joined: Result<Result<(), BatchError>, JoinError>,
) -> Result<(), BatchError> {
    let result = match joined {
        Ok(result) => result,
        Err(err) if err.is_panic() => Err(PanicError::from_payload(err.into_panic()).into()),
        Err(_) => Err(ExecutorError::Aborted.into()),
    };

    let outcome = match &result {
        Ok(()) => TaskOutcome::Succeeded,
        Err(BatchError::Panicked(_)) => TaskOutcome::Panicked,
        Err(_) => TaskOutcome::Failed,
    };
    executor
        .metrics()
        .record_task_finished(executor.name(), outcome);
    result
}

/// First panic among tasks that already finished but were never settled.
fn finished_panic(running: &mut Running) -> Option<PanicError> {
    while let Some(joined) = running.try_join_next() {
        match joined {
            Ok(Err(BatchError::Panicked(p))) => return Some(p),
            Err(err) if err.is_panic() => return Some(PanicError::from_payload(err.into_panic())),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::error::ContextError;

    fn ok_task(counter: &Arc<AtomicUsize>) -> Task {
        let counter = Arc::clone(counter);
        Task::new(move |_| async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    /// Task that records the peak number of concurrently running tasks.
    fn peak_task(current: &Arc<AtomicUsize>, peak: &Arc<AtomicUsize>, hold: Duration) -> Task {
        let current = Arc::clone(current);
        let peak = Arc::clone(peak);
        Task::new(move |_| async move {
            let now = current.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(hold).await;
            current.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn all_tasks_succeed() {
        let counter = Arc::new(AtomicUsize::new(0));
        let executor = Executor::new(3);
        let tasks = (0..20).map(|_| ok_task(&counter)).collect();

        executor.run(tasks).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 20);
        assert_eq!(executor.in_flight(), 0);
    }

    #[tokio::test]
    async fn empty_batch_succeeds() {
        let executor = Executor::new(1);
        assert!(executor.run(Vec::new()).await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrency_cap_is_reached_but_never_exceeded() {
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let executor = Executor::new(3);
        let tasks = (0..12)
            .map(|_| peak_task(&current, &peak, Duration::from_millis(40)))
            .collect();

        executor.run(tasks).await.unwrap();
        assert_eq!(peak.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn unbounded_runs_everything_at_once() {
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let executor = Executor::new(-1);
        let tasks = (0..8)
            .map(|_| peak_task(&current, &peak, Duration::from_millis(100)))
            .collect();

        executor.run(tasks).await.unwrap();
        assert_eq!(peak.load(Ordering::SeqCst), 8);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn first_error_stops_admission() {
        let started = Arc::new(AtomicUsize::new(0));
        let executor = Executor::new(1);
        let mut tasks = vec![Task::new(|_| async { Err("first task failed".into()) })];
        tasks.extend((0..10).map(|_| {
            let started = Arc::clone(&started);
            Task::new(move |_| async move {
                started.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(())
            })
        }));

        let err = executor.run(tasks).await.unwrap_err();
        assert!(matches!(err, BatchError::Task(_)));
        assert_eq!(err.to_string(), "task failed: first task failed");
        // One follow-up task may have been admitted while the failure was in flight.
        assert!(started.load(Ordering::SeqCst) <= 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn panic_is_contained() {
        let executor = Executor::new(4);
        let tasks = (0..4)
            .map(|i| {
                Task::new(move |_| async move {
                    if i == 2 {
                        let empty: Vec<u8> = Vec::new();
                        let _ = empty[i];
                    }
                    Ok(())
                })
            })
            .collect();

        let err = executor.run(tasks).await.unwrap_err();
        assert!(err.is_panic());
        assert!(err.to_string().contains("index out of bounds"));
    }

    #[tokio::test]
    async fn cancelled_context_starts_nothing() {
        let counter = Arc::new(AtomicUsize::new(0));
        let ctx = Context::background();
        ctx.cancel();

        let executor = Executor::new(2);
        let tasks = (0..5).map(|_| ok_task(&counter)).collect();
        let err = run_batch(&ctx, &executor, tasks).await.unwrap_err();

        assert_eq!(err.context_error(), Some(ContextError::Canceled));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn cancellation_returns_promptly() {
        let ctx = Context::background();
        let executor = Executor::new(4);
        let tasks = (0..64)
            .map(|_| {
                Task::new(|_| async {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(())
                })
            })
            .collect();

        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let started = Instant::now();
        let err = run_batch(&ctx, &executor, tasks).await.unwrap_err();
        assert!(err.is_canceled());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn deadline_is_reported() {
        let ctx = Context::background().with_timeout(Duration::from_millis(30));
        let executor = Executor::new(1);
        let tasks = vec![Task::new(|_| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        })];

        let err = run_batch(&ctx, &executor, tasks).await.unwrap_err();
        assert_eq!(err.context_error(), Some(ContextError::DeadlineExceeded));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn running_tasks_observe_fail_fast() {
        let observed = Arc::new(AtomicUsize::new(0));
        let executor = Executor::new(2);

        let watcher = {
            let observed = Arc::clone(&observed);
            Task::new(move |ctx: Context| async move {
                ctx.done().await;
                observed.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        };
        let failing = Task::new(|_| async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Err("boom".into())
        });

        let err = executor.run(vec![watcher, failing]).await.unwrap_err();
        assert!(matches!(err, BatchError::Task(_)));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(observed.load(Ordering::SeqCst), 1);
        assert_eq!(executor.in_flight(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn executor_is_reusable_across_batches() {
        let executor = Executor::new(2);
        for _ in 0..2 {
            let counter = Arc::new(AtomicUsize::new(0));
            let tasks = (0..10).map(|_| ok_task(&counter)).collect();
            executor.run(tasks).await.unwrap();
            assert_eq!(counter.load(Ordering::SeqCst), 10);
        }

        let err = executor
            .run(vec![Task::new(|_| async { Err("once".into()) })])
            .await
            .unwrap_err();
        assert!(matches!(err, BatchError::Task(_)));

        let counter = Arc::new(AtomicUsize::new(0));
        executor.run(vec![ok_task(&counter)]).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn closed_executor_reports_executor_error() {
        let executor = Executor::new(1);
        executor.close();
        let err = executor
            .run(vec![Task::new(|_| async { Ok(()) })])
            .await
            .unwrap_err();
        assert!(matches!(err, BatchError::Executor(ExecutorError::Closed)));
    }

    #[tokio::test]
    async fn panic_finished_before_cancellation_is_attached() {
        let ctx = Context::background();
        let executor = Executor::new(0);
        let sleeper = Task::new(|_| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        });
        let parent = ctx.clone();
        let panicking = Task::new(move |_| async move {
            parent.cancel();
            if parent.is_done() {
                panic!("late panic");
            }
            Ok(())
        });

        let err = run_batch(&ctx, &executor, vec![sleeper, panicking]).await.unwrap_err();
        assert!(err.is_canceled());
        assert!(err.is_panic());
        assert!(err.to_string().contains("late panic"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn close_during_pending_admission_reports_closed() {
        let executor = Executor::new(1);
        let tasks = (0..3)
            .map(|_| {
                Task::new(|_| async {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    Ok(())
                })
            })
            .collect();

        let closer = executor.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            closer.close();
        });

        let err = executor.run(tasks).await.unwrap_err();
        assert!(matches!(err, BatchError::Executor(ExecutorError::Closed)));
    }
}
