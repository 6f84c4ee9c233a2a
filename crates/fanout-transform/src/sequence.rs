//! Order-preserving transforms over plain sequences.

use std::future::Future;

use fanout_core::{BatchError, BoxError, Context, Executor};
use tracing::debug;

use crate::indexed::{expand, gather_indexed};

/// Maps every element, at most `limit` at a time. Element `i` of the output comes from
/// element `i` of the input.
pub async fn map<T, U, E, F, Fut>(input: Vec<T>, limit: isize, f: F) -> Result<Vec<U>, BatchError>
where
    T: Send + 'static,
    U: Send + Sync + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(Context, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<U, E>> + Send + 'static,
{
    map_ctx(&Context::background(), input, limit, f).await
}

pub async fn map_ctx<T, U, E, F, Fut>(
    ctx: &Context,
    input: Vec<T>,
    limit: isize,
    f: F,
) -> Result<Vec<U>, BatchError>
where
    T: Send + 'static,
    U: Send + Sync + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(Context, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<U, E>> + Send + 'static,
{
    if input.is_empty() {
        return Ok(Vec::new());
    }
    let executor = Executor::scoped(limit);
    map_with_executor(ctx, &executor, input, f).await
}

pub async fn map_with_executor<T, U, E, F, Fut>(
    ctx: &Context,
    executor: &Executor,
    input: Vec<T>,
    f: F,
) -> Result<Vec<U>, BatchError>
where
    T: Send + 'static,
    U: Send + Sync + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(Context, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<U, E>> + Send + 'static,
{
    if input.is_empty() {
        return Ok(Vec::new());
    }
    debug!(elements = input.len(), executor = executor.name(), "sequence map");
    gather_indexed(ctx, executor, input, f).await
}

/// Expands every element and concatenates the pieces in input order.
pub async fn flat_map<T, U, R, E, F, Fut>(
    input: Vec<T>,
    limit: isize,
    f: F,
) -> Result<Vec<U>, BatchError>
where
    T: Send + 'static,
    U: Send + Sync + 'static,
    R: IntoIterator<Item = U> + Send + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(Context, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    flat_map_ctx(&Context::background(), input, limit, f).await
}

pub async fn flat_map_ctx<T, U, R, E, F, Fut>(
    ctx: &Context,
    input: Vec<T>,
    limit: isize,
    f: F,
) -> Result<Vec<U>, BatchError>
where
    T: Send + 'static,
    U: Send + Sync + 'static,
    R: IntoIterator<Item = U> + Send + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(Context, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    if input.is_empty() {
        return Ok(Vec::new());
    }
    let executor = Executor::scoped(limit);
    flat_map_with_executor(ctx, &executor, input, f).await
}

pub async fn flat_map_with_executor<T, U, R, E, F, Fut>(
    ctx: &Context,
    executor: &Executor,
    input: Vec<T>,
    f: F,
) -> Result<Vec<U>, BatchError>
where
    T: Send + 'static,
    U: Send + Sync + 'static,
    R: IntoIterator<Item = U> + Send + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(Context, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    if input.is_empty() {
        return Ok(Vec::new());
    }
    debug!(elements = input.len(), executor = executor.name(), "sequence flat map");
    let groups = gather_indexed(ctx, executor, input, move |ctx, item| expand(f(ctx, item))).await?;
    Ok(groups.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn output_order_matches_input_order() {
        let input: Vec<u64> = (0..300).collect();
        let output = map(input, 8, |_ctx, n: u64| async move {
            tokio::time::sleep(Duration::from_millis((n * 7919) % 13)).await;
            Ok::<_, BoxError>(n * n)
        })
        .await
        .unwrap();

        let expected: Vec<u64> = (0..300).map(|n| n * n).collect();
        assert_eq!(output, expected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn flat_map_concatenates_groups() {
        let input = vec![3usize, 0, 2];
        let output = flat_map(input, 2, |_ctx, n: usize| async move {
            tokio::time::sleep(Duration::from_millis(((3 - n) * 5) as u64)).await;
            Ok::<_, BoxError>(std::iter::repeat_n(n, n))
        })
        .await
        .unwrap();

        assert_eq!(output, vec![3, 3, 3, 2, 2]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn reused_executor_matches_fresh_executor() {
        let executor = Executor::new(4);
        let ctx = Context::background();
        let square = |_ctx: Context, n: i64| async move { Ok::<_, BoxError>(n * n) };

        let first = map_with_executor(&ctx, &executor, (0..50).collect(), square).await.unwrap();
        let second = map_with_executor(&ctx, &executor, (0..50).collect(), square).await.unwrap();
        let fresh = map((0..50).collect(), 4, square).await.unwrap();

        assert_eq!(first, fresh);
        assert_eq!(second, fresh);
    }

    #[tokio::test]
    async fn largest_limit_is_accepted() {
        let output = map(vec![1u8, 2], isize::MAX, |_ctx, n: u8| async move {
            Ok::<_, BoxError>(n * 3)
        })
        .await
        .unwrap();
        assert_eq!(output, vec![3, 6]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn panic_surfaces_as_panic_error() {
        let err = map(vec![1, 2, 3], 0, |_ctx, n: i32| async move {
            if n == 2 {
                let empty: Vec<i32> = Vec::new();
                return Ok::<_, BoxError>(empty[n as usize]);
            }
            Ok(n)
        })
        .await
        .unwrap_err();

        assert!(err.is_panic());
        assert!(err.to_string().contains("panic recovered"));
        assert!(err.to_string().contains("index out of bounds"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn tasks_see_fail_fast_cancellation() {
        let observed = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&observed);
        let err = map(vec![0u32, 1, 2, 3], 0, move |ctx: Context, n: u32| {
            let seen = Arc::clone(&seen);
            async move {
                if n == 0 {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    return Err(anyhow::anyhow!("first element failed"));
                }
                ctx.token().cancelled().await;
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(n)
            }
        })
        .await
        .unwrap_err();

        assert!(err.to_string().contains("first element failed"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(observed.load(Ordering::SeqCst), 3);
    }
}
