//! Transforms over [`Map`].
//!
//! Same merge rules as [`crate::native_map`]: colliding keys from different inputs keep
//! whichever value was written last.

use std::future::Future;
use std::hash::BuildHasher;

use fanout_core::{BatchError, BoxError, Context, Executor};
use fanout_model::{Collectable, Map};
use tracing::debug;

use crate::indexed::expand;
use crate::unordered::gather;

pub async fn map<K, V, K2, V2, S, E, F, Fut>(
    input: Map<K, V, S>,
    limit: isize,
    f: F,
) -> Result<Map<K2, V2, S>, BatchError>
where
    K: Send + 'static,
    V: Send + 'static,
    K2: Collectable + Send + 'static,
    V2: Send + 'static,
    S: BuildHasher + Clone + Send + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(Context, K, V) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(K2, V2), E>> + Send + 'static,
{
    map_ctx(&Context::background(), input, limit, f).await
}

pub async fn map_ctx<K, V, K2, V2, S, E, F, Fut>(
    ctx: &Context,
    input: Map<K, V, S>,
    limit: isize,
    f: F,
) -> Result<Map<K2, V2, S>, BatchError>
where
    K: Send + 'static,
    V: Send + 'static,
    K2: Collectable + Send + 'static,
    V2: Send + 'static,
    S: BuildHasher + Clone + Send + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(Context, K, V) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(K2, V2), E>> + Send + 'static,
{
    if input.is_empty() {
        return Ok(Map::with_hasher(input.hasher().clone()));
    }
    let executor = Executor::scoped(limit);
    map_with_executor(ctx, &executor, input, f).await
}

pub async fn map_with_executor<K, V, K2, V2, S, E, F, Fut>(
    ctx: &Context,
    executor: &Executor,
    input: Map<K, V, S>,
    f: F,
) -> Result<Map<K2, V2, S>, BatchError>
where
    K: Send + 'static,
    V: Send + 'static,
    K2: Collectable + Send + 'static,
    V2: Send + 'static,
    S: BuildHasher + Clone + Send + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(Context, K, V) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(K2, V2), E>> + Send + 'static,
{
    let out = Map::with_capacity_and_hasher(input.len(), input.hasher().clone());
    if input.is_empty() {
        return Ok(out);
    }
    debug!(entries = input.len(), executor = executor.name(), "map");
    gather(
        ctx,
        executor,
        input,
        out,
        move |ctx, (k, v): (K, V)| f(ctx, k, v),
        |out: &mut Map<K2, V2, S>, (k, v): (K2, V2)| {
            out.insert(k, v);
        },
    )
    .await
}

/// Expands every entry into any number of pairs. Pairs from one entry are applied in
/// their own iteration order.
pub async fn flat_map<K, V, K2, V2, S, R, E, F, Fut>(
    input: Map<K, V, S>,
    limit: isize,
    f: F,
) -> Result<Map<K2, V2, S>, BatchError>
where
    K: Send + 'static,
    V: Send + 'static,
    K2: Collectable + Send + 'static,
    V2: Send + 'static,
    S: BuildHasher + Clone + Send + 'static,
    R: IntoIterator<Item = (K2, V2)> + Send + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(Context, K, V) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    flat_map_ctx(&Context::background(), input, limit, f).await
}

pub async fn flat_map_ctx<K, V, K2, V2, S, R, E, F, Fut>(
    ctx: &Context,
    input: Map<K, V, S>,
    limit: isize,
    f: F,
) -> Result<Map<K2, V2, S>, BatchError>
where
    K: Send + 'static,
    V: Send + 'static,
    K2: Collectable + Send + 'static,
    V2: Send + 'static,
    S: BuildHasher + Clone + Send + 'static,
    R: IntoIterator<Item = (K2, V2)> + Send + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(Context, K, V) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    if input.is_empty() {
        return Ok(Map::with_hasher(input.hasher().clone()));
    }
    let executor = Executor::scoped(limit);
    flat_map_with_executor(ctx, &executor, input, f).await
}

pub async fn flat_map_with_executor<K, V, K2, V2, S, R, E, F, Fut>(
    ctx: &Context,
    executor: &Executor,
    input: Map<K, V, S>,
    f: F,
) -> Result<Map<K2, V2, S>, BatchError>
where
    K: Send + 'static,
    V: Send + 'static,
    K2: Collectable + Send + 'static,
    V2: Send + 'static,
    S: BuildHasher + Clone + Send + 'static,
    R: IntoIterator<Item = (K2, V2)> + Send + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(Context, K, V) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    let out = Map::with_hasher(input.hasher().clone());
    if input.is_empty() {
        return Ok(out);
    }
    debug!(entries = input.len(), executor = executor.name(), "flat map");
    gather(
        ctx,
        executor,
        input,
        out,
        move |ctx, (k, v): (K, V)| expand(f(ctx, k, v)),
        |out: &mut Map<K2, V2, S>, pairs: Vec<(K2, V2)>| out.extend(pairs),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use fanout_model::FnvBuildHasher;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn keys_and_values_are_transformed() {
        let input: Map<String, u32> = [("alpha", 1), ("beta", 2)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let output = map(input, 2, |_ctx, k: String, v: u32| async move {
            Ok::<_, BoxError>((k.len(), v * 10))
        })
        .await
        .unwrap();

        assert_eq!(output.get(&5), Some(&10));
        assert_eq!(output.get(&4), Some(&20));
        assert_eq!(output.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn result_feeds_back_into_another_call() {
        let input: Map<u32, u32> = (0..10).map(|i| (i, i)).collect();
        let doubled = map(input, 4, |_ctx, k: u32, v: u32| async move { Ok::<_, BoxError>((k, v * 2)) })
            .await
            .unwrap();
        let shifted = map(doubled, 4, |_ctx, k: u32, v: u32| async move { Ok::<_, BoxError>((k + 100, v)) })
            .await
            .unwrap();

        let expected: Map<u32, u32> = (0..10).map(|i| (i + 100, i * 2)).collect();
        assert_eq!(shifted, expected);
        assert_eq!(shifted.hasher(), &FnvBuildHasher::default());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn flat_map_colliding_keys_keep_one_value() {
        let input: Map<u32, u32> = (0..8).map(|i| (i, i)).collect();
        let output = flat_map(input, 0, |_ctx, k: u32, v: u32| async move {
            tokio::time::sleep(Duration::from_millis(u64::from(k % 3))).await;
            Ok::<_, BoxError>(vec![(k, v), (u32::MAX, k)])
        })
        .await
        .unwrap();

        assert_eq!(output.len(), 9);
        assert!(output.get(&u32::MAX).is_some_and(|v| *v < 8));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn deadline_expiry_is_reported() {
        let ctx = Context::background().with_timeout(Duration::from_millis(20));
        let input: Map<u32, u32> = (0..100).map(|i| (i, i)).collect();
        let err = map_ctx(&ctx, input, 2, |_ctx, k: u32, v: u32| async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, BoxError>((k, v))
        })
        .await
        .unwrap_err();

        assert_eq!(err.context_error(), Some(fanout_core::ContextError::DeadlineExceeded));
    }
}
