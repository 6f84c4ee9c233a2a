//! Order-preserving transforms over [`OrderedMap`].
//!
//! Output entries appear in the order of the input entries that produced them, however
//! the tasks interleave. A key produced twice keeps the position of its first occurrence
//! and the value of its last.

use std::future::Future;
use std::hash::BuildHasher;

use fanout_core::{BatchError, BoxError, Context, Executor};
use fanout_model::{Collectable, OrderedMap};
use tracing::debug;

use crate::indexed::{expand, gather_indexed};

/// Maps every entry, at most `limit` at a time, keeping input order.
pub async fn map<K, V, K2, V2, S, E, F, Fut>(
    input: OrderedMap<K, V, S>,
    limit: isize,
    f: F,
) -> Result<OrderedMap<K2, V2, S>, BatchError>
where
    K: Send + 'static,
    V: Send + 'static,
    K2: Collectable + Send + Sync + 'static,
    V2: Send + Sync + 'static,
    S: BuildHasher + Clone + Send,
    E: Into<BoxError> + 'static,
    F: Fn(Context, K, V) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(K2, V2), E>> + Send + 'static,
{
    map_ctx(&Context::background(), input, limit, f).await
}

pub async fn map_ctx<K, V, K2, V2, S, E, F, Fut>(
    ctx: &Context,
    input: OrderedMap<K, V, S>,
    limit: isize,
    f: F,
) -> Result<OrderedMap<K2, V2, S>, BatchError>
where
    K: Send + 'static,
    V: Send + 'static,
    K2: Collectable + Send + Sync + 'static,
    V2: Send + Sync + 'static,
    S: BuildHasher + Clone + Send,
    E: Into<BoxError> + 'static,
    F: Fn(Context, K, V) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(K2, V2), E>> + Send + 'static,
{
    if input.is_empty() {
        return Ok(OrderedMap::with_hasher(input.hasher().clone()));
    }
    let executor = Executor::scoped(limit);
    map_with_executor(ctx, &executor, input, f).await
}

pub async fn map_with_executor<K, V, K2, V2, S, E, F, Fut>(
    ctx: &Context,
    executor: &Executor,
    input: OrderedMap<K, V, S>,
    f: F,
) -> Result<OrderedMap<K2, V2, S>, BatchError>
where
    K: Send + 'static,
    V: Send + 'static,
    K2: Collectable + Send + Sync + 'static,
    V2: Send + Sync + 'static,
    S: BuildHasher + Clone + Send,
    E: Into<BoxError> + 'static,
    F: Fn(Context, K, V) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(K2, V2), E>> + Send + 'static,
{
    let hasher = input.hasher().clone();
    if input.is_empty() {
        return Ok(OrderedMap::with_hasher(hasher));
    }
    debug!(entries = input.len(), executor = executor.name(), "ordered map");
    let mapped = gather_indexed(ctx, executor, input.into_entries(), move |ctx, (k, v): (K, V)| {
        f(ctx, k, v)
    })
    .await?;

    let mut out = OrderedMap::with_capacity_and_hasher(mapped.len(), hasher);
    out.extend(mapped);
    Ok(out)
}

/// Expands every entry into any number of pairs. All pairs of entry `i` precede those of
/// entry `i + 1`, each group in its own iteration order.
pub async fn flat_map<K, V, K2, V2, S, R, E, F, Fut>(
    input: OrderedMap<K, V, S>,
    limit: isize,
    f: F,
) -> Result<OrderedMap<K2, V2, S>, BatchError>
where
    K: Send + 'static,
    V: Send + 'static,
    K2: Collectable + Send + Sync + 'static,
    V2: Send + Sync + 'static,
    S: BuildHasher + Clone + Send,
    R: IntoIterator<Item = (K2, V2)> + Send + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(Context, K, V) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    flat_map_ctx(&Context::background(), input, limit, f).await
}

pub async fn flat_map_ctx<K, V, K2, V2, S, R, E, F, Fut>(
    ctx: &Context,
    input: OrderedMap<K, V, S>,
    limit: isize,
    f: F,
) -> Result<OrderedMap<K2, V2, S>, BatchError>
where
    K: Send + 'static,
    V: Send + 'static,
    K2: Collectable + Send + Sync + 'static,
    V2: Send + Sync + 'static,
    S: BuildHasher + Clone + Send,
    R: IntoIterator<Item = (K2, V2)> + Send + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(Context, K, V) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    if input.is_empty() {
        return Ok(OrderedMap::with_hasher(input.hasher().clone()));
    }
    let executor = Executor::scoped(limit);
    flat_map_with_executor(ctx, &executor, input, f).await
}

pub async fn flat_map_with_executor<K, V, K2, V2, S, R, E, F, Fut>(
    ctx: &Context,
    executor: &Executor,
    input: OrderedMap<K, V, S>,
    f: F,
) -> Result<OrderedMap<K2, V2, S>, BatchError>
where
    K: Send + 'static,
    V: Send + 'static,
    K2: Collectable + Send + Sync + 'static,
    V2: Send + Sync + 'static,
    S: BuildHasher + Clone + Send,
    R: IntoIterator<Item = (K2, V2)> + Send + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(Context, K, V) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    let hasher = input.hasher().clone();
    if input.is_empty() {
        return Ok(OrderedMap::with_hasher(hasher));
    }
    debug!(entries = input.len(), executor = executor.name(), "ordered flat map");
    let groups = gather_indexed(ctx, executor, input.into_entries(), move |ctx, (k, v): (K, V)| {
        expand(f(ctx, k, v))
    })
    .await?;

    let mut out = OrderedMap::with_capacity_and_hasher(groups.iter().map(Vec::len).sum(), hasher);
    out.extend(groups.into_iter().flatten());
    Ok(out)
}
