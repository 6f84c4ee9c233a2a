//! Transforms over `std::collections::HashMap`.
//!
//! Results are merged into a shared map under a mutex. When two inputs produce the same
//! key the last writer wins, and which one is last is not deterministic.

use std::collections::HashMap;
use std::future::Future;
use std::hash::{BuildHasher, Hash};

use fanout_core::{BatchError, BoxError, Context, Executor};
use tracing::debug;

use crate::indexed::expand;
use crate::unordered::gather;

/// Maps every entry to a new `(key, value)` pair, at most `limit` at a time.
pub async fn map<K, V, K2, V2, S, E, F, Fut>(
    input: HashMap<K, V, S>,
    limit: isize,
    f: F,
) -> Result<HashMap<K2, V2, S>, BatchError>
where
    K: Send + 'static,
    V: Send + 'static,
    K2: Eq + Hash + Send + 'static,
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
    input: HashMap<K, V, S>,
    limit: isize,
    f: F,
) -> Result<HashMap<K2, V2, S>, BatchError>
where
    K: Send + 'static,
    V: Send + 'static,
    K2: Eq + Hash + Send + 'static,
    V2: Send + 'static,
    S: BuildHasher + Clone + Send + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(Context, K, V) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(K2, V2), E>> + Send + 'static,
{
    if input.is_empty() {
        return Ok(HashMap::with_hasher(input.hasher().clone()));
    }
    let executor = Executor::scoped(limit);
    map_with_executor(ctx, &executor, input, f).await
}

/// Runs on the caller's executor, which is left open afterwards.
pub async fn map_with_executor<K, V, K2, V2, S, E, F, Fut>(
    ctx: &Context,
    executor: &Executor,
    input: HashMap<K, V, S>,
    f: F,
) -> Result<HashMap<K2, V2, S>, BatchError>
where
    K: Send + 'static,
    V: Send + 'static,
    K2: Eq + Hash + Send + 'static,
    V2: Send + 'static,
    S: BuildHasher + Clone + Send + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(Context, K, V) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(K2, V2), E>> + Send + 'static,
{
    let out = HashMap::with_capacity_and_hasher(input.len(), input.hasher().clone());
    if input.is_empty() {
        return Ok(out);
    }
    debug!(entries = input.len(), executor = executor.name(), "native map");
    gather(
        ctx,
        executor,
        input,
        out,
        move |ctx, (k, v): (K, V)| f(ctx, k, v),
        |out: &mut HashMap<K2, V2, S>, (k, v): (K2, V2)| {
            out.insert(k, v);
        },
    )
    .await
}

/// Expands every entry into any number of pairs, merged into one map.
pub async fn flat_map<K, V, K2, V2, S, R, E, F, Fut>(
    input: HashMap<K, V, S>,
    limit: isize,
    f: F,
) -> Result<HashMap<K2, V2, S>, BatchError>
where
    K: Send + 'static,
    V: Send + 'static,
    K2: Eq + Hash + Send + 'static,
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
    input: HashMap<K, V, S>,
    limit: isize,
    f: F,
) -> Result<HashMap<K2, V2, S>, BatchError>
where
    K: Send + 'static,
    V: Send + 'static,
    K2: Eq + Hash + Send + 'static,
    V2: Send + 'static,
    S: BuildHasher + Clone + Send + 'static,
    R: IntoIterator<Item = (K2, V2)> + Send + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(Context, K, V) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    if input.is_empty() {
        return Ok(HashMap::with_hasher(input.hasher().clone()));
    }
    let executor = Executor::scoped(limit);
    flat_map_with_executor(ctx, &executor, input, f).await
}

pub async fn flat_map_with_executor<K, V, K2, V2, S, R, E, F, Fut>(
    ctx: &Context,
    executor: &Executor,
    input: HashMap<K, V, S>,
    f: F,
) -> Result<HashMap<K2, V2, S>, BatchError>
where
    K: Send + 'static,
    V: Send + 'static,
    K2: Eq + Hash + Send + 'static,
    V2: Send + 'static,
    S: BuildHasher + Clone + Send + 'static,
    R: IntoIterator<Item = (K2, V2)> + Send + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(Context, K, V) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    let out = HashMap::with_hasher(input.hasher().clone());
    if input.is_empty() {
        return Ok(out);
    }
    debug!(entries = input.len(), executor = executor.name(), "native flat map");
    gather(
        ctx,
        executor,
        input,
        out,
        move |ctx, (k, v): (K, V)| expand(f(ctx, k, v)),
        |out: &mut HashMap<K2, V2, S>, pairs: Vec<(K2, V2)>| out.extend(pairs),
    )
    .await
}
