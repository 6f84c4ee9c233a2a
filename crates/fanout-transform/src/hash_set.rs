//! Transforms over [`Set`]. Outputs are unions: duplicates collapse on insert.

use std::future::Future;
use std::hash::BuildHasher;

use fanout_core::{BatchError, BoxError, Context, Executor};
use fanout_model::{Collectable, Set};
use tracing::debug;

use crate::indexed::expand;
use crate::unordered::gather;

/// Maps every element, at most `limit` at a time.
pub async fn map<T, U, S, E, F, Fut>(
    input: Set<T, S>,
    limit: isize,
    f: F,
) -> Result<Set<U, S>, BatchError>
where
    T: Send + 'static,
    U: Collectable + Send + 'static,
    S: BuildHasher + Clone + Send + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(Context, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<U, E>> + Send + 'static,
{
    map_ctx(&Context::background(), input, limit, f).await
}

pub async fn map_ctx<T, U, S, E, F, Fut>(
    ctx: &Context,
    input: Set<T, S>,
    limit: isize,
    f: F,
) -> Result<Set<U, S>, BatchError>
where
    T: Send + 'static,
    U: Collectable + Send + 'static,
    S: BuildHasher + Clone + Send + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(Context, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<U, E>> + Send + 'static,
{
    if input.is_empty() {
        return Ok(Set::with_hasher(input.hasher().clone()));
    }
    let executor = Executor::scoped(limit);
    map_with_executor(ctx, &executor, input, f).await
}

pub async fn map_with_executor<T, U, S, E, F, Fut>(
    ctx: &Context,
    executor: &Executor,
    input: Set<T, S>,
    f: F,
) -> Result<Set<U, S>, BatchError>
where
    T: Send + 'static,
    U: Collectable + Send + 'static,
    S: BuildHasher + Clone + Send + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(Context, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<U, E>> + Send + 'static,
{
    let out = Set::with_capacity_and_hasher(input.len(), input.hasher().clone());
    if input.is_empty() {
        return Ok(out);
    }
    debug!(elements = input.len(), executor = executor.name(), "set map");
    gather(ctx, executor, input, out, f, |out: &mut Set<U, S>, value| {
        out.insert(value);
    })
    .await
}

/// Expands every element into any number of elements; the output is their union.
pub async fn flat_map<T, U, S, R, E, F, Fut>(
    input: Set<T, S>,
    limit: isize,
    f: F,
) -> Result<Set<U, S>, BatchError>
where
    T: Send + 'static,
    U: Collectable + Send + 'static,
    S: BuildHasher + Clone + Send + 'static,
    R: IntoIterator<Item = U> + Send + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(Context, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    flat_map_ctx(&Context::background(), input, limit, f).await
}

pub async fn flat_map_ctx<T, U, S, R, E, F, Fut>(
    ctx: &Context,
    input: Set<T, S>,
    limit: isize,
    f: F,
) -> Result<Set<U, S>, BatchError>
where
    T: Send + 'static,
    U: Collectable + Send + 'static,
    S: BuildHasher + Clone + Send + 'static,
    R: IntoIterator<Item = U> + Send + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(Context, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    if input.is_empty() {
        return Ok(Set::with_hasher(input.hasher().clone()));
    }
    let executor = Executor::scoped(limit);
    flat_map_with_executor(ctx, &executor, input, f).await
}

pub async fn flat_map_with_executor<T, U, S, R, E, F, Fut>(
    ctx: &Context,
    executor: &Executor,
    input: Set<T, S>,
    f: F,
) -> Result<Set<U, S>, BatchError>
where
    T: Send + 'static,
    U: Collectable + Send + 'static,
    S: BuildHasher + Clone + Send + 'static,
    R: IntoIterator<Item = U> + Send + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(Context, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    let out = Set::with_hasher(input.hasher().clone());
    if input.is_empty() {
        return Ok(out);
    }
    debug!(elements = input.len(), executor = executor.name(), "set flat map");
    gather(
        ctx,
        executor,
        input,
        out,
        move |ctx, item| expand(f(ctx, item)),
        |out: &mut Set<U, S>, values: Vec<U>| out.extend(values),
    )
    .await
}
