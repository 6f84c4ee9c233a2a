//! Parallel `map` / `flat_map` over collections.
//!
//! Each element (or entry) becomes one task on a [`fanout_core::Executor`]; the first
//! failing transform aborts the whole call and no output is returned.
//!
//! | Module | Input | Output order |
//! |---|---|---|
//! | [`native_map`] | `std::collections::HashMap` | unordered |
//! | [`hash_set`] | [`fanout_model::Set`] | unordered |
//! | [`hash_map`] | [`fanout_model::Map`] | unordered |
//! | [`ordered_map`] | [`fanout_model::OrderedMap`] | input order |
//! | [`sequence`] | `Vec` | input order |
//!
//! Every module offers the same six entry points:
//! - `map` / `flat_map`: own executor capped at `limit`, background context;
//! - `map_ctx` / `flat_map_ctx`: own executor, caller's context;
//! - `map_with_executor` / `flat_map_with_executor`: caller's context and executor.
//!
//! A `limit` of zero or less means no cap. Executors created by a call are closed when
//! it returns; executors passed in are left open.
//!
//! Calls log at `debug` through `tracing`; `fanout_observe` installs a subscriber:
//!
//! ```
//! use std::collections::HashMap;
//! use fanout_observe::{LoggerConfig, logger_init};
//! use fanout_transform::native_map;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), fanout_transform::BoxError> {
//! logger_init(&LoggerConfig { level: "fanout_transform=debug".into(), ..Default::default() })?;
//!
//! let input = HashMap::from([("a", 1), ("b", 2), ("c", 3)]);
//! let output = native_map::map(input, 2, |_ctx, k, v: i32| async move {
//!     Ok::<_, fanout_transform::BoxError>((v, k.to_uppercase()))
//! })
//! .await?;
//! assert_eq!(output[&1], "A");
//! # Ok(())
//! # }
//! ```

mod indexed;
mod unordered;

pub mod hash_map;
pub mod hash_set;
pub mod native_map;
pub mod ordered_map;
pub mod sequence;

pub use fanout_core::{BatchError, BoxError, Context, Executor};
