//! Prometheus metrics backend for fanout executors.
//!
//! [`PrometheusMetrics`] implements [`fanout_core::MetricsBackend`]; attach it to an
//! executor and expose [`PrometheusMetrics::gather`] from your own HTTP endpoint.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use fanout_core::{Executor, ExecutorConfig};
//! use fanout_prometheus::PrometheusMetrics;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! let executor = Executor::from_config(&ExecutorConfig::new("ingest", 8))
//!     .with_metrics(Arc::new(metrics.clone()));
//!
//! // later, from a /metrics handler:
//! let body = metrics.encode_text()?;
//! # let _ = (executor, body);
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `fanout_batches_started_total{executor}` - Counter
//! - `fanout_tasks_submitted_total{executor}` - Counter
//! - `fanout_tasks_finished_total{executor, outcome}` - Counter
//! - `fanout_batch_duration_seconds{executor, outcome}` - Histogram
//! - `fanout_tasks_in_flight{executor}` - Gauge
//!
//! This crate does NOT serve the metrics; use the application's HTTP stack.

mod backend;
pub use backend::{MetricsError, PrometheusMetrics};

pub use prometheus::{Encoder, Registry, TextEncoder};
