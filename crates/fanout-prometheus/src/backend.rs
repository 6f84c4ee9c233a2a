use std::time::Duration;

use fanout_core::{BatchOutcome, MetricsBackend, TaskOutcome};
use prometheus::proto::MetricFamily;
use prometheus::{
    HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Executor metrics recorded into a dedicated [`Registry`]. Clones share the same series.
#[derive(Clone)]
pub struct PrometheusMetrics {
    registry: Registry,
    batches_started: IntCounterVec,
    tasks_submitted: IntCounterVec,
    tasks_finished: IntCounterVec,
    batch_duration: HistogramVec,
    in_flight: IntGaugeVec,
}

impl PrometheusMetrics {
    pub fn new() -> Result<Self, MetricsError> {
        Self::with_registry(Registry::new())
    }

    /// Registers the fanout series into `registry`. Fails if they are already registered there.
    pub fn with_registry(registry: Registry) -> Result<Self, MetricsError> {
        let batches_started = IntCounterVec::new(
            Opts::new("fanout_batches_started_total", "Batches submitted to an executor"),
            &["executor"],
        )?;
        let tasks_submitted = IntCounterVec::new(
            Opts::new("fanout_tasks_submitted_total", "Tasks contained in submitted batches"),
            &["executor"],
        )?;
        let tasks_finished = IntCounterVec::new(
            Opts::new("fanout_tasks_finished_total", "Tasks that returned, by outcome"),
            &["executor", "outcome"],
        )?;
        let batch_duration = HistogramVec::new(
            HistogramOpts::new("fanout_batch_duration_seconds", "Wall time of a batch, by outcome")
                .buckets(prometheus::exponential_buckets(0.001, 4.0, 10)?),
            &["executor", "outcome"],
        )?;
        let in_flight = IntGaugeVec::new(
            Opts::new("fanout_tasks_in_flight", "Admitted tasks that have not returned yet"),
            &["executor"],
        )?;

        registry.register(Box::new(batches_started.clone()))?;
        registry.register(Box::new(tasks_submitted.clone()))?;
        registry.register(Box::new(tasks_finished.clone()))?;
        registry.register(Box::new(batch_duration.clone()))?;
        registry.register(Box::new(in_flight.clone()))?;

        Ok(Self {
            registry,
            batches_started,
            tasks_submitted,
            tasks_finished,
            batch_duration,
            in_flight,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Current values in the Prometheus text exposition format.
    pub fn encode_text(&self) -> Result<String, MetricsError> {
        Ok(TextEncoder::new().encode_to_string(&self.gather())?)
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn record_batch_started(&self, executor: &str, tasks: usize) {
        self.batches_started.with_label_values(&[executor]).inc();
        self.tasks_submitted.with_label_values(&[executor]).inc_by(tasks as u64);
    }

    fn record_task_finished(&self, executor: &str, outcome: TaskOutcome) {
        self.tasks_finished
            .with_label_values(&[executor, outcome.as_str()])
            .inc();
    }

    fn record_batch_finished(&self, executor: &str, outcome: BatchOutcome, elapsed: Duration) {
        self.batch_duration
            .with_label_values(&[executor, outcome.as_str()])
            .observe(elapsed.as_secs_f64());
    }

    fn record_task_admitted(&self, executor: &str) {
        self.in_flight.with_label_values(&[executor]).inc();
    }

    fn record_task_released(&self, executor: &str) {
        self.in_flight.with_label_values(&[executor]).dec();
    }
}
