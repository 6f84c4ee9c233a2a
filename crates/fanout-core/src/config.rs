use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

/// Declarative executor settings.
///
/// `max_in_flight` caps how many tasks run at once; zero or a negative value means
/// no explicit cap (bounded only by the runtime). Caps above
/// [`Semaphore::MAX_PERMITS`] are clamped to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExecutorConfig {
    /// Label used in logs and metrics.
    pub name: String,
    pub max_in_flight: isize,
}

impl ExecutorConfig {
    pub fn new(name: impl Into<String>, max_in_flight: isize) -> Self {
        Self {
            name: name.into(),
            max_in_flight,
        }
    }

    /// The effective cap, `None` when unbounded.
    #[inline]
    pub fn limit(&self) -> Option<usize> {
        (self.max_in_flight > 0)
            .then(|| (self.max_in_flight as usize).min(Semaphore::MAX_PERMITS))
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            max_in_flight: 0,
        }
    }
}
