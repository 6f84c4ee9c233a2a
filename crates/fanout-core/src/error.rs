use thiserror::Error;

use crate::panic::PanicError;

/// Error a user transform may return; anything `Into<BoxError>` is accepted.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    #[error("context canceled")]
    Canceled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Faults of the executor itself, as opposed to failures of user tasks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("executor is closed")]
    Closed,
    #[error("task was aborted by the runtime before completing")]
    Aborted,
    #[error("batch output is still shared with a running task")]
    Detached,
}

/// Outcome of a failed batch. Exactly one cause is reported.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("task failed: {0}")]
    Task(#[source] BoxError),

    #[error(transparent)]
    Panicked(#[from] PanicError),

    #[error("{source}{}", joined_panic(.panic))]
    Canceled {
        #[source]
        source: ContextError,
        panic: Option<PanicError>,
    },

    #[error("executor error: {0}")]
    Executor(#[from] ExecutorError),
}

impl BatchError {
    pub(crate) fn canceled(source: ContextError) -> Self {
        BatchError::Canceled {
            source,
            panic: None,
        }
    }

    /// The context error, when the batch ended because its context was done.
    pub fn context_error(&self) -> Option<ContextError> {
        match self {
            BatchError::Canceled { source, .. } => Some(*source),
            _ => None,
        }
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, BatchError::Canceled { .. })
    }

    pub fn is_panic(&self) -> bool {
        matches!(
            self,
            BatchError::Panicked(_) | BatchError::Canceled { panic: Some(_), .. }
        )
    }
}

impl From<ContextError> for BatchError {
    fn from(source: ContextError) -> Self {
        BatchError::canceled(source)
    }
}

fn joined_panic(panic: &Option<PanicError>) -> String {
    match panic {
        Some(p) => format!("; {p}"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_error_keeps_source_text() {
        let err = BatchError::Task("boom".into());
        assert_eq!(err.to_string(), "task failed: boom");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn cancellation_joins_recovered_panic() {
        let err = BatchError::Canceled {
            source: ContextError::Canceled,
            panic: Some(PanicError::new("index out of bounds", String::new())),
        };
        let text = err.to_string();
        assert!(text.starts_with("context canceled; panic recovered"));
        assert!(text.contains("index out of bounds"));
        assert!(err.is_panic());
        assert_eq!(err.context_error(), Some(ContextError::Canceled));
    }

    #[test]
    fn plain_cancellation() {
        let err: BatchError = ContextError::DeadlineExceeded.into();
        assert_eq!(err.to_string(), "context deadline exceeded");
        assert!(err.is_canceled());
        assert!(!err.is_panic());
    }
}
