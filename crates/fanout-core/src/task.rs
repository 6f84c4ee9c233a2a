use std::borrow::Cow;
use std::fmt;
use std::future::Future;

use futures::future::BoxFuture;

use crate::context::Context;
use crate::error::BoxError;

type TaskBody = Box<dyn FnOnce(Context) -> BoxFuture<'static, Result<(), BoxError>> + Send>;

/// One-shot unit of work: receives the batch context, returns success or an error.
///
/// A task runs at most once; it is consumed by the executor that runs it.
pub struct Task {
    name: Cow<'static, str>,
    body: TaskBody,
}

impl Task {
    pub fn new<F, Fut>(body: F) -> Self
    where
        F: FnOnce(Context) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        Self {
            name: Cow::Borrowed("task"),
            body: Box::new(move |ctx| Box::pin(body(ctx))),
        }
    }

    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the task body with `ctx`.
    pub async fn run(self, ctx: Context) -> Result<(), BoxError> {
        (self.body)(ctx).await
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn runs_body_once_with_context() {
        let task = Task::new(|ctx: Context| async move {
            if ctx.is_done() {
                return Err("done".into());
            }
            Ok(())
        })
        .with_name("probe");

        assert_eq!(task.name(), "probe");
        assert!(task.run(Context::background()).await.is_ok());
    }

    #[tokio::test]
    async fn observes_cancelled_context() {
        let ctx = Context::background();
        ctx.cancel();
        let task = Task::new(|ctx: Context| async move {
            match ctx.err() {
                Some(e) => Err(e.into()),
                None => Ok(()),
            }
        });
        let err = task.run(ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "context canceled");
    }
}
