//! Conversion of task panics into ordinary errors.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::future::{Future, poll_fn};
use std::panic::AssertUnwindSafe;
use std::pin::pin;
use std::sync::Once;

use futures::FutureExt;
use thiserror::Error;
use tracing::warn;

use crate::error::{BatchError, BoxError};

/// A panic caught at a task boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("panic recovered: {message}\n{stack}")]
pub struct PanicError {
    message: String,
    stack: String,
}

impl PanicError {
    pub fn new(message: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: stack.into(),
        }
    }

    /// Builds the error from an unwind payload, capturing the current stack.
    pub fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        Self::new(payload_message(payload), Backtrace::force_capture().to_string())
    }

    /// Like [`from_payload`](Self::from_payload), but prefers the stack the panic hook
    /// recorded on this thread while the panicking frame was still live.
    pub(crate) fn from_unwind(payload: Box<dyn Any + Send>) -> Self {
        let stack = CAPTURED
            .with(|slot| slot.borrow_mut().take())
            .unwrap_or_else(|| Backtrace::force_capture().to_string());
        Self::new(payload_message(payload), stack)
    }

    /// The panic message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Stack snapshot taken where the panic was contained.
    pub fn stack(&self) -> &str {
        &self.stack
    }
}

fn payload_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(s) => *s,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(s) => (*s).to_string(),
            Err(_) => "non-string panic payload".to_string(),
        },
    }
}

thread_local! {
    /// Depth of [`contain`] polls on this thread.
    static ARMED: Cell<usize> = const { Cell::new(0) };
    static CAPTURED: RefCell<Option<String>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

/// Chains a hook that snapshots the stack of panics raised inside [`contain`]; other
/// panics go straight to the previous hook.
fn install_hook() {
    HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            if ARMED.with(Cell::get) > 0 {
                let stack = Backtrace::force_capture().to_string();
                CAPTURED.with(|slot| *slot.borrow_mut() = Some(stack));
            }
            previous(info);
        }));
    });
}

struct Armed;

impl Armed {
    fn enter() -> Self {
        ARMED.with(|depth| depth.set(depth.get() + 1));
        Armed
    }
}

impl Drop for Armed {
    fn drop(&mut self) {
        ARMED.with(|depth| depth.set(depth.get() - 1));
    }
}

/// Polls `task` to completion, turning a panic into [`BatchError::Panicked`]
/// and a returned error into [`BatchError::Task`].
pub async fn contain<F>(task: F) -> Result<(), BatchError>
where
    F: Future<Output = Result<(), BoxError>>,
{
    install_hook();
    let mut task = pin!(task);
    let armed = poll_fn(move |cx| {
        let _armed = Armed::enter();
        task.as_mut().poll(cx)
    });

    match AssertUnwindSafe(armed).catch_unwind().await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(BatchError::Task(err)),
        Err(payload) => {
            let err = PanicError::from_unwind(payload);
            warn!(message = err.message(), "task panicked; converted to error");
            Err(BatchError::Panicked(err))
        }
    }
}
