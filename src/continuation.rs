//! The completion protocol
//!
//! A [`Continuation`] is the handle a callback-style task completes exactly
//! once. Completing consumes the handle, so a second completion does not
//! compile. The waiting side is a plain future resolving to the delivered
//! [`TaskResult`].

use crate::error::{FlowError, TaskError, TaskResult};
use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{trace, warn};

/// Single-use completion handle passed to callback-style task bodies
pub struct Continuation<T> {
    sender: oneshot::Sender<TaskResult<T>>,
}

impl<T> Continuation<T> {
    /// Deliver the completion signal
    pub fn complete(self, result: TaskResult<T>) {
        if self.sender.send(result).is_err() {
            // Only happens when the awaiting runner was dropped (aborted siblings).
            trace!("Completion delivered after the runner stopped waiting");
        }
    }

    /// Deliver a successful completion
    pub fn succeed(self, value: T) {
        self.complete(Ok(value));
    }

    /// Deliver a failed completion
    pub fn fail(self, error: impl Into<TaskError>) {
        self.complete(Err(error.into()));
    }
}

impl<T> fmt::Debug for Continuation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuation")
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

/// Create a continuation and the future that resolves once it is completed
pub fn channel<T>() -> (Continuation<T>, BoxFuture<'static, TaskResult<T>>)
where
    T: Send + 'static,
{
    labelled_channel(None)
}

pub(crate) fn labelled_channel<T>(
    label: Option<String>,
) -> (Continuation<T>, BoxFuture<'static, TaskResult<T>>)
where
    T: Send + 'static,
{
    let (sender, receiver) = oneshot::channel();
    let completion = async move {
        match receiver.await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "Task {} dropped its continuation without completing",
                    label.as_deref().unwrap_or("<unnamed>")
                );
                Err(FlowError::abandoned(label).into())
            }
        }
    };
    (Continuation { sender }, completion.boxed())
}

/// Drive a flow on the tokio runtime and hand its outcome to `callback`
///
/// The callback runs exactly once, after the flow has finished. This is the
/// `runner(tasks, callback)` shape of the completion protocol.
pub fn spawn_with_callback<Fut, C>(flow: Fut, callback: C) -> JoinHandle<()>
where
    Fut: Future + Send + 'static,
    Fut::Output: Send + 'static,
    C: FnOnce(Fut::Output) + Send + 'static,
{
    tokio::spawn(async move {
        let outcome = flow.await;
        callback(outcome);
    })
}
