//! Single-use units of asynchronous work
//!
//! A [`Task`] is invoked at most once: [`Task::invoke`] consumes it and
//! returns the future of its completion. Runners own every task they are
//! given and drop it after the single invocation.

use crate::continuation::{self, Continuation};
use crate::error::TaskResult;
use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;

type Body<I, T> = Box<dyn FnOnce(I, Option<String>) -> BoxFuture<'static, TaskResult<T>> + Send>;

/// An opaque unit of asynchronous work taking an input of type `I`
///
/// Tasks handed to [`serial`](crate::serial) take `Option<T>`: the first
/// step receives `None`, every later step receives the previous result.
/// Tasks handed to the fan-out runners take `()`.
pub struct Task<I, T> {
    label: Option<String>,
    body: Body<I, T>,
}

impl<I, T> Task<I, T>
where
    I: Send + 'static,
    T: Send + 'static,
{
    /// Create a task from a future-returning body
    pub fn new<F, Fut>(body: F) -> Self
    where
        F: FnOnce(I) -> Fut + Send + 'static,
        Fut: Future<Output = TaskResult<T>> + Send + 'static,
    {
        Self {
            label: None,
            body: Box::new(move |input, _label| body(input).boxed()),
        }
    }

    /// Create a task from a continuation-passing body
    ///
    /// The body runs as soon as the task is invoked and must eventually
    /// complete the continuation, from any thread. Dropping the
    /// continuation instead reports [`FlowError::Abandoned`](crate::FlowError::Abandoned).
    pub fn from_callback<F>(body: F) -> Self
    where
        F: FnOnce(I, Continuation<T>) + Send + 'static,
    {
        Self {
            label: None,
            body: Box::new(move |input, label| {
                let (next, completion) = continuation::labelled_channel(label);
                body(input, next);
                completion
            }),
        }
    }

    /// Attach a label used in log output and library errors
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Invoke the task, consuming it
    pub fn invoke(self, input: I) -> BoxFuture<'static, TaskResult<T>> {
        (self.body)(input, self.label)
    }
}

impl<T> Task<(), T>
where
    T: Send + 'static,
{
    /// Create an input-less task from a future
    pub fn from_future<Fut>(future: Fut) -> Self
    where
        Fut: Future<Output = TaskResult<T>> + Send + 'static,
    {
        Self::new(move |()| future)
    }
}

impl<I, T> fmt::Debug for Task<I, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("label", &self.label).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlowError;
    use anyhow::anyhow;

    #[tokio::test]
    async fn test_new_task_receives_input() {
        let task = Task::new(|x: i32| async move { Ok(x * 2) });
        assert_eq!(task.invoke(21).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_callback_task_completes_from_spawned_thread() {
        let task = Task::from_callback(|x: i32, next: Continuation<i32>| {
            std::thread::spawn(move || next.succeed(x + 1));
        });
        assert_eq!(task.invoke(1).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_callback_task_reports_failure() {
        let task: Task<(), i32> =
            Task::from_callback(|(), next| next.fail(anyhow!("fatal error")));
        let err = task.invoke(()).await.unwrap_err();
        assert_eq!(err.to_string(), "fatal error");
    }

    #[tokio::test]
    async fn test_dropped_continuation_reports_abandoned_with_label() {
        let task: Task<(), i32> = Task::from_callback(|(), next| drop(next)).with_label("leaky");
        assert_eq!(task.label(), Some("leaky"));

        let err = task.invoke(()).await.unwrap_err();
        match err.downcast_ref::<FlowError>() {
            Some(FlowError::Abandoned { label }) => assert_eq!(label.as_deref(), Some("leaky")),
            other => panic!("expected Abandoned, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_callback_body_runs_at_invocation() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let task: Task<(), ()> = Task::from_callback(move |(), next| {
            flag.store(true, Ordering::SeqCst);
            next.succeed(());
        });

        assert!(!ran.load(Ordering::SeqCst));
        let completion = task.invoke(());
        assert!(ran.load(Ordering::SeqCst));
        completion.await.unwrap();
    }
}
