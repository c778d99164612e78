//! Sync-to-async adapter
//!
//! [`make_async`] wraps a blocking or pure function so it can be scheduled
//! like any other task. The function runs on tokio's blocking pool, never
//! inside the caller's stack frame, so a slow function cannot hold up the
//! launches of a concurrent batch.

use crate::continuation::Continuation;
use crate::error::{FlowError, TaskResult};
use crate::task::Task;
use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{trace, warn};

/// Wrap `func` as an asynchronous, task-shaped callable
///
/// An `Err` returned by `func` becomes the failed completion. A panic
/// inside `func` is caught and reported as [`FlowError::Panicked`]. There
/// are no retries.
pub fn make_async<F, I, T>(func: F) -> SyncTask<F>
where
    F: Fn(I) -> TaskResult<T> + Send + Sync + 'static,
{
    SyncTask {
        func: Arc::new(func),
        label: None,
    }
}

/// A blocking function adapted to the completion protocol
pub struct SyncTask<F> {
    func: Arc<F>,
    label: Option<String>,
}

impl<F> Clone for SyncTask<F> {
    fn clone(&self) -> Self {
        Self {
            func: Arc::clone(&self.func),
            label: self.label.clone(),
        }
    }
}

impl<F> fmt::Debug for SyncTask<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncTask")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl<F> SyncTask<F> {
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Schedule `func(input)`; nothing runs until the future is polled
    pub fn call<I, T>(&self, input: I) -> BoxFuture<'static, TaskResult<T>>
    where
        F: Fn(I) -> TaskResult<T> + Send + Sync + 'static,
        I: Send + 'static,
        T: Send + 'static,
    {
        let func = Arc::clone(&self.func);
        let label = self.label.clone();
        async move {
            trace!("Deferring sync function {:?} to the blocking pool", label);
            match tokio::task::spawn_blocking(move || func(input)).await {
                Ok(result) => result,
                Err(join_error) if join_error.is_panic() => {
                    let payload = join_error.into_panic();
                    let error = FlowError::panicked(label, &*payload);
                    warn!("{}", error);
                    Err(error.into())
                }
                Err(join_error) => Err(join_error.into()),
            }
        }
        .boxed()
    }

    /// Schedule `func(input)` and deliver the outcome to `next`
    pub fn call_with<I, T>(&self, input: I, next: Continuation<T>) -> JoinHandle<()>
    where
        F: Fn(I) -> TaskResult<T> + Send + Sync + 'static,
        I: Send + 'static,
        T: Send + 'static,
    {
        let completion = self.call(input);
        tokio::spawn(async move { next.complete(completion.await) })
    }

    /// A task that calls `func` with whatever input the runner passes
    pub fn into_task<I, T>(self) -> Task<I, T>
    where
        F: Fn(I) -> TaskResult<T> + Send + Sync + 'static,
        I: Send + 'static,
        T: Send + 'static,
    {
        let label = self.label.clone();
        let task = Task::new(move |input| self.call(input));
        match label {
            Some(label) => task.with_label(label),
            None => task,
        }
    }

    /// An input-less task calling `func(input)`
    pub fn bind<I, T>(&self, input: I) -> Task<(), T>
    where
        F: Fn(I) -> TaskResult<T> + Send + Sync + 'static,
        I: Send + 'static,
        T: Send + 'static,
    {
        let task = Task::from_future(self.call(input));
        match &self.label {
            Some(label) => task.with_label(label.clone()),
            None => task,
        }
    }
}
