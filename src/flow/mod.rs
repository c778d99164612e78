//! Flow runners
//!
//! Four ways to run a batch of [`Task`]s:
//!
//! - [`serial`] - one after another, threading each result forward; stops at the first failure
//! - [`parallel`] - all at once, results in input order; fails on the first failure
//! - [`map`] - [`parallel`] over one task per item
//! - [`limit_parallel`] - at most `limit` at once; every task runs, the first failure is reported
//!   alongside the successes
//!
//! The free functions use [`FlowConfig::default`]. Use a [`Flow`] to run
//! with a different configuration.

pub mod bounded;
pub mod map;
pub mod parallel;
pub mod serial;
#[cfg(test)]
mod serial_tests;

pub use bounded::Settled;

use crate::config::FlowConfig;
use crate::continuation::Continuation;
use crate::error::{FlowError, TaskResult};
use crate::task::Task;
use std::future::Future;

/// Runner handle carrying a validated [`FlowConfig`]
///
/// The returned futures own everything they need, so they can be spawned
/// or passed to [`spawn_with_callback`](crate::spawn_with_callback).
#[derive(Debug, Clone, Default)]
pub struct Flow {
    config: FlowConfig,
}

impl Flow {
    pub fn new(config: FlowConfig) -> Result<Self, FlowError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Build a flow from `TASKFLOW_*` environment overrides
    pub fn from_env() -> Result<Self, FlowError> {
        Self::new(FlowConfig::from_env()?)
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn serial<T>(
        &self,
        tasks: Vec<Task<Option<T>, T>>,
    ) -> impl Future<Output = TaskResult<Option<T>>> + Send + 'static
    where
        T: Send + 'static,
    {
        serial::run_serial(tasks)
    }

    pub fn parallel<T>(
        &self,
        tasks: Vec<Task<(), T>>,
    ) -> impl Future<Output = TaskResult<Vec<T>>> + Send + 'static
    where
        T: Send + 'static,
    {
        parallel::run_parallel(tasks, self.config.on_failure)
    }

    pub fn map<A, T, F, Fut>(
        &self,
        items: impl IntoIterator<Item = A>,
        transform: F,
    ) -> impl Future<Output = TaskResult<Vec<T>>> + Send + 'static
    where
        A: Send + 'static,
        T: Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TaskResult<T>> + Send + 'static,
    {
        map::run_map(items.into_iter().collect(), transform, self.config.on_failure)
    }

    /// [`Flow::map`] with a continuation-passing transform
    pub fn map_with_callback<A, T, F>(
        &self,
        items: impl IntoIterator<Item = A>,
        transform: F,
    ) -> impl Future<Output = TaskResult<Vec<T>>> + Send + 'static
    where
        A: Send + 'static,
        T: Send + 'static,
        F: Fn(A, Continuation<T>) + Send + Sync + 'static,
    {
        map::run_map_with_callback(items.into_iter().collect(), transform, self.config.on_failure)
    }

    pub fn limit_parallel<T>(
        &self,
        tasks: Vec<Task<(), T>>,
        limit: usize,
    ) -> impl Future<Output = Settled<T>> + Send + 'static
    where
        T: Send + 'static,
    {
        bounded::run_bounded(tasks, limit)
    }

    /// [`Flow::limit_parallel`] with the configured default limit
    pub fn limit_parallel_default<T>(
        &self,
        tasks: Vec<Task<(), T>>,
    ) -> impl Future<Output = Settled<T>> + Send + 'static
    where
        T: Send + 'static,
    {
        bounded::run_bounded(tasks, self.config.default_limit)
    }

    /// [`Flow::map`] through the bounded runner
    pub fn map_limit<A, T, F, Fut>(
        &self,
        items: impl IntoIterator<Item = A>,
        limit: usize,
        transform: F,
    ) -> impl Future<Output = Settled<T>> + Send + 'static
    where
        A: Send + 'static,
        T: Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TaskResult<T>> + Send + 'static,
    {
        map::run_map_limit(items.into_iter().collect(), limit, transform)
    }
}

/// Run `tasks` one after another; see [`Flow::serial`]
pub async fn serial<T>(tasks: Vec<Task<Option<T>, T>>) -> TaskResult<Option<T>>
where
    T: Send + 'static,
{
    Flow::default().serial(tasks).await
}

/// Run `tasks` concurrently; see [`Flow::parallel`]
pub async fn parallel<T>(tasks: Vec<Task<(), T>>) -> TaskResult<Vec<T>>
where
    T: Send + 'static,
{
    Flow::default().parallel(tasks).await
}

/// Apply `transform` to every item concurrently; see [`Flow::map`]
pub async fn map<A, T, F, Fut>(items: impl IntoIterator<Item = A>, transform: F) -> TaskResult<Vec<T>>
where
    A: Send + 'static,
    T: Send + 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = TaskResult<T>> + Send + 'static,
{
    Flow::default().map(items, transform).await
}

/// Apply a continuation-passing `transform` to every item concurrently
pub async fn map_with_callback<A, T, F>(
    items: impl IntoIterator<Item = A>,
    transform: F,
) -> TaskResult<Vec<T>>
where
    A: Send + 'static,
    T: Send + 'static,
    F: Fn(A, Continuation<T>) + Send + Sync + 'static,
{
    Flow::default().map_with_callback(items, transform).await
}

/// Run `tasks` with at most `limit` in flight; see [`Flow::limit_parallel`]
pub async fn limit_parallel<T>(tasks: Vec<Task<(), T>>, limit: usize) -> Settled<T>
where
    T: Send + 'static,
{
    Flow::default().limit_parallel(tasks, limit).await
}

/// Apply `transform` to every item with at most `limit` in flight
pub async fn map_limit<A, T, F, Fut>(
    items: impl IntoIterator<Item = A>,
    limit: usize,
    transform: F,
) -> Settled<T>
where
    A: Send + 'static,
    T: Send + 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = TaskResult<T>> + Send + 'static,
{
    Flow::default().map_limit(items, limit, transform).await
}
