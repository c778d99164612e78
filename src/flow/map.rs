//! Mapper
//!
//! Binds each item to the transform as a task and hands the batch to the
//! parallel or bounded runner.

use crate::config::SiblingPolicy;
use crate::continuation::Continuation;
use crate::error::TaskResult;
use crate::flow::bounded::{run_bounded, Settled};
use crate::flow::parallel::run_parallel;
use crate::task::Task;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// One task per item; the transform is only called when the task is invoked
fn bind_items<A, T, F, Fut>(items: Vec<A>, transform: F) -> Vec<Task<(), T>>
where
    A: Send + 'static,
    T: Send + 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = TaskResult<T>> + Send + 'static,
{
    let transform = Arc::new(transform);
    items
        .into_iter()
        .map(|item| {
            let transform = Arc::clone(&transform);
            Task::new(move |()| transform(item))
        })
        .collect()
}

pub(crate) async fn run_map<A, T, F, Fut>(
    items: Vec<A>,
    transform: F,
    on_failure: SiblingPolicy,
) -> TaskResult<Vec<T>>
where
    A: Send + 'static,
    T: Send + 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = TaskResult<T>> + Send + 'static,
{
    if items.is_empty() {
        debug!("No items to map");
        return Ok(Vec::new());
    }

    debug!("Mapping {} items", items.len());
    run_parallel(bind_items(items, transform), on_failure).await
}

pub(crate) async fn run_map_with_callback<A, T, F>(
    items: Vec<A>,
    transform: F,
    on_failure: SiblingPolicy,
) -> TaskResult<Vec<T>>
where
    A: Send + 'static,
    T: Send + 'static,
    F: Fn(A, Continuation<T>) + Send + Sync + 'static,
{
    if items.is_empty() {
        debug!("No items to map");
        return Ok(Vec::new());
    }

    debug!("Mapping {} items through a callback transform", items.len());
    let transform = Arc::new(transform);
    let tasks = items
        .into_iter()
        .map(|item| {
            let transform = Arc::clone(&transform);
            Task::from_callback(move |(), next| transform(item, next))
        })
        .collect();
    run_parallel(tasks, on_failure).await
}

pub(crate) async fn run_map_limit<A, T, F, Fut>(
    items: Vec<A>,
    limit: usize,
    transform: F,
) -> Settled<T>
where
    A: Send + 'static,
    T: Send + 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = TaskResult<T>> + Send + 'static,
{
    debug!("Mapping {} items with limit {}", items.len(), limit);
    run_bounded(bind_items(items, transform), limit).await
}
