//! Parallel runner
//!
//! Launches every task at once and collects the results in input order.

use crate::config::SiblingPolicy;
use crate::error::TaskResult;
use crate::task::Task;
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, trace, warn};

type Indexed<T> = BoxFuture<'static, (usize, TaskResult<T>)>;

/// Run all `tasks` concurrently
///
/// Succeeds with one value per task, positioned as the tasks were given.
/// The first failure is returned as soon as it arrives; what happens to the
/// siblings still running is decided by `on_failure`.
pub(crate) async fn run_parallel<T>(
    tasks: Vec<Task<(), T>>,
    on_failure: SiblingPolicy,
) -> TaskResult<Vec<T>>
where
    T: Send + 'static,
{
    let total = tasks.len();
    if total == 0 {
        debug!("No tasks to run in parallel");
        return Ok(Vec::new());
    }

    debug!("Running {} tasks in parallel", total);

    let mut in_flight: FuturesUnordered<Indexed<T>> = tasks
        .into_iter()
        .enumerate()
        .map(|(index, task)| {
            trace!("Launching parallel task {} ({:?})", index, task.label());
            let completion = task.invoke(());
            async move { (index, completion.await) }.boxed()
        })
        .collect();

    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(total).collect();

    let mut failure = None;
    while let Some((index, outcome)) = in_flight.next().await {
        match outcome {
            Ok(value) => {
                trace!("Parallel task {} completed", index);
                slots[index] = Some(value);
            }
            Err(error) => {
                warn!("Parallel task {} failed: {}", index, error);
                failure = Some(error);
                break;
            }
        }
    }

    if let Some(error) = failure {
        settle_siblings(in_flight, on_failure);
        return Err(error);
    }

    let results: Vec<T> = slots.into_iter().flatten().collect();
    debug_assert_eq!(results.len(), total);
    debug!("Parallel batch of {} tasks completed", total);
    Ok(results)
}

/// Dispose of tasks still running after a failure
fn settle_siblings<T>(in_flight: FuturesUnordered<Indexed<T>>, on_failure: SiblingPolicy)
where
    T: Send + 'static,
{
    if in_flight.is_empty() {
        return;
    }

    let handle = match (on_failure, tokio::runtime::Handle::try_current()) {
        (SiblingPolicy::Detach, Ok(handle)) => handle,
        (SiblingPolicy::Detach, Err(_)) => {
            warn!(
                "No tokio runtime to detach {} sibling tasks onto; dropping them",
                in_flight.len()
            );
            return;
        }
        (SiblingPolicy::Abort, _) => {
            debug!("Aborting {} sibling tasks after failure", in_flight.len());
            return;
        }
    };

    debug!(
        "Detaching {} sibling tasks; their outcomes will be discarded",
        in_flight.len()
    );
    handle.spawn(async move {
        let mut in_flight = in_flight;
        while let Some((index, outcome)) = in_flight.next().await {
            trace!(
                "Discarding outcome of detached task {} (ok: {})",
                index,
                outcome.is_ok()
            );
        }
    });
}
