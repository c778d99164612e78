//! Serial runner
//!
//! Runs tasks one after another, threading each result into the next task.

use crate::error::TaskResult;
use crate::task::Task;
use tracing::{debug, trace, warn};

/// Run `tasks` in order, stopping at the first failure
///
/// The first task receives `None`; every later task receives the value
/// produced by its predecessor. Tasks after a failing step are dropped
/// without being invoked.
pub(crate) async fn run_serial<T>(tasks: Vec<Task<Option<T>, T>>) -> TaskResult<Option<T>>
where
    T: Send + 'static,
{
    let total = tasks.len();
    if total == 0 {
        debug!("No tasks to run serially");
        return Ok(None);
    }

    debug!("Running {} tasks serially", total);

    let mut carried: Option<T> = None;
    for (index, task) in tasks.into_iter().enumerate() {
        let label = task.label().map(str::to_string);
        trace!("Starting serial step {}/{} ({:?})", index + 1, total, label);

        match task.invoke(carried.take()).await {
            Ok(value) => carried = Some(value),
            Err(error) => {
                warn!(
                    "Serial step {}/{} ({:?}) failed, skipping {} remaining: {}",
                    index + 1,
                    total,
                    label,
                    total - index - 1,
                    error
                );
                return Err(error);
            }
        }
    }

    debug!("Serial chain of {} tasks completed", total);
    Ok(carried)
}
