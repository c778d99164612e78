//! Bounded parallel runner
//!
//! Admits at most `limit` tasks at a time and launches the next task from
//! the input cursor as soon as a running one completes. Unlike
//! [`parallel`](crate::parallel), a failure does not stop the batch: the
//! first error is remembered, every task still runs exactly once, and the
//! outcome is reported after the last completion.
//!
//! All bookkeeping lives in a [`Ledger`] owned by a single invocation. The
//! ledger is only touched from the loop that polls the in-flight tasks, so
//! completions never race each other and no lock is needed.

use crate::error::{TaskError, TaskResult};
use crate::task::Task;
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, trace, warn};

/// Lifecycle of one bounded invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    /// Tasks remain behind the cursor; free slots are filled on entry
    Admitting,
    /// The cursor is exhausted; waiting for in-flight tasks
    Draining,
    /// Every task has completed
    Done,
}

/// Concurrency ledger of one bounded invocation
#[derive(Debug)]
pub(crate) struct Ledger<T> {
    total: usize,
    limit: usize,
    cursor: usize,
    running: usize,
    completed: usize,
    peak_running: usize,
    first_error: Option<TaskError>,
    entries: Vec<(usize, T)>,
    phase: Phase,
}

impl<T> Ledger<T> {
    pub(crate) fn new(total: usize, limit: usize) -> Self {
        Self {
            total,
            limit,
            cursor: 0,
            running: 0,
            completed: 0,
            peak_running: 0,
            first_error: None,
            entries: Vec::with_capacity(total),
            phase: if total == 0 { Phase::Done } else { Phase::Admitting },
        }
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn running(&self) -> usize {
        self.running
    }

    /// Claim the next cursor position if a slot is free
    pub(crate) fn admit(&mut self) -> Option<usize> {
        if self.phase != Phase::Admitting || self.running >= self.limit {
            return None;
        }

        let index = self.cursor;
        self.cursor += 1;
        self.running += 1;
        self.peak_running = self.peak_running.max(self.running);

        if self.cursor == self.total {
            self.phase = Phase::Draining;
        }
        Some(index)
    }

    /// Record the completion of the task launched from position `index`
    pub(crate) fn settle(&mut self, index: usize, outcome: TaskResult<T>) {
        debug_assert!(self.running > 0, "settle without a running task");
        self.running -= 1;
        self.completed += 1;

        match outcome {
            Ok(value) => self.entries.push((index, value)),
            Err(error) if self.first_error.is_none() => {
                warn!("Bounded task {} failed: {}", index, error);
                self.first_error = Some(error);
            }
            Err(error) => {
                debug!("Absorbing later failure of bounded task {}: {}", index, error);
            }
        }

        if self.completed == self.total {
            self.phase = Phase::Done;
        }
    }

    fn into_settled(self) -> Settled<T> {
        Settled {
            entries: self.entries,
            first_error: self.first_error,
            total: self.total,
            completed: self.completed,
            peak_running: self.peak_running,
        }
    }
}

/// Outcome of a bounded batch
///
/// Holds the first error observed (if any) alongside every successful
/// value. Values are kept in completion order, each tagged with the input
/// position of the task that produced it.
#[derive(Debug)]
pub struct Settled<T> {
    entries: Vec<(usize, T)>,
    first_error: Option<TaskError>,
    total: usize,
    completed: usize,
    peak_running: usize,
}

impl<T> Settled<T> {
    fn empty() -> Self {
        Self {
            entries: Vec::new(),
            first_error: None,
            total: 0,
            completed: 0,
            peak_running: 0,
        }
    }

    pub fn first_error(&self) -> Option<&TaskError> {
        self.first_error.as_ref()
    }

    pub fn is_ok(&self) -> bool {
        self.first_error.is_none()
    }

    /// Successful values in completion order
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, value)| value)
    }

    /// `(input position, value)` pairs in completion order
    pub fn entries(&self) -> &[(usize, T)] {
        &self.entries
    }

    /// Number of tasks the batch was given
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of tasks that completed, successfully or not
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Highest number of tasks that were in flight at once
    pub fn peak_running(&self) -> usize {
        self.peak_running
    }

    /// Successful values in completion order
    pub fn into_values(self) -> Vec<T> {
        self.entries.into_iter().map(|(_, value)| value).collect()
    }

    /// Successful values reordered by input position
    pub fn into_input_order(mut self) -> Vec<T> {
        self.entries.sort_by_key(|(index, _)| *index);
        self.into_values()
    }

    /// Split into the two slots of the completion protocol
    pub fn into_parts(self) -> (Option<TaskError>, Vec<T>) {
        let error = self.first_error;
        let values = self.entries.into_iter().map(|(_, value)| value).collect();
        (error, values)
    }

    /// The first error if one occurred, otherwise the values in completion order
    pub fn into_result(self) -> TaskResult<Vec<T>> {
        match self.into_parts() {
            (Some(error), _) => Err(error),
            (None, values) => Ok(values),
        }
    }
}

/// Run `tasks` with at most `limit` in flight at once
///
/// `limit == 0` launches nothing. When `limit` covers every task, all of
/// them start immediately and the outcome follows the parallel contract:
/// values in input order, and no values at all if any task failed.
pub(crate) async fn run_bounded<T>(tasks: Vec<Task<(), T>>, limit: usize) -> Settled<T>
where
    T: Send + 'static,
{
    let total = tasks.len();
    if total == 0 || limit == 0 {
        debug!(
            "Bounded batch has nothing to launch ({} tasks, limit {})",
            total, limit
        );
        return Settled::empty();
    }

    let unbounded = limit >= total;
    debug!(
        "Running {} tasks with at most {} in flight",
        total,
        limit.min(total)
    );

    let mut ledger = Ledger::new(total, limit);
    let mut pending = tasks.into_iter();
    let mut in_flight = FuturesUnordered::new();

    loop {
        while let Some(index) = ledger.admit() {
            let Some(task) = pending.next() else {
                break;
            };
            trace!(
                "Launching bounded task {} ({:?}), {} running",
                index,
                task.label(),
                ledger.running()
            );
            let completion = task.invoke(());
            in_flight.push(async move { (index, completion.await) });
        }

        if ledger.phase() == Phase::Done {
            break;
        }

        match in_flight.next().await {
            Some((index, outcome)) => {
                trace!("Bounded task {} completed", index);
                ledger.settle(index, outcome);
            }
            None => break,
        }
    }

    let mut settled = ledger.into_settled();
    debug!(
        "Bounded batch finished: {} completed, {} succeeded, peak {} in flight",
        settled.completed,
        settled.entries.len(),
        settled.peak_running
    );

    if unbounded {
        settled.entries.sort_by_key(|(index, _)| *index);
        if settled.first_error.is_some() {
            settled.entries.clear();
        }
    }
    settled
}
