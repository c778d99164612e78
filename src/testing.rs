//! Testing utilities
//!
//! [`ConcurrencyProbe`] instruments tasks so tests can assert how many ran,
//! how many were in flight at once, and in which order they finished.

use crate::task::Task;
use anyhow::anyhow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
struct ProbeState {
    running: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
    finished: Mutex<Vec<String>>,
}

/// Shared counters for instrumented tasks
#[derive(Debug, Clone, Default)]
pub struct ConcurrencyProbe {
    state: Arc<ProbeState>,
}

/// Marks one instrumented task as running until dropped
#[derive(Debug)]
pub struct ProbeGuard {
    state: Arc<ProbeState>,
    name: String,
}

impl Drop for ProbeGuard {
    fn drop(&mut self) {
        self.state.running.fetch_sub(1, Ordering::SeqCst);
        if let Ok(mut finished) = self.state.finished.lock() {
            finished.push(std::mem::take(&mut self.name));
        }
    }
}

impl ConcurrencyProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a task start; the returned guard records its end
    pub fn enter(&self, name: impl Into<String>) -> ProbeGuard {
        self.state.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.state.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.peak.fetch_max(running, Ordering::SeqCst);
        ProbeGuard {
            state: Arc::clone(&self.state),
            name: name.into(),
        }
    }

    /// Tasks currently between `enter` and guard drop
    pub fn running(&self) -> usize {
        self.state.running.load(Ordering::SeqCst)
    }

    /// Highest `running` value observed
    pub fn peak(&self) -> usize {
        self.state.peak.load(Ordering::SeqCst)
    }

    /// Number of `enter` calls
    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    /// Names of finished tasks in the order they finished
    pub fn finished(&self) -> Vec<String> {
        self.state
            .finished
            .lock()
            .map(|finished| finished.clone())
            .unwrap_or_default()
    }

    /// A task that sleeps for `delay` and then succeeds with `value`
    pub fn sleeper<T>(&self, name: &str, delay: Duration, value: T) -> Task<(), T>
    where
        T: Send + 'static,
    {
        let probe = self.clone();
        let name = name.to_string();
        Task::new(move |()| async move {
            let _guard = probe.enter(name);
            tokio::time::sleep(delay).await;
            Ok(value)
        })
    }

    /// A task that sleeps for `delay` and then fails with `message`
    pub fn failing<T>(&self, name: &str, delay: Duration, message: &str) -> Task<(), T>
    where
        T: Send + 'static,
    {
        let probe = self.clone();
        let name = name.to_string();
        let message = message.to_string();
        Task::new(move |()| async move {
            let _guard = probe.enter(name);
            tokio::time::sleep(delay).await;
            Err(anyhow!(message))
        })
    }
}

/// Install a test subscriber honoring `RUST_LOG`; later calls are no-ops
#[cfg(test)]
pub(crate) fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
