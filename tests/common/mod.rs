//! Common test utilities and helpers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use taskflow::TaskResult;

/// Install a subscriber honoring `RUST_LOG`; repeated calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Records every outcome handed to an outer callback
#[derive(Clone, Default)]
pub struct CallbackRecorder<T> {
    calls: Arc<AtomicUsize>,
    outcomes: Arc<Mutex<Vec<T>>>,
}

impl<T: Send + 'static> CallbackRecorder<T> {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            outcomes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A callback that records its single invocation
    pub fn callback(&self) -> impl FnOnce(T) + Send + 'static {
        let calls = self.calls.clone();
        let outcomes = self.outcomes.clone();
        move |outcome| {
            calls.fetch_add(1, Ordering::SeqCst);
            outcomes.lock().unwrap().push(outcome);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn take(&self) -> Vec<T> {
        std::mem::take(&mut *self.outcomes.lock().unwrap())
    }
}

/// Shorthand for the error message of a failed completion
pub fn error_message<T: std::fmt::Debug>(result: TaskResult<T>) -> String {
    result.unwrap_err().to_string()
}
