//! # Taskflow
//!
//! Small asynchronous task-orchestration primitives sharing one completion
//! protocol: every task completes exactly once with a [`TaskResult`].
//!
//! ## Usage
//!
//! ```no_run
//! use taskflow::{limit_parallel, serial, Task};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let total = serial(vec![
//!     Task::new(|_: Option<i32>| async { Ok(1) }),
//!     Task::new(|x: Option<i32>| async move { Ok(x.unwrap_or_default() * 2) }),
//!     Task::new(|x: Option<i32>| async move { Ok(x.unwrap_or_default() + 3) }),
//! ])
//! .await?;
//! assert_eq!(total, Some(5));
//!
//! let tasks = (0..8)
//!     .map(|i| Task::from_future(async move { Ok(i) }))
//!     .collect();
//! let settled = limit_parallel(tasks, 2).await;
//! assert_eq!(settled.into_input_order(), (0..8).collect::<Vec<_>>());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - `task` - Single-use units of asynchronous work
//! - `continuation` - The completion handle given to callback-style tasks
//! - `flow` - Serial, parallel, map, and bounded parallel runners
//! - `adapter` - Scheduling blocking functions as tasks
//! - `config` - Runner configuration and environment overrides
//! - `error` - The opaque task error and library-detected failures
//! - `testing` - Probes for instrumenting tasks in tests
pub mod adapter;
pub mod config;
pub mod continuation;
pub mod error;
pub mod flow;
pub mod task;

pub mod testing;

pub use adapter::{make_async, SyncTask};
pub use config::{FlowConfig, SiblingPolicy};
pub use continuation::{spawn_with_callback, Continuation};
pub use error::{FlowError, TaskError, TaskResult};
pub use flow::{
    limit_parallel, map, map_limit, map_with_callback, parallel, serial, Flow, Settled,
};
pub use task::Task;
