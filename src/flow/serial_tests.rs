//! Tests for the serial runner

use super::serial::run_serial;
use crate::continuation::Continuation;
use crate::error::TaskResult;
use crate::task::Task;
use crate::testing::init_test_tracing;
use anyhow::anyhow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

fn step<F>(f: F) -> Task<Option<i32>, i32>
where
    F: FnOnce(Option<i32>) -> TaskResult<i32> + Send + 'static,
{
    Task::new(move |input| async move { f(input) })
}

#[tokio::test]
async fn test_empty_chain_returns_none() {
    init_test_tracing();
    let result = run_serial::<i32>(Vec::new()).await.unwrap();
    assert_eq!(result, None);
}

#[tokio::test]
async fn test_chain_composes_results() {
    let tasks = vec![
        step(|_| Ok(1)),
        step(|x| Ok(2 * x.unwrap())),
        step(|x| Ok(x.unwrap() + 3)),
    ];
    assert_eq!(run_serial(tasks).await.unwrap(), Some(5));
}

#[tokio::test]
async fn test_first_step_gets_none_and_later_steps_get_previous_result() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let tasks = (0..3)
        .map(|i| {
            let seen = seen.clone();
            step(move |input| {
                seen.lock().unwrap().push(input);
                Ok(i * 10)
            })
        })
        .collect();

    assert_eq!(run_serial(tasks).await.unwrap(), Some(20));
    assert_eq!(*seen.lock().unwrap(), vec![None, Some(0), Some(10)]);
}

#[tokio::test]
async fn test_failure_stops_the_chain() {
    let later_calls = Arc::new(AtomicUsize::new(0));
    let counter = later_calls.clone();

    let tasks = vec![
        step(|_| Ok(1)),
        step(|_| Err(anyhow!("fatal error"))),
        step(move |x| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(x.unwrap())
        }),
    ];

    let err = run_serial(tasks).await.unwrap_err();
    assert_eq!(err.to_string(), "fatal error");
    assert_eq!(later_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failure_in_first_step_skips_everything_else() {
    let second = Arc::new(AtomicUsize::new(0));
    let counter = second.clone();
    let tasks: Vec<Task<Option<String>, String>> = vec![
        Task::from_callback(|_, next: Continuation<String>| next.fail(anyhow!("fatal error"))),
        Task::from_callback(move |_, next: Continuation<String>| {
            counter.fetch_add(1, Ordering::SeqCst);
            next.succeed("hola".to_string());
        }),
    ];

    let err = run_serial(tasks).await.unwrap_err();
    assert_eq!(err.to_string(), "fatal error");
    assert_eq!(second.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_steps_never_overlap() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let tasks = (0..3)
        .map(|i| {
            let order = order.clone();
            Task::from_callback(move |input: Option<i32>, next: Continuation<i32>| {
                order.lock().unwrap().push(format!("start {i}"));
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    order.lock().unwrap().push(format!("end {i}"));
                    next.succeed(input.unwrap_or(0) + 1);
                });
            })
        })
        .collect();

    let started = Instant::now();
    assert_eq!(run_serial(tasks).await.unwrap(), Some(3));
    assert!(started.elapsed() >= Duration::from_millis(300));
    assert_eq!(
        *order.lock().unwrap(),
        vec!["start 0", "end 0", "start 1", "end 1", "start 2", "end 2"]
    );
}
