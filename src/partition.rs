//! Helpers for spreading rows or vertices over a fixed number of workers.

use std::{any::Any, thread::ScopedJoinHandle};

use crate::errors::DenseGraphError;

pub(crate) fn require_workers(threads: usize, operation: &str) -> Result<(), DenseGraphError> {
    if threads == 0 {
        return Err(DenseGraphError::contract(format!(
            "{operation} requires at least one worker"
        )));
    }
    Ok(())
}

/// Deals items round-robin: item `i` goes to bucket `i % workers`, so worker
/// `k` receives `k, k + workers, k + 2 * workers, ...` in ascending order.
pub(crate) fn stripe<T, I>(items: I, workers: usize) -> Vec<Vec<T>>
where
    I: IntoIterator<Item = T>,
{
    let mut buckets: Vec<Vec<T>> = (0..workers).map(|_| Vec::new()).collect();
    for (idx, item) in items.into_iter().enumerate() {
        buckets[idx % workers].push(item);
    }
    buckets
}

/// Joins every handle, turning panics into `Worker` errors. All handles are
/// joined even after a failure so the enclosing scope never re-raises a panic.
pub(crate) fn join_workers<T>(
    handles: Vec<ScopedJoinHandle<'_, T>>,
) -> Result<Vec<T>, DenseGraphError> {
    let mut results = Vec::with_capacity(handles.len());
    let mut failure = None;
    for (worker, handle) in handles.into_iter().enumerate() {
        match handle.join() {
            Ok(value) => results.push(value),
            Err(payload) => {
                failure.get_or_insert_with(|| {
                    DenseGraphError::worker(format!(
                        "worker-{worker} panicked: {}",
                        panic_message(payload.as_ref())
                    ))
                });
            }
        }
    }
    match failure {
        Some(err) => Err(err),
        None => Ok(results),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}
