use std::any::Any;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, error};

use crate::error::{BenchError, Result};

/// Shared cap on how many threads a set of task groups may start.
///
/// Clones share counters. `live` drops back as each task returns, so it reads
/// zero once every started task has finished.
#[derive(Debug, Clone, Default)]
pub struct ThreadBudget {
    limit: Option<usize>,
    granted: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
}

impl ThreadBudget {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn limited(max_threads: usize) -> Self {
        Self::new(Some(max_threads))
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Spawn slots handed out so far.
    pub fn granted(&self) -> usize {
        self.granted.load(Ordering::SeqCst)
    }

    /// Tasks started and not yet returned.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    fn acquire(&self) -> Option<LiveGuard> {
        let limit = self.limit;
        self.granted
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| match limit {
                Some(max) if n >= max => None,
                _ => Some(n + 1),
            })
            .ok()?;
        self.live.fetch_add(1, Ordering::SeqCst);
        Some(LiveGuard {
            live: self.live.clone(),
        })
    }
}

/// Held by a running task; releases its `live` slot on drop.
struct LiveGuard {
    live: Arc<AtomicUsize>,
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A bounded set of OS threads launched together and joined together.
///
/// Threads are named `<group>-<index>`. `join_all` waits for every task in
/// launch order and only then reports the first panic, so no task is left
/// running when a failure is returned. A group dropped without `join_all`
/// detaches its threads; callers join every group they started before
/// propagating any error.
pub struct TaskGroup<T> {
    name: String,
    handles: Vec<JoinHandle<T>>,
    budget: ThreadBudget,
}

impl<T: Send + 'static> TaskGroup<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_capacity(name, 0)
    }

    pub fn with_capacity(name: impl Into<String>, capacity: usize) -> Self {
        Self::with_budget(name, capacity, ThreadBudget::unlimited())
    }

    /// A group whose spawns draw from `budget`, shared with other groups.
    pub fn with_budget(name: impl Into<String>, capacity: usize, budget: ThreadBudget) -> Self {
        Self {
            name: name.into(),
            handles: Vec::with_capacity(capacity),
            budget,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Launch `task` on a new thread. Spawn failure, including an exhausted
    /// budget, is returned and never retried.
    pub fn spawn<F>(&mut self, task: F) -> Result<()>
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let thread_name = format!("{}-{}", self.name, self.handles.len());
        let guard = self.budget.acquire().ok_or_else(|| BenchError::Spawn {
            name: thread_name.clone(),
            source: io::Error::new(io::ErrorKind::WouldBlock, "thread budget exhausted"),
        })?;
        let handle = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                let _live = guard;
                task()
            })
            .map_err(|source| BenchError::Spawn {
                name: thread_name.clone(),
                source,
            })?;
        debug!("spawned {}", thread_name);
        self.handles.push(handle);
        Ok(())
    }

    /// Wait for every task and collect results in launch order.
    pub fn join_all(self) -> Result<Vec<T>> {
        let mut results = Vec::with_capacity(self.handles.len());
        let mut first_failure = None;

        for (index, handle) in self.handles.into_iter().enumerate() {
            match handle.join() {
                Ok(value) => results.push(value),
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    error!("task {}-{} panicked: {}", self.name, index, message);
                    if first_failure.is_none() {
                        first_failure = Some(BenchError::TaskPanicked {
                            group: self.name.clone(),
                            index,
                            message,
                        });
                    }
                }
            }
        }

        match first_failure {
            Some(err) => Err(err),
            None => {
                debug!("joined {} task(s) in group {}", results.len(), self.name);
                Ok(results)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
