//! Units of work the event loop runs.
//!
//! A [`Task`] is host-level work that may throw; a [`MicroTask`] is a promise
//! reaction job and cannot fail.

use core_types::{JsResult, Value};

/// A task to be executed by the event loop.
///
/// Tasks represent host-level work (timers, I/O completions). A task that
/// throws stops the loop with an uncaught exception.
pub struct Task {
    callback: Box<dyn FnOnce() -> JsResult<Value>>,
}

impl Task {
    /// Creates a new Task from a closure.
    ///
    /// # Arguments
    ///
    /// * `f` - The function to execute when the task runs
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() -> JsResult<Value> + 'static,
    {
        Self {
            callback: Box::new(f),
        }
    }

    /// Executes the task.
    pub fn run(self) -> JsResult<Value> {
        (self.callback)()
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Task {{ ... }}")
    }
}

/// A microtask to be executed by the event loop.
///
/// Promise reaction jobs are microtasks. They cannot fail: anything a
/// handler throws has already been turned into a rejection.
pub struct MicroTask {
    callback: Box<dyn FnOnce()>,
}

impl MicroTask {
    /// Creates a new MicroTask from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self {
            callback: Box::new(f),
        }
    }

    /// Executes the microtask.
    pub fn run(self) {
        (self.callback)()
    }
}

impl std::fmt::Debug for MicroTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MicroTask {{ ... }}")
    }
}
