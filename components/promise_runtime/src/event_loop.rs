//! Event loop implementation.
//!
//! This module provides the main event loop that coordinates task and
//! microtask execution, and the [`Scheduler`] capability promises use to
//! defer their reaction jobs.

use crate::config::{EventLoopConfig, QueueClass};
use crate::error::{RuntimeError, RuntimeResult};
use crate::task_queue::{MicroTask, Task};
use core_types::Value;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Deferred execution facility.
///
/// Jobs handed to `defer` must run later than the call, in FIFO order.
/// Running them synchronously inside `defer` breaks the promise contract.
pub trait Scheduler {
    /// Queues a job to run after the current stack unwinds.
    fn defer(&self, job: MicroTask);
}

/// Shared scheduler handle held by every promise.
pub type SchedulerRef = Rc<dyn Scheduler>;

/// Both FIFO queues. Tasks run one per turn; microtasks drain fully after each.
#[derive(Debug, Default)]
struct Queues {
    tasks: VecDeque<Task>,
    microtasks: VecDeque<MicroTask>,
}

/// Cloneable handle onto an event loop's queues.
///
/// Jobs running inside the loop use a handle to queue more work.
#[derive(Debug, Clone)]
pub struct LoopHandle {
    queues: Rc<RefCell<Queues>>,
    reaction_queue: QueueClass,
}

impl LoopHandle {
    /// Adds a task to the task queue.
    pub fn enqueue_task(&self, task: Task) {
        self.queues.borrow_mut().tasks.push_back(task);
    }

    /// Adds a microtask to the microtask queue.
    pub fn enqueue_microtask(&self, microtask: MicroTask) {
        self.queues.borrow_mut().microtasks.push_back(microtask);
    }
}

impl Scheduler for LoopHandle {
    fn defer(&self, job: MicroTask) {
        match self.reaction_queue {
            QueueClass::Microtask => self.enqueue_microtask(job),
            QueueClass::Task => self.enqueue_task(Task::new(move || {
                job.run();
                Ok(Value::Undefined)
            })),
        }
    }
}

/// The JavaScript event loop.
///
/// Each iteration (turn) of the loop:
/// 1. Takes the oldest task from the task queue and executes it
/// 2. Drains all microtasks in the microtask queue
/// 3. Repeats until both queues are empty
///
/// # Examples
///
/// ```
/// use promise_runtime::{EventLoop, Task};
/// use core_types::Value;
///
/// let event_loop = EventLoop::new();
///
/// event_loop.enqueue_task(Task::new(|| Ok(Value::Undefined)));
/// event_loop.run_until_done().unwrap();
/// ```
#[derive(Debug)]
pub struct EventLoop {
    config: EventLoopConfig,
    handle: LoopHandle,
}

impl EventLoop {
    /// Creates a new EventLoop with empty queues and default configuration.
    pub fn new() -> Self {
        Self::with_config(EventLoopConfig::default())
    }

    /// Creates a new EventLoop with the given configuration.
    pub fn with_config(config: EventLoopConfig) -> Self {
        let handle = LoopHandle {
            queues: Rc::new(RefCell::new(Queues::default())),
            reaction_queue: config.reaction_queue,
        };
        Self { config, handle }
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &EventLoopConfig {
        &self.config
    }

    /// Returns a handle that can queue work from inside running jobs.
    pub fn handle(&self) -> LoopHandle {
        self.handle.clone()
    }

    /// Returns this loop as a promise scheduler.
    pub fn scheduler(&self) -> SchedulerRef {
        Rc::new(self.handle.clone())
    }

    /// Adds a task to the task queue.
    pub fn enqueue_task(&self, task: Task) {
        self.handle.enqueue_task(task);
    }

    /// Adds a microtask to the microtask queue.
    pub fn enqueue_microtask(&self, microtask: MicroTask) {
        self.handle.enqueue_microtask(microtask);
    }

    /// Returns true if the task queue is empty.
    pub fn is_task_queue_empty(&self) -> bool {
        self.handle.queues.borrow().tasks.is_empty()
    }

    /// Returns true if the microtask queue is empty.
    pub fn is_microtask_queue_empty(&self) -> bool {
        self.handle.queues.borrow().microtasks.is_empty()
    }

    /// Number of queued tasks.
    pub fn pending_tasks(&self) -> usize {
        self.handle.queues.borrow().tasks.len()
    }

    /// Number of queued microtasks.
    pub fn pending_microtasks(&self) -> usize {
        self.handle.queues.borrow().microtasks.len()
    }

    /// Runs the event loop until all tasks and microtasks are processed.
    ///
    /// # Errors
    ///
    /// Stops at the first task that throws, or when a microtask drain
    /// exceeds the configured budget. Work queued after that point stays
    /// queued.
    pub fn run_until_done(&self) -> RuntimeResult<()> {
        while !self.is_task_queue_empty() || !self.is_microtask_queue_empty() {
            self.process_one_cycle()?;
        }
        Ok(())
    }

    /// Processes one complete cycle: one task followed by all microtasks.
    pub fn process_one_cycle(&self) -> RuntimeResult<()> {
        let next = self.handle.queues.borrow_mut().tasks.pop_front();
        if let Some(task) = next {
            task.run().map_err(RuntimeError::UncaughtException)?;
        }
        self.run_all_microtasks()
    }

    /// Runs all microtasks in the queue until empty.
    ///
    /// Microtasks queued by running microtasks are processed in the same
    /// drain.
    pub fn run_all_microtasks(&self) -> RuntimeResult<()> {
        let mut ran = 0usize;
        loop {
            // The queue borrow must end before the job runs; jobs enqueue more jobs.
            let next = {
                let mut queues = self.handle.queues.borrow_mut();
                if let Some(limit) = self.config.max_jobs_per_drain {
                    if ran == limit && !queues.microtasks.is_empty() {
                        tracing::warn!(
                            limit,
                            pending = queues.microtasks.len(),
                            "microtask drain budget exhausted"
                        );
                        return Err(RuntimeError::JobBudgetExceeded { limit });
                    }
                }
                queues.microtasks.pop_front()
            };
            let Some(job) = next else {
                break;
            };
            job.run();
            ran += 1;
        }
        if ran > 0 {
            tracing::trace!(jobs = ran, "microtask queue drained");
        }
        Ok(())
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}
