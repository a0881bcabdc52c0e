//! Promise runtime for JavaScript execution.
//!
//! This crate provides a Promise/A+ compliant promise core and the event
//! loop that drives it:
//! - [`Promise`] - write-once state cell, reaction queue and resolution
//!   procedure, including adoption of foreign thenables
//! - [`EventLoop`] - task and microtask queues; its handle is the
//!   [`Scheduler`] promises defer their reaction jobs to
//! - [`EventLoopConfig`] - queue class and drain budget
//!
//! # Examples
//!
//! ```
//! use promise_runtime::{EventLoop, Promise};
//! use core_types::{Function, Value};
//!
//! let event_loop = EventLoop::new();
//! let source = Promise::new(event_loop.scheduler());
//! let next = source.then(
//!     Some(Function::new(|args| match args.first() {
//!         Some(Value::Smi(n)) => Ok(Value::Smi(n + 1)),
//!         _ => Err(Value::from("not a number")),
//!     })),
//!     None,
//! );
//!
//! source.fulfill(Value::Smi(1));
//! event_loop.run_until_done().unwrap();
//! assert_eq!(next.value(), Some(Value::Smi(2)));
//! ```
//!
//! Handlers never run synchronously inside `then` or `settle`; they run
//! when the event loop drains its queues.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod combinators;
pub mod config;
pub mod error;
pub mod event_loop;
pub mod promise;
pub mod resolution;
pub mod task_queue;

// Re-export main types at crate root
pub use config::{EventLoopConfig, QueueClass};
pub use error::{ConfigError, PromiseError, RuntimeError, RuntimeResult};
pub use event_loop::{EventLoop, LoopHandle, Scheduler, SchedulerRef};
pub use promise::{Promise, PromiseState, Settlement};
pub use task_queue::{MicroTask, Task};
