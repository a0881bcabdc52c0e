//! Event loop configuration.

use crate::error::ConfigError;
use serde::Deserialize;

/// Which queue class promise reaction jobs are scheduled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueClass {
    /// Reactions run from the microtask queue, after the current task.
    #[default]
    Microtask,
    /// Reactions run as ordinary tasks, one per loop turn.
    Task,
}

/// Configuration for an [`EventLoop`](crate::EventLoop).
///
/// # Examples
///
/// ```
/// use promise_runtime::{EventLoopConfig, QueueClass};
///
/// let config = EventLoopConfig::from_json(r#"{ "max_jobs_per_drain": 1000 }"#).unwrap();
/// assert_eq!(config.reaction_queue, QueueClass::Microtask);
/// assert_eq!(config.max_jobs_per_drain, Some(1000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EventLoopConfig {
    /// Queue class used for reaction jobs
    pub reaction_queue: QueueClass,
    /// Upper bound on microtasks run by a single drain; `None` is unbounded
    pub max_jobs_per_drain: Option<usize>,
}

impl EventLoopConfig {
    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` on malformed JSON or unknown fields.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the reaction queue class
    pub fn with_reaction_queue(mut self, queue: QueueClass) -> Self {
        self.reaction_queue = queue;
        self
    }

    /// Sets the per-drain job budget
    pub fn with_max_jobs_per_drain(mut self, limit: usize) -> Self {
        self.max_jobs_per_drain = Some(limit);
        self
    }
}
