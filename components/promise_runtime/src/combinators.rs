//! Convenience layer over the promise core.
//!
//! Executor construction, `catch`/`finally`, the static `resolve`/`reject`
//! adapters, the `all`/`race` aggregates, and the JavaScript-facing `then`
//! used for interop with other promise implementations.

use crate::event_loop::SchedulerRef;
use crate::promise::{first_arg, Promise, ReactionKind};
use core_types::{Function, JsObject, JsResult, Value};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

impl Promise {
    /// Creates a promise and runs `executor` synchronously with its
    /// `(fulfill, reject)` functions.
    ///
    /// Both functions settle the promise directly, without unwrapping
    /// thenables. If the executor throws, the promise rejects with the thrown
    /// value unless it has already settled.
    ///
    /// # Examples
    ///
    /// ```
    /// use promise_runtime::{EventLoop, Promise};
    /// use core_types::Value;
    ///
    /// let event_loop = EventLoop::new();
    /// let promise = Promise::with_executor(event_loop.scheduler(), |fulfill, _reject| {
    ///     fulfill.call(&Value::Undefined, &[Value::Smi(1)])?;
    ///     Ok(())
    /// });
    /// assert_eq!(promise.value(), Some(Value::Smi(1)));
    /// ```
    pub fn with_executor<F>(scheduler: SchedulerRef, executor: F) -> Promise
    where
        F: FnOnce(Function, Function) -> JsResult<()>,
    {
        let promise = Promise::new(scheduler);
        let (fulfill, reject) = promise.settle_functions();
        if let Err(thrown) = executor(fulfill, reject) {
            tracing::debug!(promise = promise.id(), "executor threw");
            promise.reject(thrown);
        }
        promise
    }

    /// Functions that fulfill or reject this promise when called.
    pub fn settle_functions(&self) -> (Function, Function) {
        let fulfill = {
            let promise = self.clone();
            Function::new(move |args| {
                promise.fulfill(first_arg(args));
                Ok(Value::Undefined)
            })
        };
        let reject = {
            let promise = self.clone();
            Function::new(move |args| {
                promise.reject(first_arg(args));
                Ok(Value::Undefined)
            })
        };
        (fulfill, reject)
    }

    /// Normalizes `value` into a promise.
    ///
    /// Promises of this family are returned as-is; anything else is run
    /// through the resolution procedure against a fresh promise.
    pub fn resolved(scheduler: SchedulerRef, value: Value) -> Promise {
        if let Some(promise) = Promise::from_value(&value) {
            return promise;
        }
        let promise = Promise::new(scheduler);
        promise.resolve(value);
        promise
    }

    /// Creates a promise rejected with `reason`.
    pub fn rejected(scheduler: SchedulerRef, reason: Value) -> Promise {
        let promise = Promise::new(scheduler);
        promise.reject(reason);
        promise
    }

    /// Adds a rejection handler only.
    pub fn catch(&self, on_rejected: Function) -> Promise {
        self.then(None, Some(on_rejected))
    }

    /// Runs `handler` on either outcome, then passes the original outcome on.
    ///
    /// The handler's return value is ignored; a throw rejects the derived
    /// promise with the thrown value.
    pub fn finally(&self, handler: Function) -> Promise {
        self.attach(Some(handler.clone()), Some(handler), ReactionKind::Finally)
    }

    /// JavaScript-level `then`: arguments that are not callable are ignored.
    pub fn invoke_then(&self, args: &[Value]) -> Promise {
        let handler = |index: usize| args.get(index).and_then(Value::as_function).cloned();
        self.then(handler(0), handler(1))
    }

    /// Exposes this promise as a plain object with a `then` method, for
    /// promise implementations that only understand thenables.
    pub fn to_thenable(&self) -> JsObject {
        let promise = self.clone();
        let thenable = JsObject::new();
        thenable.set(
            "then",
            Function::new(move |args| Ok(promise.invoke_then(args).to_value())),
        );
        thenable
    }

    /// Waits for every item.
    ///
    /// Fulfills with an `Array` of the results in input order, or rejects
    /// with the first rejection observed. An empty input fulfills at once
    /// with an empty array.
    pub fn all<I>(scheduler: SchedulerRef, items: I) -> Promise
    where
        I: IntoIterator<Item = Value>,
    {
        let aggregate = Promise::new(scheduler.clone());
        let items: Vec<Value> = items.into_iter().collect();
        if items.is_empty() {
            aggregate.fulfill(Value::Array(Vec::new()));
            return aggregate;
        }

        let results = Rc::new(RefCell::new(vec![Value::Undefined; items.len()]));
        let remaining = Rc::new(Cell::new(items.len()));
        let (_, reject) = aggregate.settle_functions();

        for (index, item) in items.into_iter().enumerate() {
            let on_fulfilled = {
                let aggregate = aggregate.clone();
                let results = results.clone();
                let remaining = remaining.clone();
                Function::new(move |args| {
                    results.borrow_mut()[index] = first_arg(args);
                    remaining.set(remaining.get() - 1);
                    if remaining.get() == 0 {
                        let values = std::mem::take(&mut *results.borrow_mut());
                        aggregate.fulfill(Value::Array(values));
                    }
                    Ok(Value::Undefined)
                })
            };
            Promise::resolved(scheduler.clone(), item)
                .then(Some(on_fulfilled), Some(reject.clone()));
        }
        aggregate
    }

    /// Settles like whichever item settles first, in either direction.
    ///
    /// An empty input never settles.
    pub fn race<I>(scheduler: SchedulerRef, items: I) -> Promise
    where
        I: IntoIterator<Item = Value>,
    {
        let aggregate = Promise::new(scheduler.clone());
        let (fulfill, reject) = aggregate.settle_functions();
        for item in items {
            Promise::resolved(scheduler.clone(), item)
                .then(Some(fulfill.clone()), Some(reject.clone()));
        }
        aggregate
    }
}
