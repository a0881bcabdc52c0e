//! The promise resolution procedure.
//!
//! Resolving normalizes an arbitrary value into a settlement: promises of
//! this family are adopted through their reaction queue, foreign objects
//! exposing a callable `then` are adopted through a pair of one-shot
//! resolving functions, and everything else fulfills directly.

use crate::error::PromiseError;
use crate::promise::{first_arg, Promise};
use core_types::{Function, Value};
use std::cell::Cell;
use std::rc::Rc;

/// Shared "already resolved" flag for a pair of resolving functions.
#[derive(Clone, Default)]
struct OnceLatch(Rc<Cell<bool>>);

impl OnceLatch {
    /// Returns true exactly once.
    fn claim(&self) -> bool {
        !self.0.replace(true)
    }
}

impl Promise {
    /// Resolves the promise with `x`.
    ///
    /// - `x` is this promise: rejects with a cyclic-resolution `TypeError`.
    /// - `x` is another promise of this family: adopts its eventual outcome.
    /// - `x` is an object or function: reads `then` once. If reading throws,
    ///   rejects with the thrown value; if `then` is callable, calls it with
    ///   `x` as receiver and adopts whatever it reports first; otherwise
    ///   fulfills with `x`.
    /// - Otherwise fulfills with `x`.
    ///
    /// Resolving a settled promise does nothing; `x` is not inspected.
    pub fn resolve(&self, x: Value) {
        if !self.is_pending() {
            tracing::trace!(promise = self.id(), "ignoring resolve of settled promise");
            return;
        }
        if let Some(other) = Promise::from_value(&x) {
            if other.ptr_eq(self) {
                tracing::debug!(promise = self.id(), "promise resolved with itself");
                self.reject(PromiseError::CyclicResolution.into());
            } else {
                tracing::trace!(promise = self.id(), source = other.id(), "adopting promise");
                other.forward_to(self);
            }
            return;
        }

        if !x.is_object_like() {
            self.fulfill(x);
            return;
        }

        let then = match x.get("then") {
            Ok(then) => then,
            Err(thrown) => {
                tracing::debug!(promise = self.id(), "reading `then` threw");
                self.reject(thrown);
                return;
            }
        };

        match then {
            Value::Function(then) => self.adopt_thenable(x, then),
            _ => self.fulfill(x),
        }
    }

    fn adopt_thenable(&self, thenable: Value, then: Function) {
        tracing::trace!(promise = self.id(), "adopting foreign thenable");
        let latch = OnceLatch::default();
        let (resolve, reject) = self.resolving_functions(&latch);

        let args = [Value::Function(resolve), Value::Function(reject)];
        if let Err(thrown) = then.call(&thenable, &args) {
            if latch.claim() {
                tracing::debug!(promise = self.id(), "`then` threw before resolving");
                self.reject(thrown);
            } else {
                tracing::trace!(promise = self.id(), "ignoring throw after resolution");
            }
        }
    }

    /// Builds `(resolvePromise, rejectPromise)`; only the first call to either has effect.
    fn resolving_functions(&self, latch: &OnceLatch) -> (Function, Function) {
        let resolve = {
            let promise = self.clone();
            let latch = latch.clone();
            Function::new(move |args| {
                if latch.claim() {
                    promise.resolve(first_arg(args));
                }
                Ok(Value::Undefined)
            })
        };
        let reject = {
            let promise = self.clone();
            let latch = latch.clone();
            Function::new(move |args| {
                if latch.claim() {
                    promise.reject(first_arg(args));
                }
                Ok(Value::Undefined)
            })
        };
        (resolve, reject)
    }
}
