//! Promise implementation following the Promise/A+ specification.
//!
//! A [`Promise`] is a cheap handle onto a shared state cell: a write-once
//! settlement plus an ordered queue of reactions registered by `then`.
//! Settling, or attaching to an already-settled promise, drains the queue;
//! handlers always run later, from a job deferred through the promise's
//! [`Scheduler`](crate::Scheduler).

use crate::event_loop::SchedulerRef;
use crate::task_queue::MicroTask;
use core_types::{Function, Value};
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_PROMISE_ID: AtomicU64 = AtomicU64::new(1);

/// The state of a Promise.
///
/// Once settled (Fulfilled or Rejected), a Promise cannot change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromiseState {
    /// The initial state; the promise is neither fulfilled nor rejected.
    Pending,
    /// The promise has been fulfilled with a value.
    Fulfilled,
    /// The promise has been rejected with a reason.
    Rejected,
}

/// The terminal outcome of a promise.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    /// Fulfilled with a value
    Fulfilled(Value),
    /// Rejected with a reason
    Rejected(Value),
}

impl Settlement {
    /// The state this outcome moves a promise to.
    pub fn state(&self) -> PromiseState {
        match self {
            Settlement::Fulfilled(_) => PromiseState::Fulfilled,
            Settlement::Rejected(_) => PromiseState::Rejected,
        }
    }

    /// The value or reason.
    pub fn payload(&self) -> &Value {
        match self {
            Settlement::Fulfilled(value) | Settlement::Rejected(value) => value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReactionKind {
    /// The handler's return value resolves the derived promise.
    Then,
    /// The handler runs for its side effect; the original outcome passes through.
    Finally,
}

/// A reaction registered via `then`, waiting for its source promise to settle.
struct PromiseReaction {
    on_fulfilled: Option<Function>,
    on_rejected: Option<Function>,
    derived: Promise,
    kind: ReactionKind,
}

impl PromiseReaction {
    /// Queues the handler job. Without a handler nothing is queued and the
    /// derived promise is handed back to take the outcome unchanged.
    fn dispatch(self, settlement: &Settlement) -> Option<Promise> {
        let PromiseReaction {
            on_fulfilled,
            on_rejected,
            derived,
            kind,
        } = self;
        let handler = match settlement {
            Settlement::Fulfilled(_) => on_fulfilled,
            Settlement::Rejected(_) => on_rejected,
        };

        let Some(handler) = handler else {
            return Some(derived);
        };
        let settlement = settlement.clone();
        let scheduler = derived.scheduler.clone();
        tracing::trace!(derived = derived.id(), "scheduling reaction job");
        scheduler.defer(MicroTask::new(move || {
            run_reaction_job(handler, settlement, derived, kind)
        }));
        None
    }
}

fn run_reaction_job(
    handler: Function,
    settlement: Settlement,
    derived: Promise,
    kind: ReactionKind,
) {
    match handler.call(&Value::Undefined, &[settlement.payload().clone()]) {
        Err(thrown) => {
            tracing::debug!(derived = derived.id(), "reaction handler threw");
            derived.reject(thrown);
        }
        Ok(result) => match kind {
            ReactionKind::Then => derived.resolve(result),
            ReactionKind::Finally => derived.settle(settlement),
        },
    }
}

struct PromiseInner {
    id: u64,
    settlement: Option<Settlement>,
    reactions: Vec<PromiseReaction>,
}

/// A JavaScript Promise.
///
/// Cloning the handle shares the promise. The state cell is only reachable
/// through `settle`, `resolve` and `then`, so the write-once rule cannot be
/// bypassed.
///
/// # Examples
///
/// ```
/// use promise_runtime::{EventLoop, Promise, PromiseState};
/// use core_types::{Function, Value};
///
/// let event_loop = EventLoop::new();
/// let promise = Promise::new(event_loop.scheduler());
/// let doubled = promise.then(
///     Some(Function::new(|args| match args.first() {
///         Some(Value::Smi(n)) => Ok(Value::Smi(n * 2)),
///         _ => Ok(Value::Undefined),
///     })),
///     None,
/// );
///
/// promise.fulfill(Value::Smi(21));
/// assert_eq!(doubled.state(), PromiseState::Pending);
///
/// event_loop.run_until_done().unwrap();
/// assert_eq!(doubled.value(), Some(Value::Smi(42)));
/// ```
#[derive(Clone)]
pub struct Promise {
    inner: Rc<RefCell<PromiseInner>>,
    scheduler: SchedulerRef,
}

impl Promise {
    /// Creates a new pending Promise whose reactions run on `scheduler`.
    pub fn new(scheduler: SchedulerRef) -> Self {
        Self {
            inner: Rc::new(RefCell::new(PromiseInner {
                id: NEXT_PROMISE_ID.fetch_add(1, Ordering::Relaxed),
                settlement: None,
                reactions: Vec::new(),
            })),
            scheduler,
        }
    }

    /// Process-unique identifier, used in log events.
    pub fn id(&self) -> u64 {
        self.inner.borrow().id
    }

    /// The scheduler this promise and everything derived from it uses.
    pub fn scheduler(&self) -> &SchedulerRef {
        &self.scheduler
    }

    /// Returns the current state.
    pub fn state(&self) -> PromiseState {
        match &self.inner.borrow().settlement {
            None => PromiseState::Pending,
            Some(settlement) => settlement.state(),
        }
    }

    /// Returns true while the promise is pending.
    pub fn is_pending(&self) -> bool {
        self.inner.borrow().settlement.is_none()
    }

    /// Returns the outcome, if settled.
    pub fn settlement(&self) -> Option<Settlement> {
        self.inner.borrow().settlement.clone()
    }

    /// Returns the fulfillment value, if fulfilled.
    pub fn value(&self) -> Option<Value> {
        match &self.inner.borrow().settlement {
            Some(Settlement::Fulfilled(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// Returns the rejection reason, if rejected.
    pub fn reason(&self) -> Option<Value> {
        match &self.inner.borrow().settlement {
            Some(Settlement::Rejected(reason)) => Some(reason.clone()),
            _ => None,
        }
    }

    /// Number of reactions waiting for this promise to settle.
    pub fn pending_reactions(&self) -> usize {
        self.inner.borrow().reactions.len()
    }

    /// Returns true if both handles refer to the same promise.
    pub fn ptr_eq(&self, other: &Promise) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Adds handlers for fulfillment and/or rejection.
    ///
    /// Returns the derived promise immediately; no handler runs before this
    /// call returns, even when the promise is already settled. A missing
    /// handler passes the value or reason through unchanged.
    pub fn then(&self, on_fulfilled: Option<Function>, on_rejected: Option<Function>) -> Promise {
        self.attach(on_fulfilled, on_rejected, ReactionKind::Then)
    }

    pub(crate) fn attach(
        &self,
        on_fulfilled: Option<Function>,
        on_rejected: Option<Function>,
        kind: ReactionKind,
    ) -> Promise {
        let derived = Promise::new(self.scheduler.clone());
        self.push_reaction(PromiseReaction {
            on_fulfilled,
            on_rejected,
            derived: derived.clone(),
            kind,
        });
        derived
    }

    /// Makes `target` settle exactly as this promise settles.
    pub(crate) fn forward_to(&self, target: &Promise) {
        self.push_reaction(PromiseReaction {
            on_fulfilled: None,
            on_rejected: None,
            derived: target.clone(),
            kind: ReactionKind::Then,
        });
    }

    fn push_reaction(&self, reaction: PromiseReaction) {
        self.inner.borrow_mut().reactions.push(reaction);
        self.drain();
    }

    /// Fulfills the promise with `value` without unwrapping it.
    pub fn fulfill(&self, value: Value) {
        self.settle(Settlement::Fulfilled(value));
    }

    /// Rejects the promise with `reason`.
    pub fn reject(&self, reason: Value) {
        self.settle(Settlement::Rejected(reason));
    }

    /// Moves a pending promise to its terminal state.
    ///
    /// Settling an already-settled promise is silently ignored.
    pub fn settle(&self, outcome: Settlement) {
        if self.record(outcome) {
            self.drain();
        }
    }

    /// Stores the outcome; false when the promise was already settled.
    fn record(&self, outcome: Settlement) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.settlement.is_some() {
            tracing::trace!(promise = inner.id, "ignoring settle of settled promise");
            return false;
        }
        tracing::trace!(promise = inner.id, state = ?outcome.state(), "promise settled");
        inner.settlement = Some(outcome);
        true
    }

    /// Empties the reaction queue of a settled promise.
    fn take_reactions(&self) -> Option<(Settlement, std::vec::IntoIter<PromiseReaction>)> {
        let mut inner = self.inner.borrow_mut();
        let settlement = inner.settlement.clone()?;
        if inner.reactions.is_empty() {
            return None;
        }
        let reactions = std::mem::take(&mut inner.reactions);
        tracing::trace!(promise = inner.id, reactions = reactions.len(), "draining reactions");
        Some((settlement, reactions.into_iter()))
    }

    fn drain(&self) {
        // Pass-through settles are walked depth first on an explicit stack,
        // so the native stack stays flat however long the chain is. Each
        // queue is emptied before its reactions dispatch, so no entry is
        // seen twice.
        let mut stack: Vec<_> = self.take_reactions().into_iter().collect();
        loop {
            let next = match stack.last_mut() {
                Some((settlement, reactions)) => {
                    reactions.next().map(|reaction| (reaction, settlement.clone()))
                }
                None => break,
            };
            let Some((reaction, settlement)) = next else {
                stack.pop();
                continue;
            };
            if let Some(derived) = reaction.dispatch(&settlement) {
                if derived.record(settlement) {
                    stack.extend(derived.take_reactions());
                }
            }
        }
    }

    /// Wraps this promise as a JavaScript value.
    pub fn to_value(&self) -> Value {
        Value::NativeObject(Rc::new(RefCell::new(self.clone())) as Rc<RefCell<dyn Any>>)
    }

    /// Recovers a promise from a value created by [`Promise::to_value`].
    ///
    /// Foreign thenables are not promises of this family and yield `None`.
    pub fn from_value(value: &Value) -> Option<Promise> {
        match value {
            Value::NativeObject(obj) => {
                let obj = obj.borrow();
                obj.downcast_ref::<Promise>().cloned()
            }
            _ => None,
        }
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Promise")
            .field("id", &inner.id)
            .field("settlement", &inner.settlement)
            .field("reactions", &inner.reactions.len())
            .finish()
    }
}

/// First argument of a call, `undefined` when absent.
pub(crate) fn first_arg(args: &[Value]) -> Value {
    args.first().cloned().unwrap_or(Value::Undefined)
}
