//! Unit tests for the resolution procedure

use crate::support::*;
use core_types::{ErrorKind, Function, JsObject, Value};
use promise_runtime::{EventLoop, Promise, PromiseState, Task};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Object whose `then` calls back with the given arguments, in order.
///
/// Each step is `(true, v)` to call resolvePromise(v) or `(false, v)` to
/// call rejectPromise(v).
fn scripted_thenable(steps: Vec<(bool, Value)>) -> JsObject {
    let obj = JsObject::new();
    obj.set(
        "then",
        Function::new(move |args| {
            for (fulfill, value) in &steps {
                let callback = if *fulfill { &args[0] } else { &args[1] };
                call1(callback, value.clone());
            }
            Ok(Value::Undefined)
        }),
    );
    obj
}

#[test]
fn handler_returning_promise_waits_for_it() {
    let el = EventLoop::new();
    let inner = Promise::new(el.scheduler());
    let source = Promise::resolved(el.scheduler(), Value::Smi(1));
    let derived = source.then(Some(returning(inner.to_value())), None);

    el.run_until_done().unwrap();
    assert_eq!(derived.state(), PromiseState::Pending);

    let settle_later = inner.clone();
    el.enqueue_task(Task::new(move || {
        settle_later.fulfill(Value::from("done"));
        Ok(Value::Undefined)
    }));
    el.run_until_done().unwrap();
    assert_eq!(derived.value(), Some(Value::from("done")));
}

#[test]
fn nested_promises_unwrap_recursively() {
    let el = EventLoop::new();
    let innermost = Promise::new(el.scheduler());
    let middle = Promise::new(el.scheduler());
    middle.resolve(innermost.to_value());
    let outer = Promise::resolved(el.scheduler(), Value::Undefined)
        .then(Some(returning(middle.to_value())), None);

    el.run_until_done().unwrap();
    assert!(outer.is_pending());

    innermost.reject(Value::from("deep"));
    el.run_until_done().unwrap();
    assert_eq!(outer.reason(), Some(Value::from("deep")));
}

#[test]
fn handler_returning_its_own_derived_promise_rejects() {
    let el = EventLoop::new();
    let slot: Rc<RefCell<Option<Promise>>> = Rc::new(RefCell::new(None));
    let handler_slot = slot.clone();
    let derived = Promise::resolved(el.scheduler(), Value::Smi(1)).then(
        Some(Function::new(move |_| {
            let derived = handler_slot.borrow().clone().expect("derived promise stored");
            Ok(derived.to_value())
        })),
        None,
    );
    *slot.borrow_mut() = Some(derived.clone());

    el.run_until_done().unwrap();
    match derived.reason() {
        Some(Value::Error(err)) => assert_eq!(err.kind, ErrorKind::TypeError),
        other => panic!("expected TypeError, got {:?}", other),
    }
}

#[test]
fn thenable_resolving_synchronously_is_adopted() {
    let el = EventLoop::new();
    let promise = Promise::new(el.scheduler());
    promise.resolve(Value::Object(scripted_thenable(vec![(true, Value::Smi(7))])));
    assert_eq!(promise.value(), Some(Value::Smi(7)));
}

#[test]
fn only_first_resolving_call_counts() {
    let el = EventLoop::new();
    let a = Promise::new(el.scheduler());
    a.resolve(Value::Object(scripted_thenable(vec![
        (true, Value::Smi(7)),
        (true, Value::Smi(8)),
        (false, Value::from("late")),
    ])));
    assert_eq!(a.value(), Some(Value::Smi(7)));

    let b = Promise::new(el.scheduler());
    b.resolve(Value::Object(scripted_thenable(vec![
        (false, Value::from("first")),
        (true, Value::Smi(1)),
    ])));
    assert_eq!(b.reason(), Some(Value::from("first")));
}

#[test]
fn thenable_resolving_later_is_adopted_later() {
    let el = EventLoop::new();
    let stored: Rc<RefCell<Option<Value>>> = Rc::new(RefCell::new(None));
    let sink = stored.clone();
    let obj = JsObject::new();
    obj.set(
        "then",
        Function::new(move |args| {
            *sink.borrow_mut() = Some(args[0].clone());
            Ok(Value::Undefined)
        }),
    );

    let promise = Promise::new(el.scheduler());
    promise.resolve(Value::Object(obj));
    assert!(promise.is_pending());

    let resolve = stored.borrow().clone().unwrap();
    call1(&resolve, Value::from("eventually"));
    assert_eq!(promise.value(), Some(Value::from("eventually")));
}

#[test]
fn then_getter_is_read_exactly_once() {
    let el = EventLoop::new();
    let reads = Rc::new(Cell::new(0));
    let counter = reads.clone();
    let obj = JsObject::new();
    obj.define_getter(
        "then",
        Function::new(move |_| {
            counter.set(counter.get() + 1);
            // A different function on every read
            let n = counter.get();
            Ok(Value::Function(Function::new(move |args| {
                call1(&args[0], Value::Smi(n));
                Ok(Value::Undefined)
            })))
        }),
    );

    let promise = Promise::new(el.scheduler());
    promise.resolve(Value::Object(obj));
    assert_eq!(reads.get(), 1);
    assert_eq!(promise.value(), Some(Value::Smi(1)));
}

#[test]
fn throwing_then_getter_rejects() {
    let el = EventLoop::new();
    let obj = JsObject::new();
    obj.define_getter("then", throwing(Value::from("getter failed")));
    let promise = Promise::new(el.scheduler());
    promise.resolve(Value::Object(obj));
    assert_eq!(promise.reason(), Some(Value::from("getter failed")));
}

#[test]
fn then_throwing_before_resolving_rejects() {
    let el = EventLoop::new();
    let obj = JsObject::new();
    obj.set("then", throwing(Value::from("then failed")));
    let promise = Promise::new(el.scheduler());
    promise.resolve(Value::Object(obj));
    assert_eq!(promise.reason(), Some(Value::from("then failed")));
}

#[test]
fn then_throwing_after_resolving_is_ignored() {
    let el = EventLoop::new();
    let obj = JsObject::new();
    obj.set(
        "then",
        Function::new(|args| {
            call1(&args[0], Value::Smi(5));
            Err(Value::from("too late"))
        }),
    );
    let promise = Promise::new(el.scheduler());
    promise.resolve(Value::Object(obj));
    assert_eq!(promise.value(), Some(Value::Smi(5)));
}

#[test]
fn then_is_called_with_thenable_as_receiver() {
    let el = EventLoop::new();
    let obj = JsObject::new();
    obj.set("payload", Value::Smi(11));
    obj.set(
        "then",
        Function::with_this(|this, args| {
            let payload = this.get("payload")?;
            call1(&args[0], payload);
            Ok(Value::Undefined)
        }),
    );
    let promise = Promise::new(el.scheduler());
    promise.resolve(Value::Object(obj));
    assert_eq!(promise.value(), Some(Value::Smi(11)));
}

#[test]
fn thenable_resolving_with_thenable_unwraps_again() {
    let el = EventLoop::new();
    let inner = scripted_thenable(vec![(true, Value::from("innermost"))]);
    let outer = scripted_thenable(vec![(true, Value::Object(inner))]);
    let promise = Promise::new(el.scheduler());
    promise.resolve(Value::Object(outer));
    assert_eq!(promise.value(), Some(Value::from("innermost")));
}

#[test]
fn thenable_resolving_with_promise_adopts_it() {
    let el = EventLoop::new();
    let inner = Promise::new(el.scheduler());
    let promise = Promise::new(el.scheduler());
    promise.resolve(Value::Object(scripted_thenable(vec![(true, inner.to_value())])));
    assert!(promise.is_pending());

    inner.fulfill(Value::Smi(4));
    assert_eq!(promise.value(), Some(Value::Smi(4)));
}

#[test]
fn rejection_reason_is_not_unwrapped() {
    let el = EventLoop::new();
    let thenable = Value::Object(scripted_thenable(vec![(true, Value::Smi(1))]));
    let promise = Promise::new(el.scheduler());
    promise.resolve(Value::Object(scripted_thenable(vec![(false, thenable.clone())])));
    assert_eq!(promise.reason(), Some(thenable));
}

#[test]
fn function_with_then_property_is_a_thenable() {
    let el = EventLoop::new();
    let func = Function::new(|_| Ok(Value::Undefined));
    func.properties().set(
        "then",
        Function::new(|args| {
            call1(&args[0], Value::from("from function"));
            Ok(Value::Undefined)
        }),
    );
    let promise = Promise::new(el.scheduler());
    promise.resolve(Value::Function(func));
    assert_eq!(promise.value(), Some(Value::from("from function")));
}

#[test]
fn plain_function_fulfills_with_itself() {
    let el = EventLoop::new();
    let func = Function::new(|_| Ok(Value::Undefined));
    let promise = Promise::new(el.scheduler());
    promise.resolve(Value::Function(func.clone()));
    assert_eq!(promise.value(), Some(Value::Function(func)));
}

#[test]
fn arrays_and_errors_fulfill_as_values() {
    let el = EventLoop::new();
    let array = Value::Array(vec![Value::Smi(1), Value::Smi(2)]);
    let a = Promise::new(el.scheduler());
    a.resolve(array.clone());
    assert_eq!(a.value(), Some(array));

    let error = Value::Error(core_types::JsError::type_error("as value"));
    let b = Promise::new(el.scheduler());
    b.resolve(error.clone());
    assert_eq!(b.value(), Some(error));
}

/// Loop written as recursion: each step's handler returns the next step's promise.
fn count_down(source: &Promise, n: i32) -> Value {
    if n == 0 {
        return Value::from("done");
    }
    let next = source.clone();
    source
        .then(Some(Function::new(move |_| Ok(count_down(&next, n - 1)))), None)
        .to_value()
}

#[test]
fn deep_recursive_adoption_settles() {
    let el = EventLoop::new();
    let source = Promise::resolved(el.scheduler(), Value::Undefined);
    let outer = Promise::resolved(el.scheduler(), count_down(&source, 10_000));
    assert!(outer.is_pending());

    el.run_until_done().unwrap();
    assert_eq!(outer.value(), Some(Value::from("done")));
}

#[test]
fn long_adoption_chain_settles_synchronously() {
    let el = EventLoop::new();
    let first = Promise::new(el.scheduler());
    let mut chain = vec![first.clone()];
    for _ in 0..20_000 {
        let next = Promise::new(el.scheduler());
        next.resolve(chain[chain.len() - 1].to_value());
        chain.push(next);
    }

    first.reject(Value::from("bottom"));
    assert!(chain.iter().all(|p| p.reason() == Some(Value::from("bottom"))));
}

#[test]
fn resolving_settled_promise_leaves_thenable_untouched() {
    let el = EventLoop::new();
    let reads = Rc::new(Cell::new(0));
    let counter = reads.clone();
    let obj = JsObject::new();
    obj.define_getter(
        "then",
        Function::new(move |_| {
            counter.set(counter.get() + 1);
            Ok(Value::Function(Function::new(|args| {
                call1(&args[0], Value::Smi(2));
                Ok(Value::Undefined)
            })))
        }),
    );

    let promise = Promise::new(el.scheduler());
    promise.fulfill(Value::Smi(1));
    promise.resolve(Value::Object(obj));
    assert_eq!(reads.get(), 0);
    assert_eq!(promise.value(), Some(Value::Smi(1)));
}
