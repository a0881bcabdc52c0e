//! Ordinary objects and callable values.
//!
//! Both are cheap reference-counted handles: cloning shares the underlying
//! object, and equality is identity.

use crate::value::{JsResult, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A property slot on an object.
#[derive(Clone, Debug)]
pub enum Property {
    /// Plain stored value
    Data(Value),
    /// Computed property; the getter runs on every read
    Accessor(Function),
}

/// An ordinary JavaScript object.
///
/// # Examples
///
/// ```
/// use core_types::{JsObject, Value};
///
/// let obj = JsObject::new();
/// obj.set("answer", Value::Smi(42));
/// assert_eq!(obj.get("answer").unwrap(), Value::Smi(42));
/// assert_eq!(obj.get("missing").unwrap(), Value::Undefined);
/// ```
#[derive(Clone, Default)]
pub struct JsObject {
    properties: Rc<RefCell<HashMap<String, Property>>>,
}

impl JsObject {
    /// Creates an empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines or overwrites a data property.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.properties
            .borrow_mut()
            .insert(key.into(), Property::Data(value.into()));
    }

    /// Defines or overwrites an accessor property.
    ///
    /// The getter receives the holder as `this` and no arguments.
    pub fn define_getter(&self, key: impl Into<String>, getter: Function) {
        self.properties
            .borrow_mut()
            .insert(key.into(), Property::Accessor(getter));
    }

    /// Returns true if the object has an own property with this key.
    pub fn has(&self, key: &str) -> bool {
        self.properties.borrow().contains_key(key)
    }

    /// Reads a property with this object as the receiver.
    pub fn get(&self, key: &str) -> JsResult<Value> {
        self.get_with_receiver(key, &Value::Object(self.clone()))
    }

    pub(crate) fn get_with_receiver(&self, key: &str, receiver: &Value) -> JsResult<Value> {
        // Release the borrow before a getter can touch this object again.
        let slot = self.properties.borrow().get(key).cloned();
        match slot {
            None => Ok(Value::Undefined),
            Some(Property::Data(value)) => Ok(value),
            Some(Property::Accessor(getter)) => getter.call(receiver, &[]),
        }
    }

    /// Returns true if both handles refer to the same object.
    pub fn ptr_eq(&self, other: &JsObject) -> bool {
        Rc::ptr_eq(&self.properties, &other.properties)
    }
}

impl fmt::Debug for JsObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let properties = self.properties.borrow();
        let mut keys: Vec<&String> = properties.keys().collect();
        keys.sort();
        f.debug_struct("JsObject").field("keys", &keys).finish()
    }
}

type NativeFn = dyn Fn(&Value, &[Value]) -> JsResult<Value>;

struct FunctionInner {
    call: Box<NativeFn>,
    properties: JsObject,
}

/// A callable value.
///
/// Functions are also objects: they carry their own property bag, so a
/// function can expose a `then` property like any other object.
///
/// # Examples
///
/// ```
/// use core_types::{Function, Value};
///
/// let double = Function::new(|args| match args.first() {
///     Some(Value::Smi(n)) => Ok(Value::Smi(n * 2)),
///     _ => Err(Value::from("expected a number")),
/// });
/// assert_eq!(double.call(&Value::Undefined, &[Value::Smi(21)]).unwrap(), Value::Smi(42));
/// ```
#[derive(Clone)]
pub struct Function {
    inner: Rc<FunctionInner>,
}

impl Function {
    /// Creates a function that ignores its receiver.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> JsResult<Value> + 'static,
    {
        Self::with_this(move |_this, args| f(args))
    }

    /// Creates a function that observes its receiver (`this`).
    pub fn with_this<F>(f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> JsResult<Value> + 'static,
    {
        Self {
            inner: Rc::new(FunctionInner {
                call: Box::new(f),
                properties: JsObject::new(),
            }),
        }
    }

    /// Calls the function.
    ///
    /// # Errors
    ///
    /// Returns the thrown value if the function throws.
    pub fn call(&self, this: &Value, args: &[Value]) -> JsResult<Value> {
        (self.inner.call)(this, args)
    }

    /// The function's own property bag.
    pub fn properties(&self) -> &JsObject {
        &self.inner.properties
    }

    /// Returns true if both handles refer to the same function.
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function {{ ... }}")
    }
}
