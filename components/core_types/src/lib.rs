//! Core JavaScript value types and error handling.
//!
//! This crate provides the foundational types shared by the runtime
//! components: value representation, objects with data and accessor
//! properties, callable functions, and error types.
//!
//! # Overview
//!
//! - [`Value`] - Tagged representation of JavaScript values
//! - [`JsObject`] - Ordinary object with a property bag
//! - [`Function`] - Callable value with an explicit receiver
//! - [`JsError`] - JavaScript errors
//! - [`ErrorKind`] - Types of JavaScript errors
//!
//! # Examples
//!
//! ```
//! use core_types::{ErrorKind, Function, JsError, JsObject, Value};
//!
//! // Create JavaScript values
//! let num = Value::Smi(42);
//! assert!(num.is_truthy());
//! assert_eq!(num.type_of(), "number");
//!
//! // An object exposing a callable property
//! let obj = JsObject::new();
//! obj.set("then", Function::new(|_| Ok(Value::Undefined)));
//! assert!(Value::Object(obj).get("then").unwrap().is_callable());
//!
//! // Errors are values once thrown
//! let error: Value = JsError::new(ErrorKind::TypeError, "not a function").into();
//! assert_eq!(error.type_of(), "object");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod object;
mod value;

pub use error::{ErrorKind, JsError};
pub use object::{Function, JsObject, Property};
pub use value::{JsResult, Value};
