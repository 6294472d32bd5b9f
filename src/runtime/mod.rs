//! Runtime values and live objects.
//!
//! # Key Components
//!
//! - [`Value`] - Dynamic carrier for arguments and results, with boxing via [`From`] and
//!   unboxing via [`TryFrom`]
//! - [`Delegate`] - Identity-compared event handler
//! - [`Object`] - A live instance of a registered type; [`ObjectRef`] is its shared handle
//! - [`ObjectExt`] - Name-based `call`/`get`/`set`/`subscribe` on any object
//! - [`DispatchTable`] - Signature-keyed member handlers for implementing [`Object::invoke`]

mod object;
mod value;

pub use object::{DispatchFn, DispatchTable, Object, ObjectExt, ObjectRef};
pub use value::{Delegate, DelegateFn, Value};
