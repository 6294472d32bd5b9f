// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # dynproxy
//!
//! [![License](https://img.shields.io/badge/license-Apache--2.0-blue.svg)](https://www.apache.org/licenses/LICENSE-2.0)
//!
//! Runtime proxy synthesis and member interception in pure Rust.
//!
//! `dynproxy` builds, at runtime, a new type implementing the same capabilities (interfaces)
//! as a source type, and routes every method call, property read or write, and event
//! subscription on instances of that type through a pluggable interception step before, or
//! instead of, reaching a wrapped source instance. Calling code holds an object shaped exactly
//! like the original while cross-cutting logic (logging, auditing, caching, access control)
//! runs on every access.
//!
//! ## Features
//!
//! - **🧩 Type synthesis** - Proxy types for any interface or class implementing interfaces,
//!   including inherited and closed or open generic interfaces
//! - **🎯 One choke point** - Every generated member funnels into [`proxy::Interceptor`]
//! - **🔗 Shared state** - Proxies hold a live reference to the source, never a copy
//! - **🏷️ Signature identity** - Overloads are told apart by full signature, not by name
//! - **⚡ Cached and thread-safe** - One proxy type per source type, even under concurrent
//!   first builds
//!
//! ## Quick Start
//!
//! ### Using the Prelude
//!
//! ```rust
//! use std::sync::Arc;
//! use dynproxy::prelude::*;
//!
//! let registry = Arc::new(TypeRegistry::new());
//! let greeter = TypeBuilder::interface("IGreeter")
//!     .method("Greet", TypeSignature::String, vec![("name", TypeSignature::String)])
//!     .build(&registry)?;
//!
//! let factory = ProxyFactory::new(registry.clone());
//! let proxy_type = factory.build_proxy_type(&greeter)?;
//! assert!(proxy_type.descriptor().implements(greeter.token));
//! # Ok::<(), dynproxy::Error>(())
//! ```
//!
//! ### Wrapping an Instance
//!
//! Source objects implement [`runtime::Object`]; a [`runtime::DispatchTable`] maps member
//! signatures to handlers.
//!
//! ```rust
//! use std::{any::Any, sync::Arc};
//! use dynproxy::prelude::*;
//!
//! struct Greeter {
//!     ty: TypeRc,
//!     table: DispatchTable<Greeter>,
//! }
//!
//! impl Object for Greeter {
//!     fn runtime_type(&self) -> TypeRc {
//!         self.ty.clone()
//!     }
//!     fn invoke(&self, method: &MethodRc, args: &[Value]) -> Result<Value> {
//!         self.table.dispatch(self, method, args)
//!     }
//!     fn as_any(&self) -> &dyn Any {
//!         self
//!     }
//! }
//!
//! let registry = Arc::new(TypeRegistry::new());
//! let iface = TypeBuilder::interface("IGreeter")
//!     .method("Greet", TypeSignature::String, vec![("name", TypeSignature::String)])
//!     .build(&registry)?;
//! let class = TypeBuilder::class("Greeter").implements(&iface).build(&registry)?;
//!
//! let mut table = DispatchTable::new(class.clone());
//! table.bind("Greet", |_, args| {
//!     Ok(Value::String(format!("Hello, {}", String::try_from(&args[0])?)))
//! })?;
//! let source: ObjectRef = Arc::new(Greeter { ty: class, table });
//!
//! let proxy = ProxyFactory::new(registry).build_proxy_object(source)?;
//! assert_eq!(proxy.call("Greet", &[Value::from("James")])?, Value::from("Hello, James"));
//! # Ok::<(), dynproxy::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`metadata`] - Tokens, signatures, members, type descriptors and the [`metadata::typesystem::TypeRegistry`]
//! - [`runtime`] - The [`runtime::Value`] carrier and the [`runtime::Object`] trait
//! - [`proxy`] - Capability sets, member extraction, the interception contract, the
//!   synthesizer and the factory
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`]; see [`Error`] for the failure kinds. Build-time
//! failures surface from [`proxy::ProxyFactory::build_proxy_type`] before any proxy type is
//! cached; at call time the default strategy reports source failures as
//! [`Error::TargetInvocation`].
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade: synthesis and cache reuse at `debug`, each slot
//! dispatch at `trace`, and the default strategy's invocation records on the
//! `dynproxy::intercept` target.

#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use dynproxy::prelude::*;
///
/// let registry = TypeRegistry::new();
/// let ty = TypeBuilder::interface("IEmpty").build(&registry)?;
/// assert!(ty.is_interface());
/// # Ok::<(), dynproxy::Error>(())
/// ```
pub mod prelude;

/// Type and member metadata: tokens, signatures, members and the type registry
pub mod metadata;

/// Runtime values, live objects and signature-keyed dispatch
pub mod runtime;

/// Proxy type synthesis, the interception contract and the proxy factory
pub mod proxy;

/// `dynproxy` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `dynproxy` Error type
///
/// The main error type for all operations in this crate.
///
/// # Examples
///
/// ```rust,no_run
/// use dynproxy::{Error, prelude::*};
///
/// # fn example(proxy: &ProxyInstance) {
/// match proxy.call("CalculateTax", &[Value::R8(3.0)]) {
///     Ok(tax) => println!("tax: {tax}"),
///     Err(Error::TargetInvocation { member, source }) => println!("{member} failed: {source}"),
///     Err(e) => println!("Error: {e}"),
/// }
/// # }
/// ```
pub use error::Error;
