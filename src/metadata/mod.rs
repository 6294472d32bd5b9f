//! Type and member metadata.
//!
//! This module contains the descriptive side of the crate: the types a proxy can be built for,
//! their members and signatures, and the tokens identifying all of them. Everything here is
//! immutable once registered, so it can be shared freely across threads.
//!
//! # Key Components
//!
//! - [`token`] - Table/row identifiers for types and members
//! - [`signatures`] - Method and type signatures, and signature-based member identity
//! - [`members`] - Methods, properties, events and fields
//! - [`typesystem`] - Type descriptors, the type builder and the central registry
//!
//! # Examples
//!
//! ```rust
//! use dynproxy::metadata::{signatures::TypeSignature, typesystem::{TypeBuilder, TypeRegistry}};
//!
//! let registry = TypeRegistry::new();
//! let ty = TypeBuilder::interface("IClock")
//!     .namespace("Demo")
//!     .property("Now", TypeSignature::DateTime, true, false)
//!     .build(&registry)?;
//!
//! println!("{} declares {} methods", ty.fullname(), ty.methods.len());
//! # Ok::<(), dynproxy::Error>(())
//! ```

/// Member definitions
pub mod members;
/// Method and type signatures
pub mod signatures;
/// Metadata tokens
pub mod token;
/// Type descriptors and the type registry
pub mod typesystem;
