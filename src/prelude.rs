//! # dynproxy Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the dynproxy library. Import this module to get quick access to everything needed to
//! declare types, implement source objects and build proxies.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all dynproxy operations
pub use crate::Error;

/// The result type used throughout dynproxy
pub use crate::Result;

// ================================================================================================
// Metadata
// ================================================================================================

/// Metadata token type for referencing types and members
pub use crate::metadata::token::Token;

/// Signatures and signature-based member identity
pub use crate::metadata::signatures::{
    SignatureKey, SignatureMethod, SignatureParameter, TypeSignature,
};

/// Members of types
pub use crate::metadata::members::{
    EventRc, FieldRc, Method, MethodAttributes, MethodRc, MethodSemantics, PropertyRc,
};

/// Core type system components
pub use crate::metadata::typesystem::{
    TypeAttributes, TypeBuilder, TypeDescriptor, TypeFlavor, TypeRc, TypeRegistry,
};

// ================================================================================================
// Runtime
// ================================================================================================

/// Values and live objects
pub use crate::runtime::{Delegate, DispatchTable, Object, ObjectExt, ObjectRef, Value};

// ================================================================================================
// Proxies
// ================================================================================================

/// Main entry point for building proxies
pub use crate::proxy::ProxyFactory;

/// Synthesis
pub use crate::proxy::{
    CapabilitySet, MemberDescriptor, ProxyBuilder, ProxyConfig, ProxyType, ProxyTypeRc,
    TypeSynthesizer,
};

/// Interception
pub use crate::proxy::{
    DefaultInterceptor, InterceptionArguments, Interceptor, InterceptorFactory,
    InvocationRecord, ProxyInstance,
};
