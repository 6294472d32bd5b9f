//! Type system for proxyable types.
//!
//! This module describes the types a proxy can be synthesized for and the proxy types
//! themselves: interfaces with their methods, properties and events, classes implementing
//! them, and the generic parameters or arguments either may carry.
//!
//! # Key Components
//!
//! - [`TypeDescriptor`]: Immutable description of one registered type
//! - [`TypeRegistry`]: Central, thread-safe registry assigning tokens and resolving them
//! - [`TypeBuilder`]: Fluent builder for interfaces and classes
//!
//! # Examples
//!
//! ```rust
//! use dynproxy::metadata::{signatures::TypeSignature, typesystem::{TypeBuilder, TypeRegistry}};
//!
//! let registry = TypeRegistry::new();
//! let named = TypeBuilder::interface("INamed")
//!     .namespace("Demo")
//!     .property("Name", TypeSignature::String, true, true)
//!     .build(&registry)?;
//!
//! assert!(named.is_interface());
//! assert!(named.find_property("Name").is_some());
//! # Ok::<(), dynproxy::Error>(())
//! ```

mod builder;
mod registry;

use std::{any::TypeId, collections::HashSet, fmt, sync::Arc};

use bitflags::bitflags;
use strum::Display;

pub use builder::TypeBuilder;
pub use registry::TypeRegistry;

use crate::metadata::{
    members::{EventRc, FieldRc, MethodRc, PropertyRc},
    signatures::{SignatureKey, TypeSignature},
    token::Token,
};

/// Reference to a `TypeDescriptor`
pub type TypeRc = Arc<TypeDescriptor>;

/// The kind of a type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum TypeFlavor {
    /// Reference type with state
    Class,
    /// Abstract member contract
    Interface,
    /// Value type
    ValueType,
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    /// Type attribute flags
    pub struct TypeAttributes: u32 {
        /// Visible outside its namespace
        const PUBLIC = 0x0001;
        /// Type is an interface
        const INTERFACE = 0x0020;
        /// Type cannot be instantiated
        const ABSTRACT = 0x0080;
        /// Type cannot be derived from
        const SEALED = 0x0100;
        /// Type was generated by the proxy synthesizer
        const SYNTHESIZED = 0x1000_0000;
    }
}

/// Represents one registered type: an interface, a class, or a synthesized proxy type.
pub struct TypeDescriptor {
    /// Token
    pub token: Token,
    /// Namespace (can be empty)
    pub namespace: String,
    /// Simple name; closed generic types carry their arguments, e.g. `IRepository<string>`
    pub name: String,
    /// Interface, class or value type
    pub flavor: TypeFlavor,
    /// Attribute flags
    pub flags: TypeAttributes,
    /// Directly implemented (classes) or inherited (interfaces) interfaces, in declared order
    pub interfaces: Vec<TypeRc>,
    /// All methods this type declares, accessors included
    pub methods: Vec<MethodRc>,
    /// All properties this type declares
    pub properties: Vec<PropertyRc>,
    /// All events this type declares
    pub events: Vec<EventRc>,
    /// All fields this type declares
    pub fields: Vec<FieldRc>,
    /// Generic parameter names (open generic types)
    pub generic_params: Vec<String>,
    /// Generic arguments (closed generic types)
    pub generic_args: Vec<TypeSignature>,
    /// The open definition a closed generic type was made from
    pub generic_definition: Option<Token>,
    /// The Rust type backing instances of this type, if declared
    pub rust_type: Option<TypeId>,
}

impl TypeDescriptor {
    /// Returns the full name (Namespace.Name) of the type
    #[must_use]
    pub fn fullname(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// True for interfaces
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.flavor == TypeFlavor::Interface
    }

    /// True for types generated by the proxy synthesizer
    #[must_use]
    pub fn is_synthesized(&self) -> bool {
        self.flags.contains(TypeAttributes::SYNTHESIZED)
    }

    /// True for open or closed generic types
    #[must_use]
    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty() || !self.generic_args.is_empty()
    }

    /// True for open generic types that still declare unbound parameters
    #[must_use]
    pub fn is_generic_definition(&self) -> bool {
        !self.generic_params.is_empty() && self.generic_args.is_empty()
    }

    /// Every interface this type implements or inherits, transitively.
    ///
    /// Each direct interface is listed before the interfaces it inherits; duplicates reached
    /// through several paths keep their first position.
    #[must_use]
    pub fn all_interfaces(&self) -> Vec<TypeRc> {
        fn visit(ty: &TypeRc, seen: &mut HashSet<Token>, out: &mut Vec<TypeRc>) {
            if !seen.insert(ty.token) {
                return;
            }
            out.push(ty.clone());
            for base in &ty.interfaces {
                visit(base, seen, out);
            }
        }

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for iface in &self.interfaces {
            visit(iface, &mut seen, &mut out);
        }
        out
    }

    /// Returns true if this type is `token` or implements it
    #[must_use]
    pub fn implements(&self, token: Token) -> bool {
        self.token == token || self.all_interfaces().iter().any(|i| i.token == token)
    }

    /// Returns true if this type is `target` or implements it.
    ///
    /// Unlike [`TypeDescriptor::implements`], descriptors are compared by identity, so types
    /// of different registries never match.
    #[must_use]
    pub fn is_assignable_to(&self, target: &TypeRc) -> bool {
        std::ptr::eq(self, Arc::as_ptr(target))
            || self.all_interfaces().iter().any(|i| Arc::ptr_eq(i, target))
    }

    /// Finds a property by name on this type, then on its interfaces
    #[must_use]
    pub fn find_property(&self, name: &str) -> Option<PropertyRc> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .or_else(|| {
                self.all_interfaces()
                    .iter()
                    .find_map(|i| i.properties.iter().find(|p| p.name == name).cloned())
            })
    }

    /// Finds an event by name on this type, then on its interfaces
    #[must_use]
    pub fn find_event(&self, name: &str) -> Option<EventRc> {
        self.events
            .iter()
            .find(|e| e.name == name)
            .cloned()
            .or_else(|| {
                self.all_interfaces()
                    .iter()
                    .find_map(|i| i.events.iter().find(|e| e.name == name).cloned())
            })
    }

    /// All methods called `name` on this type and its interfaces.
    ///
    /// Overloads are kept; a signature re-declared further up the hierarchy is reported once,
    /// from the most derived declaration.
    #[must_use]
    pub fn find_methods(&self, name: &str) -> Vec<MethodRc> {
        let mut seen: HashSet<SignatureKey> = HashSet::new();
        let mut found = Vec::new();

        let own = self.methods.iter().cloned();
        let inherited = self
            .all_interfaces()
            .into_iter()
            .flat_map(|i| i.methods.clone());

        for method in own.chain(inherited) {
            if method.name == name && seen.insert(method.key()) {
                found.push(method);
            }
        }
        found
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("token", &self.token)
            .field("fullname", &self.fullname())
            .field("flavor", &self.flavor)
            .field(
                "interfaces",
                &self
                    .interfaces
                    .iter()
                    .map(|i| i.fullname())
                    .collect::<Vec<_>>(),
            )
            .field("methods", &self.methods.len())
            .field("properties", &self.properties.len())
            .field("events", &self.events.len())
            .field("generic_params", &self.generic_params)
            .field("generic_args", &self.generic_args)
            .finish()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fullname())
    }
}
