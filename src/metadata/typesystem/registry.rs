//! Central type registry.
//!
//! This module provides the [`TypeRegistry`], a thread-safe registry for every type known
//! to a proxy context: user-declared interfaces and classes, closed generic instances, and
//! the proxy types the synthesizer generates. It assigns tokens, indexes types by token,
//! full name and backing Rust type, and resolves member tokens back to their [`Method`]s.
//!
//! # Registry Architecture
//!
//! - **Token-based lookup**: Primary index using tokens (`SkipMap`)
//! - **Name-based lookup**: Secondary index for full names (`DashMap`)
//! - **Rust type lookup**: Secondary index for `TypeId`s of backing Rust types (`DashMap`)
//! - **Member lookup**: Method tokens to methods, for member identity resolution
//! - **Generic instances**: Closed generic types cached per definition and arguments
//!
//! # Thread Safety
//!
//! - Lock-free primary storage (`SkipMap`)
//! - Concurrent hash maps for indices (`DashMap`)
//! - Atomic per-table row counters for token generation
//!
//! [`Method`]: crate::metadata::members::Method

use std::{
    any::TypeId,
    collections::HashMap,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};

use crossbeam_skiplist::SkipMap;
use dashmap::{mapref::entry::Entry, DashMap};

use crate::{
    metadata::{
        members::{Event, Method, MethodRc, Property},
        signatures::TypeSignature,
        token::{TableKind, Token},
        typesystem::{TypeDescriptor, TypeRc},
    },
    Error, Result,
};

/// Highest row a token can address
pub const MAX_ROW: u32 = 0x00FF_FFFF;

/// Central registry for all types of a proxy context.
///
/// # Examples
///
/// ```rust
/// use dynproxy::metadata::{signatures::TypeSignature, typesystem::{TypeBuilder, TypeRegistry}};
///
/// let registry = TypeRegistry::new();
/// let ty = TypeBuilder::interface("ICounter")
///     .method("Increment", TypeSignature::I4, vec![])
///     .build(&registry)?;
///
/// assert!(registry.get(&ty.token).is_some());
/// assert!(registry.get_by_fullname("ICounter").is_some());
/// let increment = ty.find_methods("Increment").remove(0);
/// assert!(registry.resolve_method(increment.token).is_some());
/// # Ok::<(), dynproxy::Error>(())
/// ```
pub struct TypeRegistry {
    /// Primary storage, by token
    types: SkipMap<Token, TypeRc>,
    /// Registration order
    ordered: boxcar::Vec<TypeRc>,
    /// Full name to token
    fullnames: DashMap<String, Token>,
    /// Backing Rust type to token
    rust_types: DashMap<TypeId, Token>,
    /// Method token to method
    methods: DashMap<Token, MethodRc>,
    /// Closed generic instances, keyed by definition and arguments
    generic_instances: DashMap<(Token, Vec<TypeSignature>), TypeRc>,
    /// Next row per table
    rows: [AtomicU32; 5],
}

impl TypeRegistry {
    /// Create a new, empty registry
    #[must_use]
    pub fn new() -> Self {
        TypeRegistry {
            types: SkipMap::new(),
            ordered: boxcar::Vec::new(),
            fullnames: DashMap::new(),
            rust_types: DashMap::new(),
            methods: DashMap::new(),
            generic_instances: DashMap::new(),
            rows: Default::default(),
        }
    }

    /// Allocate the next token of `table`.
    ///
    /// Rows start at 1; a null token is never handed out, and a row is never reused.
    ///
    /// # Errors
    /// Returns [`Error::Build`] once all [`MAX_ROW`] rows of `table` are allocated.
    pub fn next_token(&self, table: TableKind) -> Result<Token> {
        let counter = match table {
            TableKind::TypeDef => &self.rows[0],
            TableKind::Field => &self.rows[1],
            TableKind::MethodDef => &self.rows[2],
            TableKind::Event => &self.rows[3],
            TableKind::Property => &self.rows[4],
        };
        let previous = counter
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |row| {
                row.checked_add(1).filter(|next| *next <= MAX_ROW)
            })
            .map_err(|_| build_error!("Table {} is exhausted ({} rows)", table, MAX_ROW))?;
        Ok(Token::from_parts(table, previous + 1))
    }

    /// Register a new type.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateType`] if a type with the same full name, or the same backing
    /// Rust type, is already registered. Nothing is inserted in that case.
    pub fn insert(&self, new_type: TypeRc) -> Result<()> {
        let fullname = new_type.fullname();
        match self.fullnames.entry(fullname.clone()) {
            Entry::Occupied(_) => return Err(Error::DuplicateType(fullname)),
            Entry::Vacant(slot) => {
                slot.insert(new_type.token);
            }
        }

        if let Some(rust_type) = new_type.rust_type {
            match self.rust_types.entry(rust_type) {
                Entry::Occupied(_) => {
                    self.fullnames.remove(&fullname);
                    return Err(Error::DuplicateType(fullname));
                }
                Entry::Vacant(slot) => {
                    slot.insert(new_type.token);
                }
            }
        }

        for method in &new_type.methods {
            self.methods.insert(method.token, method.clone());
        }
        self.types.insert(new_type.token, new_type.clone());
        self.ordered.push(new_type);
        Ok(())
    }

    /// Get a type by its token
    #[must_use]
    pub fn get(&self, token: &Token) -> Option<TypeRc> {
        self.types.get(token).map(|entry| entry.value().clone())
    }

    /// Get a type by its full name (`Namespace.Name`)
    #[must_use]
    pub fn get_by_fullname(&self, fullname: &str) -> Option<TypeRc> {
        let token = *self.fullnames.get(fullname)?;
        self.get(&token)
    }

    /// Get the type declared as backed by the Rust type `id`
    #[must_use]
    pub fn get_by_rust_type(&self, id: TypeId) -> Option<TypeRc> {
        let token = *self.rust_types.get(&id)?;
        self.get(&token)
    }

    /// Get the type declared as backed by the Rust type `T`
    #[must_use]
    pub fn get_of<T: 'static>(&self) -> Option<TypeRc> {
        self.get_by_rust_type(TypeId::of::<T>())
    }

    /// Resolve a member identity token back to its method
    #[must_use]
    pub fn resolve_method(&self, token: Token) -> Option<MethodRc> {
        self.methods.get(&token).map(|entry| entry.value().clone())
    }

    /// Number of registered types
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true if no type has been registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Snapshot of all types in registration order
    #[must_use]
    pub fn iter(&self) -> Vec<TypeRc> {
        self.ordered.iter().map(|(_, ty)| ty.clone()).collect()
    }

    /// Close the open generic `definition` over `args`.
    ///
    /// Member signatures of the closed type have every generic parameter substituted.
    /// Inherited interfaces that are themselves generic definitions of the same arity are
    /// closed over the same arguments. Repeated requests return the same type.
    ///
    /// # Errors
    /// Returns [`Error::Build`] if `definition` is not a generic definition or the argument
    /// count does not match its parameter count.
    pub fn make_generic(&self, definition: &TypeRc, args: Vec<TypeSignature>) -> Result<TypeRc> {
        if !definition.is_generic_definition() {
            return Err(build_error!(
                "'{}' is not a generic type definition",
                definition.fullname()
            ));
        }
        if definition.generic_params.len() != args.len() {
            return Err(build_error!(
                "'{}' declares {} generic parameter(s), {} argument(s) supplied",
                definition.fullname(),
                definition.generic_params.len(),
                args.len()
            ));
        }

        let key = (definition.token, args);
        if let Some(existing) = self.generic_instances.get(&key) {
            return Ok(existing.value().clone());
        }

        let mut interfaces = Vec::with_capacity(definition.interfaces.len());
        for base in &definition.interfaces {
            if base.is_generic_definition() && base.generic_params.len() == key.1.len() {
                interfaces.push(self.make_generic(base, key.1.clone())?);
            } else {
                interfaces.push(base.clone());
            }
        }

        let args = key.1.clone();
        let closed = self
            .generic_instances
            .entry(key)
            .or_try_insert_with(|| -> Result<TypeRc> {
                let closed = Arc::new(self.close(definition, &args, interfaces)?);
                self.insert(closed.clone())?;
                Ok(closed)
            })?;
        Ok(closed.value().clone())
    }

    fn close(
        &self,
        definition: &TypeDescriptor,
        args: &[TypeSignature],
        interfaces: Vec<TypeRc>,
    ) -> Result<TypeDescriptor> {
        let token = self.next_token(TableKind::TypeDef)?;
        let arg_names: Vec<String> = args.iter().map(ToString::to_string).collect();
        let name = format!("{}<{}>", definition.name, arg_names.join(", "));
        let declaring_name = if definition.namespace.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", definition.namespace, name)
        };

        let mut remapped: HashMap<Token, MethodRc> = HashMap::new();
        let mut methods = Vec::with_capacity(definition.methods.len());
        for method in &definition.methods {
            let closed = Arc::new(Method {
                token: self.next_token(TableKind::MethodDef)?,
                name: method.name.clone(),
                declaring: token,
                declaring_name: declaring_name.clone(),
                signature: method.signature.substitute(args),
                flags: method.flags,
                semantics: method.semantics.clone(),
            });
            remapped.insert(method.token, closed.clone());
            methods.push(closed);
        }

        let accessor = |method: &MethodRc| -> Result<MethodRc> {
            remapped
                .get(&method.token)
                .cloned()
                .ok_or(Error::UnresolvedToken(method.token))
        };

        let mut properties = Vec::with_capacity(definition.properties.len());
        for property in &definition.properties {
            properties.push(Arc::new(Property {
                token: self.next_token(TableKind::Property)?,
                name: property.name.clone(),
                property_type: property.property_type.substitute(args),
                getter: property.getter.as_ref().map(&accessor).transpose()?,
                setter: property.setter.as_ref().map(&accessor).transpose()?,
            }));
        }

        let mut events = Vec::with_capacity(definition.events.len());
        for event in &definition.events {
            events.push(Arc::new(Event {
                token: self.next_token(TableKind::Event)?,
                name: event.name.clone(),
                handler_type: event.handler_type.substitute(args),
                add_on: accessor(&event.add_on)?,
                remove_on: accessor(&event.remove_on)?,
            }));
        }

        Ok(TypeDescriptor {
            token,
            namespace: definition.namespace.clone(),
            name,
            flavor: definition.flavor,
            flags: definition.flags,
            interfaces,
            methods,
            properties,
            events,
            fields: Vec::new(),
            generic_params: Vec::new(),
            generic_args: args.to_vec(),
            generic_definition: Some(definition.token),
            rust_type: None,
        })
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::typesystem::TypeBuilder;

    fn repository(registry: &TypeRegistry) -> Result<TypeRc> {
        TypeBuilder::interface("IRepository")
            .namespace("Demo")
            .generic_param("T")
            .method(
                "Find",
                TypeSignature::GenericParam(0),
                vec![("id", TypeSignature::I4)],
            )
            .property("Latest", TypeSignature::GenericParam(0), true, false)
            .build(registry)
    }

    #[test]
    fn test_tokens_are_unique_per_table() -> Result<()> {
        let registry = TypeRegistry::new();
        let a = registry.next_token(TableKind::MethodDef)?;
        let b = registry.next_token(TableKind::MethodDef)?;
        let c = registry.next_token(TableKind::TypeDef)?;

        assert_ne!(a, b);
        assert_eq!(a.row(), 1);
        assert_eq!(b.row(), 2);
        assert_eq!(c.row(), 1);
        assert_eq!(c.kind(), Some(TableKind::TypeDef));
        Ok(())
    }

    #[test]
    fn test_exhausted_table_never_reissues_rows() -> Result<()> {
        let registry = TypeRegistry::new();
        registry.rows[2].store(MAX_ROW - 1, Ordering::Relaxed);

        let last = registry.next_token(TableKind::MethodDef)?;
        assert_eq!(last.row(), MAX_ROW);
        assert_eq!(last.kind(), Some(TableKind::MethodDef));

        for _ in 0..2 {
            assert!(matches!(
                registry.next_token(TableKind::MethodDef),
                Err(Error::Build { .. })
            ));
        }
        assert_eq!(registry.rows[2].load(Ordering::Relaxed), MAX_ROW);

        // Other tables keep their own rows.
        assert_eq!(registry.next_token(TableKind::Property)?.row(), 1);
        Ok(())
    }

    #[test]
    fn test_building_into_exhausted_table_fails() {
        let registry = TypeRegistry::new();
        registry.rows[0].store(MAX_ROW, Ordering::Relaxed);

        assert!(matches!(
            TypeBuilder::interface("ILate").build(&registry),
            Err(Error::Build { .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_fullname_is_rejected() -> Result<()> {
        let registry = TypeRegistry::new();
        TypeBuilder::interface("INamed").build(&registry)?;

        let err = TypeBuilder::interface("INamed").build(&registry).unwrap_err();
        assert!(matches!(err, Error::DuplicateType(name) if name == "INamed"));
        assert_eq!(registry.len(), 1);
        Ok(())
    }

    #[test]
    fn test_duplicate_rust_type_is_rejected() -> Result<()> {
        struct Backing;

        let registry = TypeRegistry::new();
        let iface = TypeBuilder::interface("INamed").build(&registry)?;
        let first = TypeBuilder::class("First")
            .implements(&iface)
            .backed_by::<Backing>()
            .build(&registry)?;

        let err = TypeBuilder::class("Second")
            .implements(&iface)
            .backed_by::<Backing>()
            .build(&registry)
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateType(_)));
        assert!(registry.get_by_fullname("Second").is_none());
        assert_eq!(registry.get_of::<Backing>().map(|t| t.token), Some(first.token));
        Ok(())
    }

    #[test]
    fn test_make_generic_substitutes_members() -> Result<()> {
        let registry = TypeRegistry::new();
        let open = repository(&registry)?;

        let closed = registry.make_generic(&open, vec![TypeSignature::String])?;
        assert_eq!(closed.fullname(), "Demo.IRepository<string>");
        assert_eq!(closed.generic_definition, Some(open.token));
        assert!(closed.is_generic());
        assert!(!closed.is_generic_definition());

        let find = closed.find_methods("Find").remove(0);
        assert_eq!(find.signature.return_type, TypeSignature::String);
        assert_eq!(find.declaring, closed.token);
        assert!(registry.resolve_method(find.token).is_some());

        let latest = closed.find_property("Latest").unwrap();
        assert_eq!(latest.property_type, TypeSignature::String);
        assert_eq!(
            latest.getter.as_ref().unwrap().signature.return_type,
            TypeSignature::String
        );
        Ok(())
    }

    #[test]
    fn test_make_generic_is_cached() -> Result<()> {
        let registry = TypeRegistry::new();
        let open = repository(&registry)?;

        let first = registry.make_generic(&open, vec![TypeSignature::I4])?;
        let second = registry.make_generic(&open, vec![TypeSignature::I4])?;
        let other = registry.make_generic(&open, vec![TypeSignature::String])?;

        assert!(Arc::ptr_eq(&first, &second));
        assert_ne!(first.token, other.token);
        Ok(())
    }

    #[test]
    fn test_make_generic_rejects_bad_arity() -> Result<()> {
        let registry = TypeRegistry::new();
        let open = repository(&registry)?;

        let err = registry
            .make_generic(&open, vec![TypeSignature::I4, TypeSignature::I4])
            .unwrap_err();
        assert!(matches!(err, Error::Build { .. }));

        let closed = registry.make_generic(&open, vec![TypeSignature::I4])?;
        assert!(matches!(
            registry.make_generic(&closed, vec![TypeSignature::I4]),
            Err(Error::Build { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_iter_preserves_registration_order() -> Result<()> {
        let registry = TypeRegistry::new();
        let a = TypeBuilder::interface("IA").build(&registry)?;
        let b = TypeBuilder::interface("IB").build(&registry)?;

        let order: Vec<Token> = registry.iter().iter().map(|t| t.token).collect();
        assert_eq!(order, vec![a.token, b.token]);
        assert!(!registry.is_empty());
        Ok(())
    }
}
