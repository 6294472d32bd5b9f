//! Builder for interface and class definitions.
//!
//! This module provides the [`TypeBuilder`] struct, which offers a fluent API for declaring
//! the types proxies are synthesized for: interfaces with methods, properties and events, and
//! classes implementing them. Accessors are generated following the CLI naming convention
//! (`get_X`/`set_X`, `add_X`/`remove_X`) and flagged as special-name methods.
//!
//! # Example
//!
//! ```rust
//! use dynproxy::metadata::{signatures::TypeSignature, typesystem::{TypeBuilder, TypeRegistry}};
//!
//! let registry = TypeRegistry::new();
//! let notify = TypeBuilder::interface("INotifyPropertyChanged")
//!     .namespace("System.ComponentModel")
//!     .event("PropertyChanged", TypeSignature::Delegate)
//!     .build(&registry)?;
//!
//! let employee = TypeBuilder::interface("IEmployee")
//!     .namespace("Demo")
//!     .property("Name", TypeSignature::String, true, true)
//!     .method("CalculateTax", TypeSignature::R8, vec![("percent", TypeSignature::R8)])
//!     .build(&registry)?;
//!
//! let model = TypeBuilder::class("EmployeeModel")
//!     .namespace("Demo")
//!     .implements(&employee)
//!     .implements(&notify)
//!     .build(&registry)?;
//!
//! assert_eq!(model.all_interfaces().len(), 2);
//! # Ok::<(), dynproxy::Error>(())
//! ```

use std::{any::TypeId, collections::HashSet, sync::Arc};

use crate::{
    metadata::{
        members::{Event, Method, MethodAttributes, MethodRc, MethodSemantics, Property},
        signatures::{SignatureKey, SignatureMethod, SignatureParameter, TypeSignature},
        token::TableKind,
        typesystem::{TypeAttributes, TypeDescriptor, TypeFlavor, TypeRc, TypeRegistry},
    },
    Result,
};

/// Method definition collected by the builder.
struct MethodDefinition {
    name: String,
    signature: SignatureMethod,
    is_static: bool,
}

/// Property definition collected by the builder.
struct PropertyDefinition {
    name: String,
    property_type: TypeSignature,
    has_getter: bool,
    has_setter: bool,
}

/// Event definition collected by the builder.
struct EventDefinition {
    name: String,
    handler_type: TypeSignature,
}

/// Provides a fluent API for declaring interfaces and classes
pub struct TypeBuilder {
    name: String,
    namespace: String,
    flavor: TypeFlavor,
    flags: TypeAttributes,
    interfaces: Vec<TypeRc>,
    generic_params: Vec<String>,
    methods: Vec<MethodDefinition>,
    properties: Vec<PropertyDefinition>,
    events: Vec<EventDefinition>,
    rust_type: Option<TypeId>,
}

impl TypeBuilder {
    fn new(name: &str, flavor: TypeFlavor, flags: TypeAttributes) -> Self {
        TypeBuilder {
            name: name.to_string(),
            namespace: String::new(),
            flavor,
            flags,
            interfaces: Vec::new(),
            generic_params: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            events: Vec::new(),
            rust_type: None,
        }
    }

    /// Start declaring an interface
    ///
    /// ## Arguments
    /// * 'name' - The simple name of the interface
    #[must_use]
    pub fn interface(name: &str) -> Self {
        Self::new(
            name,
            TypeFlavor::Interface,
            TypeAttributes::PUBLIC | TypeAttributes::INTERFACE | TypeAttributes::ABSTRACT,
        )
    }

    /// Start declaring a class
    ///
    /// ## Arguments
    /// * 'name' - The simple name of the class
    #[must_use]
    pub fn class(name: &str) -> Self {
        Self::new(name, TypeFlavor::Class, TypeAttributes::PUBLIC)
    }

    /// Set the namespace
    #[must_use]
    pub fn namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace.to_string();
        self
    }

    /// Mark the class as sealed
    #[must_use]
    pub fn sealed(mut self) -> Self {
        self.flags |= TypeAttributes::SEALED;
        self
    }

    /// Implement (classes) or inherit (interfaces) an interface
    ///
    /// ## Arguments
    /// * 'interface' - A registered interface
    #[must_use]
    pub fn implements(mut self, interface: &TypeRc) -> Self {
        self.interfaces.push(interface.clone());
        self
    }

    /// Declare a type-level generic parameter; `GenericParam(i)` refers to the i-th one
    #[must_use]
    pub fn generic_param(mut self, name: &str) -> Self {
        self.generic_params.push(name.to_string());
        self
    }

    /// Declare the Rust type instances of this type are backed by
    #[must_use]
    pub fn backed_by<T: 'static>(mut self) -> Self {
        self.rust_type = Some(TypeId::of::<T>());
        self
    }

    /// Declare an instance method with by-value parameters
    ///
    /// ## Arguments
    /// * 'name' - Method name
    /// * 'return_type' - Return type, `TypeSignature::Void` for none
    /// * 'params' - Parameter names and types, in order
    #[must_use]
    pub fn method(
        self,
        name: &str,
        return_type: TypeSignature,
        params: Vec<(&str, TypeSignature)>,
    ) -> Self {
        let params = params
            .into_iter()
            .map(|(name, base)| SignatureParameter::new(name, base))
            .collect();
        self.method_signature(name, SignatureMethod::new(return_type, params))
    }

    /// Declare an instance method with method-level generic parameters
    #[must_use]
    pub fn generic_method(
        self,
        name: &str,
        generic_params: &[&str],
        return_type: TypeSignature,
        params: Vec<(&str, TypeSignature)>,
    ) -> Self {
        let mut signature = SignatureMethod::new(
            return_type,
            params
                .into_iter()
                .map(|(name, base)| SignatureParameter::new(name, base))
                .collect(),
        );
        signature.generic_params = generic_params.iter().map(ToString::to_string).collect();
        self.method_signature(name, signature)
    }

    /// Declare an instance method from a complete signature
    #[must_use]
    pub fn method_signature(mut self, name: &str, signature: SignatureMethod) -> Self {
        self.methods.push(MethodDefinition {
            name: name.to_string(),
            signature,
            is_static: false,
        });
        self
    }

    /// Declare a static method
    #[must_use]
    pub fn static_method(
        mut self,
        name: &str,
        return_type: TypeSignature,
        params: Vec<(&str, TypeSignature)>,
    ) -> Self {
        let mut signature = SignatureMethod::new(
            return_type,
            params
                .into_iter()
                .map(|(name, base)| SignatureParameter::new(name, base))
                .collect(),
        );
        signature.has_this = false;
        self.methods.push(MethodDefinition {
            name: name.to_string(),
            signature,
            is_static: true,
        });
        self
    }

    /// Declare a property
    ///
    /// ## Arguments
    /// * 'name' - Property name
    /// * 'property_type' - Type of the property value
    /// * 'has_getter' - Generate `get_X`
    /// * 'has_setter' - Generate `set_X`
    #[must_use]
    pub fn property(
        mut self,
        name: &str,
        property_type: TypeSignature,
        has_getter: bool,
        has_setter: bool,
    ) -> Self {
        self.properties.push(PropertyDefinition {
            name: name.to_string(),
            property_type,
            has_getter,
            has_setter,
        });
        self
    }

    /// Declare an event
    #[must_use]
    pub fn event(mut self, name: &str, handler_type: TypeSignature) -> Self {
        self.events.push(EventDefinition {
            name: name.to_string(),
            handler_type,
        });
        self
    }

    /// Validate the declaration, assign tokens and register the type.
    ///
    /// # Errors
    /// Returns [`crate::Error::Build`] for an empty name, a non-interface in the interface list,
    /// duplicate parameter names, or two members with the same signature; and
    /// [`crate::Error::DuplicateType`] if the full name is taken.
    pub fn build(self, registry: &TypeRegistry) -> Result<TypeRc> {
        if self.name.is_empty() {
            return Err(build_error!("A type requires a name"));
        }
        if let Some(not_interface) = self.interfaces.iter().find(|i| !i.is_interface()) {
            return Err(build_error!(
                "'{}' can not implement '{}', which is not an interface",
                self.name,
                not_interface.fullname()
            ));
        }

        let token = registry.next_token(TableKind::TypeDef)?;
        let fullname = if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        };
        let member_flags = match self.flavor {
            TypeFlavor::Interface => {
                MethodAttributes::PUBLIC | MethodAttributes::VIRTUAL | MethodAttributes::ABSTRACT
            }
            TypeFlavor::Class | TypeFlavor::ValueType => MethodAttributes::PUBLIC,
        };

        let mut keys: HashSet<SignatureKey> = HashSet::new();
        let mut methods: Vec<MethodRc> = Vec::new();
        let mut define = |name: String,
                          signature: SignatureMethod,
                          flags: MethodAttributes,
                          semantics: Option<(MethodSemantics, String)>|
         -> Result<MethodRc> {
            let signature = name_parameters(&fullname, &name, signature)?;
            if !keys.insert(SignatureKey::new(&name, &signature)) {
                return Err(build_error!(
                    "'{}' declares '{}' twice with the same signature",
                    fullname,
                    name
                ));
            }
            let method = Arc::new(Method {
                token: registry.next_token(TableKind::MethodDef)?,
                name,
                declaring: token,
                declaring_name: fullname.clone(),
                signature,
                flags,
                semantics,
            });
            methods.push(method.clone());
            Ok(method)
        };

        for definition in self.methods {
            let flags = if definition.is_static {
                MethodAttributes::PUBLIC | MethodAttributes::STATIC
            } else {
                member_flags
            };
            define(definition.name, definition.signature, flags, None)?;
        }

        let accessor_flags = member_flags | MethodAttributes::SPECIAL_NAME;
        let mut property_names = HashSet::new();
        let mut properties = Vec::with_capacity(self.properties.len());
        for definition in self.properties {
            if !property_names.insert(definition.name.clone()) {
                return Err(build_error!(
                    "'{}' declares property '{}' twice",
                    fullname,
                    definition.name
                ));
            }

            let getter = if definition.has_getter {
                Some(define(
                    MethodSemantics::Getter.accessor_name(&definition.name),
                    SignatureMethod::new(definition.property_type.clone(), Vec::new()),
                    accessor_flags,
                    Some((MethodSemantics::Getter, definition.name.clone())),
                )?)
            } else {
                None
            };
            let setter = if definition.has_setter {
                Some(define(
                    MethodSemantics::Setter.accessor_name(&definition.name),
                    SignatureMethod::new(
                        TypeSignature::Void,
                        vec![SignatureParameter::new(
                            "value",
                            definition.property_type.clone(),
                        )],
                    ),
                    accessor_flags,
                    Some((MethodSemantics::Setter, definition.name.clone())),
                )?)
            } else {
                None
            };

            properties.push(Arc::new(Property {
                token: registry.next_token(TableKind::Property)?,
                name: definition.name,
                property_type: definition.property_type,
                getter,
                setter,
            }));
        }

        let mut event_names = HashSet::new();
        let mut events = Vec::with_capacity(self.events.len());
        for definition in self.events {
            if !event_names.insert(definition.name.clone()) {
                return Err(build_error!(
                    "'{}' declares event '{}' twice",
                    fullname,
                    definition.name
                ));
            }

            let mut accessor = |semantics: MethodSemantics| {
                define(
                    semantics.accessor_name(&definition.name),
                    SignatureMethod::new(
                        TypeSignature::Void,
                        vec![SignatureParameter::new(
                            "value",
                            definition.handler_type.clone(),
                        )],
                    ),
                    accessor_flags,
                    Some((semantics, definition.name.clone())),
                )
            };
            let add_on = accessor(MethodSemantics::AddOn)?;
            let remove_on = accessor(MethodSemantics::RemoveOn)?;

            events.push(Arc::new(Event {
                token: registry.next_token(TableKind::Event)?,
                name: definition.name,
                handler_type: definition.handler_type,
                add_on,
                remove_on,
            }));
        }

        let new_type = Arc::new(TypeDescriptor {
            token,
            namespace: self.namespace,
            name: self.name,
            flavor: self.flavor,
            flags: self.flags,
            interfaces: self.interfaces,
            methods,
            properties,
            events,
            fields: Vec::new(),
            generic_params: self.generic_params,
            generic_args: Vec::new(),
            generic_definition: None,
            rust_type: self.rust_type,
        });
        registry.insert(new_type.clone())?;
        Ok(new_type)
    }
}

/// Gives unnamed parameters positional names and rejects duplicates.
fn name_parameters(
    fullname: &str,
    method: &str,
    mut signature: SignatureMethod,
) -> Result<SignatureMethod> {
    let mut seen = HashSet::new();
    for (index, param) in signature.params.iter_mut().enumerate() {
        if param.name.is_empty() {
            param.name = format!("arg{index}");
        }
        if !seen.insert(param.name.clone()) {
            return Err(build_error!(
                "'{}::{}' declares parameter '{}' twice",
                fullname,
                method,
                param.name
            ));
        }
    }
    Ok(signature)
}

/// Token of a type, for use in [`TypeSignature::Class`]
impl From<&TypeRc> for TypeSignature {
    fn from(ty: &TypeRc) -> Self {
        TypeSignature::Class(ty.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_property_accessors_are_special() -> Result<()> {
        let registry = TypeRegistry::new();
        let ty = TypeBuilder::interface("IEmployee")
            .property("Id", TypeSignature::I4, true, true)
            .property("Age", TypeSignature::I4, true, false)
            .build(&registry)?;

        let id = ty.find_property("Id").unwrap();
        let getter = id.getter.as_ref().unwrap();
        let setter = id.setter.as_ref().unwrap();
        assert_eq!(getter.name, "get_Id");
        assert_eq!(setter.name, "set_Id");
        assert!(getter.is_special());
        assert_eq!(setter.signature.params[0].name, "value");
        assert_eq!(setter.signature.return_type, TypeSignature::Void);
        assert!(matches!(
            &getter.semantics,
            Some((MethodSemantics::Getter, owner)) if owner == "Id"
        ));

        let age = ty.find_property("Age").unwrap();
        assert!(age.setter.is_none());
        assert_eq!(ty.methods.len(), 3);
        Ok(())
    }

    #[test]
    fn test_event_accessors() -> Result<()> {
        let registry = TypeRegistry::new();
        let ty = TypeBuilder::interface("INotifyPropertyChanged")
            .event("PropertyChanged", TypeSignature::Delegate)
            .build(&registry)?;

        let event = ty.find_event("PropertyChanged").unwrap();
        assert_eq!(event.add_on.name, "add_PropertyChanged");
        assert_eq!(event.remove_on.name, "remove_PropertyChanged");
        assert_eq!(
            event.add_on.signature.params[0].base,
            TypeSignature::Delegate
        );
        Ok(())
    }

    #[test]
    fn test_unnamed_parameters_get_positional_names() -> Result<()> {
        let registry = TypeRegistry::new();
        let ty = TypeBuilder::interface("ICalculator")
            .method(
                "Add",
                TypeSignature::I4,
                vec![("", TypeSignature::I4), ("", TypeSignature::I4)],
            )
            .build(&registry)?;

        let add = ty.find_methods("Add").remove(0);
        let names: Vec<&str> = add
            .signature
            .params
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["arg0", "arg1"]);
        Ok(())
    }

    #[test]
    fn test_duplicate_parameter_names_are_rejected() {
        let registry = TypeRegistry::new();
        let err = TypeBuilder::interface("ICalculator")
            .method(
                "Add",
                TypeSignature::I4,
                vec![("a", TypeSignature::I4), ("a", TypeSignature::I4)],
            )
            .build(&registry)
            .unwrap_err();
        assert!(matches!(err, Error::Build { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_signatures_are_rejected_but_overloads_allowed() -> Result<()> {
        let registry = TypeRegistry::new();
        let overloads = TypeBuilder::interface("ICalculator")
            .method("Add", TypeSignature::I4, vec![("a", TypeSignature::I4)])
            .method(
                "Add",
                TypeSignature::I4,
                vec![("a", TypeSignature::I4), ("b", TypeSignature::I4)],
            )
            .build(&registry)?;
        assert_eq!(overloads.find_methods("Add").len(), 2);

        let err = TypeBuilder::interface("IBroken")
            .method("Add", TypeSignature::I4, vec![("a", TypeSignature::I4)])
            .method("Add", TypeSignature::I8, vec![("b", TypeSignature::I4)])
            .build(&registry)
            .unwrap_err();
        assert!(matches!(err, Error::Build { .. }));
        Ok(())
    }

    #[test]
    fn test_getter_colliding_with_method_is_rejected() {
        let registry = TypeRegistry::new();
        let err = TypeBuilder::interface("IBroken")
            .method("get_Name", TypeSignature::String, vec![])
            .property("Name", TypeSignature::String, true, false)
            .build(&registry)
            .unwrap_err();
        assert!(matches!(err, Error::Build { .. }));
    }

    #[test]
    fn test_class_can_only_implement_interfaces() -> Result<()> {
        let registry = TypeRegistry::new();
        let base = TypeBuilder::class("Base").build(&registry)?;
        let err = TypeBuilder::class("Derived")
            .implements(&base)
            .build(&registry)
            .unwrap_err();
        assert!(matches!(err, Error::Build { .. }));
        Ok(())
    }

    #[test]
    fn test_static_methods_are_flagged() -> Result<()> {
        let registry = TypeRegistry::new();
        let ty = TypeBuilder::interface("IFactory")
            .static_method("Create", TypeSignature::Object, vec![])
            .build(&registry)?;

        let create = ty.find_methods("Create").remove(0);
        assert!(create.is_static());
        assert!(!create.signature.has_this);
        Ok(())
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let registry = TypeRegistry::new();
        assert!(matches!(
            TypeBuilder::interface("").build(&registry),
            Err(Error::Build { .. })
        ));
    }
}
