//! The proxy type synthesizer.
//!
//! [`ProxyBuilder`] turns a source type into a [`ProxyType`]: it computes the capability set,
//! extracts the members to generate, checks every signature can be carried through the
//! interception contract, and assembles a new registered type whose members all funnel into
//! the configured [`Interceptor`](crate::proxy::Interceptor).
//!
//! # Synthesis Steps
//!
//! ```text
//! source type
//!     │
//!     ▼
//! CapabilitySet::of ──► InvalidCapability
//!     │
//!     ▼
//! extract ──► MemberDescriptor*
//!     │
//!     ▼
//! check_representable ──► UnsupportedMember
//!     │
//!     ▼
//! assemble: source field, slots, properties, events ──► BuildFailed
//!     │
//!     ▼
//! TypeRegistry::insert ──► ProxyType (cached per source type)
//! ```

use std::{collections::HashMap, sync::Arc};

use dashmap::DashMap;
use indexmap::IndexMap;
use log::debug;
use rayon::prelude::*;

use crate::{
    metadata::{
        members::{
            Event, Field, FieldAttributes, Method, MethodAttributes, MethodRc, Property,
        },
        signatures::{SignatureKey, TypeSignature},
        token::{TableKind, Token},
        typesystem::{
            TypeAttributes, TypeDescriptor, TypeFlavor, TypeRc, TypeRegistry,
        },
    },
    proxy::{
        extract, CapabilitySet, Interceptor, InterceptorFactory, MemberDescriptor, ProxyConfig,
        ProxyType, ProxyTypeRc, ReturnConversion, SlotKind, SynthesizedMember,
    },
    Error, Result,
};

/// Builds proxy types for source types.
///
/// Implementations must register every type they build in [`TypeSynthesizer::registry`] and
/// return the same proxy type for repeated requests with the same source type.
pub trait TypeSynthesizer: Send + Sync {
    /// Build, or reuse, the proxy type for `source`.
    ///
    /// # Errors
    /// Returns [`Error::TypeNotFound`] if `source` is not a type of [`TypeSynthesizer::registry`],
    /// [`Error::InvalidCapability`] if `source` has no capability,
    /// [`Error::UnsupportedMember`] if a member can not be represented or two capabilities
    /// disagree on a member's type, and [`Error::BuildFailed`] for any other synthesis failure.
    fn build(&self, source: &TypeRc) -> Result<ProxyTypeRc>;

    /// The registry proxy types are registered in
    fn registry(&self) -> &Arc<TypeRegistry>;
}

/// The default [`TypeSynthesizer`].
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use dynproxy::{
///     metadata::{signatures::TypeSignature, typesystem::{TypeBuilder, TypeRegistry}},
///     proxy::{ProxyBuilder, TypeSynthesizer},
/// };
///
/// let registry = Arc::new(TypeRegistry::new());
/// let clock = TypeBuilder::interface("IClock")
///     .property("Now", TypeSignature::DateTime, true, false)
///     .build(&registry)?;
///
/// let builder = ProxyBuilder::new(registry.clone());
/// let first = builder.build(&clock)?;
/// let second = builder.build(&clock)?;
/// assert!(Arc::ptr_eq(&first, &second));
/// assert!(first.descriptor().is_synthesized());
/// # Ok::<(), dynproxy::Error>(())
/// ```
pub struct ProxyBuilder {
    registry: Arc<TypeRegistry>,
    config: ProxyConfig,
    interceptor: InterceptorFactory,
    cache: DashMap<Token, ProxyTypeRc>,
}

impl ProxyBuilder {
    /// Create a builder using the [`DefaultInterceptor`](crate::proxy::DefaultInterceptor)
    #[must_use]
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        ProxyBuilder {
            registry,
            config: ProxyConfig::default(),
            interceptor: InterceptorFactory::default(),
            cache: DashMap::new(),
        }
    }

    /// Replace the configuration
    #[must_use]
    pub fn with_config(mut self, config: ProxyConfig) -> Self {
        self.config = config;
        self
    }

    /// Route every generated member through a default-constructed `T`
    #[must_use]
    pub fn with_interceptor<T: Interceptor + Default + 'static>(self) -> Self {
        self.with_interceptor_factory(InterceptorFactory::of::<T>())
    }

    /// Route every generated member through strategies built by `factory`
    #[must_use]
    pub fn with_interceptor_factory(mut self, factory: InterceptorFactory) -> Self {
        self.interceptor = factory;
        self
    }

    /// The active configuration
    #[must_use]
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// The cached proxy type for the source type `token` of this builder's registry, if built
    #[must_use]
    pub fn cached(&self, token: &Token) -> Option<ProxyTypeRc> {
        self.cache.get(token).map(|entry| entry.value().clone())
    }

    /// `source` must be the descriptor registered under its token in this builder's registry.
    ///
    /// Tokens are only unique within one registry; a descriptor from another registry may
    /// carry the token of an unrelated local type.
    fn check_registered(&self, source: &TypeRc) -> Result<()> {
        match self.registry.get(&source.token) {
            Some(registered) if Arc::ptr_eq(&registered, source) => Ok(()),
            _ => Err(Error::TypeNotFound(format!(
                "{} ({}) is not registered with this builder",
                source.fullname(),
                source.token
            ))),
        }
    }

    /// Number of cached proxy types
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Build the proxy types of all `sources` in parallel.
    ///
    /// # Errors
    /// Returns the first failure; proxy types built before it stay cached.
    pub fn build_all(&self, sources: &[TypeRc]) -> Result<Vec<ProxyTypeRc>> {
        sources.par_iter().map(|source| self.build(source)).collect()
    }

    fn synthesize(&self, source: &TypeRc) -> Result<ProxyTypeRc> {
        let capabilities = CapabilitySet::of(source)?;
        let members = extract(&capabilities)?;

        for member in &members {
            for (_, method) in member.methods() {
                method
                    .signature
                    .check_representable()
                    .map_err(|reason| Error::UnsupportedMember {
                        member: method.qualified_name(),
                        reason,
                    })?;
            }
        }

        let proxy_type = self
            .assemble(capabilities, &members)
            .map_err(|cause| Error::BuildFailed {
                type_name: source.fullname(),
                source: Box::new(cause),
            })?;

        debug!(
            "Synthesized {} for {} ({} slots, interceptor {})",
            proxy_type.descriptor().fullname(),
            source.fullname(),
            proxy_type.slots().len(),
            self.interceptor.name()
        );
        Ok(Arc::new(proxy_type))
    }

    fn assemble(
        &self,
        capabilities: CapabilitySet,
        members: &[MemberDescriptor],
    ) -> Result<ProxyType> {
        let registry = &self.registry;
        let source = capabilities.source().clone();

        let token = registry.next_token(TableKind::TypeDef)?;
        let name = self.proxy_name(&source);
        let fullname = if source.namespace.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", source.namespace, name)
        };

        let source_field = Arc::new(Field {
            token: registry.next_token(TableKind::Field)?,
            name: self.config.source_field.clone(),
            field_type: TypeSignature::Class(source.token),
            flags: FieldAttributes::PRIVATE | FieldAttributes::INIT_ONLY,
        });

        let mut slots: Vec<SynthesizedMember> = Vec::new();
        let mut methods: Vec<MethodRc> = Vec::new();
        let mut generated: HashMap<SignatureKey, MethodRc> = HashMap::new();
        let mut generate = |kind: SlotKind,
                            target: &MethodRc,
                            capability: Token|
         -> Result<MethodRc> {
            let method = Arc::new(Method {
                token: registry.next_token(TableKind::MethodDef)?,
                name: target.name.clone(),
                declaring: token,
                declaring_name: fullname.clone(),
                signature: target.signature.clone(),
                flags: MethodAttributes::PUBLIC
                    | MethodAttributes::VIRTUAL
                    | MethodAttributes::FINAL
                    | (target.flags & MethodAttributes::SPECIAL_NAME),
                semantics: target.semantics.clone(),
            });
            slots.push(SynthesizedMember {
                slot: slots.len(),
                kind,
                method: method.clone(),
                target: target.clone(),
                capability,
                conversion: ReturnConversion::for_return(&target.signature.return_type),
            });
            generated.insert(method.key(), method.clone());
            methods.push(method.clone());
            Ok(method)
        };

        // Same-named properties and events of several capabilities merge into one member.
        let mut properties: IndexMap<(String, TypeSignature), [Option<MethodRc>; 2]> =
            IndexMap::new();
        let mut events: IndexMap<(String, TypeSignature), [Option<MethodRc>; 2]> =
            IndexMap::new();

        for member in members {
            let capability = member.capability().token;
            match member {
                MemberDescriptor::Method { method, .. } => {
                    generate(SlotKind::Method, method, capability)?;
                }
                MemberDescriptor::Property {
                    property,
                    getter,
                    setter,
                    ..
                } => {
                    let getter = getter
                        .as_ref()
                        .map(|m| generate(SlotKind::Getter, m, capability))
                        .transpose()?;
                    let setter = setter
                        .as_ref()
                        .map(|m| generate(SlotKind::Setter, m, capability))
                        .transpose()?;
                    let accessors = properties
                        .entry((property.name.clone(), property.property_type.clone()))
                        .or_default();
                    accessors[0] = accessors[0].take().or(getter);
                    accessors[1] = accessors[1].take().or(setter);
                }
                MemberDescriptor::Event {
                    event,
                    add_on,
                    remove_on,
                    ..
                } => {
                    let add_on = add_on
                        .as_ref()
                        .map(|m| generate(SlotKind::AddOn, m, capability))
                        .transpose()?;
                    let remove_on = remove_on
                        .as_ref()
                        .map(|m| generate(SlotKind::RemoveOn, m, capability))
                        .transpose()?;
                    let accessors = events
                        .entry((event.name.clone(), event.handler_type.clone()))
                        .or_default();
                    accessors[0] = accessors[0].take().or(add_on);
                    accessors[1] = accessors[1].take().or(remove_on);
                }
            }
        }

        // Accessors synthesized earlier for another member are shared, not regenerated.
        let lookup = |existing: Option<MethodRc>, declared: Option<&MethodRc>| -> Option<MethodRc> {
            existing.or_else(|| declared.and_then(|m| generated.get(&m.key()).cloned()))
        };

        let mut proxy_properties = Vec::with_capacity(properties.len());
        for ((name, property_type), [getter, setter]) in properties {
            let declared = source.find_property(&name);
            let getter = lookup(getter, declared.as_ref().and_then(|p| p.getter.as_ref()));
            let setter = lookup(setter, declared.as_ref().and_then(|p| p.setter.as_ref()));
            proxy_properties.push(Arc::new(Property {
                token: registry.next_token(TableKind::Property)?,
                name,
                property_type,
                getter,
                setter,
            }));
        }

        let mut proxy_events = Vec::with_capacity(events.len());
        for ((name, handler_type), [add_on, remove_on]) in events {
            let declared = source.find_event(&name);
            let add_on = lookup(add_on, declared.as_ref().map(|e| &e.add_on));
            let remove_on = lookup(remove_on, declared.as_ref().map(|e| &e.remove_on));
            let (Some(add_on), Some(remove_on)) = (add_on, remove_on) else {
                return Err(build_error!(
                    "Event '{}' of '{}' is missing an accessor",
                    name,
                    source.fullname()
                ));
            };
            proxy_events.push(Arc::new(Event {
                token: registry.next_token(TableKind::Event)?,
                name,
                handler_type,
                add_on,
                remove_on,
            }));
        }

        let descriptor = Arc::new(TypeDescriptor {
            token,
            namespace: source.namespace.clone(),
            name,
            flavor: TypeFlavor::Class,
            flags: TypeAttributes::PUBLIC | TypeAttributes::SEALED | TypeAttributes::SYNTHESIZED,
            interfaces: capabilities.capabilities().to_vec(),
            methods,
            properties: proxy_properties,
            events: proxy_events,
            fields: vec![source_field.clone()],
            generic_params: source.generic_params.clone(),
            generic_args: source.generic_args.clone(),
            generic_definition: None,
            rust_type: None,
        });
        registry.insert(descriptor.clone())?;

        Ok(ProxyType::new(
            descriptor,
            source_field,
            capabilities,
            slots,
            self.interceptor.clone(),
            self.config.strict_returns,
        ))
    }

    /// `<Source><suffix>_<guid>`, with generic arguments stripped from the source name
    fn proxy_name(&self, source: &TypeRc) -> String {
        let base = source
            .name
            .split_once('<')
            .map_or(source.name.as_str(), |(base, _)| base);
        let guid = uguid::Guid::from_random_bytes(rand::random::<[u8; 16]>());
        format!(
            "{}{}_{}",
            base,
            self.config.name_suffix,
            guid.to_string().replace('-', "")
        )
    }
}

impl TypeSynthesizer for ProxyBuilder {
    fn build(&self, source: &TypeRc) -> Result<ProxyTypeRc> {
        self.check_registered(source)?;
        if !self.config.cache_types {
            return self.synthesize(source);
        }

        if let Some(cached) = self.cache.get(&source.token) {
            if Arc::ptr_eq(cached.source_type(), source) {
                debug!("Reusing {} for {}", cached.descriptor().fullname(), source.fullname());
                return Ok(cached.value().clone());
            }
        }

        let entry = self
            .cache
            .entry(source.token)
            .or_try_insert_with(|| self.synthesize(source))?;
        if !Arc::ptr_eq(entry.source_type(), source) {
            return Err(build_error!(
                "Cached proxy type {} was built for another '{}'",
                entry.descriptor().fullname(),
                source.fullname()
            ));
        }
        Ok(entry.value().clone())
    }

    fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }
}
