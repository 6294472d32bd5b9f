//! Synthesized proxy types and their member slots.
//!
//! A [`ProxyType`] is the finished product of synthesis: a registered [`TypeDescriptor`]
//! describing the proxy's shape, plus one [`SynthesizedMember`] per generated method. A slot
//! plays the role of a generated method body. It captures everything the body needs at
//! synthesis time (parameter list, member identity, return conversion), so an invocation
//! never looks anything up by name.
//!
//! [`TypeDescriptor`]: crate::metadata::typesystem::TypeDescriptor

use std::{collections::HashMap, fmt, sync::Arc};

use log::trace;

use crate::{
    metadata::{
        members::{FieldRc, MethodRc},
        signatures::{SignatureKey, TypeSignature},
        token::Token,
        typesystem::TypeRc,
    },
    proxy::{
        CapabilitySet, InterceptionArguments, Interceptor, InterceptorFactory, ProxyInstance,
        SlotKind,
    },
    runtime::{ObjectRef, Value},
    Error, Result,
};

/// Reference to a `ProxyType`
pub type ProxyTypeRc = Arc<ProxyType>;

/// How an interceptor result is turned into a member's return value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReturnConversion {
    /// `void` member, the result is dropped
    Discard,
    /// Value-typed return, the result must carry exactly this type
    Unbox(TypeSignature),
    /// Reference-typed return, passed through as-is
    Reference(TypeSignature),
}

impl ReturnConversion {
    /// The conversion for a member returning `return_type`
    #[must_use]
    pub fn for_return(return_type: &TypeSignature) -> Self {
        if return_type.is_void() {
            ReturnConversion::Discard
        } else if return_type.is_value_type() {
            ReturnConversion::Unbox(return_type.clone())
        } else {
            ReturnConversion::Reference(return_type.clone())
        }
    }

    /// Convert an interceptor result.
    ///
    /// # Errors
    /// With `strict` set, returns [`Error::InvalidCast`] if `value` does not conform to the
    /// return type.
    pub fn apply(&self, value: Value, strict: bool) -> Result<Value> {
        match self {
            ReturnConversion::Discard => Ok(Value::Void),
            ReturnConversion::Unbox(signature) | ReturnConversion::Reference(signature) => {
                if strict && !value.conforms_to(signature) {
                    Err(value.cast_error(signature))
                } else {
                    Ok(value)
                }
            }
        }
    }
}

/// One generated member of a proxy type.
#[derive(Clone)]
pub struct SynthesizedMember {
    /// Index in the proxy type's slot table
    pub slot: usize,
    /// The member's role
    pub kind: SlotKind,
    /// The method declared on the proxy type
    pub method: MethodRc,
    /// The capability member handed to the interceptor as member identity
    pub target: MethodRc,
    /// Token of the capability declaring `target`
    pub capability: Token,
    /// Conversion of the interceptor result
    pub conversion: ReturnConversion,
}

impl SynthesizedMember {
    /// Run the generated body: check and collect the arguments, call the interceptor, convert
    /// its result.
    ///
    /// # Errors
    /// Returns [`Error::ArgumentCount`] or [`Error::InvalidCast`] for arguments that do not
    /// match the signature, the interceptor's error, or [`Error::InvalidCast`] for a
    /// non-conforming result under `strict`.
    pub fn invoke(
        &self,
        proxy: &ProxyInstance,
        interceptor: &dyn Interceptor,
        args: &[Value],
        strict: bool,
    ) -> Result<Value> {
        let params = &self.method.signature.params;
        if params.len() != args.len() {
            return Err(Error::ArgumentCount {
                member: self.method.qualified_name(),
                expected: params.len(),
                found: args.len(),
            });
        }

        let mut arguments = InterceptionArguments::with_capacity(args.len());
        for (param, arg) in params.iter().zip(args) {
            if !arg.conforms_to(&param.base) {
                return Err(arg.cast_error(&param.base));
            }
            arguments.insert(param.name.as_str(), arg.clone())?;
        }

        trace!(
            "{} slot {} -> {} ({})",
            self.method.qualified_name(),
            self.slot,
            self.target.qualified_name(),
            arguments
        );

        let result = interceptor.intercept(proxy, proxy.source(), &self.target, arguments)?;
        self.conversion.apply(result, strict)
    }
}

impl fmt::Debug for SynthesizedMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynthesizedMember")
            .field("slot", &self.slot)
            .field("kind", &self.kind)
            .field("method", &self.method.to_string())
            .field("target", &self.target.qualified_name())
            .field("conversion", &self.conversion)
            .finish()
    }
}

/// A synthesized proxy type, ready for instantiation.
///
/// Immutable once built; instantiate it from any number of threads.
pub struct ProxyType {
    descriptor: TypeRc,
    source_type: TypeRc,
    source_field: FieldRc,
    capabilities: CapabilitySet,
    slots: Vec<SynthesizedMember>,
    by_token: HashMap<Token, usize>,
    by_key: HashMap<SignatureKey, usize>,
    interceptor: InterceptorFactory,
    strict_returns: bool,
}

impl ProxyType {
    pub(crate) fn new(
        descriptor: TypeRc,
        source_field: FieldRc,
        capabilities: CapabilitySet,
        slots: Vec<SynthesizedMember>,
        interceptor: InterceptorFactory,
        strict_returns: bool,
    ) -> Self {
        let mut by_token = HashMap::with_capacity(slots.len() * 2);
        let mut by_key = HashMap::with_capacity(slots.len());
        for slot in &slots {
            by_token.insert(slot.method.token, slot.slot);
            by_token.entry(slot.target.token).or_insert(slot.slot);
            by_key.entry(slot.method.key()).or_insert(slot.slot);
        }

        ProxyType {
            descriptor,
            source_type: capabilities.source().clone(),
            source_field,
            capabilities,
            slots,
            by_token,
            by_key,
            interceptor,
            strict_returns,
        }
    }

    /// The registered type describing the proxy
    #[must_use]
    pub fn descriptor(&self) -> &TypeRc {
        &self.descriptor
    }

    /// The type this proxy was built for
    #[must_use]
    pub fn source_type(&self) -> &TypeRc {
        &self.source_type
    }

    /// The private field holding the source reference
    #[must_use]
    pub fn source_field(&self) -> &FieldRc {
        &self.source_field
    }

    /// The capabilities the proxy implements
    #[must_use]
    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    /// All generated members, in slot order
    #[must_use]
    pub fn slots(&self) -> &[SynthesizedMember] {
        &self.slots
    }

    /// The strategy factory invocations go through
    #[must_use]
    pub fn interceptor(&self) -> &InterceptorFactory {
        &self.interceptor
    }

    /// The slot answering `method`.
    ///
    /// `method` may be the proxy's own method, the capability member it was generated from,
    /// or any method with the same full signature.
    #[must_use]
    pub fn slot_for(&self, method: &MethodRc) -> Option<&SynthesizedMember> {
        self.by_token
            .get(&method.token)
            .or_else(|| self.by_key.get(&method.key()))
            .and_then(|index| self.slots.get(*index))
    }

    /// Create an instance bound to `source`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidCast`] if `source` is not an instance of the source type or of a
    /// type implementing it.
    pub fn instantiate(self: &Arc<Self>, source: ObjectRef) -> Result<Arc<ProxyInstance>> {
        let runtime_type = source.runtime_type();
        if !runtime_type.is_assignable_to(&self.source_type) {
            return Err(Error::InvalidCast {
                expected: self.source_type.fullname(),
                found: runtime_type.fullname(),
            });
        }
        Ok(Arc::new(ProxyInstance::new(self.clone(), source)))
    }

    /// Run the slot on `proxy` with a freshly constructed strategy.
    ///
    /// # Errors
    /// See [`SynthesizedMember::invoke`].
    pub fn dispatch(
        &self,
        slot: &SynthesizedMember,
        proxy: &ProxyInstance,
        args: &[Value],
    ) -> Result<Value> {
        let interceptor = self.interceptor.create();
        slot.invoke(proxy, interceptor.as_ref(), args, self.strict_returns)
    }
}

impl fmt::Debug for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyType")
            .field("name", &self.descriptor.fullname())
            .field("source", &self.source_type.fullname())
            .field("field", &self.source_field.name)
            .field("slots", &self.slots.len())
            .field("interceptor", &self.interceptor.name())
            .finish()
    }
}
