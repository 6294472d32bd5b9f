//! Proxy instances.

use std::{any::Any, fmt};

use crate::{
    metadata::{members::MethodRc, typesystem::TypeRc},
    proxy::ProxyTypeRc,
    runtime::{Object, ObjectRef, Value},
    Error, Result,
};

/// An instance of a [`ProxyType`](crate::proxy::ProxyType) bound to a source instance.
///
/// The source reference is set once at construction and never replaced. The proxy holds no
/// state of its own: every member access is routed through the interceptor to the bound
/// source, so proxy and source always observe the same values.
pub struct ProxyInstance {
    proxy_type: ProxyTypeRc,
    source: ObjectRef,
}

impl ProxyInstance {
    pub(crate) fn new(proxy_type: ProxyTypeRc, source: ObjectRef) -> Self {
        ProxyInstance { proxy_type, source }
    }

    /// The bound source instance
    #[must_use]
    pub fn source(&self) -> &ObjectRef {
        &self.source
    }

    /// The type of this proxy
    #[must_use]
    pub fn proxy_type(&self) -> &ProxyTypeRc {
        &self.proxy_type
    }

    /// Invoke the member in slot `index`.
    ///
    /// # Errors
    /// Returns [`Error::MemberNotFound`] for an unknown slot, otherwise see
    /// [`SynthesizedMember::invoke`](crate::proxy::SynthesizedMember::invoke).
    pub fn invoke_slot(&self, index: usize, args: &[Value]) -> Result<Value> {
        let slot = self.proxy_type.slots().get(index).ok_or_else(|| {
            Error::MemberNotFound(format!(
                "{} slot {}",
                self.proxy_type.descriptor().fullname(),
                index
            ))
        })?;
        self.proxy_type.dispatch(slot, self, args)
    }
}

impl Object for ProxyInstance {
    fn runtime_type(&self) -> TypeRc {
        self.proxy_type.descriptor().clone()
    }

    fn invoke(&self, method: &MethodRc, args: &[Value]) -> Result<Value> {
        let slot = self
            .proxy_type
            .slot_for(method)
            .ok_or_else(|| Error::MemberNotFound(method.qualified_name()))?;
        self.proxy_type.dispatch(slot, self, args)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for ProxyInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyInstance")
            .field("type", &self.proxy_type.descriptor().fullname())
            .field("source", &self.source.runtime_type().fullname())
            .finish()
    }
}
