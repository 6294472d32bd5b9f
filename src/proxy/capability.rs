//! Capability sets: the interfaces a proxy must expose.

use std::fmt;

use crate::{
    metadata::{token::Token, typesystem::TypeRc},
    Error, Result,
};

/// The ordered set of interfaces a source type implements.
///
/// Interfaces appear in declared order, each before the interfaces it inherits, without
/// duplicates. An interface source type is appended after its own bases.
#[derive(Clone)]
pub struct CapabilitySet {
    source: TypeRc,
    capabilities: Vec<TypeRc>,
}

impl CapabilitySet {
    /// Compute the capability set of `source`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidCapability`] if `source` is neither an interface nor implements
    /// one.
    pub fn of(source: &TypeRc) -> Result<Self> {
        let mut capabilities = source.all_interfaces();
        if source.is_interface() && !capabilities.iter().any(|c| c.token == source.token) {
            capabilities.push(source.clone());
        }

        if capabilities.is_empty() {
            return Err(Error::InvalidCapability(source.fullname()));
        }

        Ok(CapabilitySet {
            source: source.clone(),
            capabilities,
        })
    }

    /// The type this set was computed for
    #[must_use]
    pub fn source(&self) -> &TypeRc {
        &self.source
    }

    /// The capabilities, in resolution order
    #[must_use]
    pub fn capabilities(&self) -> &[TypeRc] {
        &self.capabilities
    }

    /// Iterate the capabilities in resolution order
    pub fn iter(&self) -> std::slice::Iter<'_, TypeRc> {
        self.capabilities.iter()
    }

    /// Number of capabilities
    #[must_use]
    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    /// True if the set holds no capability
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    /// True if the interface `token` is part of the set
    #[must_use]
    pub fn contains(&self, token: Token) -> bool {
        self.capabilities.iter().any(|c| c.token == token)
    }
}

impl<'a> IntoIterator for &'a CapabilitySet {
    type Item = &'a TypeRc;
    type IntoIter = std::slice::Iter<'a, TypeRc>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilitySet")
            .field("source", &self.source.fullname())
            .field(
                "capabilities",
                &self
                    .capabilities
                    .iter()
                    .map(|c| c.fullname())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{
        signatures::TypeSignature,
        typesystem::{TypeBuilder, TypeRegistry},
    };

    #[test]
    fn test_class_capabilities_are_its_interfaces() -> Result<()> {
        let registry = TypeRegistry::new();
        let named = TypeBuilder::interface("INamed")
            .property("Name", TypeSignature::String, true, true)
            .build(&registry)?;
        let person = TypeBuilder::interface("IPerson")
            .implements(&named)
            .build(&registry)?;
        let notify = TypeBuilder::interface("INotify")
            .event("Changed", TypeSignature::Delegate)
            .build(&registry)?;
        let model = TypeBuilder::class("PersonModel")
            .implements(&person)
            .implements(&notify)
            .build(&registry)?;

        let set = CapabilitySet::of(&model)?;
        let names: Vec<String> = set.iter().map(|c| c.fullname()).collect();
        assert_eq!(names, vec!["IPerson", "INamed", "INotify"]);
        assert!(!set.contains(model.token));
        Ok(())
    }

    #[test]
    fn test_interface_is_appended_after_its_bases() -> Result<()> {
        let registry = TypeRegistry::new();
        let named = TypeBuilder::interface("INamed").build(&registry)?;
        let person = TypeBuilder::interface("IPerson")
            .implements(&named)
            .build(&registry)?;

        let set = CapabilitySet::of(&person)?;
        let tokens: Vec<Token> = set.iter().map(|c| c.token).collect();
        assert_eq!(tokens, vec![named.token, person.token]);
        Ok(())
    }

    #[test]
    fn test_class_without_interfaces_is_rejected() -> Result<()> {
        let registry = TypeRegistry::new();
        let plain = TypeBuilder::class("Plain")
            .method("Run", TypeSignature::Void, vec![])
            .build(&registry)?;

        match CapabilitySet::of(&plain) {
            Err(Error::InvalidCapability(name)) => assert_eq!(name, "Plain"),
            other => panic!("unexpected result: {other:?}"),
        }
        Ok(())
    }
}
