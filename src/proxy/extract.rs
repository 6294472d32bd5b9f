//! Member descriptor extraction.
//!
//! Walks a [`CapabilitySet`] and lists every member a proxy type has to synthesize. Property
//! and event accessors are never listed as plain methods; they are reported through their
//! owning property or event so each accessor is synthesized exactly once.

use std::collections::{hash_map::Entry, HashMap};

use strum::Display;

use crate::{
    metadata::{
        members::{EventRc, MethodRc, PropertyRc},
        signatures::{SignatureKey, TypeSignature},
        typesystem::TypeRc,
    },
    proxy::CapabilitySet,
    Error, Result,
};

/// The role a synthesized member plays on the proxy type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum SlotKind {
    /// Plain method
    Method,
    /// Property getter
    Getter,
    /// Property setter
    Setter,
    /// Event subscription
    AddOn,
    /// Event unsubscription
    RemoveOn,
}

/// One member of a capability set to synthesize.
#[derive(Clone, Debug)]
pub enum MemberDescriptor {
    /// A plain method
    Method {
        /// The declaring capability
        capability: TypeRc,
        /// The capability member
        method: MethodRc,
    },
    /// A property; accessors already provided by an earlier capability are `None`
    Property {
        /// The declaring capability
        capability: TypeRc,
        /// The capability property
        property: PropertyRc,
        /// Getter to synthesize
        getter: Option<MethodRc>,
        /// Setter to synthesize
        setter: Option<MethodRc>,
    },
    /// An event; accessors already provided by an earlier capability are `None`
    Event {
        /// The declaring capability
        capability: TypeRc,
        /// The capability event
        event: EventRc,
        /// `add_X` to synthesize
        add_on: Option<MethodRc>,
        /// `remove_X` to synthesize
        remove_on: Option<MethodRc>,
    },
}

impl MemberDescriptor {
    /// The capability declaring this member
    #[must_use]
    pub fn capability(&self) -> &TypeRc {
        match self {
            MemberDescriptor::Method { capability, .. }
            | MemberDescriptor::Property { capability, .. }
            | MemberDescriptor::Event { capability, .. } => capability,
        }
    }

    /// Name of the method, property or event
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            MemberDescriptor::Method { method, .. } => &method.name,
            MemberDescriptor::Property { property, .. } => &property.name,
            MemberDescriptor::Event { event, .. } => &event.name,
        }
    }

    /// True for property and event members, whose methods are compiler-synthesized accessors
    #[must_use]
    pub fn is_special(&self) -> bool {
        !matches!(self, MemberDescriptor::Method { .. })
    }

    /// The methods to synthesize for this member, with their role
    #[must_use]
    pub fn methods(&self) -> Vec<(SlotKind, &MethodRc)> {
        match self {
            MemberDescriptor::Method { method, .. } => vec![(SlotKind::Method, method)],
            MemberDescriptor::Property { getter, setter, .. } => getter
                .iter()
                .map(|m| (SlotKind::Getter, m))
                .chain(setter.iter().map(|m| (SlotKind::Setter, m)))
                .collect(),
            MemberDescriptor::Event {
                add_on, remove_on, ..
            } => add_on
                .iter()
                .map(|m| (SlotKind::AddOn, m))
                .chain(remove_on.iter().map(|m| (SlotKind::RemoveOn, m)))
                .collect(),
        }
    }
}

/// List the members to synthesize for `capabilities`.
///
/// Per capability, plain methods come first, then properties, then events, each in
/// declaration order. A method signature declared by several capabilities is reported once,
/// from the first capability declaring it.
///
/// # Errors
/// Returns [`Error::InvalidCapability`] if the set is empty, and [`Error::UnsupportedMember`]
/// if two capabilities declare the same method with different return types, or the same
/// property or event with different types.
pub fn extract(capabilities: &CapabilitySet) -> Result<Vec<MemberDescriptor>> {
    if capabilities.is_empty() {
        return Err(Error::InvalidCapability(capabilities.source().fullname()));
    }

    let mut seen: HashMap<SignatureKey, MethodRc> = HashMap::new();
    let mut claim = |method: &MethodRc| -> Result<Option<MethodRc>> {
        match seen.entry(method.key()) {
            Entry::Vacant(slot) => {
                slot.insert(method.clone());
                Ok(Some(method.clone()))
            }
            Entry::Occupied(slot) => {
                let first = slot.get();
                if first.signature.return_type == method.signature.return_type {
                    Ok(None)
                } else {
                    Err(Error::UnsupportedMember {
                        member: method.qualified_name(),
                        reason: format!(
                            "returns '{}' but '{}' returns '{}'",
                            method.signature.return_type,
                            first.qualified_name(),
                            first.signature.return_type
                        ),
                    })
                }
            }
        }
    };

    let mut property_types: HashMap<String, (TypeSignature, String)> = HashMap::new();
    let mut event_types: HashMap<String, (TypeSignature, String)> = HashMap::new();

    let mut members = Vec::new();
    for capability in capabilities {
        for method in &capability.methods {
            if method.is_special() || method.is_static() {
                continue;
            }
            if let Some(method) = claim(method)? {
                members.push(MemberDescriptor::Method {
                    capability: capability.clone(),
                    method,
                });
            }
        }

        for property in &capability.properties {
            same_type(
                &mut property_types,
                capability,
                &property.name,
                &property.property_type,
            )?;
            let getter = property.getter.as_ref().map(&mut claim).transpose()?.flatten();
            let setter = property.setter.as_ref().map(&mut claim).transpose()?.flatten();
            if getter.is_some() || setter.is_some() {
                members.push(MemberDescriptor::Property {
                    capability: capability.clone(),
                    property: property.clone(),
                    getter,
                    setter,
                });
            }
        }

        for event in &capability.events {
            same_type(&mut event_types, capability, &event.name, &event.handler_type)?;
            let add_on = claim(&event.add_on)?;
            let remove_on = claim(&event.remove_on)?;
            if add_on.is_some() || remove_on.is_some() {
                members.push(MemberDescriptor::Event {
                    capability: capability.clone(),
                    event: event.clone(),
                    add_on,
                    remove_on,
                });
            }
        }
    }

    Ok(members)
}

/// Same-named properties (or events) of several capabilities must agree on their type.
fn same_type(
    declared: &mut HashMap<String, (TypeSignature, String)>,
    capability: &TypeRc,
    name: &str,
    member_type: &TypeSignature,
) -> Result<()> {
    let member = format!("{}::{}", capability.fullname(), name);
    match declared.entry(name.to_string()) {
        Entry::Vacant(slot) => {
            slot.insert((member_type.clone(), member));
            Ok(())
        }
        Entry::Occupied(slot) => {
            let (first_type, first) = slot.get();
            if first_type == member_type {
                Ok(())
            } else {
                Err(Error::UnsupportedMember {
                    reason: format!(
                        "is of type '{member_type}' but '{first}' is of type '{first_type}'"
                    ),
                    member,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::typesystem::{TypeBuilder, TypeRegistry};

    #[test]
    fn test_accessors_are_reported_through_their_owner() -> Result<()> {
        let registry = TypeRegistry::new();
        let employee = TypeBuilder::interface("IEmployee")
            .property("Name", TypeSignature::String, true, true)
            .method(
                "CalculateTax",
                TypeSignature::R8,
                vec![("percent", TypeSignature::R8)],
            )
            .event("PropertyChanged", TypeSignature::Delegate)
            .static_method("Create", TypeSignature::Object, vec![])
            .build(&registry)?;

        let members = extract(&CapabilitySet::of(&employee)?)?;
        let names: Vec<&str> = members.iter().map(MemberDescriptor::name).collect();
        assert_eq!(names, vec!["CalculateTax", "Name", "PropertyChanged"]);

        assert!(!members[0].is_special());
        let kinds: Vec<SlotKind> = members.iter().flat_map(|m| m.methods()).map(|(k, _)| k).collect();
        assert_eq!(
            kinds,
            vec![
                SlotKind::Method,
                SlotKind::Getter,
                SlotKind::Setter,
                SlotKind::AddOn,
                SlotKind::RemoveOn
            ]
        );
        Ok(())
    }

    #[test]
    fn test_first_capability_wins() -> Result<()> {
        let registry = TypeRegistry::new();
        let first = TypeBuilder::interface("IFirst")
            .method("Describe", TypeSignature::String, vec![])
            .property("Name", TypeSignature::String, true, false)
            .build(&registry)?;
        let second = TypeBuilder::interface("ISecond")
            .method("Describe", TypeSignature::String, vec![])
            .method("Describe", TypeSignature::String, vec![("verbose", TypeSignature::Boolean)])
            .property("Name", TypeSignature::String, true, true)
            .build(&registry)?;
        let model = TypeBuilder::class("Model")
            .implements(&first)
            .implements(&second)
            .build(&registry)?;

        let members = extract(&CapabilitySet::of(&model)?)?;
        let describe: Vec<&MemberDescriptor> =
            members.iter().filter(|m| m.name() == "Describe").collect();
        assert_eq!(describe.len(), 2);
        assert_eq!(describe[0].capability().token, first.token);
        assert_eq!(describe[1].capability().token, second.token);

        let names: Vec<&MemberDescriptor> = members.iter().filter(|m| m.name() == "Name").collect();
        assert_eq!(names.len(), 2);
        match names[1] {
            MemberDescriptor::Property { getter, setter, .. } => {
                assert!(getter.is_none());
                assert!(setter.is_some());
            }
            other => panic!("unexpected member: {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_conflicting_return_types_are_rejected() -> Result<()> {
        let registry = TypeRegistry::new();
        let named = TypeBuilder::interface("INamed")
            .method("Get", TypeSignature::String, vec![])
            .build(&registry)?;
        let counted = TypeBuilder::interface("ICounted")
            .method("Get", TypeSignature::I4, vec![])
            .build(&registry)?;
        let model = TypeBuilder::class("Model")
            .implements(&named)
            .implements(&counted)
            .build(&registry)?;

        match extract(&CapabilitySet::of(&model)?) {
            Err(Error::UnsupportedMember { member, reason }) => {
                assert_eq!(member, "ICounted::Get");
                assert!(reason.contains("INamed::Get"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_conflicting_property_types_are_rejected() -> Result<()> {
        let registry = TypeRegistry::new();
        let labelled = TypeBuilder::interface("ILabelled")
            .property("Label", TypeSignature::String, false, true)
            .build(&registry)?;
        let coded = TypeBuilder::interface("ICoded")
            .property("Label", TypeSignature::I4, false, true)
            .build(&registry)?;
        let model = TypeBuilder::class("Model")
            .implements(&labelled)
            .implements(&coded)
            .build(&registry)?;

        match extract(&CapabilitySet::of(&model)?) {
            Err(Error::UnsupportedMember { member, reason }) => {
                assert_eq!(member, "ICoded::Label");
                assert!(reason.contains("ILabelled::Label"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        Ok(())
    }
}
