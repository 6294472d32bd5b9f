//! Member definitions: methods, properties, events and fields.
//!
//! Members are immutable once their declaring type is registered. Property and event
//! accessors are ordinary [`Method`]s flagged [`MethodAttributes::SPECIAL_NAME`] and carrying
//! [`MethodSemantics`] that point back at the owning property or event, mirroring the CLI
//! `MethodSemantics` table.

use std::{fmt, sync::Arc};

use bitflags::bitflags;
use strum::Display;

use crate::metadata::{
    signatures::{SignatureKey, SignatureMethod, TypeSignature},
    token::Token,
};

/// Reference to a `Method`
pub type MethodRc = Arc<Method>;
/// Reference to a `Property`
pub type PropertyRc = Arc<Property>;
/// Reference to an `Event`
pub type EventRc = Arc<Event>;
/// Reference to a `Field`
pub type FieldRc = Arc<Field>;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    /// Method attribute flags
    pub struct MethodAttributes: u32 {
        /// Accessible by anyone who can see the declaring type
        const PUBLIC = 0x0006;
        /// Accessible only within the declaring type
        const PRIVATE = 0x0001;
        /// Defined on the type rather than per instance
        const STATIC = 0x0010;
        /// Method cannot be overridden
        const FINAL = 0x0020;
        /// Method is virtual
        const VIRTUAL = 0x0040;
        /// Method does not provide an implementation
        const ABSTRACT = 0x0400;
        /// Method name is special (property/event accessor)
        const SPECIAL_NAME = 0x0800;
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    /// Field attribute flags
    pub struct FieldAttributes: u32 {
        /// Accessible only within the declaring type
        const PRIVATE = 0x0001;
        /// Accessible by anyone who can see the declaring type
        const PUBLIC = 0x0006;
        /// Field can only be assigned during construction
        const INIT_ONLY = 0x0020;
    }
}

/// The role an accessor method plays for its owning property or event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum MethodSemantics {
    /// Property getter (`get_X`)
    Getter,
    /// Property setter (`set_X`)
    Setter,
    /// Event subscription (`add_X`)
    AddOn,
    /// Event unsubscription (`remove_X`)
    RemoveOn,
}

impl MethodSemantics {
    /// The CLI name prefix of accessors with this role
    #[must_use]
    pub fn prefix(&self) -> &'static str {
        match self {
            MethodSemantics::Getter => "get_",
            MethodSemantics::Setter => "set_",
            MethodSemantics::AddOn => "add_",
            MethodSemantics::RemoveOn => "remove_",
        }
    }

    /// The accessor method name for a property or event called `owner`
    #[must_use]
    pub fn accessor_name(&self, owner: &str) -> String {
        format!("{}{}", self.prefix(), owner)
    }
}

/// A method declared on a type.
#[derive(Debug)]
pub struct Method {
    /// Token
    pub token: Token,
    /// Method name
    pub name: String,
    /// Token of the declaring type
    pub declaring: Token,
    /// Full name of the declaring type
    pub declaring_name: String,
    /// Parameters, return type and generic parameters
    pub signature: SignatureMethod,
    /// Attribute flags
    pub flags: MethodAttributes,
    /// Accessor role and owner name, if this is a property or event accessor
    pub semantics: Option<(MethodSemantics, String)>,
}

impl Method {
    /// Returns `Declaring::Name`, used in diagnostics
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.declaring_name, self.name)
    }

    /// Full-signature identity of this method
    #[must_use]
    pub fn key(&self) -> SignatureKey {
        SignatureKey::new(&self.name, &self.signature)
    }

    /// Compiler-synthesized accessors are not plain methods
    #[must_use]
    pub fn is_special(&self) -> bool {
        self.flags.contains(MethodAttributes::SPECIAL_NAME)
    }

    /// True for methods without `this`
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags.contains(MethodAttributes::STATIC)
    }

    /// Number of declared parameters
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.signature.params.len()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{} {}", self.declaring_name, self.name, self.signature)
    }
}

/// A property with its accessors.
#[derive(Debug)]
pub struct Property {
    /// Token
    pub token: Token,
    /// Property name
    pub name: String,
    /// Type of the property value
    pub property_type: TypeSignature,
    /// `get_X`, if readable
    pub getter: Option<MethodRc>,
    /// `set_X`, if writable
    pub setter: Option<MethodRc>,
}

/// An event with its subscription accessors.
#[derive(Debug)]
pub struct Event {
    /// Token
    pub token: Token,
    /// Event name
    pub name: String,
    /// Type of the handlers the event accepts
    pub handler_type: TypeSignature,
    /// `add_X`
    pub add_on: MethodRc,
    /// `remove_X`
    pub remove_on: MethodRc,
}

/// A field declared on a type.
#[derive(Debug)]
pub struct Field {
    /// Token
    pub token: Token,
    /// Field name
    pub name: String,
    /// Type of the stored value
    pub field_type: TypeSignature,
    /// Attribute flags
    pub flags: FieldAttributes,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{signatures::SignatureParameter, token::TableKind};

    fn setter() -> Method {
        Method {
            token: Token::from_parts(TableKind::MethodDef, 2),
            name: "set_Name".to_string(),
            declaring: Token::from_parts(TableKind::TypeDef, 1),
            declaring_name: "Demo.IEmployee".to_string(),
            signature: SignatureMethod::new(
                TypeSignature::Void,
                vec![SignatureParameter::new("value", TypeSignature::String)],
            ),
            flags: MethodAttributes::PUBLIC
                | MethodAttributes::VIRTUAL
                | MethodAttributes::ABSTRACT
                | MethodAttributes::SPECIAL_NAME,
            semantics: Some((MethodSemantics::Setter, "Name".to_string())),
        }
    }

    #[test]
    fn test_accessor_names() {
        assert_eq!(MethodSemantics::Getter.accessor_name("Id"), "get_Id");
        assert_eq!(
            MethodSemantics::RemoveOn.accessor_name("PropertyChanged"),
            "remove_PropertyChanged"
        );
    }

    #[test]
    fn test_method_helpers() {
        let method = setter();
        assert!(method.is_special());
        assert!(!method.is_static());
        assert_eq!(method.param_count(), 1);
        assert_eq!(method.qualified_name(), "Demo.IEmployee::set_Name");
        assert_eq!(method.key().to_string(), "set_Name(string)");
        assert_eq!(
            method.to_string(),
            "Demo.IEmployee::set_Name void (string value)"
        );
    }
}
