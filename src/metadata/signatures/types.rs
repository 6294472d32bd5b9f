use std::fmt;

use crate::metadata::token::Token;

/// The type of a parameter, return value, property, event handler or field.
///
/// Value-type signatures are the ones the dynamic [`Value`](crate::runtime::Value) carrier
/// boxes and unboxes; everything else is passed through as a reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum TypeSignature {
    #[default]
    /// void
    Void,
    /// bool
    Boolean,
    /// char
    Char,
    /// signed 32bit integer
    I4,
    /// signed 64bit integer
    I8,
    /// 64bit floating-point
    R8,
    /// System.String
    String,
    /// System.DateTime
    DateTime,
    /// System.Object
    Object,
    /// An event handler / callback
    Delegate,
    /// Reference to a registered class or interface
    Class(Token),
    /// Single dimension array
    SzArray(Box<TypeSignature>),
    /// Generic parameter of the declaring type, by position
    GenericParam(u32),
    /// Generic parameter of the method, by position
    MethodGenericParam(u32),
    /// Type by reference
    ByRef(Box<TypeSignature>),
    /// A pointer to a type
    Ptr(Box<TypeSignature>),
}

impl TypeSignature {
    /// Returns true for types that are boxed into the dynamic value carrier
    #[must_use]
    pub fn is_value_type(&self) -> bool {
        matches!(
            self,
            TypeSignature::Boolean
                | TypeSignature::Char
                | TypeSignature::I4
                | TypeSignature::I8
                | TypeSignature::R8
                | TypeSignature::DateTime
        )
    }

    /// Returns true for `void`
    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(self, TypeSignature::Void)
    }

    /// Returns true if this is an unbound generic parameter of the type or method
    #[must_use]
    pub fn is_generic_param(&self) -> bool {
        matches!(
            self,
            TypeSignature::GenericParam(_) | TypeSignature::MethodGenericParam(_)
        )
    }

    /// Returns false if the signature, or anything nested in it, is a by-ref or pointer type.
    #[must_use]
    pub fn is_representable(&self) -> bool {
        match self {
            TypeSignature::ByRef(_) | TypeSignature::Ptr(_) => false,
            TypeSignature::SzArray(inner) => inner.is_representable(),
            _ => true,
        }
    }

    /// Replaces type-level generic parameters with the provided arguments.
    ///
    /// Parameters without a matching argument are left untouched.
    #[must_use]
    pub fn substitute(&self, args: &[TypeSignature]) -> TypeSignature {
        match self {
            TypeSignature::GenericParam(index) => args
                .get(*index as usize)
                .cloned()
                .unwrap_or_else(|| self.clone()),
            TypeSignature::SzArray(inner) => TypeSignature::SzArray(Box::new(inner.substitute(args))),
            TypeSignature::ByRef(inner) => TypeSignature::ByRef(Box::new(inner.substitute(args))),
            TypeSignature::Ptr(inner) => TypeSignature::Ptr(Box::new(inner.substitute(args))),
            other => other.clone(),
        }
    }
}

impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSignature::Void => write!(f, "void"),
            TypeSignature::Boolean => write!(f, "bool"),
            TypeSignature::Char => write!(f, "char"),
            TypeSignature::I4 => write!(f, "int32"),
            TypeSignature::I8 => write!(f, "int64"),
            TypeSignature::R8 => write!(f, "float64"),
            TypeSignature::String => write!(f, "string"),
            TypeSignature::DateTime => write!(f, "System.DateTime"),
            TypeSignature::Object => write!(f, "object"),
            TypeSignature::Delegate => write!(f, "delegate"),
            TypeSignature::Class(token) => write!(f, "class {token}"),
            TypeSignature::SzArray(inner) => write!(f, "{inner}[]"),
            TypeSignature::GenericParam(index) => write!(f, "!{index}"),
            TypeSignature::MethodGenericParam(index) => write!(f, "!!{index}"),
            TypeSignature::ByRef(inner) => write!(f, "{inner}&"),
            TypeSignature::Ptr(inner) => write!(f, "{inner}*"),
        }
    }
}

/// A parameter or return value of a method (II.23.2.1)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SignatureParameter {
    /// Name of the parameter, empty for return values
    pub name: String,
    /// Parameter is passed by reference
    pub by_ref: bool,
    /// The type of the parameter
    pub base: TypeSignature,
}

impl SignatureParameter {
    /// A by-value parameter
    #[must_use]
    pub fn new(name: impl Into<String>, base: TypeSignature) -> Self {
        SignatureParameter {
            name: name.into(),
            by_ref: false,
            base,
        }
    }

    /// A by-reference (`ref`/`out`) parameter
    #[must_use]
    pub fn by_ref(name: impl Into<String>, base: TypeSignature) -> Self {
        SignatureParameter {
            name: name.into(),
            by_ref: true,
            base,
        }
    }
}

/// Represents a method signature (II.23.2.1)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SignatureMethod {
    /// Instance method (`this` is passed implicitly)
    pub has_this: bool,
    /// Used to encode the keyword vararg in the calling convention, see §II.15.3
    pub vararg: bool,
    /// Names of the method-level generic parameters
    pub generic_params: Vec<String>,
    /// The return type of this `Method`
    pub return_type: TypeSignature,
    /// The parameters of this `Method`
    pub params: Vec<SignatureParameter>,
}

impl SignatureMethod {
    /// An instance method signature
    #[must_use]
    pub fn new(return_type: TypeSignature, params: Vec<SignatureParameter>) -> Self {
        SignatureMethod {
            has_this: true,
            vararg: false,
            generic_params: Vec::new(),
            return_type,
            params,
        }
    }

    /// Replaces type-level generic parameters in the return type and all parameters
    #[must_use]
    pub fn substitute(&self, args: &[TypeSignature]) -> SignatureMethod {
        SignatureMethod {
            has_this: self.has_this,
            vararg: self.vararg,
            generic_params: self.generic_params.clone(),
            return_type: self.return_type.substitute(args),
            params: self
                .params
                .iter()
                .map(|param| SignatureParameter {
                    name: param.name.clone(),
                    by_ref: param.by_ref,
                    base: param.base.substitute(args),
                })
                .collect(),
        }
    }

    /// Checks that every parameter and the return type can be carried by value.
    ///
    /// # Errors
    /// Returns a description of the first feature that can not be represented.
    pub fn check_representable(&self) -> std::result::Result<(), String> {
        if self.vararg {
            return Err("vararg calling convention".to_string());
        }
        if !self.return_type.is_representable() {
            return Err(format!("return type '{}'", self.return_type));
        }
        for param in &self.params {
            if param.by_ref {
                return Err(format!("by-ref parameter '{}'", param.name));
            }
            if !param.base.is_representable() {
                return Err(format!("parameter '{}' of type '{}'", param.name, param.base));
            }
        }
        Ok(())
    }
}

impl fmt::Display for SignatureMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (", self.return_type)?;
        for (index, param) in self.params.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            if param.by_ref {
                write!(f, "ref ")?;
            }
            write!(f, "{} {}", param.base, param.name)?;
        }
        write!(f, ")")
    }
}

/// Full-signature identity of a method: name plus ordered parameter types.
///
/// Two methods with the same name but different parameter lists are different members.
/// The return type does not take part, matching CLI overload rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignatureKey {
    /// Method name
    pub name: String,
    /// Ordered parameter types and their by-ref flag
    pub params: Vec<(TypeSignature, bool)>,
}

impl SignatureKey {
    /// Builds the key of a method with the given name and signature
    #[must_use]
    pub fn new(name: &str, signature: &SignatureMethod) -> Self {
        SignatureKey {
            name: name.to_string(),
            params: signature
                .params
                .iter()
                .map(|param| (param.base.clone(), param.by_ref))
                .collect(),
        }
    }
}

impl fmt::Display for SignatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (index, (param, by_ref)) in self.params.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            if *by_ref {
                write!(f, "ref ")?;
            }
            write!(f, "{param}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tax_signature() -> SignatureMethod {
        SignatureMethod::new(
            TypeSignature::R8,
            vec![SignatureParameter::new("percent", TypeSignature::R8)],
        )
    }

    #[test]
    fn test_value_types() {
        assert!(TypeSignature::I4.is_value_type());
        assert!(TypeSignature::DateTime.is_value_type());
        assert!(!TypeSignature::String.is_value_type());
        assert!(!TypeSignature::Object.is_value_type());
        assert!(!TypeSignature::GenericParam(0).is_value_type());
    }

    #[test]
    fn test_nested_byref_is_not_representable() {
        let nested = TypeSignature::SzArray(Box::new(TypeSignature::Ptr(Box::new(
            TypeSignature::I4,
        ))));
        assert!(!nested.is_representable());
        assert!(TypeSignature::SzArray(Box::new(TypeSignature::String)).is_representable());
    }

    #[test]
    fn test_substitute_generic_params() {
        let signature = SignatureMethod::new(
            TypeSignature::GenericParam(0),
            vec![
                SignatureParameter::new("key", TypeSignature::GenericParam(1)),
                SignatureParameter::new(
                    "values",
                    TypeSignature::SzArray(Box::new(TypeSignature::GenericParam(0))),
                ),
            ],
        );

        let closed = signature.substitute(&[TypeSignature::String, TypeSignature::I4]);
        assert_eq!(closed.return_type, TypeSignature::String);
        assert_eq!(closed.params[0].base, TypeSignature::I4);
        assert_eq!(
            closed.params[1].base,
            TypeSignature::SzArray(Box::new(TypeSignature::String))
        );

        let partial = TypeSignature::GenericParam(3).substitute(&[TypeSignature::I4]);
        assert_eq!(partial, TypeSignature::GenericParam(3));
    }

    #[test]
    fn test_check_representable() {
        assert!(tax_signature().check_representable().is_ok());

        let by_ref = SignatureMethod::new(
            TypeSignature::Boolean,
            vec![SignatureParameter::by_ref("result", TypeSignature::I4)],
        );
        let reason = by_ref.check_representable().unwrap_err();
        assert!(reason.contains("result"));

        let mut vararg = tax_signature();
        vararg.vararg = true;
        assert!(vararg.check_representable().is_err());
    }

    #[test]
    fn test_signature_key_distinguishes_overloads() {
        let one = SignatureKey::new("Add", &tax_signature());
        let two = SignatureKey::new(
            "Add",
            &SignatureMethod::new(
                TypeSignature::R8,
                vec![
                    SignatureParameter::new("a", TypeSignature::R8),
                    SignatureParameter::new("b", TypeSignature::R8),
                ],
            ),
        );
        let renamed_param = SignatureKey::new(
            "Add",
            &SignatureMethod::new(
                TypeSignature::I4,
                vec![SignatureParameter::new("other", TypeSignature::R8)],
            ),
        );

        assert_ne!(one, two);
        assert_eq!(one, renamed_param);
        assert_eq!(two.to_string(), "Add(float64, float64)");
    }

    #[test]
    fn test_signature_display() {
        assert_eq!(tax_signature().to_string(), "float64 (float64 percent)");
    }
}
