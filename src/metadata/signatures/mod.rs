//! Method and type signatures.
//!
//! Signatures describe the shape of members: parameter names and types, return types,
//! generic parameters and calling-convention features. The proxy synthesizer copies them
//! onto generated members, checks that they can be carried through the interception
//! contract, and keys member identity by [`SignatureKey`] so overloads never collide.
//!
//! # Examples
//!
//! ```rust
//! use dynproxy::metadata::signatures::{SignatureKey, SignatureMethod, SignatureParameter, TypeSignature};
//!
//! let signature = SignatureMethod::new(
//!     TypeSignature::R8,
//!     vec![SignatureParameter::new("percent", TypeSignature::R8)],
//! );
//! assert!(signature.check_representable().is_ok());
//! assert_eq!(SignatureKey::new("CalculateTax", &signature).to_string(), "CalculateTax(float64)");
//! ```

mod types;

pub use types::*;
