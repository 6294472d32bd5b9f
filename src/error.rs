use thiserror::Error;

use crate::metadata::token::Token;

macro_rules! build_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Build {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Build {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// # Error Categories
///
/// ## Synthesis Errors
/// - [`Error::InvalidCapability`] - The source type exposes no capabilities to proxy
/// - [`Error::UnsupportedMember`] - A member signature cannot be represented on a proxy type
/// - [`Error::Build`] - Synthesis failed (naming collision, invalid generic binding, ...)
/// - [`Error::BuildFailed`] - Wraps any of the above with the source type being built
///
/// ## Invocation Errors
/// - [`Error::TargetInvocation`] - The forwarded call on the source instance failed
/// - [`Error::MemberNotFound`] - No member matches the requested name or handle
/// - [`Error::ArgumentCount`] - Wrong number of arguments for a member
/// - [`Error::InvalidCast`] - A value does not conform to the declared type
///
/// ## Type System Errors
/// - [`Error::TypeNotFound`] - Requested type not found in the registry
/// - [`Error::DuplicateType`] - A type with the same full name is already registered
///
/// # Examples
///
/// ```rust,no_run
/// use dynproxy::{Error, prelude::*};
///
/// # fn example(factory: &ProxyFactory, ty: &TypeRc) {
/// match factory.build_proxy_type(ty) {
///     Ok(proxy_type) => println!("built {}", proxy_type.descriptor().fullname()),
///     Err(Error::InvalidCapability(name)) => eprintln!("{name} has nothing to proxy"),
///     Err(Error::UnsupportedMember { member, reason }) => eprintln!("{member}: {reason}"),
///     Err(e) => eprintln!("Other error: {e}"),
/// }
/// # }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The capability set of a type is empty.
    ///
    /// Raised when the source type is neither an interface nor implements one, so a proxy
    /// would have nothing to expose. Carries the full name of the offending type.
    #[error("Type '{0}' exposes no capabilities to proxy")]
    InvalidCapability(String),

    /// A member's signature cannot be represented on a synthesized proxy type.
    ///
    /// Arguments are carried by value through the interception contract, so by-ref,
    /// pointer and vararg signatures are rejected when the proxy type is built.
    #[error("Member '{member}' can not be proxied - {reason}")]
    UnsupportedMember {
        /// Qualified name of the member (`Type::member`)
        member: String,
        /// Why the member is not representable
        reason: String,
    },

    /// Synthesis of a proxy type failed.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what went wrong
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Build - {file}:{line}: {message}")]
    Build {
        /// The message to be printed for the Build error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// Building the proxy type for a source type failed.
    ///
    /// Wraps the underlying cause so callers learn which source type could not be proxied.
    #[error("Failed to build proxy type for '{type_name}': {source}")]
    BuildFailed {
        /// Full name of the source type
        type_name: String,
        /// The underlying failure
        #[source]
        source: Box<Error>,
    },

    /// The call forwarded to the source instance failed.
    ///
    /// This is the only error expected during normal member invocation on a proxy. The
    /// original failure is preserved as the source of this error.
    #[error("Invocation of '{member}' on the source instance failed: {source}")]
    TargetInvocation {
        /// Qualified name of the invoked member
        member: String,
        /// The error raised by the source instance
        #[source]
        source: Box<Error>,
    },

    /// No member with the requested name or identity exists.
    #[error("Member '{0}' not found")]
    MemberNotFound(String),

    /// A member was invoked with the wrong number of arguments.
    #[error("Member '{member}' expects {expected} argument(s), got {found}")]
    ArgumentCount {
        /// Qualified name of the member
        member: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        found: usize,
    },

    /// A value does not conform to the type it is converted to.
    #[error("Invalid cast from '{found}' to '{expected}'")]
    InvalidCast {
        /// The declared type
        expected: String,
        /// The actual value kind
        found: String,
    },

    /// Failed to find type in the `TypeRegistry`.
    #[error("Failed to find type - {0}")]
    TypeNotFound(String),

    /// A type with the same full name is already registered.
    #[error("Type '{0}' is already registered")]
    DuplicateType(String),

    /// A token resolved to nothing in the registry.
    #[error("Token {0} does not resolve to a member")]
    UnresolvedToken(Token),

    /// Failed to lock target.
    #[error("Failed to lock target")]
    LockError,

    /// Generic error for miscellaneous failures.
    ///
    /// Source objects use this to report domain failures from their members.
    #[error("{0}")]
    Error(String),
}

impl Error {
    /// Returns the innermost cause of a [`Error::TargetInvocation`] chain, or `self`.
    #[must_use]
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::TargetInvocation { source, .. } | Error::BuildFailed { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }
}
