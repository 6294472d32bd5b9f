//! The interception contract.
//!
//! Every synthesized member funnels into exactly one call:
//! [`Interceptor::intercept`]`(proxy, source, member, arguments)`. Strategies decide whether
//! and how the call reaches the source instance.

use std::{any::type_name, fmt, sync::Arc};

use indexmap::IndexMap;

use crate::{
    metadata::members::MethodRc,
    proxy::{DefaultInterceptor, ProxyInstance},
    runtime::{ObjectRef, Value},
    Result,
};

/// Argument values of one invocation, by parameter name.
///
/// Keys are unique and iterate in declared parameter order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InterceptionArguments {
    values: IndexMap<String, Value>,
}

impl InterceptionArguments {
    /// Create an empty mapping
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty mapping with room for `capacity` arguments
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        InterceptionArguments {
            values: IndexMap::with_capacity(capacity),
        }
    }

    /// Append the argument `name`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Build`] if `name` is already present.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Result<()> {
        let name = name.into();
        if self.values.contains_key(&name) {
            return Err(build_error!("Duplicate argument '{}'", name));
        }
        self.values.insert(name, value);
        Ok(())
    }

    /// The value of the argument `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// The argument at `index` in declared order
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<(&str, &Value)> {
        self.values
            .get_index(index)
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Replace the value of an existing argument; returns false if there is no such argument
    pub fn replace(&mut self, name: &str, value: Value) -> bool {
        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Number of arguments
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True for parameterless members
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate `(name, value)` pairs in declared order
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.values.iter()
    }

    /// The parameter names, in declared order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// The argument values, in declared order, ready to be passed to [`Object::invoke`]
    ///
    /// [`Object::invoke`]: crate::runtime::Object::invoke
    #[must_use]
    pub fn to_values(&self) -> Vec<Value> {
        self.values.values().cloned().collect()
    }

    /// Consume the mapping into its values, in declared order
    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.values.into_values().collect()
    }
}

impl<'a> IntoIterator for &'a InterceptionArguments {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl fmt::Display for InterceptionArguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (name, value)) in self.values.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

/// The single entry point every synthesized member calls.
///
/// # Arguments
/// * `proxy` - The proxy instance the member was invoked on
/// * `source` - The source instance bound to the proxy
/// * `member` - The capability member being invoked; pass it to [`Object::invoke`] on
///   `source` to perform the real call
/// * `arguments` - The call arguments, by parameter name
///
/// The returned value becomes the member's result; it is discarded for `void` members and
/// unboxed for value-typed returns.
///
/// # Examples
///
/// ```rust
/// use dynproxy::{prelude::*, Result};
///
/// /// Answers every getter with a constant, never touching the source.
/// #[derive(Default)]
/// struct Masking;
///
/// impl Interceptor for Masking {
///     fn intercept(
///         &self,
///         _proxy: &ProxyInstance,
///         source: &ObjectRef,
///         member: &MethodRc,
///         arguments: InterceptionArguments,
///     ) -> Result<Value> {
///         if member.name.starts_with("get_") {
///             return Ok(Value::from("***"));
///         }
///         source.invoke(member, &arguments.into_values())
///     }
/// }
/// ```
///
/// [`Object::invoke`]: crate::runtime::Object::invoke
pub trait Interceptor {
    /// Intercept one member invocation.
    ///
    /// # Errors
    /// Strategies forwarding to the source report its failures as
    /// [`crate::Error::TargetInvocation`].
    fn intercept(
        &self,
        proxy: &ProxyInstance,
        source: &ObjectRef,
        member: &MethodRc,
        arguments: InterceptionArguments,
    ) -> Result<Value>;
}

impl<I: Interceptor + ?Sized> Interceptor for Arc<I> {
    fn intercept(
        &self,
        proxy: &ProxyInstance,
        source: &ObjectRef,
        member: &MethodRc,
        arguments: InterceptionArguments,
    ) -> Result<Value> {
        (**self).intercept(proxy, source, member, arguments)
    }
}

impl<I: Interceptor + ?Sized> Interceptor for Box<I> {
    fn intercept(
        &self,
        proxy: &ProxyInstance,
        source: &ObjectRef,
        member: &MethodRc,
        arguments: InterceptionArguments,
    ) -> Result<Value> {
        (**self).intercept(proxy, source, member, arguments)
    }
}

type CreateFn = dyn Fn() -> Box<dyn Interceptor> + Send + Sync;

/// Constructs the interception strategy for each invocation.
///
/// A fresh strategy instance is created per call, like a default-constructed strategy type.
/// State that must outlive one call is shared through [`InterceptorFactory::shared`].
#[derive(Clone)]
pub struct InterceptorFactory {
    name: String,
    create: Arc<CreateFn>,
}

impl InterceptorFactory {
    /// Default-construct `T` for every invocation
    #[must_use]
    pub fn of<T: Interceptor + Default + 'static>() -> Self {
        InterceptorFactory {
            name: type_name::<T>().to_string(),
            create: Arc::new(|| -> Box<dyn Interceptor> { Box::new(T::default()) }),
        }
    }

    /// Use `create` to construct the strategy for every invocation
    pub fn from_fn<F>(name: impl Into<String>, create: F) -> Self
    where
        F: Fn() -> Box<dyn Interceptor> + Send + Sync + 'static,
    {
        InterceptorFactory {
            name: name.into(),
            create: Arc::new(create),
        }
    }

    /// Hand the same strategy instance to every invocation
    pub fn shared<I: Interceptor + Send + Sync + 'static>(interceptor: Arc<I>) -> Self {
        InterceptorFactory {
            name: type_name::<I>().to_string(),
            create: Arc::new(move || -> Box<dyn Interceptor> { Box::new(interceptor.clone()) }),
        }
    }

    /// Construct a strategy instance
    #[must_use]
    pub fn create(&self) -> Box<dyn Interceptor> {
        (self.create)()
    }

    /// Name of the strategy, for diagnostics
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for InterceptorFactory {
    fn default() -> Self {
        Self::of::<DefaultInterceptor>()
    }
}

impl fmt::Debug for InterceptorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InterceptorFactory").field(&self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_arguments_keep_declared_order() -> Result<()> {
        let mut arguments = InterceptionArguments::with_capacity(2);
        arguments.insert("b", Value::I4(2))?;
        arguments.insert("a", Value::I4(1))?;

        let names: Vec<&str> = arguments.names().collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(arguments.get_index(1), Some(("a", &Value::I4(1))));
        assert_eq!(arguments.to_string(), "b=2, a=1");
        assert_eq!(arguments.into_values(), vec![Value::I4(2), Value::I4(1)]);
        Ok(())
    }

    #[test]
    fn test_duplicate_argument_is_rejected() -> Result<()> {
        let mut arguments = InterceptionArguments::new();
        arguments.insert("value", Value::Null)?;
        assert!(matches!(
            arguments.insert("value", Value::I4(1)),
            Err(Error::Build { .. })
        ));
        assert!(arguments.replace("value", Value::I4(1)));
        assert!(!arguments.replace("missing", Value::I4(1)));
        assert_eq!(arguments.get("value"), Some(&Value::I4(1)));
        Ok(())
    }

    #[test]
    fn test_factory_names() {
        assert!(InterceptorFactory::default()
            .name()
            .ends_with("DefaultInterceptor"));
        let custom = InterceptorFactory::from_fn("audit", || Box::new(DefaultInterceptor::default()));
        assert_eq!(custom.name(), "audit");
    }
}
