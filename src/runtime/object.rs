//! Live objects and member invocation.
//!
//! Every instance a proxy can wrap, and every proxy instance itself, implements [`Object`].
//! The trait is deliberately small: an object reports its runtime type and answers invocations
//! of members of that type. [`ObjectExt`] layers name-based convenience on top for host code,
//! and [`DispatchTable`] lets a Rust type answer invocations by full member signature.

use std::{any::Any, collections::HashMap, fmt, sync::Arc};

use crate::{
    metadata::{
        members::MethodRc,
        signatures::{SignatureKey, TypeSignature},
        typesystem::TypeRc,
    },
    runtime::{Delegate, Value},
    Error, Result,
};

/// Shared handle to a live object
pub type ObjectRef = Arc<dyn Object>;

/// A live instance of a registered type.
///
/// Implementations hold their own state and decide their own synchronization; callers and
/// proxies only ever reach that state through [`Object::invoke`].
pub trait Object: Send + Sync + 'static {
    /// The registered type of this instance
    fn runtime_type(&self) -> TypeRc;

    /// Invoke `method` with `args` in declared parameter order.
    ///
    /// `method` may be declared by the runtime type itself or by any interface it implements;
    /// implementations match it by full signature.
    ///
    /// # Errors
    /// Returns [`Error::MemberNotFound`] for members the object does not implement, or any
    /// error the member itself raises.
    fn invoke(&self, method: &MethodRc, args: &[Value]) -> Result<Value>;

    /// Access to the concrete type
    fn as_any(&self) -> &dyn Any;
}

/// Name-based member access on any [`Object`].
///
/// # Examples
///
/// ```rust
/// use std::{any::Any, sync::{Arc, RwLock}};
/// use dynproxy::prelude::*;
///
/// # struct Person {
/// #     ty: TypeRc,
/// #     table: DispatchTable<Person>,
/// #     name: RwLock<String>,
/// # }
/// # impl Object for Person {
/// #     fn runtime_type(&self) -> TypeRc {
/// #         self.ty.clone()
/// #     }
/// #     fn invoke(&self, method: &MethodRc, args: &[Value]) -> Result<Value> {
/// #         self.table.dispatch(self, method, args)
/// #     }
/// #     fn as_any(&self) -> &dyn Any {
/// #         self
/// #     }
/// # }
/// # let registry = Arc::new(TypeRegistry::new());
/// # let iface = TypeBuilder::interface("IPerson")
/// #     .property("Name", TypeSignature::String, true, true)
/// #     .method("Greet", TypeSignature::String, vec![("greeting", TypeSignature::String)])
/// #     .build(&registry)?;
/// # let class = TypeBuilder::class("Person").implements(&iface).build(&registry)?;
/// # let mut table = DispatchTable::new(class.clone());
/// # table
/// #     .bind("get_Name", |p: &Person, _| Ok(Value::String(p.name.read().unwrap().clone())))?
/// #     .bind("set_Name", |p, args| {
/// #         *p.name.write().unwrap() = String::try_from(&args[0])?;
/// #         Ok(Value::Void)
/// #     })?
/// #     .bind("Greet", |p, args| {
/// #         let greeting = String::try_from(&args[0])?;
/// #         Ok(Value::String(format!("{greeting}, {}", p.name.read().unwrap())))
/// #     })?;
/// let person: ObjectRef = Arc::new(Person { ty: class, table, name: RwLock::new("Rob".into()) });
/// let proxy = ProxyFactory::new(registry).build_proxy_object(person.clone())?;
///
/// proxy.set("Name", "James")?;
/// assert_eq!(person.get("Name")?, Value::from("James"));
/// assert_eq!(proxy.call("Greet", &[Value::from("Hello")])?, Value::from("Hello, James"));
/// # Ok::<(), dynproxy::Error>(())
/// ```
pub trait ObjectExt: Object {
    /// Call the method `name` with `args`.
    ///
    /// Among overloads, the first whose arity matches and whose parameters accept every
    /// argument is chosen.
    ///
    /// # Errors
    /// Returns [`Error::MemberNotFound`] if no overload accepts the arguments.
    fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        let ty = self.runtime_type();
        let method = ty
            .find_methods(name)
            .into_iter()
            .filter(|method| !method.is_static() && method.param_count() == args.len())
            .find(|method| {
                method
                    .signature
                    .params
                    .iter()
                    .zip(args)
                    .all(|(param, arg)| arg.conforms_to(&param.base))
            })
            .ok_or_else(|| {
                let kinds: Vec<&str> = args.iter().map(Value::type_name).collect();
                Error::MemberNotFound(format!(
                    "{}::{}({})",
                    ty.fullname(),
                    name,
                    kinds.join(", ")
                ))
            })?;
        self.invoke(&method, args)
    }

    /// Read the property `name`.
    ///
    /// # Errors
    /// Returns [`Error::MemberNotFound`] if the property does not exist or has no getter.
    fn get(&self, name: &str) -> Result<Value> {
        let ty = self.runtime_type();
        let getter = ty
            .find_property(name)
            .and_then(|property| property.getter.clone())
            .ok_or_else(|| Error::MemberNotFound(format!("{}::get_{}", ty.fullname(), name)))?;
        self.invoke(&getter, &[])
    }

    /// Write the property `name`.
    ///
    /// # Errors
    /// Returns [`Error::MemberNotFound`] if the property does not exist or has no setter.
    fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        let ty = self.runtime_type();
        let setter = ty
            .find_property(name)
            .and_then(|property| property.setter.clone())
            .ok_or_else(|| Error::MemberNotFound(format!("{}::set_{}", ty.fullname(), name)))?;
        self.invoke(&setter, &[value.into()])?;
        Ok(())
    }

    /// Subscribe `handler` to the event `name`.
    ///
    /// # Errors
    /// Returns [`Error::MemberNotFound`] if the event does not exist.
    fn subscribe(&self, name: &str, handler: &Delegate) -> Result<()> {
        let ty = self.runtime_type();
        let event = ty
            .find_event(name)
            .ok_or_else(|| Error::MemberNotFound(format!("{}::{}", ty.fullname(), name)))?;
        self.invoke(&event.add_on, &[Value::Delegate(handler.clone())])?;
        Ok(())
    }

    /// Unsubscribe `handler` from the event `name`.
    ///
    /// # Errors
    /// Returns [`Error::MemberNotFound`] if the event does not exist.
    fn unsubscribe(&self, name: &str, handler: &Delegate) -> Result<()> {
        let ty = self.runtime_type();
        let event = ty
            .find_event(name)
            .ok_or_else(|| Error::MemberNotFound(format!("{}::{}", ty.fullname(), name)))?;
        self.invoke(&event.remove_on, &[Value::Delegate(handler.clone())])?;
        Ok(())
    }

    /// Downcast to the concrete Rust type
    fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

impl<O: Object + ?Sized> ObjectExt for O {}

/// Handler bound to one member in a [`DispatchTable`]
pub type DispatchFn<T> = Box<dyn Fn(&T, &[Value]) -> Result<Value> + Send + Sync>;

/// Per-type table mapping full member signatures to handlers.
///
/// Source types use a dispatch table to implement [`Object::invoke`]: members are keyed by
/// [`SignatureKey`], so the same handler answers a method whether it is addressed through the
/// declaring interface, a derived interface, or a proxy forwarding the call.
///
/// # Examples
///
/// ```rust
/// use dynproxy::{
///     metadata::{signatures::TypeSignature, typesystem::{TypeBuilder, TypeRegistry}},
///     runtime::{DispatchTable, Value},
/// };
///
/// struct Counter(i32);
///
/// let registry = TypeRegistry::new();
/// let ty = TypeBuilder::interface("ICounter")
///     .method("Next", TypeSignature::I4, vec![])
///     .build(&registry)?;
///
/// let mut table = DispatchTable::<Counter>::new(ty.clone());
/// table.bind("Next", |counter, _| Ok(Value::I4(counter.0 + 1)))?;
///
/// let next = ty.find_methods("Next").remove(0);
/// assert_eq!(table.dispatch(&Counter(41), &next, &[])?, Value::I4(42));
/// # Ok::<(), dynproxy::Error>(())
/// ```
pub struct DispatchTable<T> {
    owner: TypeRc,
    handlers: HashMap<SignatureKey, DispatchFn<T>>,
}

impl<T> DispatchTable<T> {
    /// Create an empty table for members of `owner` and its interfaces
    #[must_use]
    pub fn new(owner: TypeRc) -> Self {
        DispatchTable {
            owner,
            handlers: HashMap::new(),
        }
    }

    /// The type whose members this table answers
    #[must_use]
    pub fn owner(&self) -> &TypeRc {
        &self.owner
    }

    /// Bind the member called `name`, which must not be overloaded.
    ///
    /// # Errors
    /// Returns [`Error::MemberNotFound`] if no such member exists, or [`Error::Build`] if the
    /// name is ambiguous.
    pub fn bind<F>(&mut self, name: &str, handler: F) -> Result<&mut Self>
    where
        F: Fn(&T, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        let mut candidates = self.owner.find_methods(name);
        match candidates.len() {
            0 => Err(Error::MemberNotFound(format!(
                "{}::{}",
                self.owner.fullname(),
                name
            ))),
            1 => {
                let method = candidates.remove(0);
                self.handlers.insert(method.key(), Box::new(handler));
                Ok(self)
            }
            _ => Err(build_error!(
                "'{}::{}' is overloaded, bind it by signature",
                self.owner.fullname(),
                name
            )),
        }
    }

    /// Bind one overload of `name` by its parameter types.
    ///
    /// # Errors
    /// Returns [`Error::MemberNotFound`] if no overload has these parameter types.
    pub fn bind_overload<F>(
        &mut self,
        name: &str,
        params: &[TypeSignature],
        handler: F,
    ) -> Result<&mut Self>
    where
        F: Fn(&T, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        let key = SignatureKey {
            name: name.to_string(),
            params: params.iter().map(|param| (param.clone(), false)).collect(),
        };
        if !self
            .owner
            .find_methods(name)
            .iter()
            .any(|method| method.key() == key)
        {
            return Err(Error::MemberNotFound(format!(
                "{}::{}",
                self.owner.fullname(),
                key
            )));
        }
        self.handlers.insert(key, Box::new(handler));
        Ok(self)
    }

    /// Number of bound members
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// True if nothing is bound
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Invoke the handler bound to `method` on `target`.
    ///
    /// # Errors
    /// Returns [`Error::ArgumentCount`] on an arity mismatch, [`Error::MemberNotFound`] if
    /// nothing is bound to the member's signature, or whatever the handler returns.
    pub fn dispatch(&self, target: &T, method: &MethodRc, args: &[Value]) -> Result<Value> {
        if method.param_count() != args.len() {
            return Err(Error::ArgumentCount {
                member: method.qualified_name(),
                expected: method.param_count(),
                found: args.len(),
            });
        }

        let key = method.key();
        match self.handlers.get(&key) {
            Some(handler) => handler(target, args),
            None => Err(Error::MemberNotFound(format!(
                "{}::{}",
                self.owner.fullname(),
                key
            ))),
        }
    }
}

impl<T> fmt::Debug for DispatchTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self.handlers.keys().map(ToString::to_string).collect();
        keys.sort();
        f.debug_struct("DispatchTable")
            .field("owner", &self.owner.fullname())
            .field("members", &keys)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::RwLock;

    use super::*;
    use crate::metadata::typesystem::{TypeBuilder, TypeRegistry};

    struct Account {
        ty: TypeRc,
        table: DispatchTable<Account>,
        balance: RwLock<i64>,
    }

    impl Object for Account {
        fn runtime_type(&self) -> TypeRc {
            self.ty.clone()
        }

        fn invoke(&self, method: &MethodRc, args: &[Value]) -> Result<Value> {
            self.table.dispatch(self, method, args)
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn account(balance: i64) -> Result<Account> {
        let registry = TypeRegistry::new();
        let iface = TypeBuilder::interface("IAccount")
            .property("Balance", TypeSignature::I8, true, true)
            .method("Deposit", TypeSignature::I8, vec![("amount", TypeSignature::I8)])
            .method(
                "Deposit",
                TypeSignature::I8,
                vec![("amount", TypeSignature::I4)],
            )
            .build(&registry)?;
        let ty = TypeBuilder::class("Account")
            .implements(&iface)
            .build(&registry)?;

        let mut table = DispatchTable::new(ty.clone());
        table
            .bind("get_Balance", |a: &Account, _| Ok(Value::I8(*read_lock!(a.balance))))?
            .bind("set_Balance", |a: &Account, args| {
                *write_lock!(a.balance) = i64::try_from(&args[0])?;
                Ok(Value::Void)
            })?
            .bind_overload("Deposit", &[TypeSignature::I8], |a: &Account, args| {
                let mut balance = write_lock!(a.balance);
                *balance += i64::try_from(&args[0])?;
                Ok(Value::I8(*balance))
            })?
            .bind_overload("Deposit", &[TypeSignature::I4], |a: &Account, args| {
                let mut balance = write_lock!(a.balance);
                *balance += i64::from(i32::try_from(&args[0])?) * 100;
                Ok(Value::I8(*balance))
            })?;

        Ok(Account {
            ty,
            table,
            balance: RwLock::new(balance),
        })
    }

    #[test]
    fn test_properties_through_object_ext() -> Result<()> {
        let account = account(10)?;
        assert_eq!(account.get("Balance")?, Value::I8(10));
        account.set("Balance", 25_i64)?;
        assert_eq!(account.get("Balance")?, Value::I8(25));
        assert!(matches!(
            account.get("Owner"),
            Err(Error::MemberNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn test_overloads_are_dispatched_by_signature() -> Result<()> {
        let account = account(0)?;
        assert_eq!(account.call("Deposit", &[Value::I8(5)])?, Value::I8(5));
        assert_eq!(account.call("Deposit", &[Value::I4(1)])?, Value::I8(105));
        assert!(matches!(
            account.call("Deposit", &[Value::from("five")]),
            Err(Error::MemberNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn test_ambiguous_bind_is_rejected() -> Result<()> {
        let account = account(0)?;
        let mut table = DispatchTable::<Account>::new(account.ty.clone());
        assert!(matches!(
            table.bind("Deposit", |_, _| Ok(Value::Void)),
            Err(Error::Build { .. })
        ));
        assert!(table.is_empty());
        Ok(())
    }

    #[test]
    fn test_dispatch_checks_arity() -> Result<()> {
        let account = account(0)?;
        let getter = account
            .ty
            .find_property("Balance")
            .and_then(|p| p.getter.clone())
            .unwrap();
        assert!(matches!(
            account.invoke(&getter, &[Value::I4(1)]),
            Err(Error::ArgumentCount {
                expected: 0,
                found: 1,
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn test_downcast() -> Result<()> {
        let account: ObjectRef = Arc::new(account(7)?);
        let concrete = account.downcast_ref::<Account>().unwrap();
        assert_eq!(*read_lock!(concrete.balance), 7);
        Ok(())
    }
}
