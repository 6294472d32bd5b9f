//! The proxy factory façade.

use std::{any::type_name, fmt, sync::Arc};

use log::debug;

use crate::{
    metadata::typesystem::{TypeRc, TypeRegistry},
    proxy::{ProxyBuilder, ProxyInstance, ProxyTypeRc, TypeSynthesizer},
    runtime::ObjectRef,
    Error, Result,
};

/// Builds proxy types and bound proxy instances.
///
/// # Examples
///
/// ```rust
/// use std::{any::Any, sync::{Arc, RwLock}};
/// use dynproxy::prelude::*;
///
/// # struct Employee {
/// #     ty: TypeRc,
/// #     table: DispatchTable<Employee>,
/// #     name: RwLock<String>,
/// # }
/// # impl Object for Employee {
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
/// let registry = Arc::new(TypeRegistry::new());
/// let iface = TypeBuilder::interface("IEmployee")
///     .property("Name", TypeSignature::String, true, true)
///     .build(&registry)?;
/// let class = TypeBuilder::class("Employee").implements(&iface).build(&registry)?;
/// # let mut table = DispatchTable::new(class.clone());
/// # table
/// #     .bind("get_Name", |e: &Employee, _| Ok(Value::String(e.name.read().unwrap().clone())))?
/// #     .bind("set_Name", |e, args| {
/// #         *e.name.write().unwrap() = String::try_from(&args[0])?;
/// #         Ok(Value::Void)
/// #     })?;
///
/// let factory = ProxyFactory::new(registry.clone());
/// let source: ObjectRef =
///     Arc::new(Employee { ty: class, table, name: RwLock::new("Halford".into()) });
/// let proxy = factory.build_proxy_object(source.clone())?;
///
/// source.set("Name", "James")?;
/// assert_eq!(proxy.get("Name")?, Value::from("James"));
/// assert!(factory.build_proxy_type(&iface).is_ok());
/// # Ok::<(), dynproxy::Error>(())
/// ```
#[derive(Clone)]
pub struct ProxyFactory {
    synthesizer: Arc<dyn TypeSynthesizer>,
}

impl ProxyFactory {
    /// Create a factory backed by a default [`ProxyBuilder`]
    #[must_use]
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self::with_synthesizer(Arc::new(ProxyBuilder::new(registry)))
    }

    /// Create a factory backed by `synthesizer`
    #[must_use]
    pub fn with_synthesizer(synthesizer: Arc<dyn TypeSynthesizer>) -> Self {
        ProxyFactory { synthesizer }
    }

    /// The synthesizer proxy types are built with
    #[must_use]
    pub fn synthesizer(&self) -> &Arc<dyn TypeSynthesizer> {
        &self.synthesizer
    }

    /// The registry source and proxy types live in
    #[must_use]
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        self.synthesizer.registry()
    }

    /// The proxy type for `ty`, without instantiating it.
    ///
    /// # Errors
    /// See [`TypeSynthesizer::build`].
    pub fn build_proxy_type(&self, ty: &TypeRc) -> Result<ProxyTypeRc> {
        self.synthesizer.build(ty)
    }

    /// The proxy type for the type registered as backed by the Rust type `T`.
    ///
    /// # Errors
    /// Returns [`Error::TypeNotFound`] if no registered type is backed by `T`, otherwise see
    /// [`TypeSynthesizer::build`].
    pub fn build_proxy_type_of<T: 'static>(&self) -> Result<ProxyTypeRc> {
        let ty = self
            .registry()
            .get_of::<T>()
            .ok_or_else(|| Error::TypeNotFound(type_name::<T>().to_string()))?;
        self.build_proxy_type(&ty)
    }

    /// The proxy type for the runtime type of `instance`.
    ///
    /// # Errors
    /// See [`TypeSynthesizer::build`].
    pub fn build_proxy_type_for(&self, instance: &ObjectRef) -> Result<ProxyTypeRc> {
        self.build_proxy_type(&instance.runtime_type())
    }

    /// Wrap `instance` in a proxy of its runtime type.
    ///
    /// Always returns a new proxy instance bound to `instance`, never `instance` itself.
    ///
    /// # Errors
    /// See [`TypeSynthesizer::build`].
    pub fn build_proxy_object(&self, instance: ObjectRef) -> Result<Arc<ProxyInstance>> {
        let proxy_type = self.build_proxy_type_for(&instance)?;
        let proxy = proxy_type.instantiate(instance)?;
        debug!(
            "Bound {} to a {} instance",
            proxy_type.descriptor().fullname(),
            proxy.source().runtime_type().fullname()
        );
        Ok(proxy)
    }
}

impl fmt::Debug for ProxyFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyFactory")
            .field("types", &self.registry().len())
            .finish()
    }
}
