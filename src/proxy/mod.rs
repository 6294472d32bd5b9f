//! Proxy type synthesis and interception.
//!
//! This module builds proxy types: new types implementing the same capabilities (interfaces)
//! as a source type, whose every method, property accessor and event accessor routes through a
//! pluggable [`Interceptor`] before, or instead of, reaching a bound source instance.
//!
//! # Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`capability`] | [`CapabilitySet`]: the interfaces a proxy exposes |
//! | [`extract`](mod@extract) | [`MemberDescriptor`] extraction from a capability set |
//! | [`interceptor`] | The [`Interceptor`] contract and [`InterceptorFactory`] |
//! | [`default`] | [`DefaultInterceptor`]: forwarding plus invocation records |
//! | [`builder`] | [`ProxyBuilder`], the [`TypeSynthesizer`] |
//! | [`proxytype`] | [`ProxyType`] and its [`SynthesizedMember`] slots |
//! | [`instance`] | [`ProxyInstance`] |
//! | [`factory`] | [`ProxyFactory`] façade |
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ProxyFactory                           │
//! │  build_proxy_object(source) ─► build_proxy_type ─► bind     │
//! └─────────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                ProxyBuilder (TypeSynthesizer)               │
//! │  cache: DashMap<Token, ProxyTypeRc>                         │
//! │  CapabilitySet ─► extract ─► assemble ─► TypeRegistry       │
//! └─────────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        ProxyType                            │
//! │  slots: Vec<SynthesizedMember>  (one per generated method)  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Invocation Flow
//!
//! ```text
//! proxy.invoke(member, args)
//!         │
//!         ▼
//! ┌───────────────────┐
//! │  slot_for(member) │───► None ───► MemberNotFound
//! └───────────────────┘
//!         │
//!         ▼
//! ┌───────────────────┐
//! │  check arguments, │───► ArgumentCount / InvalidCast
//! │  collect by name  │
//! └───────────────────┘
//!         │
//!         ▼
//! ┌───────────────────┐
//! │  interceptor      │───► (default) source.invoke(member, values)
//! │  .intercept(..)   │
//! └───────────────────┘
//!         │
//!         ▼
//! ┌───────────────────┐
//! │  return conversion│───► Discard / Unbox / Reference
//! └───────────────────┘
//! ```
//!
//! # Examples
//!
//! ```rust
//! use std::{any::Any, sync::{Arc, RwLock}};
//! use dynproxy::prelude::*;
//!
//! # struct Record {
//! #     ty: TypeRc,
//! #     table: DispatchTable<Record>,
//! #     id: RwLock<i32>,
//! # }
//! # impl Object for Record {
//! #     fn runtime_type(&self) -> TypeRc {
//! #         self.ty.clone()
//! #     }
//! #     fn invoke(&self, method: &MethodRc, args: &[Value]) -> Result<Value> {
//! #         self.table.dispatch(self, method, args)
//! #     }
//! #     fn as_any(&self) -> &dyn Any {
//! #         self
//! #     }
//! # }
//! # let registry = Arc::new(TypeRegistry::new());
//! # let iface = TypeBuilder::interface("IRecord")
//! #     .property("Id", TypeSignature::I4, true, true)
//! #     .build(&registry)?;
//! # let class = TypeBuilder::class("Record").implements(&iface).build(&registry)?;
//! # let mut table = DispatchTable::new(class.clone());
//! # table
//! #     .bind("get_Id", |r: &Record, _| Ok(Value::I4(*r.id.read().unwrap())))?
//! #     .bind("set_Id", |r, args| {
//! #         *r.id.write().unwrap() = i32::try_from(&args[0])?;
//! #         Ok(Value::Void)
//! #     })?;
//! # let source: ObjectRef = Arc::new(Record { ty: class, table, id: RwLock::new(1) });
//! let factory = ProxyFactory::new(registry);
//! let proxy = factory.build_proxy_object(source.clone())?;
//!
//! proxy.set("Id", 5)?;
//! assert_eq!(source.get("Id")?, Value::I4(5));
//! # Ok::<(), dynproxy::Error>(())
//! ```

pub mod builder;
pub mod capability;
pub mod config;
pub mod default;
pub mod extract;
pub mod factory;
pub mod instance;
pub mod interceptor;
pub mod proxytype;

pub use builder::{ProxyBuilder, TypeSynthesizer};
pub use capability::CapabilitySet;
pub use config::ProxyConfig;
pub use default::{DefaultInterceptor, InvocationRecord, RecordSink, INTERCEPT_TARGET};
pub use extract::{extract, MemberDescriptor, SlotKind};
pub use factory::ProxyFactory;
pub use instance::ProxyInstance;
pub use interceptor::{InterceptionArguments, Interceptor, InterceptorFactory};
pub use proxytype::{ProxyType, ProxyTypeRc, ReturnConversion, SynthesizedMember};
