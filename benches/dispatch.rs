//! Benchmarks for member dispatch.
//!
//! Compares the cost of invoking members directly on a source object with invoking them
//! through a synthesized proxy:
//! - Property reads by token (`Object::invoke`)
//! - Property reads by name (`ObjectExt::get`)
//! - Method calls with arguments
//! - Proxy type lookup on a warm cache

extern crate dynproxy;

use criterion::{criterion_group, criterion_main, Criterion};
use dynproxy::prelude::*;
use std::{
    any::Any,
    hint::black_box,
    sync::{Arc, RwLock},
};

/// Interceptor forwarding without recording, to isolate slot dispatch overhead.
#[derive(Default)]
struct Forward;

impl Interceptor for Forward {
    fn intercept(
        &self,
        _proxy: &ProxyInstance,
        source: &ObjectRef,
        member: &MethodRc,
        arguments: InterceptionArguments,
    ) -> Result<Value> {
        source.invoke(member, &arguments.into_values())
    }
}

struct Counter {
    ty: TypeRc,
    table: DispatchTable<Counter>,
    value: RwLock<i32>,
}

impl Object for Counter {
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

struct Fixture {
    registry: Arc<TypeRegistry>,
    class: TypeRc,
    getter: MethodRc,
    source: Arc<Counter>,
}

fn fixture() -> Result<Fixture> {
    let registry = Arc::new(TypeRegistry::new());
    let iface = TypeBuilder::interface("ICounter")
        .namespace("Bench")
        .property("Value", TypeSignature::I4, true, false)
        .method(
            "Add",
            TypeSignature::I4,
            vec![("a", TypeSignature::I4), ("b", TypeSignature::I4)],
        )
        .build(&registry)?;
    let class = TypeBuilder::class("Counter")
        .namespace("Bench")
        .implements(&iface)
        .build(&registry)?;

    let mut table = DispatchTable::new(class.clone());
    table
        .bind("get_Value", |c: &Counter, _| {
            Ok(Value::I4(*c.value.read().unwrap()))
        })?
        .bind("Add", |_, args| {
            Ok(Value::I4(i32::try_from(&args[0])? + i32::try_from(&args[1])?))
        })?;

    let getter = iface
        .find_property("Value")
        .and_then(|p| p.getter.clone())
        .ok_or_else(|| Error::MemberNotFound("ICounter::get_Value".to_string()))?;
    let source = Arc::new(Counter {
        ty: class.clone(),
        table,
        value: RwLock::new(42),
    });

    Ok(Fixture {
        registry,
        class,
        getter,
        source,
    })
}

/// Benchmark a property read by member handle, direct and proxied.
fn bench_invoke_getter(c: &mut Criterion) {
    let fixture = fixture().unwrap();
    let factory = ProxyFactory::with_synthesizer(Arc::new(
        ProxyBuilder::new(fixture.registry.clone()).with_interceptor::<Forward>(),
    ));
    let proxy = factory.build_proxy_object(fixture.source.clone()).unwrap();

    c.bench_function("invoke_getter_direct", |b| {
        b.iter(|| black_box(fixture.source.invoke(black_box(&fixture.getter), &[]).unwrap()));
    });

    c.bench_function("invoke_getter_proxied", |b| {
        b.iter(|| black_box(proxy.invoke(black_box(&fixture.getter), &[]).unwrap()));
    });
}

/// Benchmark a property read by name, direct and proxied.
fn bench_get_by_name(c: &mut Criterion) {
    let fixture = fixture().unwrap();
    let factory = ProxyFactory::with_synthesizer(Arc::new(
        ProxyBuilder::new(fixture.registry.clone()).with_interceptor::<Forward>(),
    ));
    let proxy = factory.build_proxy_object(fixture.source.clone()).unwrap();

    c.bench_function("get_by_name_direct", |b| {
        b.iter(|| black_box(fixture.source.get(black_box("Value")).unwrap()));
    });

    c.bench_function("get_by_name_proxied", |b| {
        b.iter(|| black_box(proxy.get(black_box("Value")).unwrap()));
    });
}

/// Benchmark a two-argument method call, direct and proxied.
fn bench_call_method(c: &mut Criterion) {
    let fixture = fixture().unwrap();
    let factory = ProxyFactory::with_synthesizer(Arc::new(
        ProxyBuilder::new(fixture.registry.clone()).with_interceptor::<Forward>(),
    ));
    let proxy = factory.build_proxy_object(fixture.source.clone()).unwrap();
    let args = [Value::I4(20), Value::I4(22)];

    c.bench_function("call_method_direct", |b| {
        b.iter(|| black_box(fixture.source.call("Add", black_box(&args)).unwrap()));
    });

    c.bench_function("call_method_proxied", |b| {
        b.iter(|| black_box(proxy.call("Add", black_box(&args)).unwrap()));
    });
}

/// Benchmark proxy type lookup once the type is cached.
fn bench_cached_build(c: &mut Criterion) {
    let fixture = fixture().unwrap();
    let factory = ProxyFactory::new(fixture.registry.clone());
    factory.build_proxy_type(&fixture.class).unwrap();

    c.bench_function("build_proxy_type_cached", |b| {
        b.iter(|| black_box(factory.build_proxy_type(black_box(&fixture.class)).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_invoke_getter,
    bench_get_by_name,
    bench_call_method,
    bench_cached_build
);
criterion_main!(benches);
