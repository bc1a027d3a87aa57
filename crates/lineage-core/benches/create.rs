use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lineage_core::{
    Blueprint, Contract, CreateCall, Factory, MethodContract, Members, PrimitiveKind, Validator,
    Value,
};

fn chain(depth: usize) -> Blueprint {
    let mut blueprint = Blueprint::builder("Level0")
        .member("level", 0)
        .contract(Contract::new().method(
            "scale",
            MethodContract::new()
                .on_entry([PrimitiveKind::Number])
                .validator(0, Validator::new(|v| v.as_number().is_some_and(|n| n >= 0.0)))
                .on_exit(PrimitiveKind::Number),
        ))
        .method("scale", |_, args| Ok(args[0].clone()))
        .build()
        .unwrap();
    for level in 1..depth {
        blueprint = Blueprint::builder(format!("Level{}", level))
            .parent(&blueprint)
            .member("level", level as f64)
            .build()
            .unwrap();
    }
    blueprint
}

fn bench_create(c: &mut Criterion) {
    let factory = Factory::new();
    let mut group = c.benchmark_group("create");

    for depth in [1, 3, 8] {
        let blueprint = chain(depth);
        group.bench_with_input(BenchmarkId::new("chain", depth), &blueprint, |b, blueprint| {
            b.iter(|| factory.create(black_box(blueprint), CreateCall::new()).unwrap());
        });
    }

    let blueprint = chain(3);
    let extra: Members = [("extra", 1)].into_iter().collect();
    group.bench_function("chain_with_extra", |b| {
        b.iter(|| {
            factory
                .create(black_box(&blueprint), CreateCall::new().extra(extra.clone()))
                .unwrap()
        });
    });

    group.finish();
}

fn bench_guarded_call(c: &mut Criterion) {
    let factory = Factory::new();
    let instance = factory.create(&chain(3), CreateCall::new()).unwrap();
    let args = [Value::Number(4.0)];

    c.bench_function("guarded_call", |b| {
        b.iter(|| instance.call("scale", black_box(&args)).unwrap());
    });
}

criterion_group!(benches, bench_create, bench_guarded_call);
criterion_main!(benches);
