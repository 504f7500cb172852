//! Resolution benchmarks
//!
//! Benchmarks the dependency resolver on synthetic registries that
//! stress different expansion shapes. Measures:
//! - Deep dependency chains
//! - Wide fan-out with shared leaves
//! - Deduplication across requested targets
//! - Toolchain hierarchy walks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use strata_config::ResolveSettings;
use strata_recipe::{CpuArch, Dependency, MemoryRegistry, Recipe, ToolchainRef, ToolchainTable};
use strata_resolver::{toolchain_hierarchy, Resolver, TargetSpec};

fn settings() -> ResolveSettings {
    ResolveSettings {
        arch: CpuArch::X86_64,
        ..ResolveSettings::default()
    }
}

/// Resolve one request against a registry.
fn resolve_one(registry: &MemoryRegistry, settings: &ResolveSettings, request: TargetSpec) {
    let table = ToolchainTable::builtin();
    let plan = Resolver::new(registry, &table, settings)
        .resolve(&[request])
        .unwrap();
    black_box(plan);
}

/// Registry with a linear chain: pkg0 <- pkg1 <- ... <- pkg{depth-1}.
fn chain_registry(depth: usize) -> MemoryRegistry {
    let system = ToolchainRef::system();
    MemoryRegistry::with_recipes((0..depth).map(|i| {
        let recipe = Recipe::new(format!("pkg{i}"), "1.0", system.clone());
        if i == 0 {
            recipe
        } else {
            recipe.with_dependencies(vec![Dependency::new(format!("pkg{}", i - 1), "1.0")])
        }
    }))
}

/// Registry with one root depending on `width` independent leaves.
fn fanout_registry(width: usize) -> MemoryRegistry {
    let system = ToolchainRef::system();
    let mut recipes: Vec<Recipe> = (0..width)
        .map(|i| Recipe::new(format!("leaf{i}"), "1.0", system.clone()))
        .collect();
    recipes.push(
        Recipe::new("root", "1.0", system).with_dependencies(
            (0..width)
                .map(|i| Dependency::new(format!("leaf{i}"), "1.0"))
                .collect(),
        ),
    );
    MemoryRegistry::with_recipes(recipes)
}

fn bench_resolve_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_chain");
    for depth in [10, 50, 200] {
        let registry = chain_registry(depth);
        let cfg = settings();
        group.throughput(Throughput::Elements(depth as u64));
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            b.iter(|| {
                resolve_one(
                    &registry,
                    &cfg,
                    TargetSpec::new(format!("pkg{}", depth - 1), "1.0", ToolchainRef::system()),
                )
            });
        });
    }
    group.finish();
}

fn bench_resolve_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_fanout");
    for width in [10, 100] {
        let registry = fanout_registry(width);
        let cfg = settings();
        group.throughput(Throughput::Elements(width as u64));
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, _| {
            b.iter(|| {
                resolve_one(
                    &registry,
                    &cfg,
                    TargetSpec::new("root", "1.0", ToolchainRef::system()),
                )
            });
        });
    }
    group.finish();
}

fn bench_resolve_shared_libraries(c: &mut Criterion) {
    // Twenty applications over one compiler sharing twenty libraries;
    // every library is reached twenty-one times but expanded once.
    let system = ToolchainRef::system();
    let gcc = ToolchainRef::new("GCC", "6.4.0-2.28");
    let mut recipes = vec![Recipe::new("GCC", "6.4.0-2.28", system)];
    for i in 0..20 {
        recipes.push(Recipe::new(format!("lib{i}"), "1.0", gcc.clone()));
    }
    for i in 0..20 {
        recipes.push(
            Recipe::new(format!("app{i}"), "1.0", gcc.clone()).with_dependencies(
                (0..20)
                    .map(|j| Dependency::new(format!("lib{j}"), "1.0"))
                    .collect(),
            ),
        );
    }
    let registry = MemoryRegistry::with_recipes(recipes);
    let cfg = settings();
    let requests: Vec<TargetSpec> = (0..20)
        .map(|i| TargetSpec::new(format!("app{i}"), "1.0", gcc.clone()))
        .collect();

    c.bench_function("resolve_shared_libraries_20x20", |b| {
        b.iter(|| {
            let table = ToolchainTable::builtin();
            let plan = Resolver::new(&registry, &table, &cfg)
                .resolve(black_box(&requests))
                .unwrap();
            black_box(plan);
        });
    });
}

fn bench_toolchain_hierarchy(c: &mut Criterion) {
    let system = ToolchainRef::system();
    let gcc = ToolchainRef::new("GCC", "6.4.0-2.28");
    let registry = MemoryRegistry::with_recipes([
        Recipe::new("GCCcore", "6.4.0", system.clone()),
        Recipe::new("GCC", "6.4.0-2.28", system.clone())
            .with_dependencies(vec![Dependency::new("GCCcore", "6.4.0")]),
        Recipe::new("OpenMPI", "2.1.2", gcc.clone()),
        Recipe::new("gompi", "2018a", system.clone()).with_dependencies(vec![
            Dependency::new("GCC", "6.4.0-2.28"),
            Dependency::new("OpenMPI", "2.1.2").with_toolchain(gcc),
        ]),
        Recipe::new("foss", "2018a", system)
            .with_dependencies(vec![Dependency::new("gompi", "2018a")]),
    ]);
    let table = ToolchainTable::builtin();
    let cfg = settings();

    c.bench_function("toolchain_hierarchy_foss", |b| {
        let foss = ToolchainRef::new("foss", "2018a");
        b.iter(|| {
            let chain = toolchain_hierarchy(black_box(&foss), &table, &registry, &cfg).unwrap();
            black_box(chain);
        });
    });
}

criterion_group!(
    resolver_benches,
    bench_resolve_chain,
    bench_resolve_fanout,
    bench_resolve_shared_libraries,
    bench_toolchain_hierarchy
);

criterion_main!(resolver_benches);
