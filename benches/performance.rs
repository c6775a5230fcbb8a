//! Performance benchmarks for tsgen
//!
//! These benchmarks measure the performance of key operations:
//! - Reconciling a single generated rule against an existing one
//! - Full generation runs (discovery, freeze, resolution) over many locations
//!
//! ## Running Benchmarks
//!
//! ```bash
//! cargo bench
//! cargo bench reconcile
//! cargo bench generation
//! ```
//!
//! ## Expected Performance Characteristics
//!
//! ### Reconcile
//! - Linear in the number of entries of the mergeable attributes
//!
//! ### Generation
//! - Discovery and resolution both run on rayon and scale with cores
//! - Lookups after the freeze take no locks

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use tsgen::engine::{FileInventory, GenerationEngine, LocationInput, Reconciler};
use tsgen::kinds::Schema;
use tsgen::rules::Rule;
use tsgen::{Location, RuleKind};

// ============================================================================
// Helper Functions
// ============================================================================

fn ts_project(name: &str, srcs: Vec<String>, deps: Vec<String>) -> Rule {
    Rule::new(RuleKind::TsProject, name, Location::root())
        .with_attr("srcs", srcs)
        .with_attr("deps", deps)
}

fn numbered(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{}{}.ts", prefix, i)).collect()
}

/// Locations in a chain; each one imports its two successors and one npm package
fn create_inputs(count: usize) -> Vec<LocationInput> {
    (0..count)
        .map(|i| {
            let deps = vec![
                format!("../pkg{}/index", (i + 1) % count),
                format!("../pkg{}/index", (i + 2) % count),
                "lodash".to_string(),
            ];
            LocationInput::new(Location::new(format!("pkg{}", i)))
                .generate(ts_project(
                    &format!("pkg{}", i),
                    vec!["index.ts".to_string(), "util.ts".to_string()],
                    deps,
                ))
                .existing(ts_project(
                    &format!("pkg{}", i),
                    vec!["index.ts".to_string(), "manual.ts".to_string()],
                    vec!["//third_party:shim".to_string()],
                ))
        })
        .collect()
}

// ============================================================================
// Reconcile Benchmarks
// ============================================================================

fn bench_reconcile(c: &mut Criterion) {
    let schema = Schema::builtin().unwrap();
    let reconciler = Reconciler::new(&schema);
    let mut group = c.benchmark_group("reconcile");

    for entries in [10, 100, 1000].iter() {
        let generated = ts_project("lib", numbered("gen", *entries), numbered("dep", *entries));
        let existing = ts_project("lib", numbered("old", *entries), numbered("dep", *entries));
        let inventory = FileInventory::new(numbered("gen", *entries));

        group.throughput(Throughput::Elements(*entries as u64));
        group.bench_with_input(BenchmarkId::new("merge", entries), entries, |b, _| {
            b.iter(|| black_box(reconciler.reconcile(&generated, Some(&existing))))
        });
        group.bench_with_input(BenchmarkId::new("with_inventory", entries), entries, |b, _| {
            b.iter(|| {
                black_box(reconciler.reconcile_with(&generated, Some(&existing), Some(&inventory)))
            })
        });
    }

    group.finish();
}

// ============================================================================
// Generation Benchmarks
// ============================================================================

fn bench_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("generation");
    group.sample_size(20);

    for count in [100, 1000, 5000].iter() {
        let inputs = create_inputs(*count);
        let engine = GenerationEngine::new(Schema::builtin().unwrap());

        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::new("run", count), count, |b, _| {
            b.iter(|| black_box(engine.run(&inputs).unwrap()))
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark Registration
// ============================================================================

criterion_group!(reconcile_benches, bench_reconcile);
criterion_group!(generation_benches, bench_generation);
criterion_main!(reconcile_benches, generation_benches);
