//! Benchmarks for final-library resolution

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rdclink::{Engine, Policy, RecordingHost, Visibility};
use std::path::PathBuf;

/// `layers` layers of `width` device libraries; every library links the whole
/// layer below it, and one executable links the top layer.
fn layered(layers: usize, width: usize) -> Engine<RecordingHost> {
    let policy = Policy::default();
    let mut engine = Engine::new(policy.clone(), RecordingHost::from_policy(&policy));

    for layer in 0..layers {
        for i in 0..width {
            let name = format!("l{layer}_{i}");
            engine
                .add_library(&name, None, &[PathBuf::from(format!("{name}.cu"))])
                .unwrap();
            if layer > 0 {
                for j in 0..width {
                    engine
                        .add_dependency(&name, &format!("l{}_{j}", layer - 1), Visibility::Public)
                        .unwrap();
                }
            }
        }
    }

    engine
        .add_executable("app", &[PathBuf::from("main.cpp")])
        .unwrap();
    for i in 0..width {
        engine
            .add_dependency("app", &format!("l{}_{i}", layers - 1), Visibility::Private)
            .unwrap();
    }
    engine
}

fn bench_resolve_final_libraries(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_final_libraries");

    for (layers, width) in [(4, 4), (8, 4), (8, 8)] {
        let engine = layered(layers, width);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{layers}x{width}")),
            &engine,
            |b, engine| b.iter(|| engine.resolve_final_libraries(black_box("app")).unwrap()),
        );
    }

    group.finish();
}

fn bench_finish(c: &mut Criterion) {
    c.bench_function("finish_8x4", |b| {
        b.iter_with_large_drop(|| layered(8, 4).finish().unwrap())
    });
}

criterion_group!(benches, bench_resolve_final_libraries, bench_finish);
criterion_main!(benches);
