use kgs_core::RngHandle;
use kgs_graph::gen_random_kgraph;
use kgs_moves::{viable_steps, MoveKind};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn scan_bench(c: &mut Criterion) {
    let mut rng = RngHandle::from_seed(11);
    let graph = gen_random_kgraph(12, 26, 1, &mut rng).unwrap();

    c.bench_function("viable_scan_local_12", |b| {
        b.iter(|| {
            let mut g = graph.clone();
            for kind in [MoveKind::SinkDelete, MoveKind::Reduction, MoveKind::InSplit] {
                black_box(viable_steps(&mut g, kind).unwrap());
            }
        });
    });

    c.bench_function("viable_scan_cuntz_12", |b| {
        b.iter(|| {
            let mut g = graph.clone();
            black_box(viable_steps(&mut g, MoveKind::CuntzSplice).unwrap())
        });
    });
}

criterion_group!(benches, scan_bench);
criterion_main!(benches);
