use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use threemf_merge::geometry::rotate_vertices;
use threemf_merge::{Mesh, Packer, PackingAlgorithm, Rect, Vertex};

/// Deterministic spread of footprints between 5 and 80 mm
fn footprints(count: usize) -> Vec<Rect> {
    (0..count)
        .map(|i| {
            let w = 5.0 + ((i * 37) % 76) as f64;
            let h = 5.0 + ((i * 53) % 76) as f64;
            Rect::new(i, w, h)
        })
        .collect()
}

/// A flat grid of vertices
fn vertex_grid(vertices: usize) -> Mesh {
    let mut mesh = Mesh::with_capacity(vertices, 0);
    for i in 0..vertices {
        let x = (i % 100) as f64;
        let y = (i / 100) as f64;
        mesh.vertices.push(Vertex::new(x, y, (x * y).sin()));
    }
    mesh
}

fn bench_packers(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack");

    for count in [10, 100, 500] {
        let rects = footprints(count);
        for algorithm in [
            PackingAlgorithm::Shelf,
            PackingAlgorithm::Guillotine,
            PackingAlgorithm::Grid,
        ] {
            let packer = Packer::new(10.0).with_algorithm(algorithm);
            group.bench_with_input(
                BenchmarkId::new(algorithm.name(), count),
                &rects,
                |b, rects| b.iter(|| packer.pack(black_box(rects))),
            );
        }
    }

    group.finish();
}

fn bench_rotation(c: &mut Criterion) {
    let mut group = c.benchmark_group("rotate_vertices");

    for vertices in [1_000, 10_000, 100_000] {
        let mesh = vertex_grid(vertices);
        group.bench_with_input(BenchmarkId::from_parameter(vertices), &mesh, |b, mesh| {
            b.iter(|| {
                let mut rotated = mesh.clone();
                rotate_vertices(black_box(&mut rotated), 30.0, 45.0, 90.0).unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_packers, bench_rotation);
criterion_main!(benches);
