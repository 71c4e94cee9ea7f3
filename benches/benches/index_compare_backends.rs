// Copyright 2025 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use umbra_index::{Aabb2D, FlatIndex, Index, Key};

const WORLD: f64 = 2048.0;

fn rect(x: f64, y: f64, w: f64, h: f64) -> Aabb2D<f64> {
    Aabb2D::new(x, y, x + w, y + h)
}

fn world() -> Aabb2D<f64> {
    rect(0.0, 0.0, WORLD, WORLD)
}

fn gen_grid_rects(n: usize, cell: f64) -> Vec<Aabb2D<f64>> {
    let mut out = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            out.push(rect(x as f64 * cell, y as f64 * cell, cell, cell));
        }
    }
    out
}

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

fn gen_random_rects(count: usize, size: f64) -> Vec<Aabb2D<f64>> {
    let mut out = Vec::with_capacity(count);
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    for _ in 0..count {
        let x0 = rng.next_f64() * (WORLD - size);
        let y0 = rng.next_f64() * (WORLD - size);
        out.push(rect(x0, y0, size, size));
    }
    out
}

fn gen_clustered_rects(n_clusters: usize, per_cluster: usize, spread: f64) -> Vec<Aabb2D<f64>> {
    let mut out = Vec::with_capacity(n_clusters * per_cluster);
    let mut rng = Rng::new(0xC1A5_7E55_9999_ABCD);
    let mut centers = Vec::with_capacity(n_clusters);
    for _ in 0..n_clusters {
        centers.push((rng.next_f64() * WORLD, rng.next_f64() * WORLD));
    }
    for (cx, cy) in centers {
        for _ in 0..per_cluster {
            let dx = (rng.next_f64() - 0.5) * spread;
            let dy = (rng.next_f64() - 0.5) * spread;
            out.push(rect(cx + dx, cy + dy, 12.0, 12.0));
        }
    }
    out
}

fn build_quadtree(rects: &[Aabb2D<f64>]) -> (Index<f64, Aabb2D<f64>>, Vec<Key>) {
    let mut idx = Index::with_region(world());
    let keys = rects.iter().map(|r| idx.insert(*r)).collect();
    (idx, keys)
}

fn build_flat(rects: &[Aabb2D<f64>]) -> (FlatIndex<f64, Aabb2D<f64>>, Vec<Key>) {
    let mut idx = FlatIndex::new();
    let keys = rects.iter().map(|r| idx.insert(*r)).collect();
    (idx, keys)
}

fn bench_build_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_query");
    for &n in &[32usize, 64] {
        let rects = gen_grid_rects(n, 10.0);
        let q = rect(100.0, 100.0, 200.0, 200.0);
        group.throughput(Throughput::Elements((n * n) as u64));

        group.bench_function(format!("quadtree_grid_n{n}"), |b| {
            b.iter(|| {
                let (idx, _) = build_quadtree(&rects);
                black_box(idx.query_rect(q).count());
            });
        });
        group.bench_function(format!("flatvec_grid_n{n}"), |b| {
            b.iter(|| {
                let (idx, _) = build_flat(&rects);
                black_box(idx.query_rect(q).count());
            });
        });
    }
    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("queries");
    let sets = [
        ("random", gen_random_rects(4000, 16.0)),
        ("clustered", gen_clustered_rects(20, 200, 120.0)),
    ];
    let view = rect(600.0, 600.0, 800.0, 600.0);
    for (name, rects) in &sets {
        let (quad, _) = build_quadtree(rects);
        let (flat, _) = build_flat(rects);
        group.throughput(Throughput::Elements(rects.len() as u64));

        group.bench_function(format!("quadtree_rect_{name}"), |b| {
            b.iter(|| black_box(quad.query_rect(view).count()));
        });
        group.bench_function(format!("quadtree_rect_depth2_{name}"), |b| {
            b.iter(|| black_box(quad.query_rect_to_depth(view, 2).count()));
        });
        group.bench_function(format!("quadtree_point_{name}"), |b| {
            b.iter(|| black_box(quad.query_point(1000.0, 1000.0).count()));
        });
        group.bench_function(format!("flatvec_rect_{name}"), |b| {
            b.iter(|| black_box(flat.query_rect(view).count()));
        });
    }
    group.finish();
}

fn bench_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("churn");
    let rects = gen_random_rects(2000, 12.0);
    group.throughput(Throughput::Elements(rects.len() as u64));

    // Every occupant moves a little each frame, the common case for lights
    // and hulls attached to game objects.
    group.bench_function("quadtree_move_all", |b| {
        b.iter_batched(
            || build_quadtree(&rects),
            |(mut idx, keys)| {
                let mut rng = Rng::new(7);
                for &k in &keys {
                    let dx = (rng.next_f64() - 0.5) * 8.0;
                    let dy = (rng.next_f64() - 0.5) * 8.0;
                    idx.modify(k, |r| r.inc_center(dx, dy));
                }
                black_box(idx.len());
            },
            BatchSize::LargeInput,
        );
    });
    group.bench_function("flatvec_move_all", |b| {
        b.iter_batched(
            || build_flat(&rects),
            |(mut idx, keys)| {
                let mut rng = Rng::new(7);
                for &k in &keys {
                    let dx = (rng.next_f64() - 0.5) * 8.0;
                    let dy = (rng.next_f64() - 0.5) * 8.0;
                    idx.modify(k, |r| r.inc_center(dx, dy));
                }
                black_box(idx.len());
            },
            BatchSize::LargeInput,
        );
    });
    group.bench_function("quadtree_insert_remove", |b| {
        b.iter_batched(
            || build_quadtree(&rects),
            |(mut idx, keys)| {
                for &k in keys.iter().step_by(2) {
                    let r = idx.remove(k);
                    let _ = idx.insert(r);
                }
                black_box(idx.len());
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_build_query, bench_queries, bench_churn);
criterion_main!(benches);
