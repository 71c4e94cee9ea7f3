// Copyright 2025 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quadtree basics.
//!
//! Fill a region with boxes, watch the tree split, move a box out of the
//! root region and back, and compare exact and depth-limited queries.
//!
//! Run:
//! - `cargo run -p umbra_demos --example quadtree_basics`

use umbra_index::{Aabb2D, Index, QuadTreeConfig};

fn main() {
    env_logger::init();

    let config = QuadTreeConfig {
        max_occupants: 2,
        ..QuadTreeConfig::default()
    };
    let mut idx: Index<f64, Aabb2D<f64>> =
        Index::with_config(Aabb2D::new(0.0, 0.0, 256.0, 256.0), config);

    let mut keys = Vec::new();
    for i in 0..8_u32 {
        let x = f64::from(i) * 30.0 + 5.0;
        keys.push(idx.insert(Aabb2D::new(x, x, x + 10.0, x + 10.0)));
    }
    println!("nodes after inserts: {}", idx.node_regions().count());
    for (region, level) in idx.node_regions() {
        println!("  level {level}: {region:?}");
    }

    // Move the first box far outside the root and back.
    let first = keys[0];
    idx.modify(first, |b| b.set_center(1000.0, 1000.0));
    println!(
        "outside hit: {:?}",
        idx.query_point(1000.0, 1000.0).map(|(k, _)| k).collect::<Vec<_>>()
    );
    idx.modify(first, |b| b.set_center(10.0, 10.0));

    let view = Aabb2D::new(0.0, 0.0, 100.0, 100.0);
    let exact = idx.query_rect(view).count();
    let coarse = idx.query_rect_to_depth(view, 1).count();
    println!("view query: {exact} exact, {coarse} with depth 1 (superset)");

    for k in keys.drain(..) {
        let _ = idx.remove(k);
    }
    println!("nodes after removing everything: {}", idx.node_regions().count());
}
