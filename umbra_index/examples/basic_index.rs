// Copyright 2025 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Basic usage of Umbra Index: insert, move, query and remove boxes.

use umbra_index::{Aabb2D, Index};

fn main() {
    let mut idx: Index<f64, Aabb2D<f64>> =
        Index::with_region(Aabb2D::new(0.0, 0.0, 100.0, 100.0));
    let k1 = idx.insert(Aabb2D::new(0.0, 0.0, 10.0, 10.0));
    let _k2 = idx.insert(Aabb2D::new(5.0, 5.0, 15.0, 15.0));

    // Move box 1 and tell the index about it.
    idx.modify(k1, |b| b.inc_center(20.0, 0.0));

    let hits: Vec<_> = idx.query_point(6.0, 6.0).map(|(k, _)| k).collect();
    println!("hits at (6,6): {hits:?}");

    let moved = idx.remove(k1);
    println!("removed {moved:?}, {} left", idx.len());
    println!("{:?}", idx.backend());
}
