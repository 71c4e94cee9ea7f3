// Copyright 2025 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend trait for spatial indexing implementations.

use alloc::boxed::Box;

use crate::types::Aabb2D;
use core::fmt::Debug;

/// Spatial backend abstraction used by `IndexGeneric`.
///
/// Backends only see slots and boxes. Slot validity is checked by the index
/// before a backend is called, so backends may treat an unknown slot as a bug.
pub trait Backend<T: Copy + PartialOrd + Debug> {
    /// Insert a new slot into the spatial structure.
    fn insert(&mut self, slot: usize, aabb: Aabb2D<T>);

    /// Re-place an existing slot after its AABB changed.
    fn update(&mut self, slot: usize, aabb: Aabb2D<T>);

    /// Remove a slot from the spatial structure.
    fn remove(&mut self, slot: usize);

    /// Clear all spatial structures.
    fn clear(&mut self);

    /// Query slots whose AABB contains the point.
    fn query_point<'a>(&'a self, x: T, y: T) -> Box<dyn Iterator<Item = usize> + 'a>;

    /// Query slots whose AABB intersects the rectangle.
    fn query_rect<'a>(&'a self, rect: Aabb2D<T>) -> Box<dyn Iterator<Item = usize> + 'a>;

    /// Query with the hierarchy walk truncated at `depth`.
    ///
    /// Hierarchical backends may return extra candidates below the cut.
    /// Flat backends have no hierarchy and answer exactly.
    fn query_rect_to_depth<'a>(
        &'a self,
        rect: Aabb2D<T>,
        depth: usize,
    ) -> Box<dyn Iterator<Item = usize> + 'a> {
        let _ = depth;
        self.query_rect(rect)
    }
}
