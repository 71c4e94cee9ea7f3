// Copyright 2025 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The occupant capability: anything with an AABB that an index can track.

use crate::types::Aabb2D;

/// An entity that can be tracked by an [`IndexGeneric`](crate::IndexGeneric).
///
/// The occupant owns its box. The index reads it on insertion and again
/// whenever [`IndexGeneric::update_status`](crate::IndexGeneric::update_status)
/// is called; mutations in between are invisible to the index.
pub trait Occupant<T> {
    /// Current world-space bounds.
    fn aabb(&self) -> Aabb2D<T>;
}

impl<T: Copy> Occupant<T> for Aabb2D<T> {
    fn aabb(&self) -> Self {
        *self
    }
}
