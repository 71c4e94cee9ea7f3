// Copyright 2025 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Umbra Index: a 2D AABB index for occupants that move every frame.
//!
//! - The index owns its occupants. Anything implementing [`Occupant`] can be
//!   inserted; removal hands the occupant back.
//! - Entries are addressed by generational [`Key`]s, so a stale key is caught
//!   instead of silently hitting a reused slot.
//! - After an occupant's box changes, [`IndexGeneric::update_status`] re-places
//!   it, starting from the node that currently holds it.
//! - Queries by point, by rectangle, and by rectangle with a depth cut that
//!   trades exactness for fewer node visits.
//!
//! It is generic over the scalar type `T` and does not depend on any geometry crate.
//!
//! The default backend is a region [`QuadTree`] with oversized child regions,
//! so boxes lying near a split line still sink into a child. Boxes outside the
//! root region are kept aside and still answer queries. [`FlatVec`] is a linear
//! scan with the same interface, useful as a reference.
//!
//! # Example
//!
//! ```rust
//! use umbra_index::{Aabb2D, Index};
//!
//! let mut idx: Index<f64, Aabb2D<f64>> =
//!     Index::with_region(Aabb2D::new(0.0, 0.0, 100.0, 100.0));
//! let k1 = idx.insert(Aabb2D::new(0.0, 0.0, 10.0, 10.0));
//! let k2 = idx.insert(Aabb2D::new(5.0, 5.0, 15.0, 15.0));
//!
//! // Move the first box and re-place it.
//! idx.get_mut(k1).unwrap().inc_center(20.0, 0.0);
//! idx.update_status(k1);
//!
//! // Query a point inside the second box only.
//! let hits: Vec<_> = idx.query_point(6.0, 6.0).map(|(k, _)| k).collect();
//! assert_eq!(hits, [k2]);
//!
//! // Removal returns the occupant.
//! let b = idx.remove(k1);
//! assert_eq!(b, Aabb2D::new(20.0, 0.0, 30.0, 10.0));
//! assert!(!idx.is_alive(k1));
//! ```
//!
//! ### Float semantics
//!
//! This crate assumes no NaNs for floating-point coordinates.

#![no_std]

extern crate alloc;

pub mod backend;
pub mod backends;
pub mod index;
pub mod occupant;
pub mod types;

pub use backend::Backend;
pub use backends::flatvec::FlatVec;
pub use backends::quadtree::{QuadTree, QuadTreeConfig, QuadTreeF32, QuadTreeF64};
pub use index::{FlatIndex, Index, IndexGeneric, Key};
pub use occupant::Occupant;
pub use types::{Aabb2D, Scalar};
