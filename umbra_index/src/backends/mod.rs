// Copyright 2025 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend implementations for different spatial strategies.
//!
//! - `quadtree`: region quadtree with oversized children, the default for
//!   moving occupants in a bounded world.
//! - `flatvec`: flat vector with linear scans. Exact and trivially correct,
//!   used as a reference and for tiny sets.

pub mod flatvec;
pub mod quadtree;

pub use flatvec::FlatVec;
pub use quadtree::{QuadTree, QuadTreeConfig, QuadTreeF32, QuadTreeF64};
