// Copyright 2025 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Umbra Light: 2D dynamic lighting with soft shadows cast by convex hulls.
//!
//! - [`Light`]s are cones, full circles or beams with a virtual disc size that
//!   controls how soft their shadows are.
//! - [`ConvexHull`]s occlude light. Each one casts an umbra and a pair of
//!   [`ShadowFin`]s per silhouette side; see [`shadow`].
//! - [`EmissiveSprite`]s are drawn into the light map unshadowed, for things
//!   that glow.
//! - The [`LightSystem`] owns all three in quadtree indices from
//!   [`umbra_index`], decides per frame which lights must be recomputed, and
//!   keeps static lights in cached surfaces.
//!
//! Drawing goes through the [`RenderBackend`] trait, so any renderer with
//! depth testing and separate color and alpha blending can host it.
//! [`CommandRecorder`] is a headless backend that logs every call.
//!
//! ## Frame outline
//!
//! 1. [`LightSystem::compute_frame`] clears the light map to the ambient
//!    color, renders each visible light with its shadows into a scratch
//!    target (or its cache), and adds the result to the light map. Emissive
//!    sprites are drawn last.
//! 2. [`LightSystem::present_frame`] multiplies the light map onto the host
//!    target.
//!
//! Owned objects are edited through the `*_mut` accessors. Call the matching
//! `notify_*_changed` afterwards so the index and the dirty flags catch up.
//!
//! # Example
//!
//! ```rust
//! use kurbo::{Point, Rect, Vec2};
//! use umbra_light::{
//!     CommandRecorder, ConvexHull, Light, LightSystem, LightSystemConfig,
//! };
//!
//! let config = LightSystemConfig::new(
//!     Rect::new(0.0, 0.0, 1024.0, 1024.0),
//!     Rect::new(0.0, 0.0, 800.0, 600.0),
//! );
//! let mut lights = LightSystem::new(config, CommandRecorder::new()).unwrap();
//!
//! let _sun = lights.insert_light(Light::new(Point::new(200.0, 200.0), 400.0).with_size(20.0));
//! let crate_box = lights.insert_hull(ConvexHull::square(Point::new(300.0, 250.0), 25.0));
//!
//! let stats = lights.compute_frame();
//! assert_eq!(stats.lights_recomputed, 1);
//! assert_eq!(stats.shadows_cast, 1);
//! lights.present_frame();
//!
//! // Move the hull and tell the system about it.
//! lights.hull_mut(crate_box).unwrap().inc_world_center(Vec2::new(10.0, 0.0));
//! lights.notify_hull_changed(crate_box);
//! ```
//!
//! Hulls can also be read from text files holding whitespace separated
//! `x y` pairs; see [`parse_hull`] and [`ConvexHull::load_file`].

mod config;
mod emissive;
mod error;
mod fin;
mod hull;
mod light;
mod recorder;
mod render;
pub mod shadow;
mod system;

pub use config::LightSystemConfig;
pub use emissive::EmissiveSprite;
pub use error::{HullLoadError, LightSystemError, RenderError};
pub use fin::ShadowFin;
pub use hull::{ConvexHull, parse_hull};
pub use light::{LIGHT_SUBDIVISION, Light, LightKind};
pub use recorder::{CommandRecorder, DrawCommand};
pub use render::{
    BlendMode, Capabilities, Color, ColorWrites, Mesh, Primitive, RenderBackend, SurfaceId,
    Target, TextureId, Vertex,
};
pub use system::{EmissiveKey, FrameStats, HullKey, LightKey, LightSystem};

pub use umbra_index;

use kurbo::Rect;
use umbra_index::Aabb2D;

/// Index box of a world rectangle.
pub(crate) fn rect_to_aabb(r: Rect) -> Aabb2D<f64> {
    let r = r.abs();
    Aabb2D::new(r.x0, r.y0, r.x1, r.y1)
}

#[cfg(test)]
mod tests {
    #[test]
    fn package_metadata_comes_from_the_workspace() {
        assert_eq!(env!("CARGO_PKG_LICENSE"), "Apache-2.0 OR MIT");
        assert_eq!(env!("CARGO_PKG_RUST_VERSION"), "1.88");
    }
}
