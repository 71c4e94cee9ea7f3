// Copyright 2025 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shadow fins: the soft edge triangles of a shadow.

use kurbo::{Point, Vec2};

use crate::render::Vertex;

/// A single soft-edge triangle.
///
/// The triangle spans `root`, `root + penumbra` and `root + umbra`. Drawn with
/// the soft shadow texture, coverage ramps from nothing along the penumbra
/// ray to full along the umbra ray.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ShadowFin {
    /// World position the fin hangs from.
    pub root: Point,
    /// Ray bounding the fully shadowed side. Length is the light radius.
    pub umbra: Vec2,
    /// Ray bounding the lit side. Length is the light radius.
    pub penumbra: Vec2,
}

impl ShadowFin {
    /// The three textured vertices of this fin.
    pub fn vertices(&self) -> [Vertex; 3] {
        [
            Vertex::textured(self.root, Point::new(0.0, 1.0)),
            Vertex::textured(self.root + self.penumbra, Point::new(0.0, 0.0)),
            Vertex::textured(self.root + self.umbra, Point::new(1.0, 0.0)),
        ]
    }

    /// Whether the fin has a non-zero area.
    pub fn is_degenerate(&self) -> bool {
        self.umbra.cross(self.penumbra).abs() <= f64::EPSILON
            || !self.umbra.is_finite()
            || !self.penumbra.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertices_ramp_from_penumbra_to_umbra() {
        let fin = ShadowFin {
            root: Point::new(1.0, 1.0),
            umbra: Vec2::new(10.0, 0.0),
            penumbra: Vec2::new(10.0, 2.0),
        };
        let [root, pen, umb] = fin.vertices();
        assert_eq!(root.position, Point::new(1.0, 1.0));
        assert_eq!(pen.position, Point::new(11.0, 3.0));
        assert_eq!(umb.position, Point::new(11.0, 1.0));
        assert_eq!(pen.uv.x, 0.0);
        assert_eq!(umb.uv.x, 1.0);
        assert!(!fin.is_degenerate());
    }

    #[test]
    fn collinear_rays_are_degenerate() {
        let fin = ShadowFin {
            root: Point::ZERO,
            umbra: Vec2::new(3.0, 4.0),
            penumbra: Vec2::new(3.0, 4.0),
        };
        assert!(fin.is_degenerate());
    }
}
