// Copyright 2025 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Convex occluders and their text outline format.

use std::fs;
use std::path::Path;

use kurbo::{Point, Rect, Vec2};
use umbra_index::{Aabb2D, Occupant};

use crate::error::HullLoadError;
use crate::render::{Color, Mesh, Primitive, Vertex};
use crate::rect_to_aabb;

/// A convex polygon that casts shadows.
///
/// Vertices are stored relative to their centroid, so moving the hull only
/// changes [`world_center`](Self::world_center). Either winding is accepted.
///
/// After moving a hull that is owned by a [`LightSystem`](crate::LightSystem),
/// call [`notify_hull_changed`](crate::LightSystem::notify_hull_changed).
#[derive(Clone, Debug)]
pub struct ConvexHull {
    vertices: Vec<Vec2>,
    normals: Vec<Vec2>,
    world_center: Point,
    local_bounds: Rect,
    aabb_generated: bool,
    pub(crate) update_required: bool,
    // World bounds at the last index placement.
    pub(crate) indexed_bounds: Rect,
    /// Whether the hull's own area is masked out of the light.
    pub render: bool,
    /// Added to the shadow depth of this hull's geometry.
    pub shadow_depth_offset: f64,
}

impl ConvexHull {
    /// Build a hull from world-space vertices. The hull keeps its position:
    /// its world center is the centroid of `points`.
    ///
    /// # Panics
    ///
    /// Panics with fewer than three vertices.
    pub fn from_vertices(points: &[Point]) -> Self {
        let mut hull = Self {
            vertices: Vec::new(),
            normals: Vec::new(),
            world_center: Point::ZERO,
            local_bounds: Rect::ZERO,
            aabb_generated: false,
            update_required: true,
            indexed_bounds: Rect::ZERO,
            render: true,
            shadow_depth_offset: 0.0,
        };
        hull.world_center = hull.load_vertices(points);
        hull
    }

    /// Regular polygon with `sides` vertices at distance `radius` from `center`.
    pub fn regular(center: Point, radius: f64, sides: usize) -> Self {
        #[allow(clippy::cast_precision_loss, reason = "vertex counts are small")]
        let step = core::f64::consts::TAU / sides as f64;
        let points: Vec<_> = (0..sides)
            .map(|i| {
                #[allow(clippy::cast_precision_loss, reason = "vertex counts are small")]
                let a = step * i as f64;
                center + Vec2::from_angle(a) * radius
            })
            .collect();
        Self::from_vertices(&points)
    }

    /// Axis aligned square hull.
    pub fn square(center: Point, half_size: f64) -> Self {
        let h = half_size;
        Self::from_vertices(&[
            center + Vec2::new(-h, -h),
            center + Vec2::new(h, -h),
            center + Vec2::new(h, h),
            center + Vec2::new(-h, h),
        ])
    }

    /// Read a hull from a text file in the [`parse_hull`] format.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, HullLoadError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| HullLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let points = parse_hull(&text)?;
        log::debug!("loaded hull with {} vertices from {}", points.len(), path.display());
        Ok(Self::from_vertices(&points))
    }

    /// Replace the outline.
    ///
    /// Vertices are recentered on their centroid; the world center is left
    /// unchanged. Returns the centroid of `points`.
    ///
    /// # Panics
    ///
    /// Panics with fewer than three vertices.
    pub fn load_vertices(&mut self, points: &[Point]) -> Point {
        assert!(
            points.len() >= 3,
            "a convex hull needs at least 3 vertices, got {}",
            points.len()
        );
        #[allow(clippy::cast_precision_loss, reason = "vertex counts are small")]
        let n = points.len() as f64;
        let sum = points.iter().fold(Vec2::ZERO, |acc, p| acc + p.to_vec2());
        let centroid = (sum / n).to_point();
        self.vertices = points.iter().map(|p| *p - centroid).collect();
        self.compute_normals();
        self.generate_aabb();
        self.update_required = true;
        centroid
    }

    /// Recompute per-edge outward normals. Edge `i` runs from vertex `i` to
    /// vertex `i + 1`, wrapping. Normals are not normalized.
    pub fn compute_normals(&mut self) {
        let n = self.vertices.len();
        // Signed area decides which perpendicular points outward.
        let area2: f64 = (0..n)
            .map(|i| self.vertices[i].cross(self.vertices[(i + 1) % n]))
            .sum();
        let ccw = area2 >= 0.0;
        self.normals = (0..n)
            .map(|i| {
                let e = self.vertices[(i + 1) % n] - self.vertices[i];
                if ccw {
                    Vec2::new(e.y, -e.x)
                } else {
                    Vec2::new(-e.y, e.x)
                }
            })
            .collect();
    }

    /// Recompute the local bounds from the vertices.
    pub fn generate_aabb(&mut self) {
        let first = self.vertices[0].to_point();
        self.local_bounds = self
            .vertices
            .iter()
            .fold(Rect::from_points(first, first), |r, v| r.union_pt(v.to_point()));
        self.aabb_generated = true;
    }

    /// Whether bounds have been generated since construction.
    pub fn has_generated_aabb(&self) -> bool {
        self.aabb_generated
    }

    /// World-space bounds.
    pub fn bounds(&self) -> Rect {
        self.local_bounds + self.world_center.to_vec2()
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Always false; hulls have at least three vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Centroid-relative vertices.
    pub fn local_vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    /// Outward edge normals, one per edge.
    pub fn normals(&self) -> &[Vec2] {
        &self.normals
    }

    /// Vertex `i` in world space.
    pub fn world_vertex(&self, i: usize) -> Point {
        self.world_center + self.vertices[i]
    }

    /// All vertices in world space.
    pub fn world_vertices(&self) -> impl Iterator<Item = Point> + '_ {
        self.vertices.iter().map(|v| self.world_center + *v)
    }

    /// World position of the centroid.
    pub fn world_center(&self) -> Point {
        self.world_center
    }

    /// Move the hull so its centroid lands on `center`.
    pub fn set_world_center(&mut self, center: Point) {
        self.world_center = center;
        self.update_required = true;
    }

    /// Translate the hull.
    pub fn inc_world_center(&mut self, delta: Vec2) {
        self.world_center += delta;
        self.update_required = true;
    }

    /// Whether the hull changed since the last computed frame.
    pub fn update_required(&self) -> bool {
        self.update_required
    }

    /// Whether `p` lies strictly inside the hull.
    ///
    /// Every edge's cross product against `p` must have the same sign. A zero
    /// cross product, meaning `p` sits on an edge line, counts as outside.
    pub fn point_inside(&self, p: Point) -> bool {
        let n = self.vertices.len();
        let mut sign = 0.0_f64;
        for i in 0..n {
            let a = self.world_vertex(i);
            let b = self.world_vertex((i + 1) % n);
            let cross = (b - a).cross(p - a);
            if cross == 0.0 || cross.is_nan() {
                return false;
            }
            if sign == 0.0 {
                sign = cross.signum();
            } else if cross.signum() != sign {
                return false;
            }
        }
        true
    }

    /// Filled outline as a triangle fan.
    pub fn fill_mesh(&self) -> Mesh {
        Mesh {
            primitive: Primitive::TriangleFan,
            vertices: self
                .world_vertices()
                .map(|p| Vertex::colored(p, Color::BLACK))
                .collect(),
        }
    }
}

impl Occupant<f64> for ConvexHull {
    fn aabb(&self) -> Aabb2D<f64> {
        rect_to_aabb(self.bounds())
    }
}

/// Parse a hull outline: whitespace separated `x y` pairs, one vertex each.
///
/// Any malformed token fails the whole parse; no partial outline is returned.
pub fn parse_hull(text: &str) -> Result<Vec<Point>, HullLoadError> {
    let values = text
        .split_whitespace()
        .enumerate()
        .map(|(index, token)| {
            token
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| HullLoadError::InvalidNumber {
                    token: token.to_owned(),
                    index,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if values.len() % 2 != 0 {
        return Err(HullLoadError::UnpairedCoordinate {
            index: values.len() - 1,
        });
    }
    let points: Vec<_> = values
        .chunks_exact(2)
        .map(|xy| Point::new(xy[0], xy[1]))
        .collect();
    if points.len() < 3 {
        return Err(HullLoadError::TooFewVertices {
            found: points.len(),
        });
    }
    Ok(points)
}
