// Copyright 2025 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Light sources: radial cones and beams.

use core::f64::consts::{FRAC_PI_2, PI, TAU};

use kurbo::{Point, Rect, Size, Vec2};
use umbra_index::{Aabb2D, Occupant};

use crate::fin::ShadowFin;
use crate::rect_to_aabb;
use crate::render::{Color, Mesh, Primitive, SurfaceId, Vertex};

/// Angular step of the default cone tessellation.
pub const LIGHT_SUBDIVISION: f64 = PI / 24.0;

/// Shape of a light.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum LightKind {
    /// Radial light limited to `spread` radians around `direction`.
    Cone,
    /// Parallel beam of the given width, `radius` long.
    Beam {
        /// Extent across the beam direction.
        width: f64,
    },
}

/// Off-screen copy of a static light, reused while nothing changes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct StaticCache {
    pub(crate) surface: SurfaceId,
    /// World position of the surface's top-left pixel.
    pub(crate) origin: Point,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl StaticCache {
    pub(crate) fn world_rect(&self) -> Rect {
        Rect::from_origin_size(
            self.origin,
            Size::new(f64::from(self.width), f64::from(self.height)),
        )
    }
}

/// A light source.
///
/// Geometry setters recompute the bounds and mark the light dirty right away.
/// When the light is owned by a [`LightSystem`](crate::LightSystem), follow them
/// with [`notify_light_changed`](crate::LightSystem::notify_light_changed).
#[derive(Clone, Debug)]
pub struct Light {
    center: Point,
    radius: f64,
    intensity: f32,
    color: Color,
    size: f64,
    direction: f64,
    spread: f64,
    soft_spread: f64,
    kind: LightKind,
    bounds: Rect,
    pub(crate) update_required: bool,
    pub(crate) always_update: bool,
    pub(crate) cache: Option<StaticCache>,
}

impl Default for Light {
    fn default() -> Self {
        let mut light = Self {
            center: Point::ZERO,
            radius: 100.0,
            intensity: 1.0,
            color: Color::WHITE,
            size: 40.0,
            direction: 0.0,
            spread: TAU,
            soft_spread: PI / 24.0,
            kind: LightKind::Cone,
            bounds: Rect::ZERO,
            update_required: true,
            always_update: true,
            cache: None,
        };
        light.calculate_aabb();
        light
    }
}

impl Light {
    /// Full circle light at `center`.
    pub fn new(center: Point, radius: f64) -> Self {
        let mut light = Self::default();
        light.center = center;
        light.radius = radius;
        light.calculate_aabb();
        light
    }

    /// Builder: light color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.set_color(color);
        self
    }

    /// Builder: intensity in `(0, 1]`.
    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.set_intensity(intensity);
        self
    }

    /// Builder: radius of the virtual light disc.
    pub fn with_size(mut self, size: f64) -> Self {
        self.set_size(size);
        self
    }

    /// Builder: restrict to a cone.
    pub fn with_cone(mut self, direction: f64, spread: f64, soft_spread: f64) -> Self {
        self.direction = direction;
        self.spread = spread.clamp(0.0, TAU);
        self.soft_spread = soft_spread;
        self.calculate_aabb();
        self
    }

    /// Builder: make this a beam.
    pub fn with_beam(mut self, direction: f64, width: f64) -> Self {
        self.direction = direction;
        self.set_kind(LightKind::Beam { width });
        self
    }

    /// Builder: request a cached, rarely updated light.
    ///
    /// The cache surface is created when the light is inserted into a
    /// [`LightSystem`](crate::LightSystem).
    pub fn with_static(mut self, is_static: bool) -> Self {
        self.always_update = !is_static;
        self
    }

    /// Light position.
    pub fn center(&self) -> Point {
        self.center
    }

    /// Reach of the light.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Intensity in `(0, 1]`.
    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Light color.
    pub fn color(&self) -> Color {
        self.color
    }

    /// Radius of the virtual light disc, which sets penumbra width.
    pub fn size(&self) -> f64 {
        self.size
    }

    /// Direction of the cone or beam axis in radians.
    pub fn direction(&self) -> f64 {
        self.direction
    }

    /// Angular width of the cone in radians. `TAU` is a full circle.
    pub fn spread(&self) -> f64 {
        self.spread
    }

    /// Angular width of the soft cone edges.
    pub fn soft_spread(&self) -> f64 {
        self.soft_spread
    }

    /// Light shape.
    pub fn kind(&self) -> LightKind {
        self.kind
    }

    /// World bounds of everything the light can reach.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Whether the light is recomputed every frame.
    pub fn always_update(&self) -> bool {
        self.always_update
    }

    /// Whether the light needs recomputing on the next frame.
    pub fn update_required(&self) -> bool {
        self.update_required
    }

    /// Whether this light currently holds a cache surface.
    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    /// Whether the light covers the full circle.
    pub fn is_full_circle(&self) -> bool {
        matches!(self.kind, LightKind::Cone) && self.spread >= TAU
    }

    /// Move the light.
    pub fn set_center(&mut self, center: Point) {
        self.center = center;
        self.touch();
    }

    /// Translate the light.
    pub fn inc_center(&mut self, delta: Vec2) {
        self.center += delta;
        self.touch();
    }

    /// Change the reach.
    pub fn set_radius(&mut self, radius: f64) {
        self.radius = radius;
        self.touch();
    }

    /// Point the cone or beam.
    pub fn set_direction(&mut self, direction: f64) {
        self.direction = direction;
        self.touch();
    }

    /// Change the cone width, clamped to a full circle.
    pub fn set_spread(&mut self, spread: f64) {
        self.spread = spread.clamp(0.0, TAU);
        self.touch();
    }

    /// Change the soft edge width.
    pub fn set_soft_spread(&mut self, soft_spread: f64) {
        self.soft_spread = soft_spread;
        self.update_required = true;
    }

    /// Change the virtual disc radius.
    pub fn set_size(&mut self, size: f64) {
        self.size = size;
        self.update_required = true;
    }

    /// Change the color.
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
        self.update_required = true;
    }

    /// Change the intensity.
    ///
    /// # Panics
    ///
    /// Panics unless `intensity` is in `(0, 1]`.
    pub fn set_intensity(&mut self, intensity: f32) {
        assert!(
            intensity > 0.0 && intensity <= 1.0,
            "light intensity must be in (0, 1], got {intensity}"
        );
        self.intensity = intensity;
        self.update_required = true;
    }

    /// Change the light shape.
    pub fn set_kind(&mut self, kind: LightKind) {
        self.kind = kind;
        self.touch();
    }

    fn touch(&mut self) {
        self.calculate_aabb();
        self.update_required = true;
    }

    /// Recompute [`bounds`](Self::bounds).
    ///
    /// Full circles give a square around the center. Cones give the tight
    /// bounds of the sector, including any axis extreme the arc passes.
    pub fn calculate_aabb(&mut self) {
        self.bounds = match self.kind {
            LightKind::Beam { width } => {
                let [a, b, c, d] = self.beam_corners(width);
                Rect::from_points(a, b).union_pt(c).union_pt(d)
            }
            LightKind::Cone if self.spread >= TAU => {
                Rect::from_center_size(self.center, Size::new(2.0 * self.radius, 2.0 * self.radius))
            }
            LightKind::Cone => {
                let start = self.direction - self.spread / 2.0;
                let mut rect = Rect::from_points(self.center, self.arc_point(start))
                    .union_pt(self.arc_point(start + self.spread));
                for k in 0..4 {
                    let axis = FRAC_PI_2 * f64::from(k);
                    if (axis - start).rem_euclid(TAU) <= self.spread {
                        rect = rect.union_pt(self.arc_point(axis));
                    }
                }
                rect
            }
        };
    }

    fn arc_point(&self, angle: f64) -> Point {
        self.center + Vec2::from_angle(angle) * self.radius
    }

    /// Inner pair across the beam origin, then the outer pair at full reach.
    fn beam_corners(&self, width: f64) -> [Point; 4] {
        let dir = Vec2::from_angle(self.direction);
        let across = Vec2::new(-dir.y, dir.x) * (width / 2.0);
        let reach = dir * self.radius;
        let inner1 = self.center + across;
        let inner2 = self.center - across;
        [inner1, inner2, inner1 + reach, inner2 + reach]
    }

    /// The lit area with color fading out toward the edge.
    ///
    /// Cones tessellate the arc every `subdivision` radians and always end
    /// exactly on the far cone edge.
    ///
    /// # Panics
    ///
    /// Panics if the intensity is outside `(0, 1]` or `subdivision` is not
    /// positive.
    pub fn solid_portion(&self, subdivision: f64) -> Mesh {
        assert!(
            self.intensity > 0.0 && self.intensity <= 1.0,
            "light intensity must be in (0, 1], got {}",
            self.intensity
        );
        assert!(subdivision > 0.0, "light subdivision must be positive");
        let lit = self.color.scaled(self.intensity);
        let dark = Color::TRANSPARENT;
        match self.kind {
            LightKind::Cone => {
                let start = self.direction - self.spread / 2.0;
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    reason = "spread is clamped to [0, TAU] and subdivision is positive"
                )]
                let steps = (self.spread / subdivision).floor() as u32;
                let mut vertices = Vec::with_capacity(steps as usize + 3);
                vertices.push(Vertex::colored(self.center, lit));
                for i in 0..=steps {
                    let a = start + f64::from(i) * subdivision;
                    vertices.push(Vertex::colored(self.arc_point(a), dark));
                }
                if f64::from(steps) * subdivision < self.spread - 1e-9 {
                    vertices.push(Vertex::colored(self.arc_point(start + self.spread), dark));
                }
                Mesh {
                    primitive: Primitive::TriangleFan,
                    vertices,
                }
            }
            LightKind::Beam { width } => {
                let [inner1, inner2, outer1, outer2] = self.beam_corners(width);
                Mesh {
                    primitive: Primitive::TriangleStrip,
                    vertices: vec![
                        Vertex::colored(inner1, lit),
                        Vertex::colored(outer1, dark),
                        Vertex::colored(inner2, lit),
                        Vertex::colored(outer2, dark),
                    ],
                }
            }
        }
    }

    /// Fins that soften the angular edges of a cone or the sides of a beam.
    ///
    /// Empty for full circles and when the soft spread is zero.
    pub fn soft_portion(&self) -> Vec<ShadowFin> {
        if self.is_full_circle() || self.soft_spread == 0.0 {
            return Vec::new();
        }
        let r = self.radius;
        match self.kind {
            LightKind::Cone => {
                let edge1 = self.direction - self.spread / 2.0;
                let edge2 = self.direction + self.spread / 2.0;
                vec![
                    ShadowFin {
                        root: self.center,
                        umbra: Vec2::from_angle(edge1) * r,
                        penumbra: Vec2::from_angle(edge1 + self.soft_spread) * r,
                    },
                    ShadowFin {
                        root: self.center,
                        umbra: Vec2::from_angle(edge2) * r,
                        penumbra: Vec2::from_angle(edge2 - self.soft_spread) * r,
                    },
                ]
            }
            LightKind::Beam { width } => {
                let [inner1, inner2, _, _] = self.beam_corners(width);
                let along = self.direction;
                // inner1 sits on the counter-clockwise side of the axis.
                vec![
                    ShadowFin {
                        root: inner1,
                        umbra: Vec2::from_angle(along) * r,
                        penumbra: Vec2::from_angle(along - self.soft_spread) * r,
                    },
                    ShadowFin {
                        root: inner2,
                        umbra: Vec2::from_angle(along) * r,
                        penumbra: Vec2::from_angle(along + self.soft_spread) * r,
                    },
                ]
            }
        }
    }
}

impl Occupant<f64> for Light {
    fn aabb(&self) -> Aabb2D<f64> {
        rect_to_aabb(self.bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn approx_rect(a: Rect, b: Rect) -> bool {
        approx(a.x0, b.x0) && approx(a.y0, b.y0) && approx(a.x1, b.x1) && approx(a.y1, b.y1)
    }

    #[test]
    fn defaults() {
        let l = Light::default();
        assert_eq!(l.radius(), 100.0);
        assert_eq!(l.size(), 40.0);
        assert_eq!(l.intensity(), 1.0);
        assert_eq!(l.spread(), TAU);
        assert!(l.always_update());
        assert!(l.update_required());
        assert_eq!(l.bounds(), Rect::new(-100.0, -100.0, 100.0, 100.0));
    }

    #[test]
    fn quarter_cone_bounds_are_tight() {
        // Cone facing +x, 90 degrees wide: reaches (r, 0) on the axis.
        let l = Light::new(Point::ZERO, 10.0).with_cone(0.0, FRAC_PI_2, 0.0);
        let h = 10.0 * (PI / 4.0).sin();
        assert!(approx_rect(l.bounds(), Rect::new(0.0, -h, 10.0, h)));
    }

    #[test]
    fn cone_crossing_the_angle_wrap_includes_axis_extreme() {
        // Facing -x, the arc passes angle PI.
        let l = Light::new(Point::new(5.0, 5.0), 2.0).with_cone(PI, 1.0, 0.0);
        assert!(approx(l.bounds().x0, 3.0));
        assert!(approx(l.bounds().x1, 5.0));
    }

    #[test]
    fn beam_bounds_cover_the_rectangle() {
        let l = Light::new(Point::ZERO, 50.0).with_beam(0.0, 10.0);
        assert!(approx_rect(l.bounds(), Rect::new(0.0, -5.0, 50.0, 5.0)));
        let mesh = l.solid_portion(LIGHT_SUBDIVISION);
        assert_eq!(mesh.primitive, Primitive::TriangleStrip);
        assert_eq!(mesh.vertices.len(), 4);
    }

    #[test]
    fn full_circle_fan_closes() {
        let l = Light::new(Point::ZERO, 10.0);
        let mesh = l.solid_portion(LIGHT_SUBDIVISION);
        assert_eq!(mesh.primitive, Primitive::TriangleFan);
        // Center, then 48 steps plus the closing vertex.
        assert_eq!(mesh.vertices.len(), 50);
        let first = mesh.vertices[1].position;
        let last = mesh.vertices[mesh.vertices.len() - 1].position;
        assert!((first - last).hypot() < 1e-6);
        assert_eq!(mesh.vertices[0].color, Color::WHITE);
        assert_eq!(mesh.vertices[1].color, Color::TRANSPARENT);
    }

    #[test]
    fn cone_fan_ends_on_the_far_edge() {
        let l = Light::new(Point::ZERO, 10.0).with_cone(0.0, 1.0, 0.1);
        let mesh = l.solid_portion(0.3);
        let last = mesh.vertices[mesh.vertices.len() - 1].position;
        let expected = Point::ZERO + Vec2::from_angle(0.5) * 10.0;
        assert!((last - expected).hypot() < 1e-9);
    }

    #[test]
    fn soft_portion_only_for_cones_with_soft_edges() {
        assert!(Light::new(Point::ZERO, 10.0).soft_portion().is_empty());
        let hard = Light::new(Point::ZERO, 10.0).with_cone(0.0, 1.0, 0.0);
        assert!(hard.soft_portion().is_empty());
        let soft = Light::new(Point::ZERO, 10.0).with_cone(0.0, 1.0, 0.1);
        let fins = soft.soft_portion();
        assert_eq!(fins.len(), 2);
        // Penumbras point into the cone.
        assert!(fins[0].penumbra.atan2() > fins[0].umbra.atan2());
        assert!(fins[1].penumbra.atan2() < fins[1].umbra.atan2());
    }

    #[test]
    #[should_panic(expected = "intensity")]
    fn zero_intensity_panics() {
        let _ = Light::default().with_intensity(0.0);
    }

    #[test]
    fn setters_mark_dirty_and_move_bounds() {
        let mut l = Light::new(Point::ZERO, 10.0);
        l.update_required = false;
        l.inc_center(Vec2::new(5.0, 0.0));
        assert!(l.update_required());
        assert_eq!(l.bounds(), Rect::new(-5.0, -10.0, 15.0, 10.0));
        assert_eq!(l.aabb(), Aabb2D::new(-5.0, -10.0, 15.0, 10.0));
    }
}
