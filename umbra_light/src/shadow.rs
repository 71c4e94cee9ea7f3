// Copyright 2025 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shadow geometry for one light and one hull.
//!
//! Everything here is a pure function of the light and hull; nothing is
//! cached between calls.
//!
//! The light is treated as a disc of radius [`Light::size`]. Each silhouette
//! vertex of the hull gets a fin spanning the rays from both sides of the disc
//! through the vertex. The fully shadowed region between the two silhouette
//! vertices is covered by a short triangle strip through the hull center.

use kurbo::{Point, Vec2};

use crate::fin::ShadowFin;
use crate::hull::ConvexHull;
use crate::light::Light;

/// How far fins may walk along the hull when the penumbra sweeps across an
/// adjacent edge.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FinExtension {
    /// At most one extra fin per silhouette vertex.
    #[default]
    Single,
    /// Keep walking the hull, up to `max_fins` extra fins per silhouette
    /// vertex.
    Cascade,
}

/// Tuning for [`cast_shadow`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ShadowParams {
    /// Upper bound on extra fins per silhouette vertex.
    pub max_fins: usize,
    /// Extension policy.
    pub extension: FinExtension,
}

impl Default for ShadowParams {
    fn default() -> Self {
        Self {
            max_fins: 2,
            extension: FinExtension::Single,
        }
    }
}

/// Shadow of one hull under one light.
#[derive(Clone, Debug, PartialEq)]
pub struct ShadowGeometry {
    /// Silhouette vertex where back-facing edges give way to front-facing ones.
    pub first_boundary: usize,
    /// Silhouette vertex where front-facing edges give way to back-facing ones.
    pub second_boundary: usize,
    /// Primary and extension fins.
    pub fins: Vec<ShadowFin>,
    /// Triangle strip covering the umbra.
    pub umbra: [Point; 6],
}

/// Size-scaled normal to the light direction at `at`, on the side of `at`
/// facing away from the hull center.
pub fn light_normal(light: &Light, hull_center: Point, at: Point) -> Vec2 {
    let to_light = light.center() - at;
    let mut n = Vec2::new(-to_light.y, to_light.x);
    if (at - hull_center).dot(n) < 0.0 {
        n = -n;
    }
    safe_normalize(n) * light.size()
}

/// Per-edge classification: `true` where the edge faces away from the light.
///
/// The light position is shifted across the disc, per edge, so that edges
/// near grazing do not flicker between classes as the light moves.
pub fn back_facing(light: &Light, hull: &ConvexHull) -> Vec<bool> {
    let n = hull.len();
    let hull_center = hull.world_center();
    (0..n)
        .map(|i| {
            let mid = hull.world_vertex(i).midpoint(hull.world_vertex((i + 1) % n));
            let offset = light_normal(light, hull_center, mid);
            let to_light = (light.center() - offset) - mid;
            hull.normals()[i].dot(to_light) <= 0.0
        })
        .collect()
}

/// Find the two silhouette vertices from an edge classification.
///
/// Returns `(first, second)`. If every edge has the same class, both are `0`.
pub fn find_boundaries(back: &[bool]) -> (usize, usize) {
    let n = back.len();
    let mut first = 0;
    let mut second = 0;
    for cur in 0..n {
        let next = (cur + 1) % n;
        if back[cur] && !back[next] {
            first = next;
        }
        if !back[cur] && back[next] {
            second = next;
        }
    }
    (first, second)
}

/// Fin at a silhouette vertex.
pub fn primary_fin(light: &Light, hull: &ConvexHull, vertex: usize) -> ShadowFin {
    let root = hull.world_vertex(vertex);
    let n = light_normal(light, hull.world_center(), root);
    let r = light.radius();
    ShadowFin {
        root,
        umbra: safe_normalize(root - (light.center() + n)) * r,
        penumbra: safe_normalize(root - (light.center() - n)) * r,
    }
}

/// Angle between two vectors in `[0, PI]`.
fn angle_between(a: Vec2, b: Vec2) -> f64 {
    let denom = a.hypot() * b.hypot();
    if denom == 0.0 {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos()
}

fn safe_normalize(v: Vec2) -> Vec2 {
    let len = v.hypot();
    if len > 0.0 { v / len } else { Vec2::ZERO }
}

/// Walk from a silhouette vertex along the shadow side of the hull, adding a
/// fin at each vertex the penumbra sweeps past.
///
/// `step` is `n - 1` to walk backwards and `1` to walk forwards. Returns the
/// fin that bounds the umbra on this side.
fn extend_fins(
    light: &Light,
    hull: &ConvexHull,
    mut fin: ShadowFin,
    mut vertex: usize,
    step: usize,
    params: &ShadowParams,
    out: &mut Vec<ShadowFin>,
) -> ShadowFin {
    let n = hull.len();
    let limit = match params.extension {
        FinExtension::Single => params.max_fins.min(1),
        FinExtension::Cascade => params.max_fins,
    };
    for _ in 0..limit {
        let next = (vertex + step) % n;
        let edge = safe_normalize(hull.world_vertex(next) - hull.world_vertex(vertex));
        // The edge lies between the penumbra and umbra rays: the fin would
        // cut into the hull.
        if angle_between(fin.penumbra, edge) >= angle_between(fin.penumbra, fin.umbra) {
            break;
        }
        let r = light.radius();
        fin.umbra = edge * r;
        out.push(fin);

        let root = hull.world_vertex(next);
        let normal = light_normal(light, hull.world_center(), root);
        fin = ShadowFin {
            root,
            umbra: safe_normalize(root - (light.center() + normal)) * r,
            penumbra: edge * r,
        };
        vertex = next;
    }
    out.push(fin);
    fin
}

/// Compute the shadow `hull` casts under `light`.
///
/// # Panics
///
/// Panics if the hull has fewer than three vertices.
pub fn cast_shadow(light: &Light, hull: &ConvexHull, params: &ShadowParams) -> ShadowGeometry {
    let n = hull.len();
    assert!(n >= 3, "a convex hull needs at least 3 vertices");
    let back = back_facing(light, hull);
    let (first_boundary, second_boundary) = find_boundaries(&back);

    let mut fins = Vec::with_capacity(2 + 2 * params.max_fins);
    let first = extend_fins(
        light,
        hull,
        primary_fin(light, hull, first_boundary),
        first_boundary,
        n - 1,
        params,
        &mut fins,
    );
    let second = extend_fins(
        light,
        hull,
        primary_fin(light, hull, second_boundary),
        second_boundary,
        1,
        params,
        &mut fins,
    );

    let hull_center = hull.world_center();
    let through_center = safe_normalize(hull_center - light.center()) * light.radius();
    let umbra = [
        first.root,
        first.root + first.umbra,
        hull_center,
        hull_center + through_center,
        second.root,
        second.root + second.umbra,
    ];

    ShadowGeometry {
        first_boundary,
        second_boundary,
        fins,
        umbra,
    }
}

/// Whether the light disc point nearest the hull lies inside it.
///
/// Such a hull would shadow the whole light and is skipped. A light sitting
/// exactly on the hull center counts as inside.
pub fn light_inside_hull(light: &Light, hull: &ConvexHull) -> bool {
    let from_hull = light.center() - hull.world_center();
    if from_hull.hypot() == 0.0 {
        return true;
    }
    hull.point_inside(light.center() - safe_normalize(from_hull) * light.size())
}
