// Copyright 2025 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types and helpers.

use core::cmp::Ordering;
use core::fmt::Debug;

/// Axis-aligned bounding box in 2D.
///
/// The box is expected to satisfy `min_x <= max_x` and `min_y <= max_y`.
/// This is a documented precondition and is not enforced by construction;
/// [`Aabb2D::is_empty`] reports boxes that violate it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb2D<T> {
    /// Minimum x (lower bound)
    pub min_x: T,
    /// Minimum y (lower bound)
    pub min_y: T,
    /// Maximum x (upper bound)
    pub max_x: T,
    /// Maximum y (upper bound)
    pub max_y: T,
}

impl<T> Aabb2D<T> {
    /// Create a new AABB from min/max corners.
    pub const fn new(min_x: T, min_y: T, max_x: T, max_y: T) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }
}

impl<T: Copy + PartialOrd> Aabb2D<T> {
    /// Whether this AABB contains the point (bounds inclusive).
    pub fn contains_point(&self, x: T, y: T) -> bool {
        le(self.min_x, x) && le(self.min_y, y) && le(x, self.max_x) && le(y, self.max_y)
    }

    /// Whether the two boxes overlap. Touching edges count as overlapping.
    pub fn intersects(&self, other: &Self) -> bool {
        !(lt(self.max_x, other.min_x)
            || lt(self.max_y, other.min_y)
            || lt(other.max_x, self.min_x)
            || lt(other.max_y, self.min_y))
    }

    /// Whether `other` lies entirely inside this box (bounds inclusive).
    pub fn contains(&self, other: &Self) -> bool {
        le(self.min_x, other.min_x)
            && le(other.max_x, self.max_x)
            && le(self.min_y, other.min_y)
            && le(other.max_y, self.max_y)
    }

    /// The intersection of two AABBs. May be empty (inverted).
    pub fn intersect(&self, other: &Self) -> Self {
        Self {
            min_x: max_t(self.min_x, other.min_x),
            min_y: max_t(self.min_y, other.min_y),
            max_x: min_t(self.max_x, other.max_x),
            max_y: min_t(self.max_y, other.max_y),
        }
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &Self) -> Self {
        union_aabb(*self, *other)
    }

    /// Return true if the AABB is inverted. Zero-area boxes are not empty. Assumes no NaN.
    pub fn is_empty(&self) -> bool {
        lt(self.max_x, self.min_x) || lt(self.max_y, self.min_y)
    }
}

impl<T: Scalar> Aabb2D<T> {
    /// Create an AABB from its center and half extents.
    pub fn from_center_half_extents(cx: T, cy: T, hw: T, hh: T) -> Self {
        Self {
            min_x: T::sub(cx, hw),
            min_y: T::sub(cy, hh),
            max_x: T::add(cx, hw),
            max_y: T::add(cy, hh),
        }
    }

    /// Center point as `(x, y)`.
    pub fn center(&self) -> (T, T) {
        (T::mid(self.min_x, self.max_x), T::mid(self.min_y, self.max_y))
    }

    /// Width and height as `(w, h)`.
    pub fn dims(&self) -> (T, T) {
        (T::sub(self.max_x, self.min_x), T::sub(self.max_y, self.min_y))
    }

    /// Move the box so its center lands on `(cx, cy)`, keeping its dims.
    pub fn set_center(&mut self, cx: T, cy: T) {
        let (x, y) = self.center();
        self.inc_center(T::sub(cx, x), T::sub(cy, y));
    }

    /// Translate the box.
    pub fn inc_center(&mut self, dx: T, dy: T) {
        self.min_x = T::add(self.min_x, dx);
        self.max_x = T::add(self.max_x, dx);
        self.min_y = T::add(self.min_y, dy);
        self.max_y = T::add(self.max_y, dy);
    }

    /// Resize the box around its current center.
    pub fn set_dims(&mut self, w: T, h: T) {
        let (cx, cy) = self.center();
        *self = Self::from_center_half_extents(cx, cy, T::half(w), T::half(h));
    }
}

/// Floating point scalar used by the quadtree.
///
/// The quadtree needs midpoints and oversizing multipliers, so only float
/// scalars are supported.
pub trait Scalar: Copy + PartialOrd + Debug {
    /// Zero value for the scalar type.
    fn zero() -> Self;

    /// Add two scalar values.
    fn add(a: Self, b: Self) -> Self;

    /// Subtract two scalar values: a - b.
    fn sub(a: Self, b: Self) -> Self;

    /// Multiply two scalar values.
    fn mul(a: Self, b: Self) -> Self;

    /// Half of a value.
    fn half(v: Self) -> Self;

    /// Midpoint between a and b.
    fn mid(a: Self, b: Self) -> Self;

    /// Convert a configuration constant.
    fn from_f32(v: f32) -> Self;
}

impl Scalar for f32 {
    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn add(a: Self, b: Self) -> Self {
        a + b
    }

    #[inline]
    fn sub(a: Self, b: Self) -> Self {
        a - b
    }

    #[inline]
    fn mul(a: Self, b: Self) -> Self {
        a * b
    }

    #[inline]
    fn half(v: Self) -> Self {
        0.5 * v
    }

    #[inline]
    fn mid(a: Self, b: Self) -> Self {
        0.5 * (a + b)
    }

    #[inline]
    fn from_f32(v: f32) -> Self {
        v
    }
}

impl Scalar for f64 {
    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn add(a: Self, b: Self) -> Self {
        a + b
    }

    #[inline]
    fn sub(a: Self, b: Self) -> Self {
        a - b
    }

    #[inline]
    fn mul(a: Self, b: Self) -> Self {
        a * b
    }

    #[inline]
    fn half(v: Self) -> Self {
        0.5 * v
    }

    #[inline]
    fn mid(a: Self, b: Self) -> Self {
        0.5 * (a + b)
    }

    #[inline]
    fn from_f32(v: f32) -> Self {
        Self::from(v)
    }
}

pub(crate) fn min_t<T: PartialOrd + Copy>(a: T, b: T) -> T {
    match a.partial_cmp(&b) {
        Some(Ordering::Greater) => b,
        _ => a,
    }
}

pub(crate) fn max_t<T: PartialOrd + Copy>(a: T, b: T) -> T {
    match a.partial_cmp(&b) {
        Some(Ordering::Less) => b,
        _ => a,
    }
}

pub(crate) fn le<T: PartialOrd>(a: T, b: T) -> bool {
    a.partial_cmp(&b)
        .map(|o| o != Ordering::Greater)
        .unwrap_or(false)
}

pub(crate) fn lt<T: PartialOrd>(a: T, b: T) -> bool {
    a.partial_cmp(&b)
        .map(|o| o == Ordering::Less)
        .unwrap_or(false)
}

pub(crate) fn union_aabb<T: PartialOrd + Copy>(a: Aabb2D<T>, b: Aabb2D<T>) -> Aabb2D<T> {
    Aabb2D {
        min_x: min_t(a.min_x, b.min_x),
        min_y: min_t(a.min_y, b.min_y),
        max_x: max_t(a.max_x, b.max_x),
        max_y: max_t(a.max_y, b.max_y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_boxes_intersect() {
        let a = Aabb2D::new(0.0, 0.0, 10.0, 10.0);
        let b = Aabb2D::new(10.0, 0.0, 20.0, 10.0);
        let c = Aabb2D::new(10.5, 0.0, 20.0, 10.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn contains_is_inclusive() {
        let outer = Aabb2D::new(0.0_f32, 0.0, 10.0, 10.0);
        assert!(outer.contains(&outer));
        assert!(outer.contains(&Aabb2D::new(2.0, 2.0, 3.0, 3.0)));
        assert!(!outer.contains(&Aabb2D::new(-1.0, 2.0, 3.0, 3.0)));
    }

    #[test]
    fn recenter_keeps_dims_and_resize_keeps_center() {
        let mut a = Aabb2D::new(0.0, 0.0, 4.0, 2.0);
        a.set_center(10.0, 10.0);
        assert_eq!(a, Aabb2D::new(8.0, 9.0, 12.0, 11.0));
        assert_eq!(a.dims(), (4.0, 2.0));

        a.set_dims(8.0, 8.0);
        assert_eq!(a.center(), (10.0, 10.0));
        assert_eq!(a, Aabb2D::new(6.0, 6.0, 14.0, 14.0));
    }

    #[test]
    fn inverted_box_is_empty() {
        assert!(Aabb2D::new(1.0, 0.0, 0.0, 1.0).is_empty());
        assert!(!Aabb2D::new(1.0, 1.0, 1.0, 1.0).is_empty());
    }
}
