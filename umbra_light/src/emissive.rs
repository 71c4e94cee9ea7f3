// Copyright 2025 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Self-lit sprites drawn on top of the light map.

use kurbo::{Point, Rect, Size, Vec2};
use umbra_index::{Aabb2D, Occupant};

use crate::rect_to_aabb;
use crate::render::{Color, TextureId};

/// A host texture that glows regardless of shadows.
#[derive(Clone, Debug, PartialEq)]
pub struct EmissiveSprite {
    center: Point,
    scale: Vec2,
    texture: TextureId,
    texture_size: Size,
    /// Multiplied into the texture when drawn.
    pub tint: Color,
}

impl EmissiveSprite {
    /// Sprite showing `texture` at its natural size around `center`.
    pub fn new(texture: TextureId, texture_size: Size, center: Point) -> Self {
        Self {
            center,
            scale: Vec2::new(1.0, 1.0),
            texture,
            texture_size,
            tint: Color::WHITE,
        }
    }

    /// Sprite center.
    pub fn center(&self) -> Point {
        self.center
    }

    /// Per-axis scale.
    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    /// Texture handle.
    pub fn texture(&self) -> TextureId {
        self.texture
    }

    /// Move the sprite.
    pub fn set_center(&mut self, center: Point) {
        self.center = center;
    }

    /// Translate the sprite.
    pub fn inc_center(&mut self, delta: Vec2) {
        self.center += delta;
    }

    /// Stretch the sprite around its center.
    pub fn set_scale(&mut self, scale: Vec2) {
        self.scale = scale;
    }

    /// Swap the texture.
    pub fn set_texture(&mut self, texture: TextureId, texture_size: Size) {
        self.texture = texture;
        self.texture_size = texture_size;
    }

    /// Area covered on screen, in world units.
    pub fn rect(&self) -> Rect {
        let size = Size::new(
            self.texture_size.width * self.scale.x.abs(),
            self.texture_size.height * self.scale.y.abs(),
        );
        Rect::from_center_size(self.center, size)
    }
}

impl Occupant<f64> for EmissiveSprite {
    fn aabb(&self) -> Aabb2D<f64> {
        rect_to_aabb(self.rect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_follows_scale_and_center() {
        let mut s = EmissiveSprite::new(TextureId(3), Size::new(16.0, 8.0), Point::new(10.0, 10.0));
        assert_eq!(s.rect(), Rect::new(2.0, 6.0, 18.0, 14.0));
        s.set_scale(Vec2::new(2.0, 0.5));
        assert_eq!(s.rect(), Rect::new(-6.0, 8.0, 26.0, 12.0));
        s.inc_center(Vec2::new(1.0, 0.0));
        assert_eq!(s.aabb(), Aabb2D::new(-5.0, 8.0, 27.0, 12.0));
    }
}
