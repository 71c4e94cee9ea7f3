// Copyright 2025 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render backend abstraction: the draw calls the light system issues.
//!
//! The light system never talks to a GPU API directly. It binds one of a few
//! [`Target`]s, sets blend and color-write state, and submits small batches of
//! [`Vertex`] data with a depth value. Depth testing is the backend's job:
//! larger depth is nearer, and a later draw at a smaller depth is rejected
//! wherever nearer geometry was already drawn on the same target. Depth is
//! cleared alongside color.

use kurbo::{Affine, Point, Rect, Size};

use crate::error::RenderError;

/// Linear RGBA color with `f32` channels in `[0, 1]`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);

    /// Opaque color from RGB channels.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Color from RGBA channels.
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// RGB scaled by `intensity`, with `intensity` as alpha.
    pub fn scaled(self, intensity: f32) -> Self {
        Self {
            r: self.r * intensity,
            g: self.g * intensity,
            b: self.b * intensity,
            a: intensity,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

bitflags::bitflags! {
    /// Channels a draw is allowed to write.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ColorWrites: u8 {
        /// Red channel.
        const RED   = 0b0001;
        /// Green channel.
        const GREEN = 0b0010;
        /// Blue channel.
        const BLUE  = 0b0100;
        /// Alpha channel.
        const ALPHA = 0b1000;
    }
}

impl Default for ColorWrites {
    fn default() -> Self {
        Self::all()
    }
}

/// Blend equations used by the light system.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// `src * src_a + dst * (1 - src_a)`.
    Alpha,
    /// `src + dst * (1 - src_a)`.
    PremultipliedAlpha,
    /// `src + dst`.
    Additive,
    /// `dst * (1 - src_a)`: the source only removes coverage.
    MaskAlpha,
    /// Color `dst * src`, alpha `src_a + dst_a * (1 - src_a)`.
    ///
    /// Needs separate color and alpha blend functions.
    Multiply,
}

/// Primitive topology of a vertex batch.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Independent triangles, three vertices each.
    Triangles,
    /// Fan around the first vertex.
    TriangleFan,
    /// Strip, each vertex closing a triangle with the previous two.
    TriangleStrip,
    /// Closed outline. Used for debug overlays only.
    LineLoop,
}

/// One vertex of a batch. `uv` is only read while the soft shadow texture is
/// enabled.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vertex {
    /// World position.
    pub position: Point,
    /// Vertex color.
    pub color: Color,
    /// Texture coordinate.
    pub uv: Point,
}

impl Vertex {
    /// Vertex with a color and no texture coordinate.
    pub fn colored(position: Point, color: Color) -> Self {
        Self {
            position,
            color,
            uv: Point::ZERO,
        }
    }

    /// White vertex with a texture coordinate.
    pub fn textured(position: Point, uv: Point) -> Self {
        Self {
            position,
            color: Color::WHITE,
            uv,
        }
    }
}

/// A primitive batch, independent of depth and target.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    /// Topology.
    pub primitive: Primitive,
    /// Vertices in submission order.
    pub vertices: Vec<Vertex>,
}

impl Mesh {
    /// Whether there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Handle of an off-screen surface created through [`RenderBackend::create_surface`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u32);

/// Handle of a texture owned by the host application.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextureId(pub u32);

/// A render target, also usable as a composite source.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    /// The host's own target, drawn to by [`present`](crate::LightSystem::present_frame).
    Host,
    /// View-sized surface all lights accumulate into. No depth buffer needed.
    Accumulation,
    /// View-sized scratch surface with depth, reused by every dynamic light.
    LightScratch,
    /// A surface created by the backend on request, with depth.
    Surface(SurfaceId),
}

/// What a backend can do, queried once at startup and for surface sizing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Capabilities {
    /// Largest width or height a surface may have.
    pub max_surface_size: u32,
    /// Whether color and alpha blend functions can differ.
    pub separate_blend: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            max_surface_size: 4096,
            separate_blend: true,
        }
    }
}

/// Everything the light system needs from a renderer.
///
/// State set through the setters persists until changed, across target
/// binds.
pub trait RenderBackend {
    /// Static capabilities of this backend.
    fn capabilities(&self) -> Capabilities;

    /// Size the accumulation and scratch targets to the view.
    fn set_view_size(&mut self, size: Size);

    /// Allocate an off-screen surface with depth.
    fn create_surface(&mut self, width: u32, height: u32) -> Result<SurfaceId, RenderError>;

    /// Release a surface. The id must not be used afterwards.
    fn destroy_surface(&mut self, surface: SurfaceId);

    /// Make `target` current. `transform` maps world space to target pixels.
    fn bind_target(&mut self, target: Target, transform: Affine);

    /// Clear color and depth of the current target.
    fn clear(&mut self, color: Color);

    /// Blend equation for subsequent draws.
    fn set_blend(&mut self, mode: BlendMode);

    /// Channel mask for subsequent draws. Depth is always written.
    fn set_color_writes(&mut self, writes: ColorWrites);

    /// Sample the soft shadow texture with each vertex's `uv`.
    ///
    /// The texture is an alpha ramp: opaque at `uv.x = 1`, transparent at
    /// `uv.x = 0`.
    fn set_soft_shadow_texture(&mut self, enabled: bool);

    /// Draw a batch at a fixed depth.
    fn draw(&mut self, primitive: Primitive, vertices: &[Vertex], depth: f64);

    /// Draw a host texture stretched over `dest`.
    fn draw_sprite(&mut self, texture: TextureId, dest: Rect, tint: Color);

    /// Draw the contents of `source` over `dest` on the current target.
    fn composite(&mut self, source: Target, dest: Rect, blend: BlendMode);

    /// Finish the frame on the host target.
    fn present(&mut self);
}
