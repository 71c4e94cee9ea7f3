// Copyright 2025 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A [`RenderBackend`] that records calls instead of drawing.

use kurbo::{Affine, Rect, Size};

use crate::error::RenderError;
use crate::render::{
    BlendMode, Capabilities, Color, ColorWrites, Primitive, RenderBackend, SurfaceId, Target,
    TextureId, Vertex,
};

/// One recorded backend call.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// [`RenderBackend::set_view_size`].
    SetViewSize(Size),
    /// [`RenderBackend::create_surface`] that succeeded.
    CreateSurface {
        /// Issued handle.
        surface: SurfaceId,
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
    /// [`RenderBackend::destroy_surface`].
    DestroySurface(SurfaceId),
    /// [`RenderBackend::bind_target`].
    BindTarget(Target, Affine),
    /// [`RenderBackend::clear`].
    Clear(Color),
    /// [`RenderBackend::set_blend`].
    SetBlend(BlendMode),
    /// [`RenderBackend::set_color_writes`].
    SetColorWrites(ColorWrites),
    /// [`RenderBackend::set_soft_shadow_texture`].
    SoftShadowTexture(bool),
    /// [`RenderBackend::draw`].
    Draw {
        /// Topology.
        primitive: Primitive,
        /// Submitted vertices.
        vertices: Vec<Vertex>,
        /// Depth value.
        depth: f64,
    },
    /// [`RenderBackend::draw_sprite`].
    Sprite {
        /// Texture handle.
        texture: TextureId,
        /// Destination rectangle.
        dest: Rect,
        /// Tint color.
        tint: Color,
    },
    /// [`RenderBackend::composite`].
    Composite {
        /// Source target.
        source: Target,
        /// Destination rectangle on the bound target.
        dest: Rect,
        /// Blend equation.
        blend: BlendMode,
    },
    /// [`RenderBackend::present`].
    Present,
}

/// Headless backend for tests and tooling.
///
/// Tracks the live surface count and can be told to refuse surface
/// allocation.
///
/// Every call is appended to an in-memory log that is never trimmed on its
/// own. A host that keeps a recorder running across many frames should drain
/// it with [`take_commands`](Self::take_commands) once per frame.
#[derive(Debug, Default)]
pub struct CommandRecorder {
    capabilities: Capabilities,
    commands: Vec<DrawCommand>,
    next_surface: u32,
    live_surfaces: Vec<SurfaceId>,
    /// When set, every `create_surface` call fails.
    pub fail_surface_creation: bool,
}

impl CommandRecorder {
    /// Recorder with default capabilities.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorder reporting `capabilities`.
    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            ..Self::default()
        }
    }

    /// Calls recorded so far.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Take the recorded calls, leaving the log empty.
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        core::mem::take(&mut self.commands)
    }

    /// Surfaces created and not yet destroyed.
    pub fn live_surfaces(&self) -> &[SurfaceId] {
        &self.live_surfaces
    }

    /// Number of `draw` calls with the given topology.
    pub fn count_draws(&self, primitive: Primitive) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Draw { primitive: p, .. } if *p == primitive))
            .count()
    }

    fn record(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }
}

impl RenderBackend for CommandRecorder {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn set_view_size(&mut self, size: Size) {
        self.record(DrawCommand::SetViewSize(size));
    }

    fn create_surface(&mut self, width: u32, height: u32) -> Result<SurfaceId, RenderError> {
        let max = self.capabilities.max_surface_size;
        if width > max || height > max {
            return Err(RenderError::SurfaceTooLarge { width, height, max });
        }
        if self.fail_surface_creation {
            return Err(RenderError::Allocation("recorder refuses surfaces".into()));
        }
        let surface = SurfaceId(self.next_surface);
        self.next_surface += 1;
        self.live_surfaces.push(surface);
        self.record(DrawCommand::CreateSurface {
            surface,
            width,
            height,
        });
        Ok(surface)
    }

    fn destroy_surface(&mut self, surface: SurfaceId) {
        self.live_surfaces.retain(|s| *s != surface);
        self.record(DrawCommand::DestroySurface(surface));
    }

    fn bind_target(&mut self, target: Target, transform: Affine) {
        self.record(DrawCommand::BindTarget(target, transform));
    }

    fn clear(&mut self, color: Color) {
        self.record(DrawCommand::Clear(color));
    }

    fn set_blend(&mut self, mode: BlendMode) {
        self.record(DrawCommand::SetBlend(mode));
    }

    fn set_color_writes(&mut self, writes: ColorWrites) {
        self.record(DrawCommand::SetColorWrites(writes));
    }

    fn set_soft_shadow_texture(&mut self, enabled: bool) {
        self.record(DrawCommand::SoftShadowTexture(enabled));
    }

    fn draw(&mut self, primitive: Primitive, vertices: &[Vertex], depth: f64) {
        self.record(DrawCommand::Draw {
            primitive,
            vertices: vertices.to_vec(),
            depth,
        });
    }

    fn draw_sprite(&mut self, texture: TextureId, dest: Rect, tint: Color) {
        self.record(DrawCommand::Sprite {
            texture,
            dest,
            tint,
        });
    }

    fn composite(&mut self, source: Target, dest: Rect, blend: BlendMode) {
        self.record(DrawCommand::Composite {
            source,
            dest,
            blend,
        });
    }

    fn present(&mut self) {
        self.record(DrawCommand::Present);
    }
}
