// Copyright 2025 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Light system configuration.

use kurbo::Rect;
use umbra_index::QuadTreeConfig;

use crate::light::LIGHT_SUBDIVISION;
use crate::render::Color;
use crate::shadow::{FinExtension, ShadowParams};

/// Settings for a [`LightSystem`](crate::LightSystem).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LightSystemConfig {
    /// Root region of the three spatial indices.
    pub region: Rect,
    /// Initial world-space view.
    pub view: Rect,
    /// Quadtree tuning shared by the indices.
    pub quadtree: QuadTreeConfig,
    /// Color of unlit areas.
    pub ambient_color: Color,
    /// Skip hulls that contain the light.
    pub check_for_hull_intersect: bool,
    /// Upper bound on extra fins per silhouette vertex.
    pub max_fins: usize,
    /// Fin extension policy.
    pub fin_extension: FinExtension,
    /// Frames a light queued with `build_light` is forced dirty.
    pub prebuild_frames: u32,
    /// Angular step of cone tessellation in radians.
    pub light_subdivision: f64,
    /// Depth of shadow geometry.
    pub shadow_depth: f64,
    /// Depth of light geometry. Must be smaller than `shadow_depth` for
    /// shadows to mask the light.
    pub light_depth: f64,
}

impl Default for LightSystemConfig {
    fn default() -> Self {
        let view = Rect::new(0.0, 0.0, 800.0, 600.0);
        Self {
            region: view,
            view,
            quadtree: QuadTreeConfig::default(),
            ambient_color: Color::BLACK,
            check_for_hull_intersect: true,
            max_fins: 2,
            fin_extension: FinExtension::Single,
            prebuild_frames: 2,
            light_subdivision: LIGHT_SUBDIVISION,
            shadow_depth: 2.0,
            light_depth: 1.0,
        }
    }
}

impl LightSystemConfig {
    /// Default settings for a world covering `region`, viewed through `view`.
    pub fn new(region: Rect, view: Rect) -> Self {
        Self {
            region,
            view,
            ..Self::default()
        }
    }

    /// Shadow engine parameters derived from this configuration.
    pub fn shadow_params(&self) -> ShadowParams {
        ShadowParams {
            max_fins: self.max_fins,
            extension: self.fin_extension,
        }
    }
}
