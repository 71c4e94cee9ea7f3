// Copyright 2025 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The light system: owns lights, hulls and emissive sprites, and renders
//! them into a light map once per frame.

use kurbo::{Affine, Point, Rect};
use umbra_index::{Aabb2D, Index, Key, Occupant};

use crate::config::LightSystemConfig;
use crate::emissive::EmissiveSprite;
use crate::error::LightSystemError;
use crate::fin::ShadowFin;
use crate::hull::ConvexHull;
use crate::light::{Light, StaticCache};
use crate::rect_to_aabb;
use crate::render::{BlendMode, Color, ColorWrites, Primitive, RenderBackend, Target, Vertex};
use crate::shadow::{cast_shadow, light_inside_hull};

/// Handle of a light owned by a [`LightSystem`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LightKey(Key);

/// Handle of a hull owned by a [`LightSystem`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct HullKey(Key);

/// Handle of an emissive sprite owned by a [`LightSystem`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EmissiveKey(Key);

/// What [`LightSystem::compute_frame`] did.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Lights intersecting the view, plus queued pre-builds.
    pub visible_lights: usize,
    /// Lights whose shadows were recomputed.
    pub lights_recomputed: usize,
    /// Static lights drawn from their cache.
    pub lights_cached: usize,
    /// Light and hull pairs that produced shadow geometry.
    pub shadows_cast: usize,
    /// Hulls skipped because they contain the light.
    pub hulls_skipped: usize,
    /// Shadow fins drawn, excluding the lights' own soft edges.
    pub fins: usize,
    /// Emissive sprites drawn.
    pub emissives: usize,
}

/// Renders dynamic 2D lighting with soft shadows.
///
/// Lights, hulls and emissive sprites each live in their own quadtree index.
/// Every [`compute_frame`](Self::compute_frame) finds the lights in view,
/// recomputes those that changed (or are dynamic), reuses cached surfaces for
/// static lights that did not, and accumulates everything into a light map
/// that [`present_frame`](Self::present_frame) multiplies onto the host
/// target.
///
/// Occupants are moved through `*_mut` accessors followed by the matching
/// `notify_*_changed` call. Skipping the notification leaves the index stale.
pub struct LightSystem<B> {
    config: LightSystemConfig,
    backend: B,
    view: Rect,
    lights: Index<f64, Light>,
    hulls: Index<f64, ConvexHull>,
    emissives: Index<f64, EmissiveSprite>,
    prebuild: Vec<LightKey>,
    prebuild_timer: u32,
    // Scratch reused across lights within a frame.
    region_hulls: Vec<Key>,
    fins: Vec<ShadowFin>,
}

impl<B: RenderBackend> LightSystem<B> {
    /// Create a light system drawing through `backend`.
    ///
    /// Fails if the backend cannot blend color and alpha separately, which
    /// [`present_frame`](Self::present_frame) relies on.
    pub fn new(config: LightSystemConfig, mut backend: B) -> Result<Self, LightSystemError> {
        let caps = backend.capabilities();
        if !caps.separate_blend {
            return Err(LightSystemError::UnsupportedBackend(
                "separate color and alpha blending is required",
            ));
        }
        log::debug!(
            "light system backend: max surface {}px, separate blend",
            caps.max_surface_size
        );
        let region = rect_to_aabb(config.region);
        backend.set_view_size(config.view.size());
        Ok(Self {
            view: config.view,
            lights: Index::with_config(region, config.quadtree),
            hulls: Index::with_config(region, config.quadtree),
            emissives: Index::with_config(region, config.quadtree),
            config,
            backend,
            prebuild: Vec::new(),
            prebuild_timer: 0,
            region_hulls: Vec::new(),
            fins: Vec::new(),
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &LightSystemConfig {
        &self.config
    }

    /// The render backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The render backend, mutably.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Current world-space view.
    pub fn view(&self) -> Rect {
        self.view
    }

    /// Change the world-space view.
    pub fn set_view(&mut self, view: Rect) {
        if view.size() != self.view.size() {
            self.backend.set_view_size(view.size());
        }
        self.view = view;
    }

    fn camera(&self) -> Affine {
        Affine::translate(-self.view.origin().to_vec2())
    }

    // --- lights ---

    /// Take ownership of a light.
    ///
    /// A light built with [`Light::with_static`] gets its cache surface here,
    /// or stays dynamic if the surface cannot be created.
    pub fn insert_light(&mut self, mut light: Light) -> LightKey {
        light.cache = None;
        light.update_required = true;
        let wants_cache = !light.always_update;
        let key = LightKey(self.lights.insert(light));
        if wants_cache {
            self.create_cache(key);
        }
        log::debug!("inserted light {key:?}");
        key
    }

    /// Detach a light and hand it back. Its cache surface is released.
    ///
    /// # Panics
    ///
    /// Panics if `key` is stale.
    pub fn remove_light(&mut self, key: LightKey) -> Light {
        let mut light = self.lights.remove(key.0);
        if let Some(cache) = light.cache.take() {
            self.backend.destroy_surface(cache.surface);
        }
        self.prebuild.retain(|k| *k != key);
        log::debug!("removed light {key:?}");
        light
    }

    /// Shared access to a light.
    pub fn light(&self, key: LightKey) -> Option<&Light> {
        self.lights.get(key.0)
    }

    /// Mutable access to a light. Follow geometry changes with
    /// [`notify_light_changed`](Self::notify_light_changed).
    pub fn light_mut(&mut self, key: LightKey) -> Option<&mut Light> {
        self.lights.get_mut(key.0)
    }

    /// All lights.
    pub fn lights(&self) -> impl Iterator<Item = (LightKey, &Light)> + '_ {
        self.lights.iter().map(|(k, l)| (LightKey(k), l))
    }

    /// Re-place a light after it moved or changed shape, and mark it dirty.
    ///
    /// A static light whose bounds changed size gets a new cache surface.
    ///
    /// # Panics
    ///
    /// Panics if `key` is stale.
    pub fn notify_light_changed(&mut self, key: LightKey) {
        self.lights.update_status(key.0);
        let Some(light) = self.lights.get_mut(key.0) else {
            return;
        };
        light.update_required = true;
        let bounds = light.bounds();
        let Some(cache) = light.cache.as_mut() else {
            return;
        };
        let (w, h) = surface_dims(bounds);
        if w == f64::from(cache.width) && h == f64::from(cache.height) {
            cache.origin = bounds.origin();
        } else {
            let surface = cache.surface;
            light.cache = None;
            self.backend.destroy_surface(surface);
            self.create_cache(key);
        }
    }

    /// Switch a light between dynamic and cached.
    ///
    /// Turning caching on may fail; the light then stays dynamic and a
    /// warning is logged.
    ///
    /// # Panics
    ///
    /// Panics if `key` is stale.
    pub fn set_light_always_update(&mut self, key: LightKey, always: bool) {
        let light = self
            .lights
            .get_mut(key.0)
            .unwrap_or_else(|| panic!("stale light key {key:?}"));
        light.update_required = true;
        if always == light.always_update {
            return;
        }
        if always {
            light.always_update = true;
            if let Some(cache) = light.cache.take() {
                self.backend.destroy_surface(cache.surface);
            }
        } else {
            self.create_cache(key);
        }
    }

    /// Force a light to be recomputed over the next few frames, even when it
    /// is out of view. Used to warm static caches.
    ///
    /// # Panics
    ///
    /// Panics if `key` is stale.
    pub fn build_light(&mut self, key: LightKey) {
        assert!(self.lights.is_alive(key.0), "stale light key {key:?}");
        if self.prebuild.is_empty() {
            self.prebuild_timer = 0;
        }
        if !self.prebuild.contains(&key) {
            self.prebuild.push(key);
        }
    }

    /// Drop every light and release all cache surfaces.
    pub fn clear_lights(&mut self) {
        for (_, light) in self.lights.iter_mut() {
            if let Some(cache) = light.cache.take() {
                self.backend.destroy_surface(cache.surface);
            }
        }
        self.lights.clear();
        self.prebuild.clear();
        self.prebuild_timer = 0;
    }

    /// Lights whose bounds intersect `region`.
    pub fn query_lights(&self, region: Rect) -> impl Iterator<Item = (LightKey, &Light)> + '_ {
        self.lights
            .query_rect(rect_to_aabb(region))
            .map(|(k, l)| (LightKey(k), l))
    }

    fn create_cache(&mut self, key: LightKey) {
        let Some(light) = self.lights.get_mut(key.0) else {
            return;
        };
        light.always_update = true;
        let bounds = light.bounds();
        let max = self.backend.capabilities().max_surface_size;
        let (w, h) = surface_dims(bounds);
        if w > f64::from(max) || h > f64::from(max) {
            log::warn!(
                "static light {key:?} needs a {w}x{h} surface, larger than {max}; keeping it dynamic"
            );
            return;
        }
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "dims are rounded up, at least 1 and checked against the surface limit"
        )]
        let (width, height) = (w as u32, h as u32);
        match self.backend.create_surface(width, height) {
            Ok(surface) => {
                light.cache = Some(StaticCache {
                    surface,
                    origin: bounds.origin(),
                    width,
                    height,
                });
                light.always_update = false;
                light.update_required = true;
            }
            Err(err) => {
                log::warn!("static light {key:?} has no cache surface ({err}); keeping it dynamic");
            }
        }
    }

    // --- hulls ---

    /// Take ownership of a hull. Lights it overlaps are recomputed.
    pub fn insert_hull(&mut self, mut hull: ConvexHull) -> HullKey {
        hull.update_required = true;
        hull.indexed_bounds = hull.bounds();
        let bounds = hull.indexed_bounds;
        let key = HullKey(self.hulls.insert(hull));
        self.dirty_lights_in(bounds);
        log::debug!("inserted hull {key:?}");
        key
    }

    /// Detach a hull and hand it back. Lights it overlapped are recomputed.
    ///
    /// # Panics
    ///
    /// Panics if `key` is stale.
    pub fn remove_hull(&mut self, key: HullKey) -> ConvexHull {
        let hull = self.hulls.remove(key.0);
        self.dirty_lights_in(hull.indexed_bounds);
        log::debug!("removed hull {key:?}");
        hull
    }

    /// Shared access to a hull.
    pub fn hull(&self, key: HullKey) -> Option<&ConvexHull> {
        self.hulls.get(key.0)
    }

    /// Mutable access to a hull. Follow changes with
    /// [`notify_hull_changed`](Self::notify_hull_changed).
    pub fn hull_mut(&mut self, key: HullKey) -> Option<&mut ConvexHull> {
        self.hulls.get_mut(key.0)
    }

    /// All hulls.
    pub fn hulls(&self) -> impl Iterator<Item = (HullKey, &ConvexHull)> + '_ {
        self.hulls.iter().map(|(k, h)| (HullKey(k), h))
    }

    /// Re-place a hull after it moved or changed shape.
    ///
    /// Lights overlapping either the old or the new position are recomputed.
    ///
    /// # Panics
    ///
    /// Panics if `key` is stale.
    pub fn notify_hull_changed(&mut self, key: HullKey) {
        self.hulls.update_status(key.0);
        let Some(hull) = self.hulls.get_mut(key.0) else {
            return;
        };
        hull.update_required = true;
        let old = hull.indexed_bounds;
        let new = hull.bounds();
        hull.indexed_bounds = new;
        self.dirty_lights_in(old);
        self.dirty_lights_in(new);
    }

    /// Drop every hull. All lights are recomputed.
    pub fn clear_hulls(&mut self) {
        self.hulls.clear();
        for (_, light) in self.lights.iter_mut() {
            light.update_required = true;
        }
    }

    /// Hulls whose bounds intersect `region`.
    pub fn query_hulls(&self, region: Rect) -> impl Iterator<Item = (HullKey, &ConvexHull)> + '_ {
        self.hulls
            .query_rect(rect_to_aabb(region))
            .map(|(k, h)| (HullKey(k), h))
    }

    fn dirty_lights_in(&mut self, region: Rect) {
        let keys: Vec<Key> = self
            .lights
            .query_rect(rect_to_aabb(region))
            .map(|(k, _)| k)
            .collect();
        for k in keys {
            if let Some(light) = self.lights.get_mut(k) {
                light.update_required = true;
            }
        }
    }

    // --- emissive sprites ---

    /// Take ownership of an emissive sprite.
    pub fn insert_emissive(&mut self, sprite: EmissiveSprite) -> EmissiveKey {
        EmissiveKey(self.emissives.insert(sprite))
    }

    /// Detach an emissive sprite and hand it back.
    ///
    /// # Panics
    ///
    /// Panics if `key` is stale.
    pub fn remove_emissive(&mut self, key: EmissiveKey) -> EmissiveSprite {
        self.emissives.remove(key.0)
    }

    /// Shared access to an emissive sprite.
    pub fn emissive(&self, key: EmissiveKey) -> Option<&EmissiveSprite> {
        self.emissives.get(key.0)
    }

    /// Mutable access to an emissive sprite. Follow changes with
    /// [`notify_emissive_changed`](Self::notify_emissive_changed).
    pub fn emissive_mut(&mut self, key: EmissiveKey) -> Option<&mut EmissiveSprite> {
        self.emissives.get_mut(key.0)
    }

    /// All emissive sprites.
    pub fn emissives(&self) -> impl Iterator<Item = (EmissiveKey, &EmissiveSprite)> + '_ {
        self.emissives.iter().map(|(k, e)| (EmissiveKey(k), e))
    }

    /// Re-place an emissive sprite after it moved or was resized.
    ///
    /// # Panics
    ///
    /// Panics if `key` is stale.
    pub fn notify_emissive_changed(&mut self, key: EmissiveKey) {
        self.emissives.update_status(key.0);
    }

    /// Drop every emissive sprite.
    pub fn clear_emissives(&mut self) {
        self.emissives.clear();
    }

    /// Emissive sprites whose bounds intersect `region`.
    pub fn query_emissives(
        &self,
        region: Rect,
    ) -> impl Iterator<Item = (EmissiveKey, &EmissiveSprite)> + '_ {
        self.emissives
            .query_rect(rect_to_aabb(region))
            .map(|(k, e)| (EmissiveKey(k), e))
    }

    // --- frame ---

    /// Render all visible lights and emissive sprites into the accumulation
    /// target.
    pub fn compute_frame(&mut self) -> FrameStats {
        let mut stats = FrameStats::default();
        let camera = self.camera();
        self.backend.bind_target(Target::Accumulation, camera);
        self.backend.clear(self.config.ambient_color);

        let view = rect_to_aabb(self.view);
        let mut visible: Vec<LightKey> = self
            .lights
            .query_rect(view)
            .map(|(k, _)| LightKey(k))
            .collect();

        if !self.prebuild.is_empty() {
            if self.prebuild_timer < self.config.prebuild_frames {
                self.prebuild_timer += 1;
                for &key in &self.prebuild {
                    if let Some(light) = self.lights.get_mut(key.0) {
                        light.update_required = true;
                    }
                    if !visible.contains(&key) {
                        visible.push(key);
                    }
                }
            } else {
                self.prebuild.clear();
                self.prebuild_timer = 0;
            }
        }

        stats.visible_lights = visible.len();
        for key in visible {
            self.process_light(key, &mut stats);
        }

        self.backend.set_blend(BlendMode::Alpha);
        for (_, sprite) in self.emissives.query_rect(view) {
            self.backend
                .draw_sprite(sprite.texture(), sprite.rect(), sprite.tint);
            stats.emissives += 1;
        }

        for (_, hull) in self.hulls.iter_mut() {
            hull.update_required = false;
        }
        log::trace!("frame: {stats:?}");
        stats
    }

    fn process_light(&mut self, key: LightKey, stats: &mut FrameStats) {
        let Some(light) = self.lights.get(key.0) else {
            return;
        };
        self.region_hulls.clear();
        self.region_hulls.extend(
            self.hulls
                .query_rect(light.aabb())
                .map(|(k, _)| k),
        );
        let dirty = light.always_update
            || light.update_required
            || self
                .region_hulls
                .iter()
                .any(|k| self.hulls.get(*k).is_some_and(ConvexHull::update_required));

        if dirty {
            let light = light.clone();
            self.render_light(&light, stats);
            if let Some(light) = self.lights.get_mut(key.0) {
                light.update_required = false;
            }
            stats.lights_recomputed += 1;
        } else if let Some(cache) = light.cache {
            self.backend.composite(
                Target::Surface(cache.surface),
                cache.world_rect(),
                BlendMode::Additive,
            );
            stats.lights_cached += 1;
        }
    }

    fn render_light(&mut self, light: &Light, stats: &mut FrameStats) {
        let camera = self.camera();
        let (target, transform) = match light.cache {
            Some(cache) => (
                Target::Surface(cache.surface),
                Affine::translate(-cache.origin.to_vec2()),
            ),
            None => (Target::LightScratch, camera),
        };
        self.backend.bind_target(target, transform);
        self.backend.clear(Color::TRANSPARENT);

        // Shadows and hull interiors only write depth.
        self.backend.set_color_writes(ColorWrites::empty());
        self.backend.set_blend(BlendMode::PremultipliedAlpha);
        self.fins.clear();
        let params = self.config.shadow_params();
        for &hk in &self.region_hulls {
            let Some(hull) = self.hulls.get(hk) else {
                continue;
            };
            if self.config.check_for_hull_intersect && light_inside_hull(light, hull) {
                stats.hulls_skipped += 1;
                continue;
            }
            let geometry = cast_shadow(light, hull, &params);
            let strip = geometry.umbra.map(|p| Vertex::colored(p, Color::BLACK));
            self.backend.draw(
                Primitive::TriangleStrip,
                &strip,
                self.config.shadow_depth + hull.shadow_depth_offset,
            );
            self.fins.extend_from_slice(&geometry.fins);
            stats.shadows_cast += 1;
        }
        for &hk in &self.region_hulls {
            if let Some(hull) = self.hulls.get(hk)
                && hull.render
            {
                let mesh = hull.fill_mesh();
                self.backend.draw(
                    mesh.primitive,
                    &mesh.vertices,
                    self.config.shadow_depth + hull.shadow_depth_offset,
                );
            }
        }

        self.backend.set_color_writes(ColorWrites::all());
        self.backend.set_blend(BlendMode::Additive);
        let solid = light.solid_portion(self.config.light_subdivision);
        self.backend
            .draw(solid.primitive, &solid.vertices, self.config.light_depth);

        let soft = light.soft_portion();
        let triangles: Vec<Vertex> = self
            .fins
            .iter()
            .chain(&soft)
            .flat_map(ShadowFin::vertices)
            .collect();
        if !triangles.is_empty() {
            self.backend.set_soft_shadow_texture(true);
            self.backend.set_blend(BlendMode::MaskAlpha);
            self.backend
                .draw(Primitive::Triangles, &triangles, self.config.light_depth);
            self.backend.set_soft_shadow_texture(false);
        }
        stats.fins += self.fins.len();

        self.backend.bind_target(Target::Accumulation, camera);
        match light.cache {
            Some(cache) => {
                self.backend.composite(
                    Target::Surface(cache.surface),
                    cache.world_rect(),
                    BlendMode::Additive,
                );
            }
            None => {
                self.backend
                    .composite(Target::LightScratch, self.view, BlendMode::Additive);
            }
        }
    }

    /// Multiply the accumulated light map onto the host target.
    pub fn present_frame(&mut self) {
        self.backend.bind_target(Target::Host, Affine::IDENTITY);
        let dest = Rect::from_origin_size(Point::ZERO, self.view.size());
        self.backend
            .composite(Target::Accumulation, dest, BlendMode::Multiply);
        self.backend.present();
    }

    /// Outline every quadtree node and occupant bound on the host target.
    pub fn debug_render(&mut self) {
        let camera = self.camera();
        self.backend.bind_target(Target::Host, camera);
        self.backend.set_color_writes(ColorWrites::all());
        self.backend.set_blend(BlendMode::Alpha);
        let node_color = Color::rgba(1.0, 1.0, 1.0, 0.25);
        let nodes: Vec<Aabb2D<f64>> = self
            .lights
            .node_regions()
            .chain(self.hulls.node_regions())
            .chain(self.emissives.node_regions())
            .map(|(region, _)| region)
            .collect();
        for region in nodes {
            self.backend
                .draw(Primitive::LineLoop, &outline(region, node_color), 0.0);
        }
        let occupants: Vec<(Aabb2D<f64>, Color)> = self
            .lights
            .iter()
            .map(|(_, l)| (l.aabb(), Color::rgb(1.0, 1.0, 0.0)))
            .chain(self.hulls.iter().map(|(_, h)| (h.aabb(), Color::rgb(0.0, 1.0, 1.0))))
            .chain(
                self.emissives
                    .iter()
                    .map(|(_, e)| (e.aabb(), Color::rgb(1.0, 0.0, 1.0))),
            )
            .collect();
        for (aabb, color) in occupants {
            self.backend
                .draw(Primitive::LineLoop, &outline(aabb, color), 0.0);
        }
    }
}

impl<B> core::fmt::Debug for LightSystem<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LightSystem")
            .field("view", &self.view)
            .field("lights", &self.lights.len())
            .field("hulls", &self.hulls.len())
            .field("emissives", &self.emissives.len())
            .field("prebuild", &self.prebuild.len())
            .finish_non_exhaustive()
    }
}

/// Whole-pixel size of a cache surface for `bounds`, at least one pixel.
fn surface_dims(bounds: Rect) -> (f64, f64) {
    (bounds.width().ceil().max(1.0), bounds.height().ceil().max(1.0))
}

fn outline(a: Aabb2D<f64>, color: Color) -> [Vertex; 4] {
    [
        Vertex::colored(Point::new(a.min_x, a.min_y), color),
        Vertex::colored(Point::new(a.max_x, a.min_y), color),
        Vertex::colored(Point::new(a.max_x, a.max_y), color),
        Vertex::colored(Point::new(a.min_x, a.max_y), color),
    ]
}
