// Copyright 2025 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shadow scene.
//!
//! Set up a light system over the recording backend, render a few frames
//! with dynamic and static lights, and print what the backend was asked to
//! do. Set `RUST_LOG=umbra_light=debug` to see cache decisions.
//!
//! Run:
//! - `cargo run -p umbra_demos --example shadow_scene`

use kurbo::{Point, Rect, Size, Vec2};
use umbra_light::{
    Color, CommandRecorder, ConvexHull, DrawCommand, EmissiveSprite, Light, LightSystem,
    LightSystemConfig, Primitive, TextureId,
};

fn main() {
    env_logger::init();

    let mut config = LightSystemConfig::new(
        Rect::new(0.0, 0.0, 1024.0, 1024.0),
        Rect::new(0.0, 0.0, 800.0, 600.0),
    );
    config.ambient_color = Color::rgb(0.1, 0.1, 0.15);

    let mut lights = match LightSystem::new(config, CommandRecorder::new()) {
        Ok(lights) => lights,
        Err(err) => {
            log::error!("cannot start the light system: {err}");
            return;
        }
    };

    let _torch = lights.insert_light(
        Light::new(Point::new(200.0, 200.0), 350.0)
            .with_size(15.0)
            .with_color(Color::rgb(1.0, 0.8, 0.5)),
    );
    let _lamp = lights.insert_light(
        Light::new(Point::new(600.0, 150.0), 300.0)
            .with_cone(std::f64::consts::FRAC_PI_2, 1.2, 0.15)
            .with_static(true),
    );
    let _spot = lights.insert_light(
        Light::new(Point::new(100.0, 500.0), 400.0)
            .with_beam(0.0, 60.0)
            .with_intensity(0.7),
    );
    let pillar = lights.insert_hull(ConvexHull::square(Point::new(320.0, 260.0), 30.0));
    let _rock = lights.insert_hull(ConvexHull::regular(Point::new(600.0, 350.0), 40.0, 7));
    let _ember = lights.insert_emissive(EmissiveSprite::new(
        TextureId(1),
        Size::new(16.0, 16.0),
        Point::new(220.0, 210.0),
    ));

    for frame in 0..4 {
        if frame == 2 {
            // Moving the pillar invalidates the cached lamp only if it overlaps.
            if let Some(hull) = lights.hull_mut(pillar) {
                hull.inc_world_center(Vec2::new(40.0, 0.0));
            }
            lights.notify_hull_changed(pillar);
        }
        let stats = lights.compute_frame();
        lights.present_frame();
        let commands = lights.backend_mut().take_commands();
        let draws = commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Draw { .. }))
            .count();
        println!("frame {frame}: {stats:?}, {draws} draw calls");
    }

    lights.debug_render();
    println!(
        "debug overlay: {} outlines",
        lights.backend().count_draws(Primitive::LineLoop)
    );
}
