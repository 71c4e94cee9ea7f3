// Copyright 2025 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{Point, Rect, Vec2};
use umbra_light::shadow::{FinExtension, ShadowParams, cast_shadow};
use umbra_light::{CommandRecorder, ConvexHull, Light, LightSystem, LightSystemConfig};

fn bench_cast_shadow(c: &mut Criterion) {
    let mut group = c.benchmark_group("cast_shadow");
    let light = Light::new(Point::new(0.0, 0.0), 600.0).with_size(25.0);
    for sides in [4usize, 8, 32] {
        let hull = ConvexHull::regular(Point::new(150.0, 40.0), 30.0, sides);
        for (name, extension) in [("single", FinExtension::Single), ("cascade", FinExtension::Cascade)] {
            let params = ShadowParams {
                max_fins: 2,
                extension,
            };
            group.bench_function(format!("{name}_sides{sides}"), |b| {
                b.iter(|| black_box(cast_shadow(&light, &hull, &params)));
            });
        }
    }
    group.finish();
}

fn scene(static_lights: bool) -> LightSystem<CommandRecorder> {
    let config = LightSystemConfig::new(
        Rect::new(0.0, 0.0, 2048.0, 2048.0),
        Rect::new(0.0, 0.0, 1280.0, 720.0),
    );
    let mut ls = LightSystem::new(config, CommandRecorder::new()).expect("recorder blends separately");
    for i in 0..16 {
        let x = f64::from(i % 4) * 300.0 + 100.0;
        let y = f64::from(i / 4) * 180.0 + 60.0;
        let _ = ls.insert_light(
            Light::new(Point::new(x, y), 220.0)
                .with_size(12.0)
                .with_static(static_lights),
        );
    }
    for i in 0..200 {
        let x = f64::from(i % 20) * 64.0 + 20.0;
        let y = f64::from(i / 20) * 70.0 + 30.0;
        let _ = ls.insert_hull(ConvexHull::regular(Point::new(x, y), 10.0, 5));
    }
    ls
}

fn bench_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_frame");
    group.throughput(Throughput::Elements(16));

    let mut dynamic = scene(false);
    group.bench_function("dynamic_lights", |b| {
        b.iter(|| {
            let stats = dynamic.compute_frame();
            let _ = dynamic.backend_mut().take_commands();
            black_box(stats);
        });
    });

    let mut cached = scene(true);
    let _ = cached.compute_frame();
    group.bench_function("static_lights_cached", |b| {
        b.iter(|| {
            let stats = cached.compute_frame();
            let _ = cached.backend_mut().take_commands();
            black_box(stats);
        });
    });

    let mut moving = scene(true);
    let hulls: Vec<_> = moving.hulls().map(|(k, _)| k).collect();
    let mut step = 0_u32;
    group.bench_function("static_lights_moving_hull", |b| {
        b.iter(|| {
            step += 1;
            let k = hulls[(step as usize * 7) % hulls.len()];
            if let Some(h) = moving.hull_mut(k) {
                let dx = if step % 2 == 0 { 3.0 } else { -3.0 };
                h.inc_world_center(Vec2::new(dx, 0.0));
            }
            moving.notify_hull_changed(k);
            let stats = moving.compute_frame();
            let _ = moving.backend_mut().take_commands();
            black_box(stats);
        });
    });
    group.finish();
}

criterion_group!(benches, bench_cast_shadow, bench_frame);
criterion_main!(benches);
