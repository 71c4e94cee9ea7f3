// Copyright 2025 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hull files.
//!
//! Load a hull from a text file of `x y` pairs (the first argument), or from
//! a built-in outline when no path is given, and print its silhouette as
//! seen from a light.
//!
//! Run:
//! - `cargo run -p umbra_demos --example hull_file -- path/to/hull.txt`

use kurbo::Point;
use umbra_light::shadow::{ShadowParams, cast_shadow};
use umbra_light::{ConvexHull, Light, parse_hull};

const OUTLINE: &str = "
0 0
40 -10
60 20
30 50
-5 30
";

fn main() {
    env_logger::init();

    let hull = match std::env::args().nth(1) {
        Some(path) => ConvexHull::load_file(&path),
        None => parse_hull(OUTLINE).map(|points| ConvexHull::from_vertices(&points)),
    };
    let mut hull = match hull {
        Ok(hull) => hull,
        Err(err) => {
            log::error!("{err}");
            std::process::exit(1);
        }
    };
    hull.set_world_center(Point::new(200.0, 200.0));

    let light = Light::new(Point::new(50.0, 120.0), 500.0).with_size(10.0);
    let shadow = cast_shadow(&light, &hull, &ShadowParams::default());
    println!("hull with {} vertices, bounds {:?}", hull.len(), hull.bounds());
    println!(
        "silhouette vertices {} and {}, {} fins",
        shadow.first_boundary,
        shadow.second_boundary,
        shadow.fins.len()
    );
    for fin in &shadow.fins {
        println!("  fin at {:?}", fin.root);
    }
}
