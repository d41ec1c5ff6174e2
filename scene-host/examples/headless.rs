// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Headless scene host demo
//!
//! Runs every scene for a couple of seconds against a render target that
//! prints a one-line summary per frame, drags the box around in the drag
//! scene and shows the host tearing each scene down before the next starts.
//!
//! Run with `RUST_LOG=debug cargo run --example headless` to see lifecycle
//! logging.

use scene_host::composer::{SceneVariant, Viewport};
use scene_host::config::HostConfig;
use scene_host::controller::SceneController;
use scene_host::ecs::components::Vec2;
use scene_host::pointer::PointerEvent;
use scene_host::render::{Color, FrameInfo, Paint, RenderTarget, Stroke};
use std::thread;
use std::time::Duration;

/// Counts primitives and prints every 30th frame
#[derive(Default)]
struct Summary {
    current: Option<FrameInfo>,
    circles: usize,
    polygons: usize,
    lines: usize,
}

impl RenderTarget for Summary {
    fn begin_frame(&mut self, frame: &FrameInfo, _background: Color) {
        self.current = Some(*frame);
        self.circles = 0;
        self.polygons = 0;
        self.lines = 0;
    }

    fn draw_circle(&mut self, _center: Vec2, _radius: f64, _paint: &Paint) {
        self.circles += 1;
    }

    fn draw_polygon(&mut self, _points: &[Vec2], _paint: &Paint) {
        self.polygons += 1;
    }

    fn draw_line(&mut self, _from: Vec2, _to: Vec2, _stroke: &Stroke) {
        self.lines += 1;
    }

    fn end_frame(&mut self) {
        if let Some(frame) = self.current.filter(|f| f.frame % 30 == 0) {
            println!(
                "  world {} [{}] frame {:>4} step {:>4}: {} circles, {} polygons, {} lines",
                frame.world,
                frame.variant,
                frame.frame,
                frame.step,
                self.circles,
                self.polygons,
                self.lines
            );
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("=== Scene Host Demo ===\n");
    let viewport = Viewport::new(800.0, 600.0)?;
    let mut controller = SceneController::new(Summary::default(), HostConfig::default())?;

    controller.mount(SceneVariant::ShapesShowcase, viewport)?;
    let variants = [
        SceneVariant::ShapesShowcase,
        SceneVariant::Sway,
        SceneVariant::Drag,
        SceneVariant::Default,
    ];
    for variant in variants {
        controller.select(variant)?;
        println!("Running {} scene", variant);

        if variant.supports_drag() {
            controller.forward_pointer(PointerEvent::Down(Vec2::new(200.0, 200.0)));
            for step in 0..20 {
                let x = 200.0 + 10.0 * step as f64;
                let y = 200.0 - step as f64 * 5.0;
                controller.forward_pointer(PointerEvent::Move(Vec2::new(x, y)));
                thread::sleep(Duration::from_millis(20));
            }
            controller.forward_pointer(PointerEvent::Up(Vec2::new(400.0, 100.0)));
        }
        thread::sleep(Duration::from_millis(1500));

        let counts = controller.with_world(|w| (w.dynamic_body_count(), w.constraint_count()));
        if let Some((bodies, constraints)) = counts {
            println!("  {} dynamic bodies, {} constraints\n", bodies, constraints);
        }
    }

    controller.unmount();
    println!("Unmounted; render target returned: {}", controller.into_target().is_some());
    Ok(())
}
