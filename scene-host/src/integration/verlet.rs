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
//! Position Verlet integration system
//!
//! ```text
//! v      = (x(t) - x(t - dt)) · (1 - air_friction) + g·dt²
//! x(t+dt) = x(t) + v
//! ```
//!
//! Static bodies are skipped. Bodies are independent during integration, so
//! with the `parallel` feature the pass runs on the Rayon pool.

use crate::ecs::components::{Body, Vec2};
use crate::ecs::{StepContext, System, World};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Gravity plus position Verlet for every dynamic body
///
/// # Example
///
/// ```
/// use scene_host::composer::{SceneVariant, Viewport};
/// use scene_host::ecs::components::Vec2;
/// use scene_host::ecs::{StepContext, System, World};
/// use scene_host::integration::VerletIntegration;
///
/// let viewport = Viewport::new(800.0, 600.0).unwrap();
/// let gravity = Vec2::new(0.0, 1000.0);
/// let mut world = World::from_scene(SceneVariant::Drag, viewport, gravity).unwrap();
/// VerletIntegration.run(&mut world, &StepContext { dt: 1.0 / 60.0, step: 1 });
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct VerletIntegration;

impl System for VerletIntegration {
    fn run(&mut self, world: &mut World, ctx: &StepContext) {
        let gravity_step = world.gravity() * (ctx.dt * ctx.dt);
        let bodies = world.body_slice_mut();

        #[cfg(feature = "parallel")]
        bodies.par_iter_mut().for_each(|body| integrate_body(body, gravity_step));
        #[cfg(not(feature = "parallel"))]
        bodies.iter_mut().for_each(|body| integrate_body(body, gravity_step));
    }

    fn name(&self) -> &str {
        "VerletIntegration"
    }
}

fn integrate_body(body: &mut Body, gravity_step: Vec2) {
    if body.is_static() {
        return;
    }
    let velocity = body.velocity() * (1.0 - body.material.air_friction) + gravity_step;
    let next = body.position + velocity;
    if !next.is_valid() {
        log::warn!(
            "Invalid position after Verlet update for body {:?}, holding it in place",
            body.label
        );
        body.previous = body.position;
        return;
    }
    body.previous = body.position;
    body.position = next;
}
