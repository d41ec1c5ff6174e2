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
//! Contact resolution
//!
//! The four boundary walls are treated as half-planes: every dynamic body's
//! bounding box is pushed back inside the world's interior bounds, so a fast
//! body cannot tunnel through a wall between two steps. Other pairs overlap
//! on bounding circles when both are circles and on bounding boxes otherwise;
//! they are separated along the axis of least penetration by inverse mass.
//!
//! Restitution is applied by rewriting the previous position so the normal
//! velocity is reflected and scaled; a restitution of zero leaves a body
//! resting on what it hit.

use super::pair_mut;
use crate::ecs::components::{Body, BodyRole, Bounds, Shape, Vec2};
use crate::ecs::{StepContext, System, World};

/// Keeps bodies inside the walls and apart from each other
#[derive(Debug, Clone)]
pub struct ContactSolver {
    iterations: u32,
}

impl ContactSolver {
    /// Create a solver running `iterations` passes per step
    pub fn new(iterations: u32) -> Self {
        ContactSolver { iterations: iterations.max(1) }
    }

    /// Passes per step
    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

impl Default for ContactSolver {
    fn default() -> Self {
        Self::new(6)
    }
}

impl System for ContactSolver {
    fn run(&mut self, world: &mut World, _ctx: &StepContext) {
        let bounds = world.bounds();
        let bodies = world.body_slice_mut();
        for _ in 0..self.iterations {
            for i in 0..bodies.len() {
                for j in (i + 1)..bodies.len() {
                    let (a, b) = pair_mut(bodies, i, j);
                    if collides(a, b) {
                        if let Some((normal, depth)) = penetration(a, b) {
                            separate(a, b, normal, depth);
                        }
                    }
                }
            }
            for body in bodies.iter_mut().filter(|b| !b.is_static()) {
                keep_inside(body, &bounds);
            }
        }
    }

    fn name(&self) -> &str {
        "ContactSolver"
    }
}

fn collides(a: &Body, b: &Body) -> bool {
    let is_wall = |body: &Body| matches!(body.role, BodyRole::Boundary(_));
    !(a.is_static() && b.is_static()) && !is_wall(a) && !is_wall(b)
}

/// Contact normal pointing from `a` to `b` and the overlap depth
fn penetration(a: &Body, b: &Body) -> Option<(Vec2, f64)> {
    if let (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) = (a.shape, b.shape) {
        let delta = b.position - a.position;
        let distance = delta.length();
        let depth = ra + rb - distance;
        if depth <= 0.0 {
            return None;
        }
        let normal = if distance > 1e-9 { delta * (1.0 / distance) } else { Vec2::new(0.0, 1.0) };
        return Some((normal, depth));
    }

    let (ba, bb) = (a.aabb(), b.aabb());
    let overlap_x = ba.max.x.min(bb.max.x) - ba.min.x.max(bb.min.x);
    let overlap_y = ba.max.y.min(bb.max.y) - ba.min.y.max(bb.min.y);
    if overlap_x <= 0.0 || overlap_y <= 0.0 {
        return None;
    }
    let sign = |d: f64| if d < 0.0 { -1.0 } else { 1.0 };
    if overlap_x < overlap_y {
        Some((Vec2::new(sign(b.position.x - a.position.x), 0.0), overlap_x))
    } else {
        Some((Vec2::new(0.0, sign(b.position.y - a.position.y)), overlap_y))
    }
}

fn separate(a: &mut Body, b: &mut Body, normal: Vec2, depth: f64) {
    let (inv_a, inv_b) = (a.inverse_mass(), b.inverse_mass());
    let total = inv_a + inv_b;
    if total <= 0.0 {
        return;
    }

    let shift_a = normal * (-depth * inv_a / total);
    let shift_b = normal * (depth * inv_b / total);
    a.position += shift_a;
    a.previous += shift_a;
    b.position += shift_b;
    b.previous += shift_b;

    let (va, vb) = (a.velocity(), b.velocity());
    let approach = (vb - va).dot(normal);
    if approach >= 0.0 {
        return;
    }
    let restitution = a.material.restitution.max(b.material.restitution);
    let impulse = -(1.0 + restitution) * approach / total;
    a.previous = a.position - (va - normal * (impulse * inv_a));
    b.previous = b.position - (vb + normal * (impulse * inv_b));
}

fn keep_inside(body: &mut Body, bounds: &Bounds) {
    let aabb = body.aabb();
    let restitution = body.material.restitution;

    let push_x = if aabb.min.x < bounds.min.x {
        bounds.min.x - aabb.min.x
    } else if aabb.max.x > bounds.max.x {
        bounds.max.x - aabb.max.x
    } else {
        0.0
    };
    let push_y = if aabb.min.y < bounds.min.y {
        bounds.min.y - aabb.min.y
    } else if aabb.max.y > bounds.max.y {
        bounds.max.y - aabb.max.y
    } else {
        0.0
    };

    if push_x != 0.0 {
        let vx = body.position.x - body.previous.x;
        body.position.x += push_x;
        // Only velocity heading into the wall is reflected.
        body.previous.x = if vx * push_x < 0.0 {
            body.position.x + vx * restitution
        } else {
            body.position.x - vx
        };
    }
    if push_y != 0.0 {
        let vy = body.position.y - body.previous.y;
        body.position.y += push_y;
        body.previous.y = if vy * push_y < 0.0 {
            body.position.y + vy * restitution
        } else {
            body.position.y - vy
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::{SceneVariant, Viewport};
    use crate::ecs::Entity;

    const CTX: StepContext = StepContext { dt: 1.0 / 60.0, step: 1 };

    fn drag_world() -> World {
        let viewport = Viewport::new(800.0, 600.0).unwrap();
        World::from_scene(SceneVariant::Drag, viewport, Vec2::zero()).unwrap()
    }

    fn find(world: &World, label: &str) -> Entity {
        world.bodies().find(|(_, b)| b.label == label).map(|(e, _)| e).unwrap()
    }

    #[test]
    fn test_body_pushed_back_inside_floor() {
        let mut world = drag_world();
        let ball = find(&world, "ball");
        let floor = world.bounds().max.y;
        {
            let body = world.body_mut(ball).unwrap();
            body.previous = Vec2::new(400.0, floor - 45.0);
            body.position = Vec2::new(400.0, floor - 30.0);
        }
        ContactSolver::new(1).run(&mut world, &CTX);

        let body = world.body(ball).unwrap();
        assert!((body.aabb().max.y - floor).abs() < 1e-9);
        assert_eq!(body.velocity().y, 0.0);
    }

    #[test]
    fn test_restitution_reflects_normal_velocity() {
        let mut world = drag_world();
        let ball = find(&world, "ball");
        {
            let body = world.body_mut(ball).unwrap();
            body.material.restitution = 0.5;
            body.previous = Vec2::new(50.0, 300.0);
            body.position = Vec2::new(30.0, 300.0);
        }
        ContactSolver::new(1).run(&mut world, &CTX);

        let body = world.body(ball).unwrap();
        assert!((body.aabb().min.x - world.bounds().min.x).abs() < 1e-9);
        assert!((body.velocity().x - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_overlapping_bodies_separate() {
        let mut world = drag_world();
        let (boxed, ball) = (find(&world, "box"), find(&world, "ball"));
        world.body_mut(ball).unwrap().position = Vec2::new(270.0, 200.0);
        world.body_mut(ball).unwrap().previous = Vec2::new(270.0, 200.0);
        ContactSolver::default().run(&mut world, &CTX);

        let (a, b) = (world.body(boxed).unwrap().aabb(), world.body(ball).unwrap().aabb());
        assert!(a.max.x <= b.min.x + 1e-9);
        assert!(world.body(boxed).unwrap().position.x < 200.0);
    }

    #[test]
    fn test_walls_never_move() {
        let mut world = drag_world();
        let wall_positions = |w: &World| -> Vec<Vec2> {
            w.boundary().iter().map(|&e| w.body(e).unwrap().position).collect()
        };
        let walls = wall_positions(&world);
        let ball = find(&world, "ball");
        world.body_mut(ball).unwrap().position = Vec2::new(400.0, 570.0);
        ContactSolver::default().run(&mut world, &CTX);
        let after = wall_positions(&world);
        assert_eq!(walls, after);
    }
}
