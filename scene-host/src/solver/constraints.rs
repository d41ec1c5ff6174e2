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
//! Distance constraint relaxation
//!
//! Each pass moves both ends of every constraint toward its rest length by
//! `stiffness` of the remaining error, split by inverse mass. Damping removes
//! a fraction of the relative velocity along the constraint. The pointer
//! spring is solved last so the held body follows the cursor even while
//! roped.

use crate::ecs::components::{Anchor, Body, Constraint, Vec2};
use crate::ecs::{Entity, StepContext, System, World};

const MIN_LENGTH: f64 = 1e-6;

/// Relaxes ropes and the pointer spring
#[derive(Debug, Clone)]
pub struct ConstraintSolver {
    iterations: u32,
    scratch: Vec<Constraint>,
}

impl ConstraintSolver {
    /// Create a solver running `iterations` passes per step
    pub fn new(iterations: u32) -> Self {
        ConstraintSolver { iterations: iterations.max(1), scratch: Vec::new() }
    }

    /// Passes per step
    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

impl Default for ConstraintSolver {
    fn default() -> Self {
        Self::new(2)
    }
}

impl System for ConstraintSolver {
    fn run(&mut self, world: &mut World, _ctx: &StepContext) {
        self.scratch.clear();
        self.scratch.extend(world.constraints().map(|(_, c)| *c));
        self.scratch.extend(world.pointer_slot().constraint().copied());
        if self.scratch.is_empty() {
            return;
        }

        for _ in 0..self.iterations {
            for constraint in &self.scratch {
                solve(world, constraint);
            }
        }
    }

    fn name(&self) -> &str {
        "ConstraintSolver"
    }
}

fn resolve_end(world: &World, anchor: &Anchor<Entity>) -> Option<Option<usize>> {
    match anchor {
        Anchor::Point(_) => Some(None),
        Anchor::Body { body, .. } => world.body_index(*body).map(Some),
    }
}

fn end_point(bodies: &[Body], anchor: &Anchor<Entity>, index: Option<usize>) -> Vec2 {
    match (anchor, index) {
        (Anchor::Body { offset, .. }, Some(i)) => bodies[i].local_to_world(*offset),
        (Anchor::Point(p), _) => *p,
        (Anchor::Body { .. }, None) => Vec2::zero(),
    }
}

fn solve(world: &mut World, constraint: &Constraint) {
    // A dangling end means the body belongs to another world; skip it.
    let ends = (resolve_end(world, &constraint.a), resolve_end(world, &constraint.b));
    let (Some(ia), Some(ib)) = ends else {
        return;
    };
    let bodies = world.body_slice_mut();

    let point_a = end_point(bodies, &constraint.a, ia);
    let point_b = end_point(bodies, &constraint.b, ib);
    let inv_a = ia.map_or(0.0, |i| bodies[i].inverse_mass());
    let inv_b = ib.map_or(0.0, |i| bodies[i].inverse_mass());
    let mass_total = inv_a + inv_b;
    if mass_total <= 0.0 {
        return;
    }

    let delta = point_a - point_b;
    let current = delta.length().max(MIN_LENGTH);
    let difference = (current - constraint.length) / current;
    let force = delta * (difference * constraint.stiffness);
    let normal = delta * (1.0 / current);

    let velocity = |i: Option<usize>| i.map_or(Vec2::zero(), |i| bodies[i].velocity());
    let normal_velocity = normal.dot(velocity(ib) - velocity(ia));

    if let Some(i) = ia {
        let share = inv_a / mass_total;
        let body = &mut bodies[i];
        body.position -= force * share;
        if constraint.damping > 0.0 {
            body.previous -= normal * (constraint.damping * normal_velocity * share);
        }
    }
    if let Some(i) = ib {
        let share = inv_b / mass_total;
        let body = &mut bodies[i];
        body.position += force * share;
        if constraint.damping > 0.0 {
            body.previous += normal * (constraint.damping * normal_velocity * share);
        }
    }
}
