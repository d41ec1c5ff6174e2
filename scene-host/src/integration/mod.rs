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
//! Fixed-step integration
//!
//! Bodies are advanced with position Verlet: the displacement of the last
//! step, reduced by the body's air friction, is carried into the next step
//! and gravity is added as `g·dt²`. Position Verlet lets constraint and
//! contact solvers move bodies directly; the velocity change they cause is
//! picked up automatically on the next step.
//!
//! # Timestep Guidelines
//!
//! - Recommended: dt = 1/60 s, one step per display frame
//! - Larger steps make ropes stretch visibly and fast bodies tunnel into walls
//! - The host caps the number of steps per frame, so a slow frame slows the
//!   simulation down instead of piling up work

use crate::ecs::components::Body;
use crate::ecs::World;

mod verlet;

pub use verlet::VerletIntegration;

/// Largest timestep that keeps a falling body from skipping a wall
pub const MAX_STABLE_TIMESTEP: f64 = 1.0 / 15.0;

/// Check a timestep for stability
///
/// Returns a warning message for timesteps that are unusually small or too
/// large to be stable. The host logs the message and carries on.
pub fn validate_timestep(dt: f64) -> Result<(), String> {
    if dt <= 0.0 || !dt.is_finite() {
        return Err(format!("Invalid timestep: {}. Must be positive and finite.", dt));
    }
    if dt < 1e-6 {
        return Err(format!("Timestep {} is extremely small; the scene will barely move.", dt));
    }
    if dt > MAX_STABLE_TIMESTEP {
        return Err(format!(
            "Timestep {} exceeds {:.4}; bodies may tunnel through walls.",
            dt, MAX_STABLE_TIMESTEP
        ));
    }
    Ok(())
}

/// Kinetic energy of a body, KE = ½·m·v², with v = displacement / dt
pub fn kinetic_energy(body: &Body, dt: f64) -> f64 {
    if body.is_static() {
        return 0.0;
    }
    let v = body.velocity() * (1.0 / dt);
    0.5 * body.mass() * v.length_squared()
}

/// Total kinetic energy of the dynamic bodies of a world
pub fn total_kinetic_energy(world: &World, dt: f64) -> f64 {
    world.bodies().map(|(_, body)| kinetic_energy(body, dt)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::{SceneVariant, Viewport};
    use crate::ecs::components::Vec2;

    #[test]
    fn test_timestep_validation() {
        assert!(validate_timestep(1.0 / 60.0).is_ok());
        assert!(validate_timestep(0.0).is_err());
        assert!(validate_timestep(f64::NAN).is_err());
        assert!(validate_timestep(1e-9).unwrap_err().contains("extremely small"));
        assert!(validate_timestep(0.5).unwrap_err().contains("tunnel"));
    }

    #[test]
    fn test_world_at_rest_has_no_energy() {
        let viewport = Viewport::new(800.0, 600.0).unwrap();
        let world = World::from_scene(SceneVariant::Drag, viewport, Vec2::zero()).unwrap();
        assert_eq!(total_kinetic_energy(&world, 1.0 / 60.0), 0.0);
    }
}
