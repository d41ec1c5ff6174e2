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
//! Staged system scheduler
//!
//! Systems are grouped into stages that run in a fixed order every step:
//! integration first, then constraint relaxation, then contact resolution.
//! Systems added to the same stage run in insertion order.

use crate::ecs::{StepContext, System, World};

/// Stage identifier for grouping systems
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StageId(pub usize);

impl StageId {
    /// Create a new stage ID
    pub fn new(id: usize) -> Self {
        StageId(id)
    }
}

/// Standard stages of a simulation step
pub mod stages {
    use super::StageId;

    /// Gravity and Verlet integration
    pub const INTEGRATION: StageId = StageId(0);

    /// Rope and pointer constraint relaxation
    pub const CONSTRAINTS: StageId = StageId(1);

    /// Contact push-out against walls and between bodies
    pub const CONTACTS: StageId = StageId(2);
}

struct ScheduledSystem {
    system: Box<dyn System>,
    stage: StageId,
}

/// Runs systems stage by stage
///
/// # Examples
///
/// ```
/// use scene_host::ecs::scheduler::{Scheduler, stages};
/// use scene_host::ecs::{StepContext, System, World};
///
/// struct Noop;
/// impl System for Noop {
///     fn run(&mut self, _world: &mut World, _ctx: &StepContext) {}
/// }
///
/// let mut scheduler = Scheduler::new();
/// scheduler.add_system(Noop, stages::CONTACTS);
/// assert_eq!(scheduler.system_count(), 1);
/// ```
pub struct Scheduler {
    systems: Vec<ScheduledSystem>,
}

impl Scheduler {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Scheduler { systems: Vec::new() }
    }

    /// Add a system to a stage
    pub fn add_system<S: System + 'static>(&mut self, system: S, stage: StageId) {
        self.systems.push(ScheduledSystem {
            system: Box::new(system),
            stage,
        });
        // Stable sort keeps insertion order within a stage
        self.systems.sort_by_key(|s| s.stage);
    }

    /// Get the number of registered systems
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Names of the registered systems in execution order
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.system.name()).collect()
    }

    /// Run every system once, in stage order
    pub fn run(&mut self, world: &mut World, ctx: &StepContext) {
        for scheduled in &mut self.systems {
            scheduled.system.run(world, ctx);
        }
    }

    /// Clear all systems from the scheduler
    pub fn clear(&mut self) {
        self.systems.clear();
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::{SceneVariant, Viewport};
    use crate::ecs::components::Vec2;
    use std::sync::{Arc, Mutex};

    struct Recorder {
        name: String,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl System for Recorder {
        fn run(&mut self, _world: &mut World, ctx: &StepContext) {
            self.log.lock().unwrap().push(format!("{}@{}", self.name, ctx.step));
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    fn world() -> World {
        let viewport = Viewport::new(800.0, 600.0).unwrap();
        World::from_scene(SceneVariant::Default, viewport, Vec2::zero()).unwrap()
    }

    #[test]
    fn test_stage_ordering() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        let order = [
            ("contacts", stages::CONTACTS),
            ("integrate", stages::INTEGRATION),
            ("ropes", stages::CONSTRAINTS),
        ];
        for (name, stage) in order {
            scheduler.add_system(Recorder { name: name.into(), log: log.clone() }, stage);
        }
        assert_eq!(scheduler.system_names(), vec!["integrate", "ropes", "contacts"]);

        let mut world = world();
        scheduler.run(&mut world, &StepContext { dt: 1.0 / 60.0, step: 1 });
        assert_eq!(*log.lock().unwrap(), vec!["integrate@1", "ropes@1", "contacts@1"]);
    }

    #[test]
    fn test_insertion_order_within_stage() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        let first = Recorder { name: "first".into(), log: log.clone() };
        let second = Recorder { name: "second".into(), log: log.clone() };
        scheduler.add_system(first, stages::CONSTRAINTS);
        scheduler.add_system(second, stages::CONSTRAINTS);
        assert_eq!(scheduler.system_names(), vec!["first", "second"]);
    }

    #[test]
    fn test_empty_scheduler() {
        let mut scheduler = Scheduler::new();
        let mut world = world();
        scheduler.run(&mut world, &StepContext { dt: 1.0 / 60.0, step: 1 });
        scheduler.clear();
        assert_eq!(scheduler.system_count(), 0);
    }
}
