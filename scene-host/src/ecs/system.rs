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
//! System execution framework
//!
//! Systems hold the logic of one simulation step stage. They are run by the
//! [`Scheduler`](crate::ecs::scheduler::Scheduler) once per fixed step.

use crate::ecs::World;

/// Per-step information handed to every system
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepContext {
    /// Fixed timestep in seconds
    pub dt: f64,
    /// Index of this step, starting at 1
    pub step: u64,
}

/// A stage of the stepping pipeline
pub trait System: Send + Sync {
    /// Advance the world by one fixed step
    fn run(&mut self, world: &mut World, ctx: &StepContext);

    /// Get the name of this system for debugging
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
