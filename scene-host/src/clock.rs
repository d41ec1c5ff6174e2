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
//! Fixed-step simulation clock
//!
//! Frame times vary; simulation steps do not. The clock accumulates elapsed
//! frame time and hands out whole steps of `timestep` seconds. At most
//! `max_substeps` steps are due per frame: any backlog beyond that is dropped
//! so a stalled frame slows the scene down instead of freezing the loop while
//! it catches up.

use crate::ecs::StepContext;

const EPSILON: f64 = 1e-9;

/// Accumulator clock driving the simulation in fixed steps
#[derive(Debug, Clone)]
pub struct SimulationClock {
    timestep: f64,
    max_substeps: u32,
    accumulator: f64,
    steps: u64,
    dropped: f64,
}

impl SimulationClock {
    /// Create a clock; `timestep` must be positive, `max_substeps` at least 1
    pub fn new(timestep: f64, max_substeps: u32) -> Self {
        SimulationClock {
            timestep,
            max_substeps: max_substeps.max(1),
            accumulator: 0.0,
            steps: 0,
            dropped: 0.0,
        }
    }

    /// Length of one step in seconds
    pub fn timestep(&self) -> f64 {
        self.timestep
    }

    /// Steps taken so far
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Simulated time in seconds
    pub fn elapsed(&self) -> f64 {
        self.steps as f64 * self.timestep
    }

    /// Wall-clock time discarded because frames fell too far behind
    pub fn dropped(&self) -> f64 {
        self.dropped
    }

    /// Add a frame's elapsed time and return how many steps are due
    pub fn advance(&mut self, frame_time: f64) -> u32 {
        if frame_time.is_finite() && frame_time > 0.0 {
            self.accumulator += frame_time;
        }
        let mut due = 0;
        while self.accumulator + EPSILON >= self.timestep && due < self.max_substeps {
            self.accumulator -= self.timestep;
            due += 1;
        }
        if self.accumulator + EPSILON >= self.timestep {
            log::debug!(
                "Clock fell behind by {:.4}s, dropping backlog",
                self.accumulator
            );
            self.dropped += self.accumulator;
            self.accumulator = 0.0;
        }
        self.accumulator = self.accumulator.max(0.0);
        due
    }

    /// Consume one step and describe it
    pub fn tick(&mut self) -> StepContext {
        self.steps += 1;
        StepContext { dt: self.timestep, step: self.steps }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 60.0;

    #[test]
    fn test_one_frame_one_step() {
        let mut clock = SimulationClock::new(DT, 4);
        for _ in 0..10 {
            assert_eq!(clock.advance(DT), 1);
        }
    }

    #[test]
    fn test_short_frames_accumulate() {
        let mut clock = SimulationClock::new(DT, 4);
        assert_eq!(clock.advance(DT / 2.0), 0);
        assert_eq!(clock.advance(DT / 2.0), 1);
    }

    #[test]
    fn test_backlog_is_capped() {
        let mut clock = SimulationClock::new(DT, 4);
        assert_eq!(clock.advance(1.0), 4);
        assert!(clock.dropped() > 0.9);
        assert_eq!(clock.advance(DT), 1);
    }

    #[test]
    fn test_ignores_bad_frame_times() {
        let mut clock = SimulationClock::new(DT, 4);
        assert_eq!(clock.advance(-1.0), 0);
        assert_eq!(clock.advance(f64::NAN), 0);
        assert_eq!(clock.advance(f64::INFINITY), 0);
    }

    #[test]
    fn test_tick_counts_steps() {
        let mut clock = SimulationClock::new(DT, 4);
        let ctx = clock.tick();
        assert_eq!(ctx.step, 1);
        assert_eq!(ctx.dt, DT);
        clock.tick();
        assert_eq!(clock.steps(), 2);
        assert!((clock.elapsed() - 2.0 * DT).abs() < 1e-12);
    }
}
