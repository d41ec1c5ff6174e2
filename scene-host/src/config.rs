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
//! Host configuration
//!
//! [`HostConfig`] gathers the global simulation parameters (gravity,
//! timestep, solver iterations) and the render-loop settings. It can be
//! built in code with the `with_*` methods or loaded from JSON supplied by
//! the embedding UI. Every field has a default, so partial documents are
//! accepted.

use crate::ecs::components::Vec2;
use crate::error::{ensure_finite, ensure_positive, ensure_unit, ConfigurationError};
use crate::render::Color;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Who drives the render/step loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoopMode {
    /// The host spawns a loop thread paced at `refresh_hz`
    #[default]
    Threaded,
    /// The host UI calls `HostHandle::advance_frame` from its own refresh callback
    Manual,
}

/// Configuration for a simulation host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Gravitational acceleration in px/s² (y grows downwards)
    pub gravity: Vec2,
    /// Fixed integration step in seconds
    pub timestep: f64,
    /// Target frame rate of the threaded loop
    pub refresh_hz: f64,
    /// Maximum fixed steps taken in one frame when the loop falls behind
    pub max_substeps: u32,
    /// Relaxation passes over the constraints per step
    pub constraint_iterations: u32,
    /// Contact push-out passes per step
    pub position_iterations: u32,
    /// Stiffness of the spring pulling a grabbed body towards the cursor
    pub pointer_stiffness: f64,
    /// Background colour as `#rgb` or `#rrggbb`
    pub background: String,
    /// Draw outlines instead of filled shapes
    pub wireframes: bool,
    /// Loop driver
    pub loop_mode: LoopMode,
}

impl Default for HostConfig {
    fn default() -> Self {
        HostConfig {
            gravity: Vec2::new(0.0, 1000.0),
            timestep: 1.0 / 60.0,
            refresh_hz: 60.0,
            max_substeps: 4,
            constraint_iterations: 2,
            position_iterations: 6,
            pointer_stiffness: 0.2,
            background: "#f0f0f0".to_string(),
            wireframes: false,
            loop_mode: LoopMode::Threaded,
        }
    }
}

impl HostConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON and validate it
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        let config: HostConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Use the manual loop driver
    pub fn manual(mut self) -> Self {
        self.loop_mode = LoopMode::Manual;
        self
    }

    /// Set the loop driver
    pub fn with_loop_mode(mut self, mode: LoopMode) -> Self {
        self.loop_mode = mode;
        self
    }

    /// Set gravity in px/s²
    pub fn with_gravity(mut self, x: f64, y: f64) -> Self {
        self.gravity = Vec2::new(x, y);
        self
    }

    /// Set the fixed timestep in seconds
    pub fn with_timestep(mut self, dt: f64) -> Self {
        self.timestep = dt;
        self
    }

    /// Set the threaded loop frame rate
    pub fn with_refresh_hz(mut self, hz: f64) -> Self {
        self.refresh_hz = hz;
        self
    }

    /// Set the pointer spring stiffness
    pub fn with_pointer_stiffness(mut self, stiffness: f64) -> Self {
        self.pointer_stiffness = stiffness;
        self
    }

    /// Draw outlines only
    pub fn with_wireframes(mut self, wireframes: bool) -> Self {
        self.wireframes = wireframes;
        self
    }

    /// Parsed background colour
    pub fn background_color(&self) -> Result<Color, ConfigurationError> {
        Color::from_hex(&self.background)
    }

    /// Time between frames of the threaded loop
    pub fn frame_period(&self) -> Result<Duration, ConfigurationError> {
        let hz = ensure_positive("refresh_hz", self.refresh_hz)?;
        Duration::try_from_secs_f64(1.0 / hz)
            .map_err(|_| ConfigurationError::OutOfRange { field: "refresh_hz", value: hz })
    }

    /// Reject values the stepping pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        ensure_finite("gravity.x", self.gravity.x)?;
        ensure_finite("gravity.y", self.gravity.y)?;
        ensure_positive("timestep", self.timestep)?;
        self.frame_period()?;
        if self.max_substeps == 0 {
            return Err(ConfigurationError::NonPositive { field: "max_substeps", value: 0.0 });
        }
        if self.constraint_iterations == 0 {
            return Err(ConfigurationError::NonPositive {
                field: "constraint_iterations",
                value: 0.0,
            });
        }
        if self.position_iterations == 0 {
            return Err(ConfigurationError::NonPositive {
                field: "position_iterations",
                value: 0.0,
            });
        }
        ensure_unit("pointer_stiffness", self.pointer_stiffness)?;
        self.background_color()?;
        Ok(())
    }
}
