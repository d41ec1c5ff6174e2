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
//! # Scene Host
//!
//! Hosts small interactive 2D rigid-body scenes inside a UI. A scene is
//! composed from a named variant, simulated in fixed steps and drawn onto a
//! render target supplied by the UI, with an optional pointer spring for
//! dragging bodies around.
//!
//! ## Features
//!
//! - **Scene composition**: four static walls fitted to the viewport plus the
//!   bodies and ropes of the selected variant
//! - **Position Verlet stepping**: gravity, rope relaxation and wall contacts
//!   run as a staged ECS pipeline
//! - **Lifecycle**: start, stop and rebuild with guaranteed teardown; the
//!   render target is always handed back
//! - **Pointer interaction**: events buffered from any thread and applied at
//!   turn boundaries
//! - **Parallelization**: optional Rayon integration for per-body work
//!
//! ## Example
//!
//! ```rust
//! use scene_host::composer::{SceneVariant, Viewport};
//! use scene_host::config::HostConfig;
//! use scene_host::controller::SceneController;
//! use scene_host::ecs::components::Vec2;
//! use scene_host::render::{Color, FrameInfo, Paint, RenderTarget, Stroke};
//!
//! struct Null;
//!
//! impl RenderTarget for Null {
//!     fn begin_frame(&mut self, _: &FrameInfo, _: Color) {}
//!     fn draw_circle(&mut self, _: Vec2, _: f64, _: &Paint) {}
//!     fn draw_polygon(&mut self, _: &[Vec2], _: &Paint) {}
//!     fn draw_line(&mut self, _: Vec2, _: Vec2, _: &Stroke) {}
//! }
//!
//! let mut controller = SceneController::new(Null, HostConfig::default().manual()).unwrap();
//! controller.mount(SceneVariant::Sway, Viewport::new(800.0, 600.0).unwrap()).unwrap();
//! controller.advance_frame().unwrap();
//! controller.select(SceneVariant::Drag).unwrap();
//! controller.unmount();
//! ```

#![warn(missing_docs)]

/// Fixed-step simulation clock
pub mod clock;

/// Scene variants and world composition
pub mod composer;

/// Host configuration
pub mod config;

/// Scene lifecycle controller
pub mod controller;

/// Entity Component System implementation
pub mod ecs;

/// Error types
pub mod error;

/// Body and constraint constructors
pub mod factory;

/// Simulation host and loop drivers
pub mod host;

/// Numerical integration
pub mod integration;

/// Pointer interaction
pub mod pointer;

/// Render binding
pub mod render;

/// Constraint and contact solvers
pub mod solver;

pub use composer::{SceneVariant, Viewport};
pub use config::{HostConfig, LoopMode};
pub use controller::{ControllerState, SceneController};
pub use ecs::{Entity, World};
pub use error::{ConfigurationError, Error, Result};
pub use host::{HostHandle, Scene, SimulationHost, StartError};
pub use render::{FrameInfo, RenderTarget};
