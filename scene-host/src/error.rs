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
//! Error types for scene construction and host lifecycle
//!
//! Construction problems are reported as [`ConfigurationError`] and are
//! always raised before anything is bound to a render target. Lifecycle
//! misuse (stepping a stopped host, attaching a pointer to a scene that
//! does not support dragging) is reported through [`Error`].

use crate::composer::SceneVariant;
use thiserror::Error;

/// Invalid viewport, body, constraint or host parameters
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Viewport width or height is zero, negative or not finite
    #[error("viewport must have positive finite dimensions, got {width}x{height}")]
    InvalidViewport {
        /// Requested width
        width: f64,
        /// Requested height
        height: f64,
    },

    /// A viewport is valid but cannot enclose the bodies of a scene
    #[error("viewport {width}x{height} is too small for the {variant} scene")]
    ViewportTooSmall {
        /// Scene being composed
        variant: SceneVariant,
        /// Requested width
        width: f64,
        /// Requested height
        height: f64,
    },

    /// A coordinate or scalar is NaN or infinite
    #[error("{field} must be finite, got {value}")]
    NonFinite {
        /// Name of the offending parameter
        field: &'static str,
        /// Offending value
        value: f64,
    },

    /// A size, density or rate must be strictly positive
    #[error("{field} must be positive, got {value}")]
    NonPositive {
        /// Name of the offending parameter
        field: &'static str,
        /// Offending value
        value: f64,
    },

    /// Stiffness, damping and similar coefficients live in [0, 1]
    #[error("{field} must lie in [0, 1], got {value}")]
    OutOfUnitRange {
        /// Name of the offending parameter
        field: &'static str,
        /// Offending value
        value: f64,
    },

    /// A value is positive and finite but outside what the host can use
    #[error("{field} is out of range, got {value}")]
    OutOfRange {
        /// Name of the offending parameter
        field: &'static str,
        /// Offending value
        value: f64,
    },

    /// Regular polygons need at least three sides
    #[error("polygon needs at least 3 sides, got {0}")]
    TooFewSides(u32),

    /// A radius was given for a rectangle, or an extent for a round shape
    #[error("size does not match a {0} shape")]
    SizeMismatch(&'static str),

    /// A colour string is not `#rgb` or `#rrggbb`
    #[error("invalid colour {0:?}")]
    InvalidColor(String),

    /// A constraint refers to a body that is not part of the composition
    #[error("constraint refers to body #{index} but only {count} bodies exist")]
    BodyIndexOutOfRange {
        /// Referenced index
        index: usize,
        /// Number of bodies available
        count: usize,
    },

    /// A world must be enclosed by exactly four static walls
    #[error("world needs exactly 4 static boundary walls, found {found}")]
    Boundary {
        /// Number of static boundary bodies supplied
        found: usize,
    },

    /// A content body does not start inside the walls
    #[error("body {0:?} does not start inside the boundary")]
    OutOfBounds(&'static str),

    /// Host configuration could not be parsed
    #[error("failed to parse host configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors raised by the simulation host and scene controller
#[derive(Debug, Error)]
pub enum Error {
    /// Construction was rejected; nothing was started
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Pointer interaction was requested for a scene without drag support
    #[error("the {0} scene does not support pointer dragging")]
    DragUnsupported(SceneVariant),

    /// The controller has no active scene
    #[error("no scene is mounted")]
    NotMounted,

    /// `mount` was called while a scene is already active
    #[error("a {0} scene is already mounted")]
    AlreadyMounted(SceneVariant),

    /// The host handle was already stopped
    #[error("simulation host has been stopped")]
    HostStopped,

    /// `advance_frame` is only valid when the host UI drives the loop
    #[error("host is driven by its own loop thread; manual frames are not allowed")]
    ManualStepInThreadedMode,

    /// The loop thread panicked while drawing or stepping
    #[error("simulation loop thread panicked")]
    LoopPanicked,

    /// The loop thread could not be started
    #[error("failed to spawn simulation loop thread: {0}")]
    LoopSpawn(#[source] std::io::Error),
}

/// Result alias for host operations
pub type Result<T> = std::result::Result<T, Error>;

/// Checks that `value` is finite
pub(crate) fn ensure_finite(
    field: &'static str,
    value: f64,
) -> std::result::Result<f64, ConfigurationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigurationError::NonFinite { field, value })
    }
}

/// Checks that `value` is finite and strictly positive
pub(crate) fn ensure_positive(
    field: &'static str,
    value: f64,
) -> std::result::Result<f64, ConfigurationError> {
    let value = ensure_finite(field, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigurationError::NonPositive { field, value })
    }
}

/// Checks that `value` lies in [0, 1]
pub(crate) fn ensure_unit(
    field: &'static str,
    value: f64,
) -> std::result::Result<f64, ConfigurationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigurationError::OutOfUnitRange { field, value })
    }
}
