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
//! World composition per scene
//!
//! [`compose`] turns a [`SceneVariant`] and a [`Viewport`] into the full
//! initial set of body and constraint descriptors. Every scene switch
//! rebuilds from scratch, so composition is deterministic: the same inputs
//! always give structurally equal output.
//!
//! Scene layouts use fixed coordinates laid out for an 800×600 canvas. A
//! viewport that cannot enclose a scene's bodies inside its walls is
//! rejected rather than clipped.

use crate::ecs::components::{Bounds, ShapeKind, Vec2};
use crate::error::ConfigurationError;
use crate::factory::{
    boundary_interior, make_boundary, make_rope_constraint, make_shape, BodyDesc, ConstraintDesc,
    Size, WALL_FILL,
};
use crate::render::Color;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rest length of the sway pendulum's rope
pub const ROPE_LENGTH: f64 = 200.0;
/// Stiffness of the sway pendulum's rope
pub const ROPE_STIFFNESS: f64 = 0.3;
/// Damping of the sway pendulum's rope
pub const ROPE_DAMPING: f64 = 0.05;

mod palette {
    use crate::render::Color;

    pub const CIRCLE: Color = Color::rgb(0xf3, 0x55, 0x49);
    pub const RECTANGLE: Color = Color::rgb(0xf3, 0xa7, 0x49);
    pub const PENTAGON: Color = Color::rgb(0xf3, 0xe7, 0x49);
    pub const PENDULUM: Color = Color::rgb(0x49, 0xf3, 0x55);
    pub const BOX: Color = Color::rgb(0x49, 0xb3, 0xf3);
    pub const BALL: Color = Color::rgb(0xb3, 0x49, 0xf3);
}

/// Scene selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SceneVariant {
    /// A circle, a rectangle and a pentagon falling freely
    #[serde(rename = "drawShapes")]
    ShapesShowcase,
    /// A pendulum on a damped rope plus two draggable bodies
    #[serde(rename = "sway")]
    Sway,
    /// Two draggable bodies
    #[serde(rename = "drag")]
    Drag,
    /// Walls only
    #[serde(rename = "default")]
    Default,
}

impl SceneVariant {
    /// All variants
    pub const ALL: [SceneVariant; 4] = [
        SceneVariant::ShapesShowcase,
        SceneVariant::Sway,
        SceneVariant::Drag,
        SceneVariant::Default,
    ];

    /// Whether the scene installs a pointer constraint slot
    pub fn supports_drag(self) -> bool {
        matches!(self, SceneVariant::Sway | SceneVariant::Drag)
    }

    /// Selector tag used by the host UI
    pub fn tag(self) -> &'static str {
        match self {
            SceneVariant::ShapesShowcase => "drawShapes",
            SceneVariant::Sway => "sway",
            SceneVariant::Drag => "drag",
            SceneVariant::Default => "default",
        }
    }
}

impl fmt::Display for SceneVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Error returned when parsing an unknown selector tag
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown scene selector {0:?}")]
pub struct UnknownScene(pub String);

impl FromStr for SceneVariant {
    type Err = UnknownScene;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SceneVariant::ALL
            .into_iter()
            .find(|v| v.tag() == s)
            .ok_or_else(|| UnknownScene(s.to_string()))
    }
}

/// Visible area of the render target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    width: f64,
    height: f64,
}

impl Viewport {
    /// Create a viewport; both dimensions must be positive and finite
    pub fn new(width: f64, height: f64) -> Result<Self, ConfigurationError> {
        if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
            Ok(Viewport { width, height })
        } else {
            Err(ConfigurationError::InvalidViewport { width, height })
        }
    }

    /// Width in pixels
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> f64 {
        self.height
    }
}

/// Initial content of a world
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    /// Scene this composition was built for
    pub variant: SceneVariant,
    /// Viewport this composition was built for
    pub viewport: Viewport,
    /// Interior of the boundary walls
    pub bounds: Bounds,
    /// Body descriptors; the four walls come first
    pub bodies: Vec<BodyDesc>,
    /// Constraint descriptors referring to `bodies` by index
    pub constraints: Vec<ConstraintDesc>,
    /// Whether the scene has a pointer constraint slot
    pub pointer_slot: bool,
}

impl Composition {
    /// The four boundary walls
    pub fn boundary(&self) -> &[BodyDesc] {
        &self.bodies[..4]
    }

    /// Everything but the walls
    pub fn content(&self) -> &[BodyDesc] {
        &self.bodies[4..]
    }

    /// Dynamic bodies
    pub fn dynamic_bodies(&self) -> impl Iterator<Item = &BodyDesc> + '_ {
        self.bodies.iter().filter(|b| !b.is_static)
    }
}

/// Compose the initial content of a scene
///
/// ```
/// use scene_host::composer::{compose, SceneVariant, Viewport};
///
/// let viewport = Viewport::new(800.0, 600.0).unwrap();
/// let composition = compose(SceneVariant::ShapesShowcase, viewport).unwrap();
/// assert_eq!(composition.bodies.len(), 7);
/// assert!(composition.constraints.is_empty());
/// ```
pub fn compose(
    variant: SceneVariant,
    viewport: Viewport,
) -> Result<Composition, ConfigurationError> {
    let (w, h) = (viewport.width(), viewport.height());
    let bounds = boundary_interior(w, h)?;
    let mut bodies: Vec<BodyDesc> = make_boundary(w, h)?.into();
    let mut constraints = Vec::new();

    match variant {
        SceneVariant::ShapesShowcase => {
            bodies.push(ball(Vec2::new(100.0, 50.0), 30.0, palette::CIRCLE)?);
            bodies.push(block(Vec2::new(200.0, 50.0), 50.0, palette::RECTANGLE)?);
            bodies.push(pentagon(Vec2::new(300.0, 50.0), palette::PENTAGON)?);
        }
        SceneVariant::Sway => {
            let anchor = bodies.len();
            bodies.push(
                ball(Vec2::new(400.0, 100.0), 10.0, WALL_FILL)?
                    .into_static()
                    .with_label("rope-anchor"),
            );
            let pendulum = bodies.len();
            bodies.push(
                pentagon(Vec2::new(200.0, 300.0), palette::PENDULUM)?
                    .with_density(0.04)?
                    .with_label("pendulum"),
            );
            push_draggables(&mut bodies)?;
            constraints.push(make_rope_constraint(
                anchor,
                pendulum,
                ROPE_LENGTH,
                ROPE_STIFFNESS,
                ROPE_DAMPING,
            )?);
        }
        SceneVariant::Drag => push_draggables(&mut bodies)?,
        SceneVariant::Default => {}
    }

    for body in &bodies[4..] {
        if !bounds.contains(&body.aabb()) {
            return Err(ConfigurationError::ViewportTooSmall { variant, width: w, height: h });
        }
    }

    log::debug!(
        "composed {} scene: {} bodies, {} constraints",
        variant,
        bodies.len(),
        constraints.len()
    );
    Ok(Composition {
        variant,
        viewport,
        bounds,
        bodies,
        constraints,
        pointer_slot: variant.supports_drag(),
    })
}

fn push_draggables(bodies: &mut Vec<BodyDesc>) -> Result<(), ConfigurationError> {
    bodies.push(
        make_shape(
            ShapeKind::Rectangle,
            Vec2::new(200.0, 200.0),
            Size::Extent(80.0, 80.0),
            palette::BOX,
        )?
        .with_label("box"),
    );
    bodies.push(ball(Vec2::new(400.0, 200.0), 40.0, palette::BALL)?.with_label("ball"));
    Ok(())
}

fn ball(position: Vec2, radius: f64, fill: Color) -> Result<BodyDesc, ConfigurationError> {
    make_shape(ShapeKind::Circle, position, Size::Radius(radius), fill)
}

fn block(position: Vec2, side: f64, fill: Color) -> Result<BodyDesc, ConfigurationError> {
    make_shape(ShapeKind::Rectangle, position, Size::Extent(side, side), fill)
}

fn pentagon(position: Vec2, fill: Color) -> Result<BodyDesc, ConfigurationError> {
    make_shape(ShapeKind::Polygon { sides: 5 }, position, Size::Radius(40.0), fill)
}
