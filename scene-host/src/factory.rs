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
//! Body and constraint factory
//!
//! Pure constructors for the descriptors a scene is composed from. Inputs
//! fully determine outputs and every parameter is validated here, so a
//! descriptor that exists is always safe to insert into a world.

use crate::ecs::components::{
    body_aabb, Anchor, Body, BodyRole, Bounds, Constraint, Material, Shape, ShapeKind, Vec2, Wall,
};
use crate::error::{ensure_finite, ensure_positive, ensure_unit, ConfigurationError};
use crate::render::{Color, Stroke};

/// Fill of the boundary walls and the pendulum anchor
pub const WALL_FILL: Color = Color::rgb(0x66, 0x66, 0x55);

/// Line style of rope constraints
pub const ROPE_STROKE: Stroke = Stroke::new(Color::rgb(0x55, 0x55, 0x55), 2.0);

/// Thickness of the side walls and the ceiling
const WALL_THICKNESS: f64 = 20.0;
/// Thickness of the ground slab
const GROUND_THICKNESS: f64 = 60.0;
/// Overlap between the walls and the viewport edges
const WALL_OFFSET: f64 = 10.0;

/// Constraint descriptor whose bodies are indices into a composition
pub type ConstraintDesc = Constraint<usize>;

/// Size argument of [`make_shape`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Size {
    /// Radius of a circle or circumradius of a polygon
    Radius(f64),
    /// Width and height of a rectangle
    Extent(f64, f64),
}

/// Body descriptor, not yet inserted in a world
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDesc {
    /// Human readable label
    pub label: &'static str,
    /// Geometry
    pub shape: Shape,
    /// Role in the scene
    pub role: BodyRole,
    /// Centre of mass
    pub position: Vec2,
    /// Orientation in radians
    pub angle: f64,
    /// Material parameters
    pub material: Material,
    /// Static bodies never move
    pub is_static: bool,
    /// Fill colour hint
    pub fill: Color,
}

impl BodyDesc {
    /// Set the label
    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    /// Override the density
    pub fn with_density(mut self, density: f64) -> Result<Self, ConfigurationError> {
        self.material.density = ensure_positive("density", density)?;
        Ok(self)
    }

    /// Override the restitution
    pub fn with_restitution(mut self, restitution: f64) -> Result<Self, ConfigurationError> {
        self.material.restitution = ensure_unit("restitution", restitution)?;
        Ok(self)
    }

    /// Override the air friction
    pub fn with_air_friction(mut self, air_friction: f64) -> Result<Self, ConfigurationError> {
        self.material.air_friction = ensure_unit("air_friction", air_friction)?;
        Ok(self)
    }

    /// Make the body static
    pub fn into_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// The shape's kind
    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    /// World-space bounding box at the initial position
    pub fn aabb(&self) -> Bounds {
        body_aabb(&self.shape, self.position, self.angle)
    }

    /// Runtime body for this descriptor
    pub(crate) fn build(&self) -> Body {
        Body::new(
            self.label,
            self.shape,
            self.role,
            self.material,
            self.fill,
            self.position,
            self.angle,
            self.is_static,
        )
    }
}

/// The four static walls enclosing a viewport
///
/// Returned in the order ground, left wall, right wall, ceiling.
pub fn make_boundary(
    viewport_width: f64,
    viewport_height: f64,
) -> Result<[BodyDesc; 4], ConfigurationError> {
    let (w, h) = checked_viewport(viewport_width, viewport_height)?;
    let wall = |label, wall, x, y, width, height| BodyDesc {
        label,
        shape: Shape::Rectangle { width, height },
        role: BodyRole::Boundary(wall),
        position: Vec2::new(x, y),
        angle: 0.0,
        material: Material::default(),
        is_static: true,
        fill: WALL_FILL,
    };
    Ok([
        wall("ground", Wall::Ground, w / 2.0, h + WALL_OFFSET, w + WALL_OFFSET, GROUND_THICKNESS),
        wall("wall-left", Wall::Left, -WALL_OFFSET, h / 2.0, WALL_THICKNESS, h),
        wall("wall-right", Wall::Right, w + WALL_OFFSET, h / 2.0, WALL_THICKNESS, h),
        wall("ceiling", Wall::Ceiling, w / 2.0, -WALL_OFFSET, w + WALL_OFFSET, WALL_THICKNESS),
    ])
}

/// The open rectangle enclosed by [`make_boundary`]'s walls
pub fn boundary_interior(
    viewport_width: f64,
    viewport_height: f64,
) -> Result<Bounds, ConfigurationError> {
    let (w, h) = checked_viewport(viewport_width, viewport_height)?;
    let ground_top = h + WALL_OFFSET - GROUND_THICKNESS / 2.0;
    Ok(Bounds::new(Vec2::new(0.0, 0.0), Vec2::new(w, ground_top)))
}

fn checked_viewport(width: f64, height: f64) -> Result<(f64, f64), ConfigurationError> {
    if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
        Ok((width, height))
    } else {
        Err(ConfigurationError::InvalidViewport { width, height })
    }
}

/// A dynamic body with default material
///
/// `size` must match `kind`: a radius for circles and polygons, an extent
/// for rectangles.
pub fn make_shape(
    kind: ShapeKind,
    position: Vec2,
    size: Size,
    style: Color,
) -> Result<BodyDesc, ConfigurationError> {
    ensure_finite("position.x", position.x)?;
    ensure_finite("position.y", position.y)?;
    let (shape, label) = match (kind, size) {
        (ShapeKind::Circle, Size::Radius(radius)) => {
            (Shape::Circle { radius: ensure_positive("radius", radius)? }, "circle")
        }
        (ShapeKind::Rectangle, Size::Extent(width, height)) => (
            Shape::Rectangle {
                width: ensure_positive("width", width)?,
                height: ensure_positive("height", height)?,
            },
            "rectangle",
        ),
        (ShapeKind::Polygon { sides }, Size::Radius(radius)) => {
            if sides < 3 {
                return Err(ConfigurationError::TooFewSides(sides));
            }
            (Shape::Polygon { sides, radius: ensure_positive("radius", radius)? }, "polygon")
        }
        (ShapeKind::Rectangle, Size::Radius(_)) => {
            return Err(ConfigurationError::SizeMismatch("rectangle"))
        }
        (ShapeKind::Circle, Size::Extent(..)) => {
            return Err(ConfigurationError::SizeMismatch("circle"))
        }
        (ShapeKind::Polygon { .. }, Size::Extent(..)) => {
            return Err(ConfigurationError::SizeMismatch("polygon"))
        }
    };
    Ok(BodyDesc {
        label,
        shape,
        role: BodyRole::Content,
        position,
        angle: 0.0,
        material: Material::default(),
        is_static: false,
        fill: style,
    })
}

/// A damped rope between the centres of two composition bodies
pub fn make_rope_constraint(
    anchor_body: usize,
    target_body: usize,
    length: f64,
    stiffness: f64,
    damping: f64,
) -> Result<ConstraintDesc, ConfigurationError> {
    Ok(Constraint {
        label: "rope",
        a: Anchor::body(anchor_body),
        b: Anchor::body(target_body),
        length: ensure_positive("length", length)?,
        stiffness: ensure_unit("stiffness", stiffness)?,
        damping: ensure_unit("damping", damping)?,
        render: Some(ROPE_STROKE),
    })
}

/// The invisible spring between the cursor and a grabbed body
pub fn make_pointer_constraint<B>(
    pointer: Vec2,
    body: B,
    offset: Vec2,
    stiffness: f64,
) -> Result<Constraint<B>, ConfigurationError> {
    ensure_finite("pointer.x", pointer.x)?;
    ensure_finite("pointer.y", pointer.y)?;
    Ok(Constraint {
        label: "pointer",
        a: Anchor::Point(pointer),
        b: Anchor::Body { body, offset },
        length: 0.0,
        stiffness: ensure_unit("stiffness", stiffness)?,
        damping: 0.0,
        render: None,
    })
}
