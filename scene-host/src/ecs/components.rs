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
//! Rigid body and constraint components
//!
//! Coordinates are screen pixels with y growing downwards, matching the
//! render target. Bodies are integrated with position Verlet, so velocity
//! is implicit in the difference between the current and previous position.

use crate::ecs::{Component, Entity};
use crate::render::{Color, Stroke};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// 2D vector in pixels
///
/// ```
/// use scene_host::ecs::components::Vec2;
///
/// let v = Vec2::new(3.0, 4.0);
/// assert_eq!(v.length(), 5.0);
/// assert!(v.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// Horizontal component
    pub x: f64,
    /// Vertical component (down is positive)
    pub y: f64,
}

impl Vec2 {
    /// Create a new vector
    pub const fn new(x: f64, y: f64) -> Self {
        Vec2 { x, y }
    }

    /// The zero vector
    pub const fn zero() -> Self {
        Vec2::new(0.0, 0.0)
    }

    /// Dot product
    pub fn dot(self, other: Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product
    pub fn cross(self, other: Vec2) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Squared length
    pub fn length_squared(self) -> f64 {
        self.dot(self)
    }

    /// Euclidean length
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Rotate counter-clockwise (in screen space: clockwise) by `angle` radians
    pub fn rotate(self, angle: f64) -> Vec2 {
        if angle == 0.0 {
            return self;
        }
        let (sin, cos) = angle.sin_cos();
        Vec2::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    /// Check if both components are finite
    pub fn is_valid(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Vec2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Top-left corner
    pub min: Vec2,
    /// Bottom-right corner
    pub max: Vec2,
}

impl Bounds {
    /// Create bounds from two corners
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Bounds { min, max }
    }

    /// Width of the rectangle
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Height of the rectangle
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Check if a point lies strictly inside
    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x > self.min.x && p.x < self.max.x && p.y > self.min.y && p.y < self.max.y
    }

    /// Check if `other` lies strictly inside
    pub fn contains(&self, other: &Bounds) -> bool {
        other.min.x > self.min.x
            && other.max.x < self.max.x
            && other.min.y > self.min.y
            && other.max.y < self.max.y
    }
}

/// Discriminant of a [`Shape`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// Disc
    Circle,
    /// Axis-aligned box before rotation
    Rectangle,
    /// Regular polygon
    Polygon {
        /// Number of sides (at least three)
        sides: u32,
    },
}

/// Body geometry in local coordinates, centred on the centre of mass
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Disc of the given radius
    Circle {
        /// Radius in pixels
        radius: f64,
    },
    /// Box of the given size
    Rectangle {
        /// Width in pixels
        width: f64,
        /// Height in pixels
        height: f64,
    },
    /// Regular polygon inscribed in a circle of `radius`
    Polygon {
        /// Number of sides
        sides: u32,
        /// Circumradius in pixels
        radius: f64,
    },
}

impl Shape {
    /// The shape's kind
    pub fn kind(&self) -> ShapeKind {
        match *self {
            Shape::Circle { .. } => ShapeKind::Circle,
            Shape::Rectangle { .. } => ShapeKind::Rectangle,
            Shape::Polygon { sides, .. } => ShapeKind::Polygon { sides },
        }
    }

    /// Surface area in px²
    pub fn area(&self) -> f64 {
        match *self {
            Shape::Circle { radius } => PI * radius * radius,
            Shape::Rectangle { width, height } => width * height,
            Shape::Polygon { sides, radius } => {
                let n = sides as f64;
                0.5 * n * radius * radius * (2.0 * PI / n).sin()
            }
        }
    }

    /// Radius of the smallest circle around the centre enclosing the shape
    pub fn bounding_radius(&self) -> f64 {
        match *self {
            Shape::Circle { radius } | Shape::Polygon { radius, .. } => radius,
            Shape::Rectangle { width, height } => 0.5 * (width * width + height * height).sqrt(),
        }
    }

    /// Outline vertices in local coordinates, clockwise on screen
    ///
    /// Circles have no vertices. Polygon vertex `i` sits at angle
    /// `π/n + i·2π/n`. With y pointing down, an unrotated pentagon has its
    /// lowest vertex at 108° and a vertical edge on its right side.
    pub fn local_vertices(&self) -> Vec<Vec2> {
        match *self {
            Shape::Circle { .. } => Vec::new(),
            Shape::Rectangle { width, height } => {
                let (hw, hh) = (width * 0.5, height * 0.5);
                vec![
                    Vec2::new(-hw, -hh),
                    Vec2::new(hw, -hh),
                    Vec2::new(hw, hh),
                    Vec2::new(-hw, hh),
                ]
            }
            Shape::Polygon { sides, radius } => {
                let theta = 2.0 * PI / sides as f64;
                let offset = theta * 0.5;
                (0..sides)
                    .map(|i| {
                        let angle = offset + i as f64 * theta;
                        Vec2::new(radius * angle.cos(), radius * angle.sin())
                    })
                    .collect()
            }
        }
    }
}

/// Physical material of a body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Mass per px²
    pub density: f64,
    /// Fraction of normal velocity kept after a contact, in [0, 1]
    pub restitution: f64,
    /// Fraction of velocity lost per step, in [0, 1]
    pub air_friction: f64,
}

impl Material {
    /// Default density of a body
    pub const DEFAULT_DENSITY: f64 = 0.001;
    /// Default per-step air friction
    pub const DEFAULT_AIR_FRICTION: f64 = 0.01;
}

impl Default for Material {
    fn default() -> Self {
        Material {
            density: Self::DEFAULT_DENSITY,
            restitution: 0.0,
            air_friction: Self::DEFAULT_AIR_FRICTION,
        }
    }
}

/// The wall a boundary body forms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wall {
    /// Bottom
    Ground,
    /// Left side
    Left,
    /// Right side
    Right,
    /// Top
    Ceiling,
}

/// What a body is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyRole {
    /// One of the four static walls enclosing the viewport
    Boundary(Wall),
    /// Scene content (static or dynamic)
    Content,
}

/// A rigid body inserted in a world
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    /// Human readable label
    pub label: &'static str,
    /// Geometry
    pub shape: Shape,
    /// Role in the scene
    pub role: BodyRole,
    /// Material parameters
    pub material: Material,
    /// Fill colour hint
    pub fill: Color,
    /// Current position of the centre of mass
    pub position: Vec2,
    /// Position at the previous step
    pub previous: Vec2,
    /// Orientation in radians
    pub angle: f64,
    is_static: bool,
    mass: f64,
}

impl Body {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        label: &'static str,
        shape: Shape,
        role: BodyRole,
        material: Material,
        fill: Color,
        position: Vec2,
        angle: f64,
        is_static: bool,
    ) -> Self {
        let mass = if is_static { f64::INFINITY } else { shape.area() * material.density };
        Body {
            label,
            shape,
            role,
            material,
            fill,
            position,
            previous: position,
            angle,
            is_static,
            mass,
        }
    }

    /// Static bodies never move
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Mass (area × density); infinite for static bodies
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Inverse mass; zero for static bodies
    pub fn inverse_mass(&self) -> f64 {
        if self.is_static || self.mass <= 0.0 {
            0.0
        } else {
            1.0 / self.mass
        }
    }

    /// Displacement over the last step
    pub fn velocity(&self) -> Vec2 {
        self.position - self.previous
    }

    /// Outline vertices in world coordinates (empty for circles)
    pub fn world_vertices(&self) -> Vec<Vec2> {
        self.shape
            .local_vertices()
            .into_iter()
            .map(|v| self.position + v.rotate(self.angle))
            .collect()
    }

    /// World-space point of a body-local offset
    pub fn local_to_world(&self, offset: Vec2) -> Vec2 {
        self.position + offset.rotate(self.angle)
    }

    /// Body-local offset of a world-space point
    pub fn world_to_local(&self, point: Vec2) -> Vec2 {
        (point - self.position).rotate(-self.angle)
    }

    /// World-space axis-aligned bounding box
    pub fn aabb(&self) -> Bounds {
        body_aabb(&self.shape, self.position, self.angle)
    }

    /// Check if a world-space point lies inside the body's outline
    pub fn contains_point(&self, point: Vec2) -> bool {
        match self.shape {
            Shape::Circle { radius } => (point - self.position).length_squared() <= radius * radius,
            _ => {
                let vertices = self.world_vertices();
                let n = vertices.len();
                let mut sign = 0.0f64;
                for i in 0..n {
                    let edge = vertices[(i + 1) % n] - vertices[i];
                    let cross = edge.cross(point - vertices[i]);
                    if cross != 0.0 {
                        if sign != 0.0 && cross.signum() != sign {
                            return false;
                        }
                        sign = cross.signum();
                    }
                }
                true
            }
        }
    }
}

impl Component for Body {}

/// Axis-aligned bounding box of a shape placed at `position`
pub(crate) fn body_aabb(shape: &Shape, position: Vec2, angle: f64) -> Bounds {
    match *shape {
        Shape::Circle { radius } => Bounds::new(
            position - Vec2::new(radius, radius),
            position + Vec2::new(radius, radius),
        ),
        _ => {
            let mut min = Vec2::new(f64::INFINITY, f64::INFINITY);
            let mut max = Vec2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
            for v in shape.local_vertices() {
                let p = position + v.rotate(angle);
                min = Vec2::new(min.x.min(p.x), min.y.min(p.y));
                max = Vec2::new(max.x.max(p.x), max.y.max(p.y));
            }
            Bounds::new(min, max)
        }
    }
}

/// One end of a constraint
///
/// `B` is the body reference: a composition index before the constraint is
/// inserted in a world, an [`Entity`] afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor<B> {
    /// A point attached to a body, as an offset in body-local coordinates
    Body {
        /// The body
        body: B,
        /// Attachment offset from the centre of mass
        offset: Vec2,
    },
    /// A fixed world-space point
    Point(Vec2),
}

impl<B> Anchor<B> {
    /// Attach at a body's centre of mass
    pub fn body(body: B) -> Self {
        Anchor::Body { body, offset: Vec2::zero() }
    }

    /// Referenced body, if any
    pub fn body_ref(&self) -> Option<&B> {
        match self {
            Anchor::Body { body, .. } => Some(body),
            Anchor::Point(_) => None,
        }
    }

    /// Replace the body reference
    pub fn try_map<C, E>(self, f: impl FnOnce(B) -> Result<C, E>) -> Result<Anchor<C>, E> {
        Ok(match self {
            Anchor::Body { body, offset } => Anchor::Body { body: f(body)?, offset },
            Anchor::Point(p) => Anchor::Point(p),
        })
    }
}

/// Distance constraint between two anchors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraint<B = Entity> {
    /// Human readable label
    pub label: &'static str,
    /// First end
    pub a: Anchor<B>,
    /// Second end
    pub b: Anchor<B>,
    /// Rest length in pixels
    pub length: f64,
    /// Fraction of the length error corrected per relaxation pass, in [0, 1]
    pub stiffness: f64,
    /// Fraction of the relative normal velocity removed per pass, in [0, 1]
    pub damping: f64,
    /// Line style; `None` draws nothing
    pub render: Option<Stroke>,
}

impl<B> Constraint<B> {
    /// Replace both body references
    pub fn try_map<C, E>(self, mut f: impl FnMut(B) -> Result<C, E>) -> Result<Constraint<C>, E> {
        Ok(Constraint {
            label: self.label,
            a: self.a.try_map(&mut f)?,
            b: self.b.try_map(&mut f)?,
            length: self.length,
            stiffness: self.stiffness,
            damping: self.damping,
            render: self.render,
        })
    }
}

impl Component for Constraint {}
