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
//! Render binding
//!
//! The host UI supplies a [`RenderTarget`]: a surface that can draw filled or
//! outlined circles and polygons and stroked lines. Each frame the host
//! extracts a flat list of [`DrawCommand`]s from the world and replays it
//! onto the target. With the `parallel` feature the per-body extraction runs
//! on the Rayon pool; the resulting list keeps the world's body order.

use crate::composer::SceneVariant;
use crate::ecs::components::{Body, Shape, Vec2};
use crate::ecs::{World, WorldId};
use crate::error::ConfigurationError;
use std::fmt;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// An opaque RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl Color {
    /// Black
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    /// Create a colour from channels
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    /// Parse `#rgb` or `#rrggbb`
    ///
    /// ```
    /// use scene_host::render::Color;
    ///
    /// assert_eq!(Color::from_hex("#665").unwrap(), Color::rgb(0x66, 0x66, 0x55));
    /// assert_eq!(Color::from_hex("#f35549").unwrap(), Color::rgb(0xf3, 0x55, 0x49));
    /// assert!(Color::from_hex("f35549").is_err());
    /// ```
    pub fn from_hex(hex: &str) -> Result<Self, ConfigurationError> {
        let invalid = || ConfigurationError::InvalidColor(hex.to_string());
        let digits = hex.strip_prefix('#').ok_or_else(invalid)?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
        match digits.len() {
            3 => {
                let expand = |i: usize| channel(&digits[i..i + 1]).map(|v| v * 17);
                Ok(Color::rgb(expand(0)?, expand(1)?, expand(2)?))
            }
            6 => Ok(Color::rgb(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Line style
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    /// Line colour
    pub color: Color,
    /// Line width in pixels
    pub width: f64,
}

impl Stroke {
    /// Create a stroke
    pub const fn new(color: Color, width: f64) -> Self {
        Stroke { color, width }
    }
}

/// Fill and outline for a shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    /// Interior colour; `None` in wireframe mode
    pub fill: Option<Color>,
    /// Outline; set in wireframe mode
    pub stroke: Option<Stroke>,
}

impl Paint {
    fn for_body(body: &Body, wireframes: bool) -> Self {
        if wireframes {
            Paint { fill: None, stroke: Some(Stroke::new(body.fill, 1.0)) }
        } else {
            Paint { fill: Some(body.fill), stroke: None }
        }
    }
}

/// Identifies the world and step a frame was drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    /// World that produced the frame
    pub world: WorldId,
    /// Scene of that world
    pub variant: SceneVariant,
    /// Frame number within the world, starting at 1
    pub frame: u64,
    /// Simulation steps taken so far
    pub step: u64,
}

/// Drawing surface supplied by the host UI
///
/// Only the simulation host calls these methods, and only from inside a
/// loop turn, so a frame is always bracketed by `begin_frame`/`end_frame`.
pub trait RenderTarget: Send {
    /// Clear the surface for a new frame
    fn begin_frame(&mut self, frame: &FrameInfo, background: Color);

    /// Draw a circle
    fn draw_circle(&mut self, center: Vec2, radius: f64, paint: &Paint);

    /// Draw a closed polygon
    fn draw_polygon(&mut self, points: &[Vec2], paint: &Paint);

    /// Draw a line segment
    fn draw_line(&mut self, from: Vec2, to: Vec2, stroke: &Stroke);

    /// Present the frame
    fn end_frame(&mut self) {}

    /// `false` once the surface has been disposed by the host UI
    ///
    /// A detached target stops the loop that draws to it.
    fn is_attached(&self) -> bool {
        true
    }
}

/// One primitive of a frame
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// A circular body
    Circle {
        /// Centre
        center: Vec2,
        /// Radius
        radius: f64,
        /// Style
        paint: Paint,
    },
    /// A polygonal body
    Polygon {
        /// World-space outline
        points: Vec<Vec2>,
        /// Style
        paint: Paint,
    },
    /// A visible constraint
    Line {
        /// First end
        from: Vec2,
        /// Second end
        to: Vec2,
        /// Style
        stroke: Stroke,
    },
}

impl DrawCommand {
    /// Replay onto a target
    pub fn draw(&self, target: &mut (impl RenderTarget + ?Sized)) {
        match self {
            DrawCommand::Circle { center, radius, paint } => {
                target.draw_circle(*center, *radius, paint)
            }
            DrawCommand::Polygon { points, paint } => target.draw_polygon(points, paint),
            DrawCommand::Line { from, to, stroke } => target.draw_line(*from, *to, stroke),
        }
    }
}

fn body_command(body: &Body, wireframes: bool) -> DrawCommand {
    let paint = Paint::for_body(body, wireframes);
    match body.shape {
        Shape::Circle { radius } => DrawCommand::Circle { center: body.position, radius, paint },
        _ => DrawCommand::Polygon { points: body.world_vertices(), paint },
    }
}

/// Build the draw list for the current world state
///
/// Bodies come first in insertion order, then visible constraints. The
/// pointer constraint is never drawn.
pub fn extract(world: &World, wireframes: bool) -> Vec<DrawCommand> {
    let bodies = world.body_slice();

    #[cfg(feature = "parallel")]
    let mut commands: Vec<DrawCommand> =
        bodies.par_iter().map(|b| body_command(b, wireframes)).collect();
    #[cfg(not(feature = "parallel"))]
    let mut commands: Vec<DrawCommand> =
        bodies.iter().map(|b| body_command(b, wireframes)).collect();

    for (_, constraint) in world.constraints() {
        let Some(stroke) = constraint.render else { continue };
        let ends = (world.anchor_point(&constraint.a), world.anchor_point(&constraint.b));
        let (Some(from), Some(to)) = ends else {
            continue;
        };
        commands.push(DrawCommand::Line { from, to, stroke });
    }
    commands
}

/// Draw one complete frame onto `target`
pub fn draw_frame(
    world: &World,
    target: &mut (impl RenderTarget + ?Sized),
    frame: &FrameInfo,
    background: Color,
    wireframes: bool,
) {
    target.begin_frame(frame, background);
    for command in extract(world, wireframes) {
        command.draw(target);
    }
    target.end_frame();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::Viewport;

    #[test]
    fn test_color_parsing() {
        assert_eq!(Color::from_hex("#fff").unwrap(), Color::rgb(255, 255, 255));
        assert_eq!(Color::from_hex("#49b3f3").unwrap().to_string(), "#49b3f3");
        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("#ggg").is_err());
        assert!(Color::from_hex("").is_err());
    }

    #[test]
    fn test_extract_sway_draws_rope_only() {
        let viewport = Viewport::new(800.0, 600.0).unwrap();
        let world = World::from_scene(SceneVariant::Sway, viewport, Vec2::zero()).unwrap();
        let commands = extract(&world, false);
        let lines: Vec<_> =
            commands.iter().filter(|c| matches!(c, DrawCommand::Line { .. })).collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(commands.len(), world.body_count() + 1);
    }

    #[test]
    fn test_wireframe_paint() {
        let viewport = Viewport::new(800.0, 600.0).unwrap();
        let world = World::from_scene(SceneVariant::Default, viewport, Vec2::zero()).unwrap();
        for command in extract(&world, true) {
            match command {
                DrawCommand::Polygon { paint, .. } => {
                    assert!(paint.fill.is_none());
                    assert!(paint.stroke.is_some());
                }
                other => panic!("unexpected command {:?}", other),
            }
        }
    }
}
