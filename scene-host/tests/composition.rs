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
//! Scene composition through the public API

use scene_host::composer::{compose, SceneVariant, Viewport};
use scene_host::ecs::components::{BodyRole, Shape, ShapeKind, Vec2, Wall};
use scene_host::ecs::World;
use scene_host::error::ConfigurationError;
use scene_host::factory::{make_pointer_constraint, make_rope_constraint, make_shape, Size};
use scene_host::render::Color;

fn viewport(w: f64, h: f64) -> Viewport {
    Viewport::new(w, h).unwrap()
}

#[test]
fn test_every_variant_is_enclosed() {
    for variant in SceneVariant::ALL {
        for vp in [viewport(800.0, 600.0), viewport(1280.0, 720.0), viewport(1920.0, 1080.0)] {
            let c = compose(variant, vp).unwrap();
            let walls: Vec<_> =
                c.bodies.iter().filter(|b| matches!(b.role, BodyRole::Boundary(_))).collect();
            assert_eq!(walls.len(), 4, "{variant} at {vp:?}");
            assert!(walls.iter().all(|w| w.is_static));
            for body in c.dynamic_bodies() {
                assert!(c.bounds.contains_point(body.position), "{} escapes {variant}", body.label);
                assert!(c.bounds.contains(&body.aabb()));
            }
        }
    }
}

#[test]
fn test_walls_in_order() {
    let c = compose(SceneVariant::Default, viewport(800.0, 600.0)).unwrap();
    let roles: Vec<_> = c.boundary().iter().map(|b| b.role).collect();
    assert_eq!(
        roles,
        vec![
            BodyRole::Boundary(Wall::Ground),
            BodyRole::Boundary(Wall::Left),
            BodyRole::Boundary(Wall::Right),
            BodyRole::Boundary(Wall::Ceiling),
        ]
    );
}

#[test]
fn test_shapes_showcase_scenario() {
    let c = compose(SceneVariant::ShapesShowcase, viewport(800.0, 600.0)).unwrap();
    assert_eq!(c.bodies.len(), 7);
    assert!(c.constraints.is_empty());
    assert!(!c.pointer_slot);

    let content = c.content();
    assert_eq!(content[0].kind(), ShapeKind::Circle);
    assert_eq!(content[0].position, Vec2::new(100.0, 50.0));
    assert_eq!(content[0].shape, Shape::Circle { radius: 30.0 });
    assert_eq!(content[0].fill, Color::from_hex("#f35549").unwrap());

    assert_eq!(content[1].kind(), ShapeKind::Rectangle);
    assert_eq!(content[1].position, Vec2::new(200.0, 50.0));
    assert_eq!(content[1].fill, Color::from_hex("#f3a749").unwrap());

    assert_eq!(content[2].kind(), ShapeKind::Polygon { sides: 5 });
    assert_eq!(content[2].position, Vec2::new(300.0, 50.0));
    assert_eq!(content[2].fill, Color::from_hex("#f3e749").unwrap());
}

#[test]
fn test_default_is_walls_only() {
    for vp in [viewport(800.0, 600.0), viewport(64.0, 48.0), viewport(4000.0, 3000.0)] {
        let c = compose(SceneVariant::Default, vp).unwrap();
        assert_eq!(c.bodies.len(), 4);
        assert!(c.content().is_empty());
        assert!(c.constraints.is_empty());
    }
}

#[test]
fn test_sway_rope_independent_of_viewport() {
    for vp in [viewport(800.0, 600.0), viewport(1024.0, 768.0), viewport(2560.0, 1440.0)] {
        let c = compose(SceneVariant::Sway, vp).unwrap();
        assert_eq!(c.constraints.len(), 1);
        let rope = &c.constraints[0];
        assert_eq!(rope.length, 200.0);
        assert_eq!(rope.stiffness, 0.3);
        assert_eq!(rope.damping, 0.05);
        assert!(c.pointer_slot);
    }
}

#[test]
fn test_compose_is_idempotent() {
    for variant in SceneVariant::ALL {
        let a = compose(variant, viewport(800.0, 600.0)).unwrap();
        let b = compose(variant, viewport(800.0, 600.0)).unwrap();
        assert_eq!(a.bodies, b.bodies);
        assert_eq!(a.constraints, b.constraints);
    }
}

#[test]
fn test_small_viewport_rejected() {
    let err = compose(SceneVariant::Drag, viewport(300.0, 200.0)).unwrap_err();
    assert!(matches!(
        err,
        ConfigurationError::ViewportTooSmall { variant: SceneVariant::Drag, .. }
    ));
}

#[test]
fn test_invalid_viewport_rejected() {
    assert!(Viewport::new(0.0, 600.0).is_err());
    assert!(Viewport::new(800.0, -1.0).is_err());
    assert!(Viewport::new(f64::NAN, 600.0).is_err());
}

#[test]
fn test_factory_rejects_bad_parameters() {
    let at = Vec2::new(10.0, 10.0);
    assert!(matches!(
        make_shape(ShapeKind::Polygon { sides: 2 }, at, Size::Radius(5.0), Color::BLACK),
        Err(ConfigurationError::TooFewSides(2))
    ));
    assert!(make_shape(ShapeKind::Circle, at, Size::Radius(0.0), Color::BLACK).is_err());
    let far = Vec2::new(f64::INFINITY, 0.0);
    assert!(make_shape(ShapeKind::Circle, far, Size::Radius(1.0), Color::BLACK).is_err());
    assert!(make_rope_constraint(0, 1, 200.0, 1.5, 0.0).is_err());
    assert!(make_rope_constraint(0, 1, 200.0, 0.3, -0.1).is_err());
    assert!(make_pointer_constraint(at, 0usize, Vec2::zero(), 2.0).is_err());
}

#[test]
fn test_worlds_are_distinct() {
    let a = World::from_scene(SceneVariant::Sway, viewport(800.0, 600.0), Vec2::zero()).unwrap();
    let b = World::from_scene(SceneVariant::Sway, viewport(800.0, 600.0), Vec2::zero()).unwrap();
    assert_ne!(a.id(), b.id());
    for (entity, _) in a.bodies() {
        assert!(!b.contains(entity));
        assert!(b.body(entity).is_none());
    }
    for (entity, _) in a.constraints() {
        assert!(b.constraint(entity).is_none());
    }
}
