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
//! World management
//!
//! A [`World`] owns every body and constraint of one scene together with the
//! global parameters (gravity, bounds) and the pointer constraint slot.
//! Worlds are only ever built whole from a [`Composition`]; there is no way
//! to add or remove bodies afterwards, so the boundary invariant checked at
//! construction holds for the world's whole lifetime.

use crate::composer::{compose, Composition, SceneVariant, Viewport};
use crate::ecs::components::{Anchor, Body, BodyRole, Bounds, Constraint, Vec2};
use crate::ecs::{ComponentStorage, DenseStorage, Entity, WorldId};
use crate::error::ConfigurationError;
use crate::pointer::PointerConstraintSlot;

/// The complete simulated state of one scene
pub struct World {
    id: WorldId,
    next_entity_id: u64,
    bodies: DenseStorage<Body>,
    constraints: DenseStorage<Constraint>,
    boundary: [Entity; 4],
    pointer: PointerConstraintSlot,
    has_pointer_slot: bool,
    gravity: Vec2,
    bounds: Bounds,
}

impl World {
    /// Build a world from a composition
    ///
    /// Fails if the composition is not enclosed by exactly four static walls,
    /// if a content body starts outside them, or if a constraint refers to a
    /// body index that does not exist.
    pub fn from_composition(
        composition: Composition,
        gravity: Vec2,
    ) -> Result<Self, ConfigurationError> {
        let walls: Vec<usize> = composition
            .bodies
            .iter()
            .enumerate()
            .filter(|(_, b)| matches!(b.role, BodyRole::Boundary(_)) && b.is_static)
            .map(|(i, _)| i)
            .collect();
        let boundary_roles = composition
            .bodies
            .iter()
            .filter(|b| matches!(b.role, BodyRole::Boundary(_)))
            .count();
        if walls.len() != 4 || boundary_roles != 4 {
            return Err(ConfigurationError::Boundary { found: walls.len() });
        }
        for body in composition.bodies.iter().filter(|b| b.role == BodyRole::Content) {
            if !composition.bounds.contains(&body.aabb()) {
                return Err(ConfigurationError::OutOfBounds(body.label));
            }
        }

        let id = WorldId::next();
        let mut world = World {
            id,
            next_entity_id: 0,
            bodies: DenseStorage::with_capacity(composition.bodies.len()),
            constraints: DenseStorage::with_capacity(composition.constraints.len()),
            boundary: [Entity::new(0, id); 4],
            pointer: PointerConstraintSlot::Empty,
            has_pointer_slot: composition.pointer_slot,
            gravity,
            bounds: composition.bounds,
        };

        let mut handles = Vec::with_capacity(composition.bodies.len());
        for desc in &composition.bodies {
            let entity = world.spawn();
            world.bodies.insert(entity, desc.build());
            handles.push(entity);
        }
        for (slot, index) in world.boundary.iter_mut().zip(walls) {
            *slot = handles[index];
        }

        let count = handles.len();
        for desc in composition.constraints {
            let constraint = desc.try_map(|index| {
                handles
                    .get(index)
                    .copied()
                    .ok_or(ConfigurationError::BodyIndexOutOfRange { index, count })
            })?;
            let entity = world.spawn();
            world.constraints.insert(entity, constraint);
        }

        log::debug!(
            "built {} for {} scene: {} bodies, {} constraints",
            world.id,
            composition.variant,
            world.body_count(),
            world.constraint_count()
        );
        Ok(world)
    }

    /// Compose a scene and build its world
    pub fn from_scene(
        variant: SceneVariant,
        viewport: Viewport,
        gravity: Vec2,
    ) -> Result<Self, ConfigurationError> {
        Self::from_composition(compose(variant, viewport)?, gravity)
    }

    fn spawn(&mut self) -> Entity {
        let entity = Entity::new(self.next_entity_id, self.id);
        self.next_entity_id += 1;
        entity
    }

    /// Unique id of this world
    pub fn id(&self) -> WorldId {
        self.id
    }

    /// Gravitational acceleration in px/s²
    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    /// Interior of the boundary walls
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// The walls in the order ground, left, right, ceiling
    pub fn boundary(&self) -> [Entity; 4] {
        self.boundary
    }

    /// Check if a handle refers to a body or constraint of this world
    pub fn contains(&self, entity: Entity) -> bool {
        entity.world() == self.id
            && (self.bodies.contains(entity) || self.constraints.contains(entity))
    }

    /// Look up a body
    pub fn body(&self, entity: Entity) -> Option<&Body> {
        self.bodies.get(entity)
    }

    /// Look up a body mutably
    pub fn body_mut(&mut self, entity: Entity) -> Option<&mut Body> {
        self.bodies.get_mut(entity)
    }

    /// Bodies in insertion order
    pub fn bodies(&self) -> impl Iterator<Item = (Entity, &Body)> + '_ {
        self.bodies.iter()
    }

    pub(crate) fn body_slice(&self) -> &[Body] {
        self.bodies.components()
    }

    pub(crate) fn body_slice_mut(&mut self) -> &mut [Body] {
        self.bodies.components_mut()
    }

    pub(crate) fn body_index(&self, entity: Entity) -> Option<usize> {
        self.bodies.index_of(entity)
    }

    /// Number of bodies, walls included
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of dynamic bodies
    pub fn dynamic_body_count(&self) -> usize {
        self.body_slice().iter().filter(|b| !b.is_static()).count()
    }

    /// Number of static bodies, walls included
    pub fn static_body_count(&self) -> usize {
        self.body_count() - self.dynamic_body_count()
    }

    /// Scene constraints in insertion order (the pointer constraint is not included)
    pub fn constraints(&self) -> impl Iterator<Item = (Entity, &Constraint)> + '_ {
        self.constraints.iter()
    }

    /// Look up a scene constraint
    pub fn constraint(&self, entity: Entity) -> Option<&Constraint> {
        self.constraints.get(entity)
    }

    /// Number of scene constraints
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Whether the scene supports a pointer constraint
    pub fn has_pointer_slot(&self) -> bool {
        self.has_pointer_slot
    }

    /// Current pointer constraint slot
    pub fn pointer_slot(&self) -> &PointerConstraintSlot {
        &self.pointer
    }

    pub(crate) fn pointer_slot_mut(&mut self) -> &mut PointerConstraintSlot {
        &mut self.pointer
    }

    /// Number of active pointer constraints (zero or one)
    pub fn active_pointer_constraints(&self) -> usize {
        usize::from(self.pointer.is_engaged())
    }

    /// Topmost dynamic body under a world-space point
    pub fn body_at(&self, point: Vec2) -> Option<Entity> {
        let bodies = self.bodies.components();
        (0..bodies.len())
            .rev()
            .find(|&i| !bodies[i].is_static() && bodies[i].contains_point(point))
            .and_then(|i| self.bodies.entity_at(i))
    }

    /// World-space position of a constraint end, if its body exists
    pub fn anchor_point(&self, anchor: &Anchor<Entity>) -> Option<Vec2> {
        match *anchor {
            Anchor::Point(p) => Some(p),
            Anchor::Body { body, offset } => self.body(body).map(|b| b.local_to_world(offset)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::Wall;

    fn canvas() -> Viewport {
        Viewport::new(800.0, 600.0).unwrap()
    }

    #[test]
    fn test_world_from_each_scene() {
        for variant in SceneVariant::ALL {
            let world = World::from_scene(variant, canvas(), Vec2::new(0.0, 1000.0)).unwrap();
            let walls = world
                .bodies()
                .filter(|(_, b)| matches!(b.role, BodyRole::Boundary(_)))
                .count();
            assert_eq!(walls, 4);
            assert_eq!(world.has_pointer_slot(), variant.supports_drag());
            assert_eq!(world.active_pointer_constraints(), 0);
        }
    }

    #[test]
    fn test_boundary_order() {
        let world = World::from_scene(SceneVariant::Default, canvas(), Vec2::zero()).unwrap();
        let roles: Vec<_> = world.boundary().iter().map(|e| world.body(*e).unwrap().role).collect();
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
    fn test_handles_do_not_cross_worlds() {
        let first = World::from_scene(SceneVariant::Drag, canvas(), Vec2::zero()).unwrap();
        let second = World::from_scene(SceneVariant::Drag, canvas(), Vec2::zero()).unwrap();
        assert_ne!(first.id(), second.id());
        for (entity, _) in first.bodies() {
            assert!(first.contains(entity));
            assert!(!second.contains(entity));
            assert!(second.body(entity).is_none());
        }
    }

    #[test]
    fn test_missing_wall_is_rejected() {
        let mut composition = compose(SceneVariant::Drag, canvas()).unwrap();
        composition.bodies.remove(0);
        assert!(matches!(
            World::from_composition(composition, Vec2::zero()),
            Err(ConfigurationError::Boundary { found: 3 })
        ));
    }

    #[test]
    fn test_dangling_constraint_is_rejected() {
        let mut composition = compose(SceneVariant::Sway, canvas()).unwrap();
        composition.constraints[0].b = Anchor::body(99);
        assert!(matches!(
            World::from_composition(composition, Vec2::zero()),
            Err(ConfigurationError::BodyIndexOutOfRange { index: 99, .. })
        ));
    }

    #[test]
    fn test_body_at_picks_dynamic_only() {
        let world = World::from_scene(SceneVariant::Sway, canvas(), Vec2::zero()).unwrap();
        let hit = world.body_at(Vec2::new(200.0, 200.0)).unwrap();
        assert_eq!(world.body(hit).unwrap().label, "box");
        // The rope anchor is static
        assert!(world.body_at(Vec2::new(400.0, 100.0)).is_none());
        assert!(world.body_at(Vec2::new(700.0, 400.0)).is_none());
    }
}
