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
//! Component storage
//!
//! Bodies and constraints are stored densely in insertion order. Dense
//! storage keeps stepping and drawing deterministic: two worlds composed
//! from the same scene iterate their bodies in the same order.

use crate::ecs::Entity;
use std::collections::HashMap;

/// Marker trait for data stored per entity
pub trait Component: 'static + Send + Sync {}

/// Storage interface for components
pub trait ComponentStorage: Send + Sync {
    /// The component type this storage manages
    type Component: Component;

    /// Insert a component for the given entity, replacing any previous value
    fn insert(&mut self, entity: Entity, component: Self::Component);

    /// Get a reference to a component for the given entity
    fn get(&self, entity: Entity) -> Option<&Self::Component>;

    /// Get a mutable reference to a component for the given entity
    fn get_mut(&mut self, entity: Entity) -> Option<&mut Self::Component>;

    /// Check if an entity has this component
    fn contains(&self, entity: Entity) -> bool;

    /// Number of stored components
    fn len(&self) -> usize;

    /// Check if the storage is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all components
    fn clear(&mut self);
}

/// Dense, insertion-ordered component storage
///
/// A sparse map from [`Entity`] to a dense index sits in front of a
/// contiguous `Vec<T>`, so whole-world passes iterate a slice.
///
/// ```
/// use scene_host::composer::{SceneVariant, Viewport};
/// use scene_host::ecs::{Component, ComponentStorage, DenseStorage, World};
///
/// struct Tag(u8);
/// impl Component for Tag {}
///
/// let viewport = Viewport::new(800.0, 600.0).unwrap();
/// let world = World::from_scene(SceneVariant::Default, viewport, Default::default()).unwrap();
/// let ground = world.boundary()[0];
///
/// let mut storage = DenseStorage::<Tag>::new();
/// storage.insert(ground, Tag(7));
/// assert_eq!(storage.get(ground).map(|t| t.0), Some(7));
/// ```
pub struct DenseStorage<T: Component> {
    entity_to_index: HashMap<Entity, usize>,
    index_to_entity: Vec<Entity>,
    components: Vec<T>,
}

impl<T: Component> DenseStorage<T> {
    /// Create a new empty storage
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a new storage with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        DenseStorage {
            entity_to_index: HashMap::with_capacity(capacity),
            index_to_entity: Vec::with_capacity(capacity),
            components: Vec::with_capacity(capacity),
        }
    }

    /// Entities in insertion order
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.index_to_entity.iter().copied()
    }

    /// `(entity, component)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        self.index_to_entity.iter().copied().zip(self.components.iter())
    }

    /// The dense component array
    pub fn components(&self) -> &[T] {
        &self.components
    }

    /// The dense component array, mutably
    pub fn components_mut(&mut self) -> &mut [T] {
        &mut self.components
    }

    /// Dense index of an entity, if present
    pub fn index_of(&self, entity: Entity) -> Option<usize> {
        self.entity_to_index.get(&entity).copied()
    }

    /// Entity stored at a dense index
    pub fn entity_at(&self, index: usize) -> Option<Entity> {
        self.index_to_entity.get(index).copied()
    }
}

impl<T: Component> Default for DenseStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> ComponentStorage for DenseStorage<T> {
    type Component = T;

    fn insert(&mut self, entity: Entity, component: T) {
        if let Some(&index) = self.entity_to_index.get(&entity) {
            self.components[index] = component;
        } else {
            self.entity_to_index.insert(entity, self.components.len());
            self.index_to_entity.push(entity);
            self.components.push(component);
        }
    }

    fn get(&self, entity: Entity) -> Option<&T> {
        self.entity_to_index.get(&entity).map(|&i| &self.components[i])
    }

    fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        match self.entity_to_index.get(&entity) {
            Some(&i) => Some(&mut self.components[i]),
            None => None,
        }
    }

    fn contains(&self, entity: Entity) -> bool {
        self.entity_to_index.contains_key(&entity)
    }

    fn len(&self) -> usize {
        self.components.len()
    }

    fn clear(&mut self) {
        self.entity_to_index.clear();
        self.index_to_entity.clear();
        self.components.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::WorldId;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Weight(u32);
    impl Component for Weight {}

    #[test]
    fn test_insert_preserves_order() {
        let world = WorldId::next();
        let mut storage = DenseStorage::new();
        for i in 0..5 {
            storage.insert(Entity::new(10 - i, world), Weight(i as u32));
        }
        let order: Vec<u32> = storage.components().iter().map(|w| w.0).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
        assert_eq!(storage.entity_at(0), Some(Entity::new(10, world)));
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let world = WorldId::next();
        let e = Entity::new(1, world);
        let mut storage = DenseStorage::new();
        storage.insert(e, Weight(1));
        storage.insert(e, Weight(2));
        assert_eq!(storage.len(), 1);
        assert_eq!(storage.get(e), Some(&Weight(2)));
    }

    #[test]
    fn test_foreign_world_entity_is_absent() {
        let mut storage = DenseStorage::new();
        storage.insert(Entity::new(0, WorldId::next()), Weight(1));
        assert!(!storage.contains(Entity::new(0, WorldId::next())));
    }

    #[test]
    fn test_clear() {
        let world = WorldId::next();
        let mut storage = DenseStorage::new();
        storage.insert(Entity::new(0, world), Weight(1));
        storage.clear();
        assert!(storage.is_empty());
        assert_eq!(storage.entities().count(), 0);
    }
}
