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
//! Entity Component System core
//!
//! This module provides the storage layer of the simulation:
//! - World-scoped entity handles
//! - Dense, insertion-ordered component storage
//! - Body and constraint components
//! - The staged system scheduler that advances a world by one step

mod entity;
mod component;
mod system;
mod world;

pub mod components;
pub mod scheduler;

pub use entity::{Entity, EntityId, WorldId};
pub use component::{Component, ComponentStorage, DenseStorage};
pub use system::{StepContext, System};
pub use world::World;
