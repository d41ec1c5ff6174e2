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
//! Position-based solvers
//!
//! Both solvers run after integration and move bodies directly. The change
//! they make to a body's velocity is expressed by adjusting its previous
//! position, which position Verlet reads back on the next step.
//!
//! Bodies only translate: constraints act on the attachment points but apply
//! no torque, and contacts are resolved on bounding volumes.

mod constraints;
mod contacts;

pub use constraints::ConstraintSolver;
pub use contacts::ContactSolver;

use crate::ecs::components::Body;

/// Two distinct bodies of a slice, mutably; requires `i < j`
pub(crate) fn pair_mut(bodies: &mut [Body], i: usize, j: usize) -> (&mut Body, &mut Body) {
    debug_assert!(i < j);
    let (lo, hi) = bodies.split_at_mut(j);
    (&mut lo[i], &mut hi[0])
}
