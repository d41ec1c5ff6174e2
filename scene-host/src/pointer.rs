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
//! Pointer interaction
//!
//! The host UI pushes [`PointerEvent`]s into a [`PointerInput`] from any
//! thread. Events are buffered on a channel and applied to the world's
//! [`PointerConstraintSlot`] at the start of the next loop turn, never in the
//! middle of a step.
//!
//! - `Down` over a dynamic body engages a spring between the cursor and the
//!   grab point on that body. Static bodies and empty space are ignored.
//! - `Move` while engaged drags the cursor end of the spring; the body
//!   follows through the constraint solver rather than teleporting.
//! - `Move` with the button held but nothing engaged grabs the body under
//!   the cursor, if any.
//! - `Up` releases the body.

use crate::ecs::components::{Anchor, Constraint, Vec2};
use crate::ecs::{Entity, World, WorldId};
use crate::error::{Error, Result};
use crate::factory::make_pointer_constraint;
use crate::host::HostHandle;
use crate::render::RenderTarget;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

/// A pointer event in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Button pressed
    Down(Vec2),
    /// Cursor moved
    Move(Vec2),
    /// Button released
    Up(Vec2),
}

impl PointerEvent {
    /// Cursor position carried by the event
    pub fn position(&self) -> Vec2 {
        match *self {
            PointerEvent::Down(p) | PointerEvent::Move(p) | PointerEvent::Up(p) => p,
        }
    }
}

/// Buffer the host UI writes pointer events into
///
/// Cheap to clone and `Send`, so it can be handed to whatever thread
/// receives the UI's input events.
#[derive(Debug, Clone)]
pub struct PointerInput {
    tx: Sender<PointerEvent>,
}

impl PointerInput {
    /// Queue an event for the next loop turn
    ///
    /// Returns `false` if the scene this input belonged to has been torn
    /// down; the event is dropped.
    pub fn send(&self, event: PointerEvent) -> bool {
        match self.tx.send(event) {
            Ok(()) => true,
            Err(_) => {
                log::warn!("Pointer event {:?} dropped: scene is gone", event);
                false
            }
        }
    }

    /// Queue a `Down` event
    pub fn press(&self, x: f64, y: f64) -> bool {
        self.send(PointerEvent::Down(Vec2::new(x, y)))
    }

    /// Queue a `Move` event
    pub fn move_to(&self, x: f64, y: f64) -> bool {
        self.send(PointerEvent::Move(Vec2::new(x, y)))
    }

    /// Queue an `Up` event
    pub fn release(&self, x: f64, y: f64) -> bool {
        self.send(PointerEvent::Up(Vec2::new(x, y)))
    }
}

/// Last known cursor position and whether a body is held
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    /// Cursor position in viewport coordinates
    pub position: Vec2,
    /// Whether the pointer constraint is engaged
    pub engaged: bool,
}

/// The pointer constraint of a world
///
/// `Engaged` holds a zero-length spring from the cursor position to a grab
/// point expressed in the held body's local coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum PointerConstraintSlot {
    /// Nothing held
    #[default]
    Empty,
    /// A body is held
    Engaged(Constraint),
}

impl PointerConstraintSlot {
    /// Whether a body is held
    pub fn is_engaged(&self) -> bool {
        matches!(self, PointerConstraintSlot::Engaged(_))
    }

    /// The held body
    pub fn body(&self) -> Option<Entity> {
        self.constraint().and_then(|c| c.b.body_ref().copied())
    }

    /// Cursor end of the spring
    pub fn anchor(&self) -> Option<Vec2> {
        match self.constraint()?.a {
            Anchor::Point(p) => Some(p),
            Anchor::Body { .. } => None,
        }
    }

    /// Grab point in the held body's local coordinates
    pub fn offset(&self) -> Option<Vec2> {
        match self.constraint()?.b {
            Anchor::Body { offset, .. } => Some(offset),
            Anchor::Point(_) => None,
        }
    }

    /// The spring itself
    pub fn constraint(&self) -> Option<&Constraint> {
        match self {
            PointerConstraintSlot::Engaged(c) => Some(c),
            PointerConstraintSlot::Empty => None,
        }
    }

    /// Move the cursor end of the spring; ignored when empty
    pub fn set_anchor(&mut self, point: Vec2) {
        if let PointerConstraintSlot::Engaged(c) = self {
            c.a = Anchor::Point(point);
        }
    }
}

/// Receiving end of a pointer input, owned by the scene
pub(crate) struct PointerAdapter {
    rx: Receiver<PointerEvent>,
    state: PointerState,
    stiffness: f64,
    held: bool,
}

impl PointerAdapter {
    pub(crate) fn new(rx: Receiver<PointerEvent>, stiffness: f64) -> Self {
        PointerAdapter { rx, state: PointerState::default(), stiffness, held: false }
    }

    pub(crate) fn state(&self) -> PointerState {
        self.state
    }

    /// Apply every event buffered since the last turn, in order
    pub(crate) fn apply_pending(&mut self, world: &mut World) -> usize {
        let mut applied = 0;
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    self.apply(world, event);
                    applied += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        applied
    }

    fn apply(&mut self, world: &mut World, event: PointerEvent) {
        let position = event.position();
        if !position.is_valid() {
            log::warn!("Ignoring pointer event with non-finite position: {:?}", event);
            return;
        }
        self.state.position = position;

        match event {
            PointerEvent::Down(p) => {
                self.held = true;
                *world.pointer_slot_mut() = PointerConstraintSlot::Empty;
                self.try_engage(world, p);
            }
            // A held button picks up whatever body the cursor moves onto.
            PointerEvent::Move(p) if self.held && !world.pointer_slot().is_engaged() => {
                self.try_engage(world, p);
            }
            PointerEvent::Move(p) => world.pointer_slot_mut().set_anchor(p),
            PointerEvent::Up(_) => {
                self.held = false;
                if world.pointer_slot().is_engaged() {
                    log::debug!("Pointer released");
                }
                *world.pointer_slot_mut() = PointerConstraintSlot::Empty;
            }
        }
        self.state.engaged = world.pointer_slot().is_engaged();
    }

    fn try_engage(&self, world: &mut World, point: Vec2) {
        if let Some(slot) = self.engage(world, point) {
            log::debug!("Pointer engaged {:?} at {:?}", slot.body(), point);
            *world.pointer_slot_mut() = slot;
        }
    }

    fn engage(&self, world: &World, point: Vec2) -> Option<PointerConstraintSlot> {
        let entity = world.body_at(point)?;
        let offset = world.body(entity)?.world_to_local(point);
        match make_pointer_constraint(point, entity, offset, self.stiffness) {
            Ok(constraint) => Some(PointerConstraintSlot::Engaged(constraint)),
            Err(e) => {
                log::warn!("Pointer constraint rejected: {}", e);
                None
            }
        }
    }
}

/// An attached pointer adapter
#[derive(Debug, Clone)]
pub struct PointerHandle {
    input: PointerInput,
    world: WorldId,
}

impl PointerHandle {
    /// Input buffer for the host UI
    pub fn input(&self) -> PointerInput {
        self.input.clone()
    }

    /// World the adapter is attached to
    pub fn world(&self) -> WorldId {
        self.world
    }
}

/// Attach a pointer adapter to a running scene
///
/// Only drag-capable scenes accept one. Attaching again replaces the
/// previous adapter; inputs handed out by it stop delivering events.
pub fn attach<T: RenderTarget + 'static>(host: &mut HostHandle<T>) -> Result<PointerHandle> {
    let variant = host.variant();
    if !variant.supports_drag() {
        return Err(Error::DragUnsupported(variant));
    }
    let (tx, rx) = mpsc::channel();
    let world = host
        .with_scene_mut(|scene| {
            scene.pointer = Some(PointerAdapter::new(rx, scene.pointer_stiffness()));
            *scene.world.pointer_slot_mut() = PointerConstraintSlot::Empty;
            scene.world.id()
        })
        .ok_or(Error::HostStopped)?;
    log::debug!("Pointer adapter attached to {}", world);
    Ok(PointerHandle { input: PointerInput { tx }, world })
}

/// Remove a pointer adapter and release whatever it held
///
/// Returns `false` if the handle belongs to a different or stopped scene.
pub fn detach<T: RenderTarget + 'static>(host: &mut HostHandle<T>, pointer: PointerHandle) -> bool {
    host.with_scene_mut(|scene| {
        if scene.world.id() != pointer.world {
            return false;
        }
        scene.pointer = None;
        *scene.world.pointer_slot_mut() = PointerConstraintSlot::Empty;
        log::debug!("Pointer adapter detached from {}", pointer.world);
        true
    })
    .unwrap_or(false)
}
