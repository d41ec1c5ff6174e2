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
//! Scene lifecycle controller
//!
//! The controller owns the render target and at most one running scene.
//! Selecting another variant or resizing the viewport tears the running
//! scene down completely before the new one is composed, so worlds never
//! overlap and constraints never carry over.
//!
//! ```text
//! Unmounted --mount--> Active(v) --select/resize--> Active(v')
//!     ^                    |
//!     +------unmount-------+
//! ```
//!
//! A failed mount or switch leaves the controller `Unmounted` with the
//! render target back in its hands.

use crate::composer::{SceneVariant, Viewport};
use crate::config::HostConfig;
use crate::ecs::World;
use crate::error::{Error, Result};
use crate::host::{HostHandle, SimulationHost, StartError};
use crate::pointer::{self, PointerEvent, PointerHandle, PointerInput};
use crate::render::{FrameInfo, RenderTarget};

/// Lifecycle state of a [`SceneController`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// No scene is running
    Unmounted,
    /// A scene of this variant is running
    Active(SceneVariant),
}

struct ActiveScene<T: RenderTarget + 'static> {
    handle: HostHandle<T>,
    pointer: Option<PointerHandle>,
}

/// Owns the render target and drives scene selection
pub struct SceneController<T: RenderTarget + 'static> {
    host: SimulationHost,
    target: Option<T>,
    active: Option<ActiveScene<T>>,
}

impl<T: RenderTarget + 'static> SceneController<T> {
    /// Create an unmounted controller
    pub fn new(target: T, config: HostConfig) -> Result<Self> {
        let host = SimulationHost::new(config)?;
        Ok(SceneController { host, target: Some(target), active: None })
    }

    /// Current lifecycle state
    pub fn state(&self) -> ControllerState {
        match &self.active {
            Some(active) => ControllerState::Active(active.handle.variant()),
            None => ControllerState::Unmounted,
        }
    }

    /// The host used to start scenes
    pub fn host(&self) -> &SimulationHost {
        &self.host
    }

    /// Start `variant`; drag variants get a pointer adapter
    pub fn mount(&mut self, variant: SceneVariant, viewport: Viewport) -> Result<()> {
        if let Some(active) = &self.active {
            return Err(Error::AlreadyMounted(active.handle.variant()));
        }
        let target = self.target.take().ok_or(Error::HostStopped)?;
        let started = self.host.start(variant, viewport, target);
        self.activate(started)
    }

    /// Switch to another variant on the current viewport
    pub fn select(&mut self, variant: SceneVariant) -> Result<()> {
        let viewport = self.active.as_ref().ok_or(Error::NotMounted)?.handle.viewport();
        self.switch(variant, viewport)
    }

    /// Recompose the current variant for a new viewport
    pub fn resize(&mut self, viewport: Viewport) -> Result<()> {
        let variant = self.active.as_ref().ok_or(Error::NotMounted)?.handle.variant();
        self.switch(variant, viewport)
    }

    /// Stop the running scene, if any
    pub fn unmount(&mut self) {
        let Some(ActiveScene { mut handle, pointer }) = self.active.take() else {
            return;
        };
        if let Some(pointer) = pointer {
            pointer::detach(&mut handle, pointer);
        }
        let world = handle.world_id();
        match handle.stop() {
            Some(target) => self.target = Some(target),
            None => log::warn!("{} was stopped without returning its render target", world),
        }
        log::debug!("Controller unmounted {}", world);
    }

    /// Route a pointer event to the running scene
    ///
    /// Returns `false` when the event was dropped because no drag scene is
    /// running.
    pub fn forward_pointer(&self, event: PointerEvent) -> bool {
        match self.active.as_ref().and_then(|a| a.pointer.as_ref()) {
            Some(pointer) => pointer.input().send(event),
            None => {
                log::debug!("No pointer adapter attached; dropping {:?}", event);
                false
            }
        }
    }

    /// Input buffer of the running scene's pointer adapter
    ///
    /// The buffer is tied to the current world; after a switch fetch it again.
    pub fn pointer_input(&self) -> Option<PointerInput> {
        self.active.as_ref()?.pointer.as_ref().map(PointerHandle::input)
    }

    /// Handle of the running scene
    pub fn handle(&self) -> Option<&HostHandle<T>> {
        self.active.as_ref().map(|a| &a.handle)
    }

    /// Mutable handle of the running scene
    pub fn handle_mut(&mut self) -> Option<&mut HostHandle<T>> {
        self.active.as_mut().map(|a| &mut a.handle)
    }

    /// Run one manual turn of the running scene
    pub fn advance_frame(&mut self) -> Result<FrameInfo> {
        self.active.as_mut().ok_or(Error::NotMounted)?.handle.advance_frame()
    }

    /// Inspect the running world
    pub fn with_world<R>(&self, f: impl FnOnce(&World) -> R) -> Option<R> {
        self.active.as_ref()?.handle.with_world(f)
    }

    /// Unmount and give the render target back
    pub fn into_target(mut self) -> Option<T> {
        self.unmount();
        self.target.take()
    }

    fn switch(&mut self, variant: SceneVariant, viewport: Viewport) -> Result<()> {
        let active = self.active.take().ok_or(Error::NotMounted)?;
        if active.handle.variant() == variant && active.handle.viewport() == viewport {
            self.active = Some(active);
            return Ok(());
        }
        let ActiveScene { handle, pointer } = active;
        drop(pointer);
        log::debug!("Switching {} ({}) to {}", handle.world_id(), handle.variant(), variant);
        let started = self.host.rebuild(handle, variant, viewport);
        self.activate(started)
    }

    fn activate(
        &mut self,
        started: std::result::Result<HostHandle<T>, StartError<T>>,
    ) -> Result<()> {
        let mut handle = match started {
            Ok(handle) => handle,
            Err(err) => {
                let (error, target) = err.into_parts();
                self.target = target;
                log::debug!("Scene failed to start, controller unmounted: {}", error);
                return Err(error);
            }
        };

        let pointer = if handle.variant().supports_drag() {
            match pointer::attach(&mut handle) {
                Ok(pointer) => Some(pointer),
                Err(e) => {
                    self.target = handle.stop();
                    return Err(e);
                }
            }
        } else {
            None
        };

        log::debug!("Controller active on {} ({})", handle.world_id(), handle.variant());
        self.active = Some(ActiveScene { handle, pointer });
        Ok(())
    }
}

impl<T: RenderTarget + 'static> Drop for SceneController<T> {
    fn drop(&mut self) {
        self.unmount();
    }
}
