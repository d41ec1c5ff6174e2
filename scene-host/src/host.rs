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
//! Simulation host
//!
//! A [`SimulationHost`] turns a scene variant and a viewport into a running
//! [`Scene`] bound to a render target. Every loop turn is one indivisible
//! unit: buffered pointer events are applied, the [`SimulationClock`] hands
//! out the fixed steps that are due, the step pipeline runs once per step
//! and a single frame is drawn.
//!
//! Two loop drivers are available, picked by [`LoopMode`]:
//!
//! - `Threaded`: a dedicated thread paced at `refresh_hz` runs turns. The
//!   thread holds the scene lock for a whole turn, so observers never see a
//!   half-stepped world.
//! - `Manual`: the host UI calls [`HostHandle::advance_frame`] from its own
//!   display refresh callback; each call is exactly one step and one frame.
//!
//! Stopping joins the loop thread before the world is released, so once
//! [`HostHandle::stop`] returns no frame of that world can be in flight.
//! The render target is handed back to the caller.

use crate::clock::SimulationClock;
use crate::composer::{SceneVariant, Viewport};
use crate::config::{HostConfig, LoopMode};
use crate::ecs::scheduler::{stages, Scheduler};
use crate::ecs::{StepContext, World, WorldId};
use crate::error::{ConfigurationError, Error, Result};
use crate::integration::{validate_timestep, VerletIntegration};
use crate::pointer::{PointerAdapter, PointerState};
use crate::render::{self, Color, FrameInfo, RenderTarget};
use crate::solver::{ConstraintSolver, ContactSolver};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// A composed world together with everything needed to run it
pub struct Scene {
    pub(crate) world: World,
    pub(crate) pointer: Option<PointerAdapter>,
    clock: SimulationClock,
    scheduler: Scheduler,
    variant: SceneVariant,
    viewport: Viewport,
    background: Color,
    wireframes: bool,
    pointer_stiffness: f64,
    frames: u64,
}

impl Scene {
    /// Compose a scene and set up its step pipeline
    pub fn new(
        variant: SceneVariant,
        viewport: Viewport,
        config: &HostConfig,
    ) -> std::result::Result<Self, ConfigurationError> {
        let background = config.background_color()?;
        let world = World::from_scene(variant, viewport, config.gravity)?;

        let mut scheduler = Scheduler::new();
        scheduler.add_system(VerletIntegration, stages::INTEGRATION);
        scheduler.add_system(
            ConstraintSolver::new(config.constraint_iterations),
            stages::CONSTRAINTS,
        );
        scheduler.add_system(ContactSolver::new(config.position_iterations), stages::CONTACTS);

        Ok(Scene {
            world,
            pointer: None,
            clock: SimulationClock::new(config.timestep, config.max_substeps),
            scheduler,
            variant,
            viewport,
            background,
            wireframes: config.wireframes,
            pointer_stiffness: config.pointer_stiffness,
            frames: 0,
        })
    }

    /// The simulated world
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Scene variant this world was composed from
    pub fn variant(&self) -> SceneVariant {
        self.variant
    }

    /// Viewport this world was composed for
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// The fixed-step clock
    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    /// The step pipeline
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Frames drawn so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Cursor state, if a pointer adapter is attached
    pub fn pointer_state(&self) -> Option<PointerState> {
        self.pointer.as_ref().map(PointerAdapter::state)
    }

    pub(crate) fn pointer_stiffness(&self) -> f64 {
        self.pointer_stiffness
    }

    /// Run one fixed step of the pipeline
    pub fn step(&mut self) -> StepContext {
        let ctx = self.clock.tick();
        self.scheduler.run(&mut self.world, &ctx);
        ctx
    }

    /// One loop turn; `None` takes exactly one step
    fn turn(
        &mut self,
        frame_time: Option<f64>,
        target: &mut (impl RenderTarget + ?Sized),
    ) -> FrameInfo {
        if let Some(pointer) = self.pointer.as_mut() {
            pointer.apply_pending(&mut self.world);
        }
        let due = match frame_time {
            Some(elapsed) => self.clock.advance(elapsed),
            None => 1,
        };
        for _ in 0..due {
            self.step();
        }

        self.frames += 1;
        let info = FrameInfo {
            world: self.world.id(),
            variant: self.variant,
            frame: self.frames,
            step: self.clock.steps(),
        };
        render::draw_frame(&self.world, target, &info, self.background, self.wireframes);
        log::trace!("{} frame {} at step {}", info.world, info.frame, info.step);
        info
    }
}

/// Error returned by [`SimulationHost::start`]
///
/// Starting consumes the render target; on failure it is handed back here.
pub struct StartError<T> {
    error: Error,
    target: Option<T>,
}

impl<T> StartError<T> {
    fn new(error: Error, target: Option<T>) -> Self {
        StartError { error, target }
    }

    /// Why the start failed
    pub fn error(&self) -> &Error {
        &self.error
    }

    /// Recover the render target
    pub fn into_target(self) -> Option<T> {
        self.target
    }

    /// Split into the error and the render target
    pub fn into_parts(self) -> (Error, Option<T>) {
        (self.error, self.target)
    }
}

impl<T> fmt::Debug for StartError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StartError")
            .field("error", &self.error)
            .field("target_returned", &self.target.is_some())
            .finish()
    }
}

impl<T> fmt::Display for StartError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl<T> std::error::Error for StartError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<T> From<StartError<T>> for Error {
    fn from(err: StartError<T>) -> Self {
        err.error
    }
}

/// Builds scenes and binds them to render targets
#[derive(Debug, Clone)]
pub struct SimulationHost {
    config: HostConfig,
}

impl SimulationHost {
    /// Create a host after validating `config`
    pub fn new(config: HostConfig) -> Result<Self> {
        config.validate()?;
        if let Err(warning) = validate_timestep(config.timestep) {
            log::warn!("{}", warning);
        }
        Ok(SimulationHost { config })
    }

    /// Host configuration
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Compose `variant` for `viewport`, bind `target` and start the loop
    pub fn start<T: RenderTarget + 'static>(
        &self,
        variant: SceneVariant,
        viewport: Viewport,
        target: T,
    ) -> std::result::Result<HostHandle<T>, StartError<T>> {
        let scene = match Scene::new(variant, viewport, &self.config) {
            Ok(scene) => scene,
            Err(e) => {
                log::debug!("Failed to compose {} scene: {}", variant, e);
                return Err(StartError::new(e.into(), Some(target)));
            }
        };
        let world = scene.world.id();
        let shared =
            Arc::new(Mutex::new(Slot { scene: Some(scene), target: Some(target), frames: 0 }));

        let driver = match self.config.loop_mode {
            LoopMode::Manual => Driver::Manual,
            LoopMode::Threaded => {
                let spawned = self
                    .config
                    .frame_period()
                    .map_err(Error::from)
                    .and_then(|period| {
                        spawn_loop(Arc::clone(&shared), period, world).map_err(Error::LoopSpawn)
                    });
                match spawned {
                    Ok(driver) => driver,
                    Err(e) => {
                        let target = lock(&shared).target.take();
                        return Err(StartError::new(e, target));
                    }
                }
            }
        };

        log::info!("Started {} scene as {} ({:?} loop)", variant, world, self.config.loop_mode);
        Ok(HostHandle { shared, driver, variant, viewport, world })
    }

    /// Stop a running scene and take its render target back
    pub fn stop<T: RenderTarget + 'static>(&self, handle: &mut HostHandle<T>) -> Option<T> {
        handle.stop()
    }

    /// Stop `handle`, then start `variant` on the same render target
    ///
    /// The old loop is fully halted and its world released before the new
    /// scene is composed.
    pub fn rebuild<T: RenderTarget + 'static>(
        &self,
        mut handle: HostHandle<T>,
        variant: SceneVariant,
        viewport: Viewport,
    ) -> std::result::Result<HostHandle<T>, StartError<T>> {
        log::debug!("Rebuilding {} as {} scene", handle.world, variant);
        let target = handle.stop().ok_or_else(|| StartError::new(Error::HostStopped, None))?;
        self.start(variant, viewport, target)
    }
}

struct Slot<T> {
    scene: Option<Scene>,
    target: Option<T>,
    frames: u64,
}

enum Driver {
    Manual,
    Threaded { running: Arc<AtomicBool>, thread: Option<JoinHandle<()>> },
    Stopped,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One turn on whatever is bound; `None` once the binding is gone
fn run_turn<T: RenderTarget>(slot: &mut Slot<T>, frame_time: Option<f64>) -> Option<FrameInfo> {
    let attached = slot.target.as_ref().is_some_and(|t| t.is_attached());
    if !attached {
        if let Some(scene) = slot.scene.take() {
            log::info!("Render target detached; releasing {}", scene.world.id());
        }
        return None;
    }
    let (Some(scene), Some(target)) = (slot.scene.as_mut(), slot.target.as_mut()) else {
        return None;
    };
    let info = scene.turn(frame_time, target);
    slot.frames = info.frame;
    Some(info)
}

fn spawn_loop<T: RenderTarget + 'static>(
    shared: Arc<Mutex<Slot<T>>>,
    period: Duration,
    world: WorldId,
) -> std::io::Result<Driver> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);

    let thread = thread::Builder::new().name(format!("scene-loop-{}", world.raw())).spawn(move || {
        let mut last: Option<Instant> = None;
        while flag.load(Ordering::Acquire) {
            let started = Instant::now();
            let frame_time =
                last.map_or(period.as_secs_f64(), |l| started.duration_since(l).as_secs_f64());
            last = Some(started);
            {
                let mut slot = lock(&shared);
                // Stop may have been requested while this thread waited for the lock.
                if !flag.load(Ordering::Acquire) {
                    break;
                }
                if run_turn(&mut *slot, Some(frame_time)).is_none() {
                    flag.store(false, Ordering::Release);
                    break;
                }
            }
            if let Some(rest) = period.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }
        log::debug!("Loop thread of {} exiting", world);
    })?;

    Ok(Driver::Threaded { running, thread: Some(thread) })
}

/// A running scene bound to a render target
///
/// Dropping a handle that was not stopped stops it and logs a warning.
pub struct HostHandle<T: RenderTarget + 'static> {
    shared: Arc<Mutex<Slot<T>>>,
    driver: Driver,
    variant: SceneVariant,
    viewport: Viewport,
    world: WorldId,
}

impl<T: RenderTarget + 'static> HostHandle<T> {
    /// Scene variant being run
    pub fn variant(&self) -> SceneVariant {
        self.variant
    }

    /// Viewport the scene was composed for
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Identity of the world being run
    pub fn world_id(&self) -> WorldId {
        self.world
    }

    /// Whether the loop is live: not stopped, not panicked, and the target
    /// still attached
    pub fn is_running(&self) -> bool {
        if self.shared.is_poisoned() {
            return false;
        }
        match &self.driver {
            Driver::Stopped => false,
            Driver::Manual => lock(&self.shared).scene.is_some(),
            Driver::Threaded { running, thread } => {
                let alive = thread.as_ref().is_some_and(|t| !t.is_finished());
                alive && running.load(Ordering::Acquire) && lock(&self.shared).scene.is_some()
            }
        }
    }

    /// Frames drawn from this world so far
    pub fn frames_drawn(&self) -> u64 {
        lock(&self.shared).frames
    }

    /// Report a loop thread panic
    pub fn check(&self) -> Result<()> {
        if self.shared.is_poisoned() {
            return Err(Error::LoopPanicked);
        }
        match self.driver {
            Driver::Stopped => Err(Error::HostStopped),
            _ => Ok(()),
        }
    }

    /// Inspect the world between turns
    pub fn with_world<R>(&self, f: impl FnOnce(&World) -> R) -> Option<R> {
        self.with_scene(|scene| f(&scene.world))
    }

    /// Inspect the scene between turns
    pub fn with_scene<R>(&self, f: impl FnOnce(&Scene) -> R) -> Option<R> {
        lock(&self.shared).scene.as_ref().map(f)
    }

    pub(crate) fn with_scene_mut<R>(&self, f: impl FnOnce(&mut Scene) -> R) -> Option<R> {
        lock(&self.shared).scene.as_mut().map(f)
    }

    /// Run one turn on the caller's thread: one fixed step, one frame
    ///
    /// Only available with [`LoopMode::Manual`]. A detached render target
    /// stops the scene and yields [`Error::HostStopped`].
    pub fn advance_frame(&mut self) -> Result<FrameInfo> {
        match self.driver {
            Driver::Threaded { .. } => Err(Error::ManualStepInThreadedMode),
            Driver::Stopped => Err(Error::HostStopped),
            Driver::Manual => run_turn(&mut *lock(&self.shared), None).ok_or(Error::HostStopped),
        }
    }

    /// Halt the loop, release the world and return the render target
    ///
    /// Returns `None` when already stopped.
    pub fn stop(&mut self) -> Option<T> {
        match std::mem::replace(&mut self.driver, Driver::Stopped) {
            Driver::Stopped => return None,
            Driver::Manual => {}
            Driver::Threaded { running, thread } => {
                running.store(false, Ordering::Release);
                if let Some(thread) = thread {
                    if thread.join().is_err() {
                        log::error!("Loop thread of {} panicked", self.world);
                    }
                }
            }
        }

        let mut slot = lock(&self.shared);
        let scene = slot.scene.take();
        let target = slot.target.take();
        log::info!("Stopped {} after {} frames", self.world, slot.frames);
        drop(scene);
        target
    }
}

impl<T: RenderTarget + 'static> fmt::Debug for HostHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostHandle")
            .field("world", &self.world)
            .field("variant", &self.variant)
            .field("stopped", &matches!(self.driver, Driver::Stopped))
            .finish()
    }
}

impl<T: RenderTarget + 'static> Drop for HostHandle<T> {
    fn drop(&mut self) {
        if !matches!(self.driver, Driver::Stopped) {
            log::warn!("Host handle of {} dropped while running; stopping it", self.world);
            drop(self.stop());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::Vec2;
    use crate::render::{Paint, Stroke};

    #[derive(Clone, Default)]
    struct Recorder {
        frames: Arc<Mutex<Vec<FrameInfo>>>,
        detached: Arc<AtomicBool>,
        alive: Arc<()>,
    }

    impl RenderTarget for Recorder {
        fn begin_frame(&mut self, frame: &FrameInfo, _background: Color) {
            self.frames.lock().unwrap().push(*frame);
        }
        fn draw_circle(&mut self, _center: Vec2, _radius: f64, _paint: &Paint) {}
        fn draw_polygon(&mut self, _points: &[Vec2], _paint: &Paint) {}
        fn draw_line(&mut self, _from: Vec2, _to: Vec2, _stroke: &Stroke) {}
        fn is_attached(&self) -> bool {
            !self.detached.load(Ordering::SeqCst)
        }
    }

    fn canvas() -> Viewport {
        Viewport::new(800.0, 600.0).unwrap()
    }

    fn manual_host() -> SimulationHost {
        SimulationHost::new(HostConfig::default().manual()).unwrap()
    }

    fn wait_for(mut done: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done() {
            assert!(Instant::now() < deadline, "timed out");
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = HostConfig::default().with_timestep(0.0);
        assert!(matches!(SimulationHost::new(config), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_manual_frame_is_one_step() {
        let host = manual_host();
        let recorder = Recorder::default();
        let mut handle = host.start(SceneVariant::Sway, canvas(), recorder.clone()).unwrap();

        let first = handle.advance_frame().unwrap();
        let second = handle.advance_frame().unwrap();
        assert_eq!((first.frame, first.step), (1, 1));
        assert_eq!((second.frame, second.step), (2, 2));
        assert_eq!(first.world, handle.world_id());
        assert_eq!(recorder.frames.lock().unwrap().len(), 2);
        assert_eq!(handle.frames_drawn(), 2);
        handle.stop();
    }

    #[test]
    fn test_start_failure_returns_target() {
        let host = manual_host();
        let tiny = Viewport::new(100.0, 100.0).unwrap();
        let err = host.start(SceneVariant::Sway, tiny, Recorder::default()).unwrap_err();
        assert!(matches!(
            err.error(),
            Error::Configuration(ConfigurationError::ViewportTooSmall { .. })
        ));
        assert!(err.into_target().is_some());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let host = manual_host();
        let recorder = Recorder::default();
        let mut handle = host.start(SceneVariant::Drag, canvas(), recorder.clone()).unwrap();
        assert!(handle.is_running());
        assert!(host.stop(&mut handle).is_some());
        assert!(host.stop(&mut handle).is_none());
        assert!(!handle.is_running());
        assert!(handle.with_world(|w| w.body_count()).is_none());
        assert!(matches!(handle.advance_frame(), Err(Error::HostStopped)));
    }

    #[test]
    fn test_threaded_loop_draws_and_stops() {
        let host = SimulationHost::new(HostConfig::default().with_refresh_hz(240.0)).unwrap();
        let recorder = Recorder::default();
        let mut handle = host.start(SceneVariant::Default, canvas(), recorder.clone()).unwrap();
        assert!(matches!(handle.advance_frame(), Err(Error::ManualStepInThreadedMode)));

        wait_for(|| handle.frames_drawn() >= 3);
        assert!(handle.stop().is_some());
        let drawn = recorder.frames.lock().unwrap().len();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(recorder.frames.lock().unwrap().len(), drawn);
    }

    #[test]
    fn test_detached_target_stops_loop() {
        let host = manual_host();
        let recorder = Recorder::default();
        let mut handle = host.start(SceneVariant::Drag, canvas(), recorder.clone()).unwrap();
        handle.advance_frame().unwrap();
        recorder.detached.store(true, Ordering::SeqCst);

        assert!(matches!(handle.advance_frame(), Err(Error::HostStopped)));
        assert!(!handle.is_running());
        assert!(handle.with_world(|_| ()).is_none());
        assert!(handle.stop().is_some());
    }

    #[test]
    fn test_drop_guard_releases_target() {
        let host = SimulationHost::new(HostConfig::default().with_refresh_hz(240.0)).unwrap();
        let recorder = Recorder::default();
        let handle = host.start(SceneVariant::Sway, canvas(), recorder.clone()).unwrap();
        wait_for(|| handle.frames_drawn() >= 1);
        drop(handle);
        assert_eq!(Arc::strong_count(&recorder.alive), 1);
    }

    #[test]
    fn test_rebuild_changes_world() {
        let host = manual_host();
        let mut handle = host.start(SceneVariant::Sway, canvas(), Recorder::default()).unwrap();
        handle.advance_frame().unwrap();
        let old = handle.world_id();

        let mut handle = host.rebuild(handle, SceneVariant::Drag, canvas()).unwrap();
        assert_ne!(handle.world_id(), old);
        assert_eq!(handle.variant(), SceneVariant::Drag);
        assert_eq!(handle.frames_drawn(), 0);
        assert_eq!(handle.advance_frame().unwrap().frame, 1);
    }

    #[test]
    fn test_scene_pipeline_order() {
        let scene = Scene::new(SceneVariant::Sway, canvas(), &HostConfig::default()).unwrap();
        assert_eq!(
            scene.scheduler().system_names(),
            vec!["VerletIntegration", "ConstraintSolver", "ContactSolver"]
        );
    }
}
