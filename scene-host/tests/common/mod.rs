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
//! Shared render target for integration tests

#![allow(dead_code)]

use scene_host::ecs::components::Vec2;
use scene_host::render::{Color, FrameInfo, Paint, RenderTarget, Stroke};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// One recorded drawing call
#[derive(Debug, Clone, PartialEq)]
pub enum Drawn {
    Circle { center: Vec2, radius: f64, paint: Paint },
    Polygon { points: Vec<Vec2>, paint: Paint },
    Line { from: Vec2, to: Vec2, stroke: Stroke },
}

#[derive(Debug, Default)]
struct Log {
    frames: Vec<(FrameInfo, Color)>,
    current: Vec<Drawn>,
    last_frame: Vec<Drawn>,
    open: bool,
}

/// A render target that records everything drawn onto it
///
/// Clones share the same log, so a test can keep one clone while the host
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingTarget {
    log: Arc<Mutex<Log>>,
    detached: Arc<AtomicBool>,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<FrameInfo> {
        self.log.lock().unwrap().frames.iter().map(|(f, _)| *f).collect()
    }

    pub fn frame_count(&self) -> usize {
        self.log.lock().unwrap().frames.len()
    }

    pub fn backgrounds(&self) -> Vec<Color> {
        self.log.lock().unwrap().frames.iter().map(|(_, c)| *c).collect()
    }

    /// Commands of the last completed frame
    pub fn last_frame(&self) -> Vec<Drawn> {
        self.log.lock().unwrap().last_frame.clone()
    }

    /// Whether a frame is currently between begin and end
    pub fn frame_open(&self) -> bool {
        self.log.lock().unwrap().open
    }

    pub fn detach(&self) {
        self.detached.store(true, Ordering::SeqCst);
    }
}

impl RenderTarget for RecordingTarget {
    fn begin_frame(&mut self, frame: &FrameInfo, background: Color) {
        let mut log = self.log.lock().unwrap();
        assert!(!log.open, "frame began twice");
        log.open = true;
        log.current.clear();
        log.frames.push((*frame, background));
    }

    fn draw_circle(&mut self, center: Vec2, radius: f64, paint: &Paint) {
        self.log.lock().unwrap().current.push(Drawn::Circle { center, radius, paint: *paint });
    }

    fn draw_polygon(&mut self, points: &[Vec2], paint: &Paint) {
        let drawn = Drawn::Polygon { points: points.to_vec(), paint: *paint };
        self.log.lock().unwrap().current.push(drawn);
    }

    fn draw_line(&mut self, from: Vec2, to: Vec2, stroke: &Stroke) {
        self.log.lock().unwrap().current.push(Drawn::Line { from, to, stroke: *stroke });
    }

    fn end_frame(&mut self) {
        let mut log = self.log.lock().unwrap();
        log.open = false;
        let frame = std::mem::take(&mut log.current);
        log.last_frame = frame;
    }

    fn is_attached(&self) -> bool {
        !self.detached.load(Ordering::SeqCst)
    }
}

/// Poll until `done` holds, failing after five seconds
pub fn wait_for(mut done: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done() {
        assert!(Instant::now() < deadline, "timed out waiting for condition");
        thread::sleep(Duration::from_millis(2));
    }
}
