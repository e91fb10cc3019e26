//! Live sample buffer and the Recording/Detecting state machine.

use crate::dtw::{self, Detection};
use crate::error::GestureError;
use crate::geom::Vec3;
use crate::source::{PositionSource, TrackingSpace};
use crate::store::{GestureStore, MirrorMode};
use crate::tick::{Scheduler, TickHandle};
use log::{debug, info};
use std::collections::VecDeque;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectionState {
    #[default]
    Idle,
    Recording,
    Detecting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Detecting instead of plain Recording.
    pub run_detection: bool,
    /// Zero one axis of every captured position, confining the trace
    /// to a plane. `None` keeps the full 3D position.
    pub flatten_axis: Option<Axis>,
    pub sampling_period: Duration,
    pub buffer_capacity: usize,
    /// Snap grid for captured coordinates; 0 disables snapping.
    pub clamp_tolerance: f32,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            run_detection: false,
            flatten_axis: Some(Axis::X),
            sampling_period: Duration::from_micros(33_333),
            buffer_capacity: 60,
            clamp_tolerance: 0.01,
        }
    }
}

impl RecordingConfig {
    pub fn validate(&self) -> Result<(), GestureError> {
        if self.buffer_capacity == 0 {
            return Err(GestureError::InvalidConfig {
                reason: "buffer capacity must be at least 1".into(),
            });
        }
        if self.sampling_period.is_zero() {
            return Err(GestureError::InvalidConfig {
                reason: "sampling period must be positive".into(),
            });
        }
        if self.clamp_tolerance < 0.0 {
            return Err(GestureError::InvalidConfig {
                reason: "clamp tolerance must not be negative".into(),
            });
        }
        Ok(())
    }
}

pub struct GestureRecorder {
    state: DetectionState,
    buffer: VecDeque<Vec3>,
    config: RecordingConfig,
    tick_handle: Option<TickHandle>,
    /// Squared-distance floor below which a capture is treated as a
    /// duplicate of the previous sample.
    pub same_sample_tolerance: f32,
    pub mirroring_hand: MirrorMode,
    pub max_slope: u32,
    pub tracking_space: TrackingSpace,
    observers: Vec<Box<dyn FnMut(&Detection)>>,
}

impl Default for GestureRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureRecorder {
    pub fn new() -> Self {
        Self {
            state: DetectionState::Idle,
            buffer: VecDeque::new(),
            config: RecordingConfig::default(),
            tick_handle: None,
            same_sample_tolerance: 0.1,
            mirroring_hand: MirrorMode::None,
            max_slope: 3,
            tracking_space: TrackingSpace::World,
            observers: Vec::new(),
        }
    }

    pub fn state(&self) -> DetectionState {
        self.state
    }

    pub fn samples(&self) -> impl Iterator<Item = &Vec3> {
        self.buffer.iter()
    }

    /// Register a synchronous observer for winning detections.
    pub fn on_gesture_detected(&mut self, observer: impl FnMut(&Detection) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Start a session. A stale registration from an un-ended previous
    /// session is cancelled first, so restarts never leak ticks.
    pub fn begin_recording(
        &mut self,
        scheduler: &mut dyn Scheduler,
        config: RecordingConfig,
    ) -> Result<(), GestureError> {
        config.validate()?;
        if let Some(handle) = self.tick_handle.take() {
            scheduler.cancel(handle);
        }
        self.buffer = VecDeque::with_capacity(config.buffer_capacity);
        self.state = if config.run_detection {
            DetectionState::Detecting
        } else {
            DetectionState::Recording
        };
        self.tick_handle = Some(scheduler.register(config.sampling_period));
        info!(
            "recorder: session started ({:?}, capacity {}, period {:?})",
            self.state, config.buffer_capacity, config.sampling_period
        );
        self.config = config;
        Ok(())
    }

    /// One periodic capture. Samples the position source, filters the
    /// point, pushes it with FIFO eviction, and when Detecting sweeps
    /// the store if the buffer changed this tick.
    pub fn capture_frame(
        &mut self,
        source: &mut dyn PositionSource,
        store: &GestureStore,
    ) -> Option<Detection> {
        if self.state == DetectionState::Idle {
            return None;
        }
        let mut pos = source.current_position(self.tracking_space);
        match self.config.flatten_axis {
            Some(Axis::X) => pos.x = 0.0,
            Some(Axis::Y) => pos.y = 0.0,
            Some(Axis::Z) => pos.z = 0.0,
            None => {}
        }
        if self.config.clamp_tolerance > 0.0 {
            pos = pos.grid_snap(self.config.clamp_tolerance);
        }
        if let Some(last) = self.buffer.back() {
            if pos.dist_squared(last) < self.same_sample_tolerance {
                debug!("recorder: duplicate sample suppressed");
                return None;
            }
        }
        if self.buffer.len() == self.config.buffer_capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(pos);

        if self.state != DetectionState::Detecting {
            return None;
        }
        let live = self.buffer.make_contiguous();
        let detection = dtw::scan_store(store, live, self.mirroring_hand, self.max_slope)?;
        info!(
            "recorder: detected '{}' (index {}, distance {:.3})",
            detection.name, detection.index, detection.distance
        );
        for observer in &mut self.observers {
            observer(&detection);
        }
        Some(detection)
    }

    /// End the session: cancel the tick registration, go Idle, and hand
    /// back the accumulated trace. The buffer itself is retained until
    /// the next `begin_recording` or `clear_recording`.
    pub fn end_recording(&mut self, scheduler: &mut dyn Scheduler) -> Vec<Vec3> {
        if let Some(handle) = self.tick_handle.take() {
            scheduler.cancel(handle);
        }
        self.state = DetectionState::Idle;
        let trace: Vec<Vec3> = self.buffer.iter().copied().collect();
        info!("recorder: session ended ({} samples)", trace.len());
        trace
    }

    /// Drop buffered samples without changing state or capacity.
    pub fn clear_recording(&mut self) {
        self.buffer.clear();
    }
}
