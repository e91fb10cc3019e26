//! Real-time 3D motion-gesture recognition: live-buffer recording,
//! template normalization, and slope-constrained dynamic time warping
//! with left/right mirroring.

pub mod db;
pub mod dtw;
pub mod error;
pub mod geom;
pub mod import;
pub mod logging;
pub mod normalize;
pub mod recorder;
pub mod source;
pub mod store;
pub mod tick;

pub use dtw::{Detection, MatchOutcome};
pub use error::GestureError;
pub use geom::{BoundingBox, Vec3};
pub use recorder::{Axis, DetectionState, GestureRecorder, RecordingConfig};
pub use source::{PositionSource, ReplaySource, TrackingSpace};
pub use store::{Gesture, GestureSettings, GestureStore, MirrorMode};
pub use tick::{Scheduler, StepScheduler, TickHandle};
