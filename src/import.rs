//! Curve-to-template import via arc-length subdivision.

use crate::error::GestureError;
use crate::geom::Vec3;
use crate::store::GestureStore;
use log::{debug, info};

/// Realigned points this close to the local origin are discarded.
const ORIGIN_DROP_TOLERANCE: f32 = 1e-4;

/// Capability surface of an importable 3D curve. Distances are arc
/// lengths measured from the curve start.
pub trait Curve {
    fn control_point_count(&self) -> usize;
    fn control_point(&self, index: usize) -> Vec3;
    fn distance_at_control_point(&self, index: usize) -> f32;
    fn position_at_distance(&self, distance: f32) -> Vec3;

    fn total_length(&self) -> f32 {
        match self.control_point_count() {
            0 => 0.0,
            n => self.distance_at_control_point(n - 1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Sample along the curve itself; `false` walks straight chords
    /// between control points instead.
    pub preserve_curve_shape: bool,
    pub max_segment_length: f32,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            preserve_curve_shape: true,
            max_segment_length: 10.0,
        }
    }
}

/// Convert `curve` into a normalized template appended to `store`,
/// returning its index.
///
/// The curve's first control point becomes the local origin and the
/// lateral axis is rotated a quarter turn into the forward axis, the
/// same frame a live recording produces. Each control segment is split
/// into even sub-segments no longer than `max_segment_length`, with the
/// final sub-point forced exactly onto the control point. The built
/// sequence is reversed once so the curve end comes first. Realigned
/// points landing on the origin are dropped, which always swallows the
/// first control point itself.
pub fn import_curve(
    curve: &dyn Curve,
    name: &str,
    gesture_type: u8,
    options: &ImportOptions,
    store: &mut GestureStore,
) -> Result<usize, GestureError> {
    let count = curve.control_point_count();
    if count < 2 {
        return Err(GestureError::TooFewControlPoints(count));
    }
    let origin = curve.control_point(0);
    let realign = |p: Vec3| (p - origin).yaw_rotated_90();

    let mut points: Vec<Vec3> = Vec::new();
    for seg in 0..count - 1 {
        let start_dist = curve.distance_at_control_point(seg);
        let end_dist = curve.distance_at_control_point(seg + 1);
        let seg_start = curve.control_point(seg);
        let seg_end = curve.control_point(seg + 1);
        let length = if options.preserve_curve_shape {
            end_dist - start_dist
        } else {
            seg_start.dist(&seg_end)
        };
        let subs = ((length / options.max_segment_length).floor() as usize).max(1);
        let step = length / subs as f32;
        for k in 1..=subs {
            let p = if k == subs {
                seg_end
            } else if options.preserve_curve_shape {
                curve.position_at_distance(start_dist + step * k as f32)
            } else {
                let t = step * k as f32 / length;
                seg_start + (seg_end - seg_start) * t
            };
            let local = realign(p);
            if local.is_nearly_zero(ORIGIN_DROP_TOLERANCE) {
                debug!("import: dropped near-origin sample in segment {seg}");
                continue;
            }
            points.push(local);
        }
    }
    if points.is_empty() {
        return Err(GestureError::EmptyImport);
    }
    points.reverse();
    info!(
        "import: curve '{}' produced {} samples from {} control points",
        name,
        points.len(),
        count
    );
    Ok(store.save_recording(&points, name, gesture_type))
}

/// Straight-segment curve over a list of points, with chord-length
/// parameterization.
#[derive(Debug, Clone)]
pub struct Polyline {
    points: Vec<Vec3>,
    cumulative: Vec<f32>,
}

impl Polyline {
    pub fn new(points: Vec<Vec3>) -> Self {
        let mut cumulative = Vec::with_capacity(points.len());
        let mut total = 0.0;
        for (i, p) in points.iter().enumerate() {
            if i > 0 {
                total += p.dist(&points[i - 1]);
            }
            cumulative.push(total);
        }
        Self { points, cumulative }
    }
}

impl Curve for Polyline {
    fn control_point_count(&self) -> usize {
        self.points.len()
    }

    fn control_point(&self, index: usize) -> Vec3 {
        self.points[index]
    }

    fn distance_at_control_point(&self, index: usize) -> f32 {
        self.cumulative[index]
    }

    fn position_at_distance(&self, distance: f32) -> Vec3 {
        if self.points.is_empty() {
            return Vec3::ZERO;
        }
        if distance <= 0.0 {
            return self.points[0];
        }
        for i in 1..self.points.len() {
            if distance <= self.cumulative[i] {
                let span = self.cumulative[i] - self.cumulative[i - 1];
                if span <= 0.0 {
                    return self.points[i];
                }
                let t = (distance - self.cumulative[i - 1]) / span;
                return self.points[i - 1] + (self.points[i] - self.points[i - 1]) * t;
            }
        }
        self.points[self.points.len() - 1]
    }
}
