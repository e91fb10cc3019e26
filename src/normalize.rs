//! Canonical rescale of point sequences to a target extent.

use crate::geom::{BoundingBox, Vec3};
use log::warn;

const MIN_EXTENT: f32 = 1e-6;

/// Uniformly rescale `samples` and `bounds` so the box's largest
/// dimension equals `target_extent`. Returns the applied factor.
///
/// A degenerate box (zero extent) is left untouched with factor 1.0;
/// the sequence carries no size to normalize.
pub fn rescale(samples: &mut [Vec3], bounds: &mut BoundingBox, target_extent: f32) -> f32 {
    let max_dim = bounds.max_dimension();
    if max_dim <= MIN_EXTENT {
        warn!("rescale skipped: degenerate bounding box (extent {max_dim})");
        return 1.0;
    }
    let factor = target_extent / max_dim;
    for p in samples.iter_mut() {
        *p = *p * factor;
    }
    *bounds = bounds.scaled(factor);
    factor
}
