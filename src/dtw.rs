//! End-anchored dynamic time warping with slope constraints and
//! optional left/right mirroring.
//!
//! Both sequences are indexed from their tails: a match always ends at
//! the most recent live sample. Costs are squared Euclidean distances
//! and thresholds compare in the squared domain.

use crate::geom::Vec3;
use crate::store::{GestureStore, MirrorMode};
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchOutcome {
    /// Passed both gates; carries the normalized warp distance.
    Accepted(f32),
    /// Endpoint pre-filter rejected before building the table.
    EndpointRejected,
    /// Table completed but the normalized distance exceeded the gate.
    DistanceRejected(f32),
    /// No alignment path satisfied the slope constraint.
    Infeasible,
}

#[derive(Debug, Clone, Copy)]
pub struct MatchParams {
    pub max_slope: u32,
    pub first_threshold: f32,
    pub full_threshold: f32,
    /// Applied to the raw accumulated cost before the full gate,
    /// conventionally 1 / template length.
    pub scaler: f32,
}

/// A winning store sweep result.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub gesture_type: u8,
    pub name: String,
    pub index: usize,
    pub distance: f32,
}

fn template_point(template: &[Vec3], j: usize, mirror: bool) -> Vec3 {
    let p = template[template.len() - 1 - j];
    if mirror { p.mirrored_y() } else { p }
}

#[derive(Clone, Copy, PartialEq)]
enum Step {
    Start,
    Diagonal,
    Vertical,
    Horizontal,
}

#[derive(Clone, Copy)]
struct Cell {
    cost: f32,
    step: Step,
    run: u32,
}

const UNREACHED: Cell = Cell {
    cost: f32::INFINITY,
    step: Step::Start,
    run: 0,
};

/// Accumulated warp cost between `live` and `template`, tail-anchored.
/// Returns `None` when every alignment path violates `max_slope`.
pub fn warp_distance(
    live: &[Vec3],
    template: &[Vec3],
    mirror: bool,
    max_slope: u32,
) -> Option<f32> {
    let n = live.len();
    let m = template.len();
    if n == 0 || m == 0 {
        return None;
    }
    let max_slope = max_slope.max(1);
    let cost = |i: usize, j: usize| -> f32 {
        live[n - 1 - i].dist_squared(&template_point(template, j, mirror))
    };

    let mut grid = vec![UNREACHED; n * m];
    let idx = |i: usize, j: usize| i * m + j;

    grid[idx(0, 0)] = Cell {
        cost: cost(0, 0),
        step: Step::Start,
        run: 0,
    };
    for i in 1..n {
        // the first column repeats one template point per live point
        if i as u32 > max_slope {
            break;
        }
        let below = grid[idx(i - 1, 0)];
        grid[idx(i, 0)] = Cell {
            cost: below.cost + cost(i, 0),
            step: Step::Vertical,
            run: i as u32,
        };
    }
    for j in 1..m {
        if j as u32 > max_slope {
            break;
        }
        let left = grid[idx(0, j - 1)];
        grid[idx(0, j)] = Cell {
            cost: left.cost + cost(0, j),
            step: Step::Horizontal,
            run: j as u32,
        };
    }

    for i in 1..n {
        for j in 1..m {
            let mut best = UNREACHED;
            let diag = grid[idx(i - 1, j - 1)];
            if diag.cost.is_finite() {
                best = Cell {
                    cost: diag.cost,
                    step: Step::Diagonal,
                    run: 0,
                };
            }
            let up = grid[idx(i - 1, j)];
            if up.cost.is_finite() {
                let run = if up.step == Step::Vertical { up.run + 1 } else { 1 };
                if run <= max_slope && up.cost < best.cost {
                    best = Cell {
                        cost: up.cost,
                        step: Step::Vertical,
                        run,
                    };
                }
            }
            let left = grid[idx(i, j - 1)];
            if left.cost.is_finite() {
                let run = if left.step == Step::Horizontal { left.run + 1 } else { 1 };
                if run <= max_slope && left.cost < best.cost {
                    best = Cell {
                        cost: left.cost,
                        step: Step::Horizontal,
                        run,
                    };
                }
            }
            if best.cost.is_finite() {
                grid[idx(i, j)] = Cell {
                    cost: best.cost + cost(i, j),
                    step: best.step,
                    run: best.run,
                };
            }
        }
    }

    let tail = grid[idx(n - 1, m - 1)];
    tail.cost.is_finite().then_some(tail.cost)
}

/// Run the gated match of one template variant against the live buffer.
pub fn match_sequences(
    live: &[Vec3],
    template: &[Vec3],
    mirror: bool,
    params: &MatchParams,
) -> MatchOutcome {
    let (Some(live_end), Some(_)) = (live.last(), template.last()) else {
        return MatchOutcome::Infeasible;
    };
    let endpoint = live_end.dist_squared(&template_point(template, 0, mirror));
    if endpoint > params.first_threshold {
        return MatchOutcome::EndpointRejected;
    }
    let Some(raw) = warp_distance(live, template, mirror, params.max_slope) else {
        return MatchOutcome::Infeasible;
    };
    let distance = raw * params.scaler;
    if distance <= params.full_threshold {
        MatchOutcome::Accepted(distance)
    } else {
        MatchOutcome::DistanceRejected(distance)
    }
}

fn mirror_passes(mode: MirrorMode, active_hand: MirrorMode) -> &'static [bool] {
    match mode {
        MirrorMode::None => &[false],
        MirrorMode::Both => &[false, true],
        MirrorMode::Left | MirrorMode::Right => {
            if mode == active_hand {
                &[true]
            } else {
                &[false]
            }
        }
    }
}

/// Sweep every enabled template and return the globally best accepted
/// match, if any.
pub fn scan_store(
    store: &GestureStore,
    live: &[Vec3],
    active_hand: MirrorMode,
    max_slope: u32,
) -> Option<Detection> {
    let mut best: Option<Detection> = None;
    for (index, gesture) in store.gestures.iter().enumerate() {
        let settings = &gesture.settings;
        if !settings.enabled || gesture.samples.is_empty() {
            continue;
        }
        if live.len() < settings.minimum_length {
            continue;
        }
        let params = MatchParams {
            max_slope,
            first_threshold: settings.first_threshold,
            full_threshold: settings.full_threshold,
            scaler: 1.0 / gesture.samples.len() as f32,
        };
        for &mirror in mirror_passes(settings.mirror_mode, active_hand) {
            let outcome = match_sequences(live, &gesture.samples, mirror, &params);
            debug!(
                "match '{}' (index {index}, mirror {mirror}): {outcome:?}",
                gesture.name
            );
            if let MatchOutcome::Accepted(distance) = outcome {
                let better = best
                    .as_ref()
                    .map(|b| distance < b.distance)
                    .unwrap_or(true);
                if better {
                    best = Some(Detection {
                        gesture_type: gesture.gesture_type,
                        name: gesture.name.clone(),
                        index,
                        distance,
                    });
                }
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::GestureSettings;

    fn zig() -> Vec<Vec3> {
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 2.0, 0.0),
            Vec3::new(2.0, -1.0, 0.0),
            Vec3::new(3.0, 0.5, 0.0),
        ]
    }

    fn params(first: f32, full: f32, scaler: f32) -> MatchParams {
        MatchParams {
            max_slope: 3,
            first_threshold: first,
            full_threshold: full,
            scaler,
        }
    }

    #[test]
    fn test_self_match_is_zero_and_accepted() {
        let seq = zig();
        let p = params(0.0, 0.0, 1.0 / seq.len() as f32);
        match match_sequences(&seq, &seq, false, &p) {
            MatchOutcome::Accepted(d) => assert!(d.abs() < 1e-6),
            other => panic!("expected acceptance, got {other:?}"),
        }
    }

    #[test]
    fn test_mirrored_self_match_symmetric_sequence() {
        // all Y components zero, so the reflection is the identity
        let seq = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 2.0),
            Vec3::new(2.0, 0.0, 1.0),
        ];
        let raw = warp_distance(&seq, &seq, true, 3).unwrap();
        assert!(raw.abs() < 1e-6);
    }

    #[test]
    fn test_mirrored_self_match_asymmetric_sequence() {
        let seq = zig();
        let raw = warp_distance(&seq, &seq, true, 3).unwrap();
        assert!(raw > 1.0);
    }

    #[test]
    fn test_slope_constraint_rejects_long_runs() {
        // aligning 2 live points with 5 template points needs a run of
        // 3 horizontal steps somewhere, impossible with max_slope 1
        let template: Vec<Vec3> = (0..5).map(|i| Vec3::new(0.0, 0.0, i as f32)).collect();
        let live = vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 4.0)];
        assert!(warp_distance(&live, &template, false, 1).is_none());
        assert!(warp_distance(&live, &template, false, 3).is_some());
    }

    #[test]
    fn test_slope_infeasibility_beats_thresholds() {
        let template: Vec<Vec3> = (0..5).map(|i| Vec3::new(0.0, 0.0, i as f32)).collect();
        let live = vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 4.0)];
        let p = MatchParams {
            max_slope: 1,
            first_threshold: 1000.0,
            full_threshold: 1000.0,
            scaler: 1.0 / template.len() as f32,
        };
        assert_eq!(
            match_sequences(&live, &template, false, &p),
            MatchOutcome::Infeasible
        );
    }

    #[test]
    fn test_endpoint_prefilter_short_circuits() {
        let template = vec![Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0)];
        let live = vec![Vec3::ZERO, Vec3::new(0.0, 0.0, 51.0)];
        let p = params(1.0, 1000.0, 0.5);
        assert_eq!(
            match_sequences(&live, &template, false, &p),
            MatchOutcome::EndpointRejected
        );
    }

    #[test]
    fn test_distance_gate_rejects_with_value() {
        let template = vec![Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0)];
        let live = vec![Vec3::new(0.0, 3.0, 0.0), Vec3::new(0.0, 3.0, 1.0)];
        // endpoints 9.0 apart squared, inside the pre-filter
        let p = params(10.0, 1.0, 1.0);
        match match_sequences(&live, &template, false, &p) {
            MatchOutcome::DistanceRejected(d) => assert!(d > 1.0),
            other => panic!("expected distance rejection, got {other:?}"),
        }
    }

    fn store_with(templates: Vec<(&str, Vec<Vec3>, GestureSettings)>) -> GestureStore {
        let mut store = GestureStore::new(100.0);
        for (name, samples, settings) in templates {
            let size = crate::geom::BoundingBox::from_points(&samples);
            store.gestures.push(crate::store::Gesture {
                name: name.to_string(),
                gesture_type: 0,
                samples,
                size,
                settings,
            });
        }
        store
    }

    #[test]
    fn test_scan_store_picks_global_minimum() {
        let near = zig();
        let mut far = zig();
        for p in &mut far {
            p.x += 0.5;
        }
        let store = store_with(vec![
            ("far", far, GestureSettings::default()),
            ("near", near.clone(), GestureSettings::default()),
        ]);
        let hit = scan_store(&store, &near, MirrorMode::None, 3).unwrap();
        assert_eq!(hit.name, "near");
        assert_eq!(hit.index, 1);
        assert!(hit.distance.abs() < 1e-6);
    }

    #[test]
    fn test_scan_store_exact_copy_detects_index_zero() {
        let template = zig();
        let settings = GestureSettings {
            minimum_length: 4,
            full_threshold: 20.0,
            ..GestureSettings::default()
        };
        let store = store_with(vec![("only", template.clone(), settings)]);
        let hit = scan_store(&store, &template, MirrorMode::None, 3).unwrap();
        assert_eq!(hit.index, 0);
        assert_eq!(hit.name, "only");
    }

    #[test]
    fn test_scan_store_minimum_length_gate() {
        let template = zig();
        let settings = GestureSettings {
            minimum_length: 10,
            ..GestureSettings::default()
        };
        let store = store_with(vec![("long", template.clone(), settings)]);
        assert!(scan_store(&store, &template, MirrorMode::None, 3).is_none());
    }

    #[test]
    fn test_scan_store_skips_disabled() {
        let template = zig();
        let settings = GestureSettings {
            enabled: false,
            ..GestureSettings::default()
        };
        let store = store_with(vec![("off", template.clone(), settings)]);
        assert!(scan_store(&store, &template, MirrorMode::None, 3).is_none());
    }

    #[test]
    fn test_mirror_both_keeps_smaller_variant() {
        let template = zig();
        let settings = GestureSettings {
            mirror_mode: MirrorMode::Both,
            full_threshold: 100.0,
            first_threshold: 100.0,
            ..GestureSettings::default()
        };
        let store = store_with(vec![("both", template.clone(), settings)]);
        let hit = scan_store(&store, &template, MirrorMode::None, 3).unwrap();
        // un-mirrored variant is an exact match, mirrored is not
        assert!(hit.distance.abs() < 1e-6);
    }

    #[test]
    fn test_mirror_left_applies_only_for_left_hand() {
        // template recorded left-handed; right hand should match the
        // un-mirrored samples, left hand the reflection
        let template = zig();
        let mirrored: Vec<Vec3> = template.iter().map(|p| p.mirrored_y()).collect();
        let settings = GestureSettings {
            mirror_mode: MirrorMode::Left,
            ..GestureSettings::default()
        };
        let store = store_with(vec![("wave", template.clone(), settings)]);
        let left_hit = scan_store(&store, &mirrored, MirrorMode::Left, 3).unwrap();
        assert!(left_hit.distance.abs() < 1e-6);
        let right_hit = scan_store(&store, &template, MirrorMode::Right, 3).unwrap();
        assert!(right_hit.distance.abs() < 1e-6);
    }
}
