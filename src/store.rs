//! Gesture templates, per-template detection settings, and the store.

use crate::geom::{BoundingBox, Vec3};
use crate::normalize;
use log::info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorMode {
    #[default]
    None,
    Left,
    Right,
    Both,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureSettings {
    /// Live buffer must hold at least this many samples before the
    /// template is considered.
    pub minimum_length: usize,
    /// Endpoint pre-filter on squared distance.
    pub first_threshold: f32,
    /// Final gate on the normalized warp distance.
    pub full_threshold: f32,
    pub mirror_mode: MirrorMode,
    pub enabled: bool,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            minimum_length: 1,
            first_threshold: 20.0,
            full_threshold: 20.0,
            mirror_mode: MirrorMode::None,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gesture {
    pub name: String,
    pub gesture_type: u8,
    pub samples: Vec<Vec3>,
    pub size: BoundingBox,
    #[serde(default)]
    pub settings: GestureSettings,
}

impl Gesture {
    /// Recompute the bounding box from the current samples and, when a
    /// target extent is given, rescale to it. Returns the applied factor.
    pub fn recalculate_size(&mut self, rescale_to: Option<f32>) -> f32 {
        self.size = BoundingBox::from_points(&self.samples);
        match rescale_to {
            Some(target) => normalize::rescale(&mut self.samples, &mut self.size, target),
            None => 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureStore {
    pub gestures: Vec<Gesture>,
    pub target_scale: f32,
}

impl Default for GestureStore {
    fn default() -> Self {
        Self {
            gestures: Vec::new(),
            target_scale: 100.0,
        }
    }
}

impl GestureStore {
    pub fn new(target_scale: f32) -> Self {
        Self {
            gestures: Vec::new(),
            target_scale,
        }
    }

    pub fn len(&self) -> usize {
        self.gestures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gestures.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Gesture> {
        self.gestures.get(index)
    }

    /// Re-normalize every template against the store's target scale,
    /// reading each template's current samples.
    pub fn recalculate_all(&mut self) {
        for g in &mut self.gestures {
            g.recalculate_size(Some(self.target_scale));
        }
    }

    /// Normalize a copy of `samples` to the target scale and append it
    /// as a new template. The caller's sequence is untouched. Returns
    /// the new template's index.
    pub fn save_recording(&mut self, samples: &[Vec3], name: &str, gesture_type: u8) -> usize {
        let mut gesture = Gesture {
            name: name.to_string(),
            gesture_type,
            samples: samples.to_vec(),
            size: BoundingBox::from_points(samples),
            settings: GestureSettings::default(),
        };
        normalize::rescale(&mut gesture.samples, &mut gesture.size, self.target_scale);
        self.gestures.push(gesture);
        let index = self.gestures.len() - 1;
        info!(
            "store: saved gesture '{}' at index {} ({} samples)",
            name,
            index,
            samples.len()
        );
        index
    }

    pub fn remove(&mut self, index: usize) -> Option<Gesture> {
        if index >= self.gestures.len() {
            return None;
        }
        let g = self.gestures.remove(index);
        info!("store: removed gesture '{}' at index {}", g.name, index);
        Some(g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_recording_normalizes_copy_only() {
        let mut store = GestureStore::new(100.0);
        let original: Vec<Vec3> = (0..10)
            .map(|i| Vec3::new(0.0, 0.0, i as f32 * (100.0 / 9.0)))
            .collect();
        let idx = store.save_recording(&original, "line", 0);
        assert_eq!(idx, 0);
        // caller's sequence untouched
        assert!((original[9].z - 100.0).abs() < 1e-3);
        let stored = store.get(0).unwrap();
        assert!((stored.size.max_dimension() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_recalculate_hits_target_scale() {
        // Scenario: 10 collinear points from origin to (0,0,100), then
        // recalculation against a 100-unit store must keep max dim 100.
        let mut store = GestureStore::new(100.0);
        let trace: Vec<Vec3> = (0..10)
            .map(|i| Vec3::new(0.0, 0.0, i as f32 * (100.0 / 9.0)))
            .collect();
        store.save_recording(&trace, "line", 0);
        store.recalculate_all();
        let g = store.get(0).unwrap();
        assert!((g.size.max_dimension() - 100.0).abs() < 1e-3);
        let recomputed = BoundingBox::from_points(&g.samples);
        assert!((recomputed.max_dimension() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_recalculate_stable_once_normalized() {
        let mut store = GestureStore::new(50.0);
        let trace = vec![Vec3::ZERO, Vec3::new(10.0, 5.0, 0.0)];
        store.save_recording(&trace, "g", 0);
        store.recalculate_all();
        let first = store.get(0).unwrap().samples.clone();
        store.recalculate_all();
        let second = &store.get(0).unwrap().samples;
        for (a, b) in first.iter().zip(second.iter()) {
            assert!(a.dist_squared(b) < 1e-6);
        }
    }

    #[test]
    fn test_remove_out_of_range_is_none() {
        let mut store = GestureStore::default();
        assert!(store.remove(0).is_none());
    }

    #[test]
    fn test_settings_defaults() {
        let s = GestureSettings::default();
        assert_eq!(s.minimum_length, 1);
        assert_eq!(s.first_threshold, 20.0);
        assert_eq!(s.full_threshold, 20.0);
        assert_eq!(s.mirror_mode, MirrorMode::None);
        assert!(s.enabled);
    }
}
