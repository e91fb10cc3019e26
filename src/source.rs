//! Tracked-position seam and a replay source for tests and the CLI.

use crate::geom::Vec3;

/// Frame the position source reports in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackingSpace {
    #[default]
    World,
    Local,
}

pub trait PositionSource {
    /// Queried once per captured frame.
    fn current_position(&mut self, space: TrackingSpace) -> Vec3;
}

/// Feeds a prerecorded trace one sample per query, holding the final
/// position once drained.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    trace: Vec<Vec3>,
    cursor: usize,
}

impl ReplaySource {
    pub fn new(trace: Vec<Vec3>) -> Self {
        Self { trace, cursor: 0 }
    }

    pub fn exhausted(&self) -> bool {
        self.cursor >= self.trace.len()
    }
}

impl PositionSource for ReplaySource {
    fn current_position(&mut self, _space: TrackingSpace) -> Vec3 {
        match self.trace.get(self.cursor) {
            Some(p) => {
                self.cursor += 1;
                *p
            }
            None => self.trace.last().copied().unwrap_or(Vec3::ZERO),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_walks_trace_then_holds_last() {
        let mut src = ReplaySource::new(vec![Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0)]);
        assert!(!src.exhausted());
        assert_eq!(src.current_position(TrackingSpace::World).x, 1.0);
        assert_eq!(src.current_position(TrackingSpace::World).x, 2.0);
        assert!(src.exhausted());
        assert_eq!(src.current_position(TrackingSpace::World).x, 2.0);
    }

    #[test]
    fn test_replay_empty_trace_reports_origin() {
        let mut src = ReplaySource::new(Vec::new());
        assert!(src.exhausted());
        assert_eq!(src.current_position(TrackingSpace::Local), Vec3::ZERO);
    }
}
