//! Periodic-tick seam between the recorder and its host.

use std::time::Duration;

pub type TickHandle = u64;

/// The recorder only assumes "fires roughly every period"; hosts bring
/// their own tick engine.
pub trait Scheduler {
    fn register(&mut self, period: Duration) -> TickHandle;
    fn cancel(&mut self, handle: TickHandle);
}

/// Accumulator scheduler pumped by the host. `advance` reports how many
/// periods elapsed across all registrations since the last pump.
#[derive(Debug, Default)]
pub struct StepScheduler {
    entries: Vec<Entry>,
    next_handle: TickHandle,
}

#[derive(Debug)]
struct Entry {
    handle: TickHandle,
    period: Duration,
    pending: Duration,
}

impl StepScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate elapsed time and count due fires.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        let mut fires = 0;
        for entry in &mut self.entries {
            if entry.period.is_zero() {
                continue;
            }
            entry.pending += elapsed;
            while entry.pending >= entry.period {
                entry.pending -= entry.period;
                fires += 1;
            }
        }
        fires
    }

    pub fn registration_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_registered(&self, handle: TickHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }
}

impl Scheduler for StepScheduler {
    fn register(&mut self, period: Duration) -> TickHandle {
        self.next_handle += 1;
        let handle = self.next_handle;
        self.entries.push(Entry {
            handle,
            period,
            pending: Duration::ZERO,
        });
        handle
    }

    fn cancel(&mut self, handle: TickHandle) {
        self.entries.retain(|e| e.handle != handle);
    }
}
