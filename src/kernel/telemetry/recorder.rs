use std::collections::VecDeque;
use tracing::{debug, error};

use super::event::TelemetryEvent;
use super::metrics::{compute_snapshot, TelemetrySnapshot};

/// Entries kept before the oldest is evicted.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Bounded log of scope-tree diagnostics.
#[derive(Debug)]
pub struct TelemetryRecorder {
    entries: VecDeque<TelemetryEvent>,
    capacity: usize,
}

impl Default for TelemetryRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryRecorder {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity,
        }
    }

    pub fn record(&mut self, event: TelemetryEvent) {
        if event.is_error() {
            error!("RUM telemetry anomaly: {:?}", event);
        } else {
            debug!("RUM telemetry: {:?}", event);
        }
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(event);
    }

    pub fn events(&self) -> impl Iterator<Item = &TelemetryEvent> {
        self.entries.iter()
    }

    pub fn anomalies(&self) -> impl Iterator<Item = &TelemetryEvent> {
        self.entries.iter().filter(|e| e.is_error())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Counters over everything still buffered.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        compute_snapshot(&self.entries)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
