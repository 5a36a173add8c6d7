//! Recorded trace of simulated driver I/O.
//!
//! Every blocking call a simulated rig performs appends one [`CallRecord`]
//! with its start and end instants. Tests use the trace to prove that a
//! rejected request never reached the driver, and that calls on one rig
//! never overlap.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

/// One completed driver call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    /// Index of the simulated rig, in `init` order.
    pub rig: usize,
    /// Driver method name, e.g. `"set_freq"`.
    pub call: &'static str,
    pub start: Instant,
    pub end: Instant,
}

/// Shared, append-only call trace.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    records: Arc<Mutex<Vec<CallRecord>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&self, rig: usize, call: &'static str, start: Instant, end: Instant) {
        self.records.lock().push(CallRecord {
            rig,
            call,
            start,
            end,
        });
    }

    /// Snapshot of every record so far, in completion order.
    pub fn records(&self) -> Vec<CallRecord> {
        self.records.lock().clone()
    }

    /// Number of recorded calls across all rigs.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records belonging to one rig, in completion order.
    pub fn for_rig(&self, rig: usize) -> Vec<CallRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.rig == rig)
            .cloned()
            .collect()
    }

    /// Method names called on one rig, in completion order.
    pub fn calls(&self, rig: usize) -> Vec<&'static str> {
        self.for_rig(rig).into_iter().map(|r| r.call).collect()
    }

    /// Whether any two calls on `rig` overlapped in time.
    pub fn has_overlap(&self, rig: usize) -> bool {
        let mut records = self.for_rig(rig);
        records.sort_by_key(|r| r.start);
        records.windows(2).any(|w| w[1].start < w[0].end)
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}
