//! Trace events and sinks for replay and debugging.
//!
//! State transitions emit structured events through a [`TraceSink`] rather
//! than printing directly, so the core stays testable without capturing text
//! output. The textual rendering is illustrative; only the sequence and kind
//! of records for a given scenario is reproducible.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::sim::lock::{AccessMode, AcquireOutcome};
use crate::sim::worker::OpKind;

/// Stable worker identifier.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct WorkerId(u32);

impl WorkerId {
    #[inline(always)]
    pub fn from_u32(id: u32) -> Self {
        Self(id)
    }

    #[inline(always)]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a lock attempt was aimed at: the single table lock or one slot lock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockTarget {
    Table,
    Slot(u32),
}

/// Minimal event set covering lock traffic and table outcomes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraceEvent {
    /// A lock-acquire attempt and its outcome. `home` is the hashed slot
    /// before probing; the probed slot is carried by `target` (or equals
    /// `home + offset` for the global table lock).
    Acquire {
        op: OpKind,
        mode: AccessMode,
        target: LockTarget,
        home: u32,
        outcome: AcquireOutcome,
    },
    /// A lock release. `clean` is false when the release reported a
    /// state machine violation.
    Release {
        op: OpKind,
        mode: AccessMode,
        target: LockTarget,
        clean: bool,
    },
    /// Insert wrote its key into an empty slot.
    InsertOk { key: u64, slot: u32 },
    /// Insert found the slot occupied by another key and must probe on.
    InsertCollision { key: u64, slot: u32, occupant: u64 },
    /// Find located its key.
    FindHit { key: u64, slot: u32 },
    /// Find reached an empty slot: a definitive not-found.
    FindMiss { key: u64, slot: u32 },
    /// Find hit a slot occupied by a different key and must probe on.
    FindCollision { key: u64, slot: u32, occupant: u64 },
    /// The worker finished its last operation.
    WorkerDone,
}

/// A single trace entry: when, who, what.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub tick: u64,
    pub worker: WorkerId,
    pub event: TraceEvent,
}

/// Sink receiving trace records as transitions happen.
pub trait TraceSink {
    fn record(&mut self, rec: TraceRecord);
}

/// Sink that drops everything, for runs where only the report matters.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl TraceSink for NullSink {
    fn record(&mut self, _rec: TraceRecord) {}
}

/// Unbounded capture, mostly for tests and artifacts.
impl TraceSink for Vec<TraceRecord> {
    fn record(&mut self, rec: TraceRecord) {
        self.push(rec);
    }
}

/// Fixed-capacity ring of trace records. When the ring is full, the oldest
/// records are evicted first.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TraceRing {
    cap: usize,
    buf: VecDeque<TraceRecord>,
}

impl TraceRing {
    /// Create a trace ring with at least one slot.
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            cap,
            buf: VecDeque::with_capacity(cap),
        }
    }

    #[inline(always)]
    pub fn cap(&self) -> usize {
        self.cap
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Snapshot the ring contents in chronological order.
    pub fn dump(&self) -> Vec<TraceRecord> {
        self.buf.iter().copied().collect()
    }
}

impl TraceSink for TraceRing {
    fn record(&mut self, rec: TraceRecord) {
        if self.buf.len() == self.cap {
            self.buf.pop_front();
        }
        self.buf.push_back(rec);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(tick: u64) -> TraceRecord {
        TraceRecord {
            tick,
            worker: WorkerId::from_u32(0),
            event: TraceEvent::WorkerDone,
        }
    }

    #[test]
    fn ring_evicts_oldest_first() {
        let mut ring = TraceRing::new(2);
        ring.record(rec(1));
        ring.record(rec(2));
        ring.record(rec(3));
        let dump = ring.dump();
        assert_eq!(dump.len(), 2);
        assert_eq!(dump[0].tick, 2);
        assert_eq!(dump[1].tick, 3);
    }

    #[test]
    fn ring_cap_is_at_least_one() {
        let ring = TraceRing::new(0);
        assert_eq!(ring.cap(), 1);
    }
}
