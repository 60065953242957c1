//! Worker state machine driving ordered operations against the table.
//!
//! Each worker owns an ordered operation list and advances through a
//! four-state machine, one transition per scheduler step:
//!
//! ```text
//! Locking ──acquired──> Acting ──slot free / hit / miss──> Unlocking
//!    ^  ^                  │
//!    │  └───contended──────┘ (probe offset unchanged)
//!    │                  occupied by another key
//!    │                     v
//!    └──────── UnlockingAndRelocking (probe offset + 1)
//! ```
//!
//! Blocking on a busy lock and colliding on slot content are deliberately
//! asymmetric: only a confirmed content collision advances the probe offset.
//! A worker waiting on a lock retries the same slot on the next tick.
//!
//! Probing is unbounded. An insert into a full table probes forever; liveness
//! comes only from the scheduler's tick bound.

use serde::{Deserialize, Serialize};

use crate::sim::lock::{AccessMode, LockViolation};
use crate::sim::table::{LockMode, SlotTable};
use crate::sim::trace::{LockTarget, TraceEvent, TraceRecord, TraceSink, WorkerId};

/// Table operation kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    Insert,
    Find,
}

impl OpKind {
    /// Access requested against the governing lock: writes for inserts,
    /// shared reads for finds. Exclusive locks treat both the same.
    #[inline(always)]
    pub fn access_mode(self) -> AccessMode {
        match self {
            Self::Insert => AccessMode::Write,
            Self::Find => AccessMode::Read,
        }
    }
}

/// One scripted operation. `value` is carried for scenario fidelity; the
/// table records keys only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Op {
    pub kind: OpKind,
    pub key: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<u64>,
}

impl Op {
    pub fn insert(key: u64, value: u64) -> Self {
        Self {
            kind: OpKind::Insert,
            key,
            value: Some(value),
        }
    }

    pub fn find(key: u64) -> Self {
        Self {
            kind: OpKind::Find,
            key,
            value: None,
        }
    }
}

/// Explicit worker state; `done` is tracked separately and is monotone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerState {
    /// Attempting to acquire the lock governing the probed slot.
    Locking,
    /// Lock held; inspect or mutate the slot.
    Acting,
    /// Operation settled; release and move to the next operation.
    Unlocking,
    /// Content collision; release and retry the same operation one slot on.
    UnlockingAndRelocking,
}

/// Per-worker counters surfaced in the run report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStats {
    pub acquire_attempts: u64,
    pub contended: u64,
    pub collisions: u64,
    pub inserts: u64,
    pub hits: u64,
    pub misses: u64,
    pub ops_completed: u64,
}

impl WorkerStats {
    /// Fold `other` into an aggregate.
    pub fn accumulate(&mut self, other: &WorkerStats) {
        self.acquire_attempts += other.acquire_attempts;
        self.contended += other.contended;
        self.collisions += other.collisions;
        self.inserts += other.inserts;
        self.hits += other.hits;
        self.misses += other.misses;
        self.ops_completed += other.ops_completed;
    }
}

/// A simulated thread of control: its script plus its progress state.
///
/// Mutated only through [`Worker::step`]; the table and its locks are shared
/// by reference across all workers for the run's duration.
#[derive(Clone, Debug)]
pub struct Worker {
    id: WorkerId,
    ops: Vec<Op>,
    op_index: usize,
    probe_offset: u32,
    state: WorkerState,
    done: bool,
    stats: WorkerStats,
}

impl Worker {
    pub fn new(id: WorkerId, ops: Vec<Op>) -> Self {
        let done = ops.is_empty();
        Self {
            id,
            ops,
            op_index: 0,
            probe_offset: 0,
            state: WorkerState::Locking,
            done,
            stats: WorkerStats::default(),
        }
    }

    #[inline(always)]
    pub fn id(&self) -> WorkerId {
        self.id
    }

    #[inline(always)]
    pub fn is_done(&self) -> bool {
        self.done
    }

    #[inline(always)]
    pub fn state(&self) -> WorkerState {
        self.state
    }

    #[inline(always)]
    pub fn op_index(&self) -> usize {
        self.op_index
    }

    #[inline(always)]
    pub fn probe_offset(&self) -> u32 {
        self.probe_offset
    }

    #[inline(always)]
    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    /// Drive exactly one state transition at `tick`.
    ///
    /// A no-op on a finished worker. Returns the violation if a release found
    /// no outstanding holder, which the scheduler reports as a fault.
    pub fn step(
        &mut self,
        tick: u64,
        table: &mut SlotTable,
        sink: &mut dyn TraceSink,
    ) -> Result<(), LockViolation> {
        if self.done {
            return Ok(());
        }

        let op = self.ops[self.op_index];
        let mode = op.kind.access_mode();
        let capacity = table.capacity();
        let home = table.hash(op.key);
        let index = (home + self.probe_offset) % capacity;
        let target = match table.mode() {
            LockMode::Global => LockTarget::Table,
            _ => LockTarget::Slot(index),
        };

        match self.state {
            WorkerState::Locking => {
                let outcome = table.lock_for(index).try_acquire(mode, tick);
                self.stats.acquire_attempts += 1;
                self.emit(
                    sink,
                    tick,
                    TraceEvent::Acquire {
                        op: op.kind,
                        mode,
                        target,
                        home,
                        outcome,
                    },
                );
                if outcome.is_acquired() {
                    self.state = WorkerState::Acting;
                } else {
                    // Blocked on the lock: retry the same slot next tick.
                    self.stats.contended += 1;
                }
            }
            WorkerState::Acting => match op.kind {
                OpKind::Insert => match table.slot(index) {
                    None => {
                        table.write_slot(index, op.key);
                        self.stats.inserts += 1;
                        self.emit(
                            sink,
                            tick,
                            TraceEvent::InsertOk {
                                key: op.key,
                                slot: index,
                            },
                        );
                        self.state = WorkerState::Unlocking;
                    }
                    Some(occupant) => {
                        self.stats.collisions += 1;
                        self.emit(
                            sink,
                            tick,
                            TraceEvent::InsertCollision {
                                key: op.key,
                                slot: index,
                                occupant,
                            },
                        );
                        self.state = WorkerState::UnlockingAndRelocking;
                    }
                },
                OpKind::Find => match table.slot(index) {
                    Some(found) if found == op.key => {
                        self.stats.hits += 1;
                        self.emit(
                            sink,
                            tick,
                            TraceEvent::FindHit {
                                key: op.key,
                                slot: index,
                            },
                        );
                        self.state = WorkerState::Unlocking;
                    }
                    None => {
                        self.stats.misses += 1;
                        self.emit(
                            sink,
                            tick,
                            TraceEvent::FindMiss {
                                key: op.key,
                                slot: index,
                            },
                        );
                        self.state = WorkerState::Unlocking;
                    }
                    Some(occupant) => {
                        self.stats.collisions += 1;
                        self.emit(
                            sink,
                            tick,
                            TraceEvent::FindCollision {
                                key: op.key,
                                slot: index,
                                occupant,
                            },
                        );
                        self.state = WorkerState::UnlockingAndRelocking;
                    }
                },
            },
            WorkerState::Unlocking => {
                let released = table.lock_for(index).release(mode, tick);
                self.emit(
                    sink,
                    tick,
                    TraceEvent::Release {
                        op: op.kind,
                        mode,
                        target,
                        clean: released.is_ok(),
                    },
                );
                released?;
                self.op_index += 1;
                self.probe_offset = 0;
                self.state = WorkerState::Locking;
                self.stats.ops_completed += 1;
                if self.op_index == self.ops.len() {
                    self.done = true;
                    self.emit(sink, tick, TraceEvent::WorkerDone);
                }
            }
            WorkerState::UnlockingAndRelocking => {
                let released = table.lock_for(index).release(mode, tick);
                self.emit(
                    sink,
                    tick,
                    TraceEvent::Release {
                        op: op.kind,
                        mode,
                        target,
                        clean: released.is_ok(),
                    },
                );
                released?;
                self.probe_offset = (self.probe_offset + 1) % capacity;
                self.state = WorkerState::Locking;
            }
        }

        Ok(())
    }

    fn emit(&self, sink: &mut dyn TraceSink, tick: u64, event: TraceEvent) {
        sink.record(TraceRecord {
            tick,
            worker: self.id,
            event,
        });
    }
}
