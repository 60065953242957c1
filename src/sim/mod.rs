//! Deterministic lock-contention simulation core.
//!
//! Purpose:
//! - Model three locking granularities over a fixed-capacity hash table and
//!   make their blocking, collision, and fairness behavior observable.
//! - Keep every run deterministic and replayable: a single logical thread,
//!   explicit tick-based time, and round-robin arbitration.
//!
//! Invariants:
//! - `SimClock` is monotonic and advances only once per scheduler round.
//! - No lock can be released and reacquired within the same tick.
//! - Workers mutate only their own progress state; the table and its locks
//!   are the only shared resources.
//! - `TraceRing` never exceeds its capacity and evicts oldest records first.

pub mod artifact;
pub mod clock;
pub mod lock;
pub mod runner;
pub mod scenario;
pub mod table;
pub mod trace;
pub mod worker;

pub use artifact::{trace_hash, RunArtifact, ARTIFACT_SCHEMA_VERSION};
pub use clock::SimClock;
pub use lock::{AccessMode, AcquireOutcome, LockViolation, SimMutex, SimRwLock, SlotLock};
pub use runner::{FailureKind, FailureReport, RunOutcome, RunReport, SimRunner};
pub use scenario::{Scenario, SimConfig, WorkerSpec, DEFAULT_MAX_TICKS};
pub use table::{LockMode, SetupError, SlotTable};
pub use trace::{LockTarget, NullSink, TraceEvent, TraceRecord, TraceRing, TraceSink, WorkerId};
pub use worker::{Op, OpKind, Worker, WorkerState, WorkerStats};
