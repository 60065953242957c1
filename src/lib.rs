//! Deterministic discrete-time simulator of lock contention over a
//! fixed-capacity hash table.
//!
//! ## Scope
//! This crate compares three locking granularities — one global exclusive
//! lock, one exclusive lock per slot, one reader/writer lock per slot — by
//! driving scripted workers through an explicit state machine under a
//! round-robin scheduler. There is no real parallelism: the observable
//! effects of concurrent access (contention, blocking, collisions) are
//! reproduced through deterministic arbitration so a locking discipline can
//! be reasoned about before it is wired to real threads.
//!
//! ## Key invariants
//! - A lock released at tick T cannot be reacquired before T+1 (one-tick
//!   refractory period); this is what makes contention visible at all.
//! - Blocking on a busy lock never advances a worker's probe offset; only a
//!   confirmed content collision does.
//! - Every run is reproducible: identical scenarios yield identical traces.
//! - Probing is unbounded; liveness comes only from the configured tick
//!   bound, and exhausting it is a normal outcome, not an error.
//!
//! ## Run flow
//! `Scenario -> SimRunner -> Worker::step(tick) -> {SlotLock, SlotTable}`
//! with every transition emitted to a [`TraceSink`].
//!
//! ## Notable entry points
//! - [`SimRunner`] / [`Scenario`]: configure and execute a run.
//! - [`SimMutex`] / [`SimRwLock`] / [`SlotLock`]: steppable lock models.
//! - [`TraceSink`] / [`TraceRing`]: event capture decoupled from the core.
//! - [`RunArtifact`]: serialized run record with a stable trace hash.

pub mod sim;

pub use sim::{
    trace_hash, AccessMode, AcquireOutcome, FailureKind, FailureReport, LockMode, LockTarget,
    LockViolation, NullSink, Op, OpKind, RunArtifact, RunOutcome, RunReport, Scenario, SetupError,
    SimClock, SimConfig, SimMutex, SimRunner, SimRwLock, SlotLock, SlotTable, TraceEvent,
    TraceRecord, TraceRing, TraceSink, Worker, WorkerId, WorkerSpec, WorkerState, WorkerStats,
    ARTIFACT_SCHEMA_VERSION, DEFAULT_MAX_TICKS,
};
