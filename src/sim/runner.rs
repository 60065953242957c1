//! Round-robin scheduler and run reporting.
//!
//! The runner advances a global tick counter and steps every unfinished
//! worker exactly once per tick, in construction order. Ties for a contested
//! lock within a tick resolve first-in-order. The run ends when all workers
//! finish, when the tick bound is reached (reported as non-convergence, not
//! an error), or when a worker surfaces a lock-state violation.
//!
//! Setup problems (zero capacity, unknown mode) are rejected before tick 1
//! and never appear as run outcomes.

use serde::{Deserialize, Serialize};

use crate::sim::clock::SimClock;
use crate::sim::lock::LockViolation;
use crate::sim::scenario::Scenario;
use crate::sim::table::{SetupError, SlotTable};
use crate::sim::trace::TraceSink;
use crate::sim::worker::{Worker, WorkerStats};

/// Terminal classification of a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// Every worker reached `done` before the tick bound.
    Converged,
    /// The tick bound expired with work outstanding. A normal outcome; the
    /// probe protocol does not guarantee termination.
    TickLimit { pending_workers: u32 },
    /// A worker's state machine misused a lock. Always a defect.
    Fault(FailureReport),
}

impl RunOutcome {
    #[inline(always)]
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged)
    }
}

/// Structured failure report captured in artifacts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    pub kind: FailureKind,
    pub message: String,
    /// Tick at which the failure was detected.
    pub tick: u64,
}

/// Failure classification for deterministic triage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// A release found no outstanding holder.
    LockViolation { worker: u32, violation: LockViolation },
}

/// End-of-run summary: outcome, counters, and the final table image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Ticks actually executed.
    pub ticks: u64,
    pub per_worker: Vec<WorkerStats>,
    pub totals: WorkerStats,
    /// Occupied slots `(index, key)` at run end, in index order.
    pub occupied: Vec<(u32, u64)>,
}

/// Deterministic round-robin simulation runner.
///
/// The runner owns nothing mutable between runs; calling [`SimRunner::run`]
/// twice with equivalent sinks produces identical traces and reports.
pub struct SimRunner {
    scenario: Scenario,
}

impl SimRunner {
    pub fn new(scenario: Scenario) -> Self {
        Self { scenario }
    }

    #[inline(always)]
    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// Execute the scenario, emitting trace records into `sink`.
    pub fn run(&self, sink: &mut dyn TraceSink) -> Result<RunReport, SetupError> {
        let cfg = &self.scenario.config;
        let mut table = SlotTable::new(cfg.capacity, cfg.mode)?;
        let mut workers = self.scenario.build_workers();
        let mut clock = SimClock::new();

        let outcome = loop {
            if workers.iter().all(Worker::is_done) {
                break RunOutcome::Converged;
            }
            if clock.now_ticks() >= cfg.max_ticks {
                let pending = workers.iter().filter(|w| !w.is_done()).count() as u32;
                break RunOutcome::TickLimit {
                    pending_workers: pending,
                };
            }

            let tick = clock.next_tick();
            if let Some(report) = step_round(tick, &mut workers, &mut table, sink) {
                break RunOutcome::Fault(report);
            }
        };

        Ok(build_report(outcome, clock.now_ticks(), &workers, &table))
    }
}

/// Step every unfinished worker once, in construction order.
fn step_round(
    tick: u64,
    workers: &mut [Worker],
    table: &mut SlotTable,
    sink: &mut dyn TraceSink,
) -> Option<FailureReport> {
    for worker in workers.iter_mut() {
        if worker.is_done() {
            continue;
        }
        if let Err(violation) = worker.step(tick, table, sink) {
            return Some(failure(worker.id().as_u32(), violation, tick));
        }
    }
    None
}

fn failure(worker: u32, violation: LockViolation, tick: u64) -> FailureReport {
    FailureReport {
        kind: FailureKind::LockViolation { worker, violation },
        message: violation.to_string(),
        tick,
    }
}

fn build_report(
    outcome: RunOutcome,
    ticks: u64,
    workers: &[Worker],
    table: &SlotTable,
) -> RunReport {
    let per_worker: Vec<WorkerStats> = workers.iter().map(|w| *w.stats()).collect();
    let mut totals = WorkerStats::default();
    for stats in &per_worker {
        totals.accumulate(stats);
    }
    RunReport {
        outcome,
        ticks,
        per_worker,
        totals,
        occupied: table.occupied(),
    }
}
