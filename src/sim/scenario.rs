//! Scenario schema for contention simulation runs.
//!
//! Scenarios are plain data, serialized as part of repro artifacts and
//! loadable from JSON by the CLI. Everything the original demo hardcoded is
//! explicit per-run configuration here: table capacity, lock mode, tick
//! bound, and each worker's ordered operation list. No process-wide state
//! survives a run.

use serde::{Deserialize, Serialize};

use crate::sim::table::LockMode;
use crate::sim::trace::WorkerId;
use crate::sim::worker::{Op, Worker};

/// Tick safety bound used when a scenario does not set one.
pub const DEFAULT_MAX_TICKS: u64 = 100;

/// Configuration for a single simulation run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Number of table slots; fixed for the run.
    pub capacity: u32,
    /// Locking granularity under test.
    pub mode: LockMode,
    /// Maximum ticks before the run is declared non-convergent.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
}

fn default_max_ticks() -> u64 {
    DEFAULT_MAX_TICKS
}

/// One worker's scripted operation list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSpec {
    pub ops: Vec<Op>,
}

/// Top-level scenario: run configuration plus the worker scripts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub config: SimConfig,
    pub workers: Vec<WorkerSpec>,
}

impl Scenario {
    /// The classic three-worker demo over a capacity-10 table: keys 25, 35,
    /// and 45 all hash to slot 5, so every granularity shows contention.
    pub fn demo(mode: LockMode) -> Self {
        Self {
            config: SimConfig {
                capacity: 10,
                mode,
                max_ticks: DEFAULT_MAX_TICKS,
            },
            workers: vec![
                WorkerSpec {
                    ops: vec![Op::insert(25, 25), Op::find(15)],
                },
                WorkerSpec {
                    ops: vec![Op::insert(35, 35), Op::find(25)],
                },
                WorkerSpec {
                    ops: vec![Op::find(45), Op::find(25)],
                },
            ],
        }
    }

    /// Instantiate workers in construction order. The scheduler steps them
    /// in this order, which is also how lock ties are resolved.
    pub fn build_workers(&self) -> Vec<Worker> {
        self.workers
            .iter()
            .enumerate()
            .map(|(i, spec)| Worker::new(WorkerId::from_u32(i as u32), spec.ops.clone()))
            .collect()
    }

    /// Total operations across all workers.
    pub fn total_ops(&self) -> usize {
        self.workers.iter().map(|w| w.ops.len()).sum()
    }
}
