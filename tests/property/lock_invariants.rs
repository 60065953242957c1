//! Property tests over arbitrary scenarios.
//!
//! Every generated run is checked against the lock-safety oracles: at most
//! one exclusive holder per lock at any tick, writers excluded while readers
//! are outstanding, and no acquire on the tick of the matching release. The
//! oracles replay the emitted trace rather than peeking at simulator state,
//! so they also pin the trace contract itself.

use std::collections::HashMap;

use proptest::prelude::*;

use locksim_rs::{
    AccessMode, AcquireOutcome, LockMode, LockTarget, Op, RunOutcome, Scenario, SimConfig,
    SimRunner, TraceEvent, TraceRecord, WorkerSpec,
};

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u64..60).prop_map(|k| Op::insert(k, k)),
        (0u64..60).prop_map(Op::find),
    ]
}

fn arb_scenario() -> impl Strategy<Value = Scenario> {
    (
        1u32..12,
        prop::sample::select(LockMode::ALL.to_vec()),
        1u64..200,
        prop::collection::vec(prop::collection::vec(arb_op(), 0..5), 0..4),
    )
        .prop_map(|(capacity, mode, max_ticks, workers)| Scenario {
            config: SimConfig {
                capacity,
                mode,
                max_ticks,
            },
            workers: workers
                .into_iter()
                .map(|ops| WorkerSpec { ops })
                .collect(),
        })
}

/// Mirror of one lock's externally visible state, rebuilt from the trace.
#[derive(Default)]
struct LockModel {
    readers: u32,
    writer: bool,
    last_release: Option<u64>,
}

/// Replay the trace and assert the lock-safety invariants hold throughout.
fn check_lock_invariants(mode: LockMode, trace: &[TraceRecord]) {
    let shared = mode == LockMode::PerSlotShared;
    let mut locks: HashMap<LockTarget, LockModel> = HashMap::new();

    for rec in trace {
        match rec.event {
            TraceEvent::Acquire {
                mode: access,
                target,
                outcome: AcquireOutcome::Acquired,
                ..
            } => {
                let model = locks.entry(target).or_default();
                if let Some(last) = model.last_release {
                    assert!(
                        rec.tick > last,
                        "acquire at tick {} on lock released at tick {last}",
                        rec.tick
                    );
                }
                if shared && access == AccessMode::Read {
                    assert!(!model.writer, "reader admitted while writer held");
                    model.readers += 1;
                } else {
                    assert!(
                        !model.writer && model.readers == 0,
                        "second holder admitted at tick {}",
                        rec.tick
                    );
                    model.writer = true;
                }
            }
            TraceEvent::Release {
                mode: access,
                target,
                clean,
                ..
            } => {
                assert!(clean, "state machine produced a dirty release");
                let model = locks.entry(target).or_default();
                if shared && access == AccessMode::Read {
                    assert!(model.readers > 0, "read release with no readers");
                    model.readers -= 1;
                    if model.readers == 0 {
                        model.last_release = Some(rec.tick);
                    }
                } else {
                    assert!(model.writer, "release with no holder");
                    model.writer = false;
                    model.last_release = Some(rec.tick);
                }
            }
            _ => {}
        }

        for model in locks.values() {
            assert!(
                !(model.writer && model.readers > 0),
                "writer and readers coexist at tick {}",
                rec.tick
            );
        }
    }
}

proptest! {
    /// The state machine never misuses a lock, inserted keys never exceed
    /// capacity, and per-worker progress stays within bounds.
    #[test]
    fn runs_stay_within_bounds(scenario in arb_scenario()) {
        let runner = SimRunner::new(scenario.clone());
        let mut trace: Vec<TraceRecord> = Vec::new();
        let report = runner.run(&mut trace).expect("generated scenarios are valid");

        prop_assert!(!matches!(report.outcome, RunOutcome::Fault(_)));
        prop_assert!(report.totals.inserts <= u64::from(scenario.config.capacity));
        prop_assert!(report.occupied.len() <= scenario.config.capacity as usize);
        prop_assert!(report.ticks <= scenario.config.max_ticks);
        for (stats, spec) in report.per_worker.iter().zip(&scenario.workers) {
            prop_assert!(stats.ops_completed <= spec.ops.len() as u64);
        }
    }

    /// Lock-safety oracles hold for every generated run, in every mode.
    #[test]
    fn traces_respect_lock_invariants(scenario in arb_scenario()) {
        let mode = scenario.config.mode;
        let runner = SimRunner::new(scenario);
        let mut trace: Vec<TraceRecord> = Vec::new();
        runner.run(&mut trace).expect("generated scenarios are valid");
        check_lock_invariants(mode, &trace);
    }

    /// Replaying a scenario yields the exact same trace.
    #[test]
    fn runs_are_deterministic(scenario in arb_scenario()) {
        let runner = SimRunner::new(scenario);
        let mut first: Vec<TraceRecord> = Vec::new();
        let mut second: Vec<TraceRecord> = Vec::new();
        runner.run(&mut first).expect("valid");
        runner.run(&mut second).expect("valid");
        prop_assert_eq!(first, second);
    }
}
