//! Lock-contention simulator CLI.
//!
//! Runs scripted workers against a fixed-capacity hash table under one or
//! all locking granularities and prints the event trace. With no scenario
//! file, runs the built-in demo workload (three workers whose keys all hash
//! to slot 5) across every mode, the way the original demo did.
//!
//! # Output Format
//!
//! Trace lines are written to stdout, one per event. A summary line per run
//! is written to stderr:
//! `mode=M outcome=O ticks=N ops=N inserts=N hits=N misses=N collisions=N contended=N`
//!
//! The textual format is illustrative; only the sequence and kind of events
//! is stable.
//!
//! # Exit Codes
//!
//! - `0`: Success, including non-convergent runs (tick bound reached)
//! - `1`: A run surfaced a lock-state violation (simulator defect)
//! - `2`: Invalid arguments or configuration error

use std::env;
use std::fs;
use std::io::{self, Write};
use std::process;

use locksim_rs::{
    LockMode, LockTarget, RunOutcome, RunReport, Scenario, SimRunner, TraceEvent, TraceRecord,
    TraceSink,
};

fn print_usage(exe: &std::ffi::OsStr) {
    eprintln!(
        "usage: {} [OPTIONS]

OPTIONS:
    --mode=<MODE>           Lock granularity: global, per_slot, shared_per_slot,
                            or all (default: all)
    --capacity=<N>          Table capacity (default: 10)
    --max-ticks=<N>         Tick safety bound (default: 100)
    --scenario=<FILE>       Load a scenario from JSON instead of the demo workload
    --quiet                 Suppress the per-event trace, print summaries only
    --help, -h              Show this help message",
        exe.to_string_lossy()
    );
}

/// Sink that renders records as human-readable lines on stdout.
///
/// Write errors are ignored so `locksim | head` behaves like any CLI.
struct LineSink {
    out: io::Stdout,
}

impl TraceSink for LineSink {
    fn record(&mut self, rec: TraceRecord) {
        let _ = writeln!(self.out, "{}", format_record(&rec));
    }
}

fn format_target(target: LockTarget) -> String {
    match target {
        LockTarget::Table => "table".to_string(),
        LockTarget::Slot(slot) => format!("slot {slot}"),
    }
}

fn format_record(rec: &TraceRecord) -> String {
    let tick = rec.tick;
    let w = rec.worker.as_u32();
    match rec.event {
        TraceEvent::Acquire {
            op,
            mode,
            target,
            home,
            outcome,
        } => {
            let verb = match op {
                locksim_rs::OpKind::Insert => "insert",
                locksim_rs::OpKind::Find => "find",
            };
            let status = match outcome {
                locksim_rs::AcquireOutcome::Acquired => "acquired",
                locksim_rs::AcquireOutcome::Contended => "waiting",
            };
            format!(
                "[tick {tick:>3}] worker-{w}: lock {} ({mode}, for {verb}, home {home}) -> {status}",
                format_target(target)
            )
        }
        TraceEvent::Release {
            mode,
            target,
            clean,
            ..
        } => {
            let status = if clean { "released" } else { "VIOLATION" };
            format!(
                "[tick {tick:>3}] worker-{w}: unlock {} ({mode}) -> {status}",
                format_target(target)
            )
        }
        TraceEvent::InsertOk { key, slot } => {
            format!("[tick {tick:>3}] worker-{w}: inserted key {key} at slot {slot}")
        }
        TraceEvent::InsertCollision {
            key,
            slot,
            occupant,
        } => {
            format!(
                "[tick {tick:>3}] worker-{w}: insert key {key} found occupant {occupant} at slot {slot}"
            )
        }
        TraceEvent::FindHit { key, slot } => {
            format!("[tick {tick:>3}] worker-{w}: key {key} found at slot {slot}")
        }
        TraceEvent::FindMiss { key, slot } => {
            format!("[tick {tick:>3}] worker-{w}: key {key} not found (slot {slot} empty)")
        }
        TraceEvent::FindCollision {
            key,
            slot,
            occupant,
        } => {
            format!(
                "[tick {tick:>3}] worker-{w}: find key {key} found occupant {occupant} at slot {slot}"
            )
        }
        TraceEvent::WorkerDone => format!("[tick {tick:>3}] worker-{w}: done"),
    }
}

fn summarize(mode: LockMode, report: &RunReport) {
    let outcome = match &report.outcome {
        RunOutcome::Converged => "converged".to_string(),
        RunOutcome::TickLimit { pending_workers } => {
            format!("tick_limit(pending={pending_workers})")
        }
        RunOutcome::Fault(failure) => format!("fault({})", failure.message),
    };
    eprintln!(
        "mode={mode} outcome={outcome} ticks={} ops={} inserts={} hits={} misses={} \
         collisions={} contended={} occupied={}",
        report.ticks,
        report.totals.ops_completed,
        report.totals.inserts,
        report.totals.hits,
        report.totals.misses,
        report.totals.collisions,
        report.totals.contended,
        report.occupied.len(),
    );
}

struct Options {
    mode: Option<LockMode>,
    capacity: Option<u32>,
    max_ticks: Option<u64>,
    scenario_path: Option<String>,
    quiet: bool,
}

fn parse_args() -> Options {
    let mut args = env::args_os();
    let exe = args.next().unwrap_or_else(|| "locksim".into());
    let mut opts = Options {
        mode: None,
        capacity: None,
        max_ticks: None,
        scenario_path: None,
        quiet: false,
    };

    for arg in args {
        let Some(flag) = arg.to_str() else {
            eprintln!("invalid (non-UTF-8) argument");
            process::exit(2);
        };
        if let Some(value) = flag.strip_prefix("--mode=") {
            if value == "all" {
                opts.mode = None;
            } else {
                opts.mode = Some(value.parse().unwrap_or_else(|err| {
                    eprintln!("{err}");
                    process::exit(2);
                }));
            }
        } else if let Some(value) = flag.strip_prefix("--capacity=") {
            opts.capacity = Some(value.parse().unwrap_or_else(|_| {
                eprintln!("invalid --capacity value: {value}");
                process::exit(2);
            }));
        } else if let Some(value) = flag.strip_prefix("--max-ticks=") {
            opts.max_ticks = Some(value.parse().unwrap_or_else(|_| {
                eprintln!("invalid --max-ticks value: {value}");
                process::exit(2);
            }));
        } else if let Some(value) = flag.strip_prefix("--scenario=") {
            opts.scenario_path = Some(value.to_string());
        } else if flag == "--quiet" {
            opts.quiet = true;
        } else if flag == "--help" || flag == "-h" {
            print_usage(&exe);
            process::exit(0);
        } else {
            eprintln!("unrecognized argument: {flag}");
            print_usage(&exe);
            process::exit(2);
        }
    }

    opts
}

fn load_scenario(path: &str) -> Scenario {
    let data = fs::read_to_string(path).unwrap_or_else(|err| {
        eprintln!("cannot read scenario {path}: {err}");
        process::exit(2);
    });
    serde_json::from_str(&data).unwrap_or_else(|err| {
        eprintln!("cannot parse scenario {path}: {err}");
        process::exit(2);
    })
}

fn apply_overrides(scenario: &mut Scenario, opts: &Options) {
    if let Some(mode) = opts.mode {
        scenario.config.mode = mode;
    }
    if let Some(capacity) = opts.capacity {
        scenario.config.capacity = capacity;
    }
    if let Some(max_ticks) = opts.max_ticks {
        scenario.config.max_ticks = max_ticks;
    }
}

fn run_one(scenario: Scenario, quiet: bool) -> RunReport {
    let mode = scenario.config.mode;
    println!(
        "=== simulation: mode={} capacity={} max_ticks={} workers={} ===",
        mode,
        scenario.config.capacity,
        scenario.config.max_ticks,
        scenario.workers.len()
    );

    let runner = SimRunner::new(scenario);
    let result = if quiet {
        runner.run(&mut locksim_rs::NullSink)
    } else {
        let mut sink = LineSink { out: io::stdout() };
        runner.run(&mut sink)
    };

    let report = result.unwrap_or_else(|err| {
        eprintln!("setup error: {err}");
        process::exit(2);
    });
    summarize(mode, &report);
    for (slot, key) in &report.occupied {
        println!("  slot {slot}: key {key}");
    }
    report
}

fn main() {
    let opts = parse_args();
    let mut faulted = false;

    if let Some(path) = &opts.scenario_path {
        let mut scenario = load_scenario(path);
        apply_overrides(&mut scenario, &opts);
        let report = run_one(scenario, opts.quiet);
        faulted = matches!(report.outcome, RunOutcome::Fault(_));
    } else {
        // Demo workload, swept across one or all granularities.
        let modes: Vec<LockMode> = match opts.mode {
            Some(mode) => vec![mode],
            None => LockMode::ALL.to_vec(),
        };
        for mode in modes {
            let mut scenario = Scenario::demo(mode);
            apply_overrides(&mut scenario, &opts);
            let report = run_one(scenario, opts.quiet);
            faulted |= matches!(report.outcome, RunOutcome::Fault(_));
        }
    }

    if faulted {
        process::exit(1);
    }
}
