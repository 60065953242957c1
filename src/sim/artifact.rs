//! Reproducible artifact schema for simulation runs.
//!
//! Artifacts are serialized to disk to allow deterministic replay and
//! comparison across runs. The schema is versioned for forward-compatible
//! evolution.

use serde::{Deserialize, Serialize};

use crate::sim::runner::RunReport;
use crate::sim::scenario::Scenario;
use crate::sim::trace::TraceRecord;

pub const ARTIFACT_SCHEMA_VERSION: u32 = 1;

/// Self-contained record of a run: inputs, outcome, and trace.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunArtifact {
    pub schema_version: u32,
    /// Determinism key: the full scenario, config included.
    pub scenario: Scenario,
    pub report: RunReport,
    /// Trace records in emission order (possibly ring-truncated).
    pub trace: Vec<TraceRecord>,
    /// Stable hash of `trace` for replay checks.
    pub trace_hash: u64,
}

impl RunArtifact {
    pub fn new(scenario: Scenario, report: RunReport, trace: Vec<TraceRecord>) -> Self {
        let hash = trace_hash(&trace);
        Self {
            schema_version: ARTIFACT_SCHEMA_VERSION,
            scenario,
            report,
            trace,
            trace_hash: hash,
        }
    }

    /// Whether the stored trace still matches its recorded hash.
    pub fn verify_trace(&self) -> bool {
        trace_hash(&self.trace) == self.trace_hash
    }
}

/// Compute a stable 64-bit hash of the trace records.
///
/// This is used to sanity-check replay determinism without comparing entire
/// traces record by record.
pub fn trace_hash(records: &[TraceRecord]) -> u64 {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    for rec in records {
        hasher.update(format!("{rec:?}").as_bytes());
    }
    let digest = hasher.finalize();
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(out)
}
