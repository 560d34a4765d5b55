//! Drift detection: determinism verification and trace comparison.

use a51_slide::config::SimulationConfig;
use a51_slide::SimulationOutput;

use crate::error::{Result, RuntimeError};
use crate::replay;

/// Run the same configuration twice and require identical hashes.
pub fn verify_determinism(config: &SimulationConfig) -> Result<String> {
    let hash1 = replay::rebuild_hash(config)?;
    let hash2 = replay::rebuild_hash(config)?;
    if hash1 != hash2 {
        return Err(RuntimeError::Drift {
            stored: hash1,
            replayed: hash2,
        });
    }
    Ok(hash1)
}

/// Structured comparison of two runs.
pub fn compare_traces(a: &SimulationOutput, b: &SimulationOutput) -> DriftReport {
    let rows_a = a.trace.len();
    let rows_b = b.trace.len();

    // 1-based row of the first record that differs, or where one trace ends
    let first_divergent_row = a
        .trace
        .iter()
        .zip(b.trace.iter())
        .position(|(ra, rb)| ra != rb)
        .or_else(|| (rows_a != rows_b).then_some(rows_a.min(rows_b)))
        .map(|i| i + 1);

    let ks_a = a.keystream.bits();
    let ks_b = b.keystream.bits();
    let common = ks_a.len().min(ks_b.len());
    let keystream_hamming = ks_a
        .iter()
        .zip(ks_b)
        .filter(|(x, y)| x != y)
        .count()
        + (ks_a.len().max(ks_b.len()) - common);

    DriftReport {
        rows_a,
        rows_b,
        row_delta: rows_b as i64 - rows_a as i64,
        first_divergent_row,
        keystream_a: a.keystream.to_string(),
        keystream_b: b.keystream.to_string(),
        keystream_hamming,
        clock_counts_a: clock_counts(a),
        clock_counts_b: clock_counts(b),
    }
}

/// Number of cycles each of X, Y, Z was shifted.
fn clock_counts(output: &SimulationOutput) -> [usize; 3] {
    let mut counts = [0usize; 3];
    for record in &output.trace {
        for (count, inj) in counts.iter_mut().zip(record.injected) {
            *count += usize::from(inj.is_some());
        }
    }
    counts
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftReport {
    pub rows_a: usize,
    pub rows_b: usize,
    pub row_delta: i64,
    pub first_divergent_row: Option<usize>,
    pub keystream_a: String,
    pub keystream_b: String,
    /// Differing bit positions, counting unmatched tail bits as different.
    pub keystream_hamming: usize,
    pub clock_counts_a: [usize; 3],
    pub clock_counts_b: [usize; 3],
}

impl DriftReport {
    pub fn is_identical(&self) -> bool {
        self.first_divergent_row.is_none() && self.keystream_hamming == 0
    }
}
