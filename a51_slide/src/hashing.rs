/// Slide A5/1: Canonical Hashing
///
/// Deterministic canonical serialization + SHA-256 hashing of a run.
/// Produces byte-identical output across platforms.
///
/// Rules:
///   - engine_version first, then config, keystream, steps
///   - steps are the tabular rows, in chronological order
///   - UTF-8 JSON, no whitespace, no float

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::engine::SimulationOutput;
use crate::export::{trace_rows, TraceRow};
use crate::ENGINE_VERSION;

#[derive(Serialize)]
struct CanonicalConfig {
    key: u16,
    frame: u8,
    warmup_cycles: usize,
    keystream_bits: usize,
}

#[derive(Serialize)]
struct CanonicalRun {
    engine_version: u32,
    config: CanonicalConfig,
    keystream: String,
    steps: Vec<TraceRow>,
}

/// Canonical serialization of a run to UTF-8 JSON bytes.
pub fn canonical_serialize(output: &SimulationOutput) -> Vec<u8> {
    let p = &output.params;
    let run = CanonicalRun {
        engine_version: ENGINE_VERSION,
        config: CanonicalConfig {
            key: p.key,
            frame: p.frame,
            warmup_cycles: p.warmup_cycles,
            keystream_bits: p.keystream_bits,
        },
        keystream: output.keystream.to_string(),
        steps: trace_rows(&output.trace),
    };
    serde_json::to_vec(&run).expect("canonical_serialize: JSON serialization failed")
}

/// SHA-256 of canonical serialization. Lowercase hex string.
pub fn canonical_hash(output: &SimulationOutput) -> String {
    sha256_hex(&canonical_serialize(output))
}

/// Lowercase hex SHA-256 of arbitrary bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<String>()
}
