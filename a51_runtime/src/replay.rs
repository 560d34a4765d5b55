//! Replay orchestrator: rebuild a run from its configuration.
//!
//! Delegates all register logic to the engine. No cached state.

use tracing::debug;

use a51_slide::config::SimulationConfig;
use a51_slide::hashing::canonical_hash;
use a51_slide::{simulate, SimulationOutput};

use crate::error::Result;

/// Re-run `config` from zeroed registers.
///
/// Returns `(output, canonical_hash)`. Pure on the configuration.
pub fn rebuild_run(config: &SimulationConfig) -> Result<(SimulationOutput, String)> {
    let output = simulate(config)?;
    let hash = canonical_hash(&output);
    debug!(hash = %hash, records = output.trace.len(), "run rebuilt");
    Ok((output, hash))
}

/// Rebuild and return only the canonical hash.
pub fn rebuild_hash(config: &SimulationConfig) -> Result<String> {
    let (_, hash) = rebuild_run(config)?;
    Ok(hash)
}
