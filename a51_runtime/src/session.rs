//! Session manager: one isolated directory per persisted run.
//!
//! Directory structure:
//!   <base_dir>/<session_id>/config.json
//!   <base_dir>/<session_id>/trace.log
//!   <base_dir>/<session_id>/snapshot.json
//!   <base_dir>/<session_id>/trace.csv
//!
//! Run-before-persist order:
//!   1. simulate(config)  (configuration errors abort here)
//!   2. config.json, trace.log  (only if step 1 succeeded)
//!   3. snapshot.json, trace.csv

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use a51_slide::config::{RunParams, SimulationConfig};
use a51_slide::domain::{Keystream, Phase};
use a51_slide::export::write_csv_file;
use a51_slide::hashing::canonical_hash;
use a51_slide::trace::Trace;
use a51_slide::SimulationOutput;

use crate::error::{Result, RuntimeError};
use crate::replay;
use crate::snapshot::{self, verify_snapshot_hash, RunSnapshot};
use crate::trace_store::TraceStore;

pub const CONFIG_FILE: &str = "config.json";
pub const TRACE_LOG_FILE: &str = "trace.log";
pub const SNAPSHOT_FILE: &str = "snapshot.json";
pub const TRACE_CSV_FILE: &str = "trace.csv";

/// A persisted run together with its in-memory output.
pub struct Session {
    session_id: String,
    dir: PathBuf,
    config: SimulationConfig,
    output: SimulationOutput,
    hash: String,
}

impl Session {
    /// Run `config` and persist everything under `<base_dir>/<session_id>`.
    ///
    /// Refuses to touch a directory that already holds a trace log.
    pub fn create(base_dir: &Path, session_id: &str, config: &SimulationConfig) -> Result<Self> {
        let dir = base_dir.join(session_id);
        if dir.join(TRACE_LOG_FILE).exists() {
            return Err(RuntimeError::SessionExists(session_id.to_string()));
        }

        let (output, hash) = replay::rebuild_run(config)?;

        fs::create_dir_all(&dir)?;
        fs::write(dir.join(CONFIG_FILE), serde_json::to_string_pretty(config)?)?;
        TraceStore::open(&dir.join(TRACE_LOG_FILE))?.append_trace(&output.trace)?;
        snapshot::save_snapshot(&dir.join(SNAPSHOT_FILE), &output)?;
        write_csv_file(&output.trace, &dir.join(TRACE_CSV_FILE))?;

        info!(session = session_id, hash = %hash, "session created");
        Ok(Self {
            session_id: session_id.to_string(),
            dir,
            config: config.clone(),
            output,
            hash,
        })
    }

    /// Reload a session, replay its configuration and reject any drift
    /// between what is stored and what the engine produces now.
    pub fn open(base_dir: &Path, session_id: &str) -> Result<Self> {
        let dir = base_dir.join(session_id);
        let config: SimulationConfig =
            serde_json::from_str(&fs::read_to_string(dir.join(CONFIG_FILE))?)?;

        let stored = TraceStore::open(&dir.join(TRACE_LOG_FILE))?.load_trace()?;
        let (output, hash) = replay::rebuild_run(&config)?;

        if stored != output.trace {
            let stored_hash = stored_trace_hash(stored);
            warn!(session = session_id, "stored trace differs from replay");
            return Err(RuntimeError::Drift {
                stored: stored_hash,
                replayed: hash,
            });
        }

        if let Some(snap) = snapshot::load_snapshot(&dir.join(SNAPSHOT_FILE))? {
            check_snapshot(&snap, &hash)?;
        }

        info!(session = session_id, hash = %hash, "session reopened");
        Ok(Self {
            session_id: session_id.to_string(),
            dir,
            config,
            output,
            hash,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn output(&self) -> &SimulationOutput {
        &self.output
    }

    pub fn keystream(&self) -> &Keystream {
        &self.output.keystream
    }

    /// Canonical hash of the run.
    pub fn current_hash(&self) -> &str {
        &self.hash
    }
}

/// Hash the stored records under the parameters they themselves encode.
fn stored_trace_hash(stored: Trace) -> String {
    let value_of = |phase: Phase| {
        stored
            .phase(phase)
            .filter_map(|r| r.input)
            .fold(0u64, |acc, input| (acc << 1) | u64::from(input.bit))
    };
    let params = RunParams {
        key: value_of(Phase::LoadKc) as u16,
        frame: value_of(Phase::LoadFn) as u8,
        warmup_cycles: stored.phase(Phase::Warmup).count(),
        keystream_bits: stored.phase(Phase::Keystream).count(),
    };
    let keystream: Vec<u8> = stored.iter().filter_map(|r| r.output).collect();
    canonical_hash(&SimulationOutput {
        params,
        keystream: Keystream::from(keystream),
        trace: stored,
    })
}

fn check_snapshot(snap: &RunSnapshot, replayed_hash: &str) -> Result<()> {
    if !verify_snapshot_hash(snap) {
        return Err(RuntimeError::Corrupt(
            "snapshot hash does not match its canonical JSON".to_string(),
        ));
    }
    if snap.hash != replayed_hash {
        return Err(RuntimeError::Drift {
            stored: snap.hash.clone(),
            replayed: replayed_hash.to_string(),
        });
    }
    Ok(())
}
