//! Snapshot layer: deterministic run snapshots.
//!
//! Snapshots contain canonical JSON + hash for verification.
//! No timestamps in snapshot content (determinism).

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use a51_slide::config::SimulationConfig;
use a51_slide::hashing::{canonical_hash, canonical_serialize, sha256_hex};
use a51_slide::{SimulationOutput, ENGINE_VERSION};

use crate::error::{Result, RuntimeError};

/// Snapshot on-disk format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSnapshot {
    /// Engine version at snapshot time.
    pub engine_version: u32,
    pub config: SimulationConfig,
    /// Keystream as a '0'/'1' string.
    pub keystream: String,
    /// Canonical JSON of the run (UTF-8).
    pub canonical_json: String,
    /// SHA-256 of the canonical JSON.
    pub hash: String,
}

impl RunSnapshot {
    pub fn capture(output: &SimulationOutput) -> Result<Self> {
        let canonical_json = String::from_utf8(canonical_serialize(output))
            .map_err(|e| RuntimeError::Corrupt(format!("canonical JSON is not UTF-8: {}", e)))?;
        Ok(Self {
            engine_version: ENGINE_VERSION,
            config: output.params.into(),
            keystream: output.keystream.to_string(),
            canonical_json,
            hash: canonical_hash(output),
        })
    }
}

/// Write a snapshot of `output` to `path`, fsynced.
pub fn save_snapshot(path: &Path, output: &SimulationOutput) -> Result<RunSnapshot> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let snap = RunSnapshot::capture(output)?;
    let content = serde_json::to_string_pretty(&snap)?;

    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;

    info!(path = %path.display(), hash = %snap.hash, "snapshot saved");
    Ok(snap)
}

/// Load a snapshot. Returns `None` if the file does not exist.
pub fn load_snapshot(path: &Path) -> Result<Option<RunSnapshot>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

/// Verify a snapshot's internal hash consistency.
/// Returns true if the hash matches the canonical JSON content.
pub fn verify_snapshot_hash(snap: &RunSnapshot) -> bool {
    sha256_hex(snap.canonical_json.as_bytes()) == snap.hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use a51_slide::simulate;

    #[test]
    fn test_save_load_verify() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        let out = simulate(&SimulationConfig::default()).unwrap();

        let saved = save_snapshot(&path, &out).unwrap();
        let loaded = load_snapshot(&path).unwrap().unwrap();
        assert_eq!(saved, loaded);
        assert_eq!(loaded.keystream, "10011000");
        assert_eq!(loaded.config, SimulationConfig::default());
        assert_eq!(loaded.engine_version, 1);
        assert!(verify_snapshot_hash(&loaded));
    }

    #[test]
    fn test_tampered_snapshot_fails_verification() {
        let out = simulate(&SimulationConfig::default()).unwrap();
        let mut snap = RunSnapshot::capture(&out).unwrap();
        snap.canonical_json = snap.canonical_json.replace("10011000", "10011001");
        assert!(!verify_snapshot_hash(&snap));
    }

    #[test]
    fn test_missing_snapshot_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_snapshot(&dir.path().join("absent.json")).unwrap().is_none());
    }

    #[test]
    fn test_malformed_snapshot_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(load_snapshot(&path), Err(RuntimeError::Json(_))));
    }
}
