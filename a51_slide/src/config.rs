/// Slide A5/1: Simulation Configuration
///
/// `SimulationConfig` is the raw, user-facing shape (wide integer types so
/// that out-of-range input is representable). `validate` turns it into
/// `RunParams`, the only shape the engine accepts.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bits::check_width;
use crate::error::ConfigError;

/// Key width in bits.
pub const KEY_BITS: u32 = 16;
/// Frame-number width in bits.
pub const FRAME_BITS: u32 = 8;

pub const DEFAULT_KEY: u64 = 0xBEEF;
pub const DEFAULT_FRAME: u64 = 0x3A;
pub const DEFAULT_WARMUP_CYCLES: i64 = 10;
pub const DEFAULT_KEYSTREAM_BITS: i64 = 8;

/// Unvalidated run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub key: u64,
    pub frame: u64,
    pub warmup_cycles: i64,
    pub keystream_bits: i64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_KEY,
            frame: DEFAULT_FRAME,
            warmup_cycles: DEFAULT_WARMUP_CYCLES,
            keystream_bits: DEFAULT_KEYSTREAM_BITS,
        }
    }
}

/// Validated run parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunParams {
    pub key: u16,
    pub frame: u8,
    pub warmup_cycles: usize,
    pub keystream_bits: usize,
}

impl RunParams {
    /// Number of step records a run with these parameters produces.
    pub fn trace_len(&self) -> usize {
        1 + KEY_BITS as usize + FRAME_BITS as usize + self.warmup_cycles + self.keystream_bits
    }
}

impl From<RunParams> for SimulationConfig {
    fn from(p: RunParams) -> Self {
        Self {
            key: p.key as u64,
            frame: p.frame as u64,
            warmup_cycles: p.warmup_cycles as i64,
            keystream_bits: p.keystream_bits as i64,
        }
    }
}

impl SimulationConfig {
    pub fn new(key: u64, frame: u64, warmup_cycles: i64, keystream_bits: i64) -> Self {
        Self {
            key,
            frame,
            warmup_cycles,
            keystream_bits,
        }
    }

    /// Check widths and counts. Nothing is constructed on failure.
    pub fn validate(&self) -> Result<RunParams, ConfigError> {
        check_width("key", self.key, KEY_BITS)?;
        check_width("frame", self.frame, FRAME_BITS)?;
        let warmup_cycles = cycle_count("warmup_cycles", self.warmup_cycles)?;
        let keystream_bits = cycle_count("keystream_bits", self.keystream_bits)?;
        Ok(RunParams {
            key: self.key as u16,
            frame: self.frame as u8,
            warmup_cycles,
            keystream_bits,
        })
    }

    /// Load from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

fn cycle_count(field: &'static str, value: i64) -> Result<usize, ConfigError> {
    usize::try_from(value).map_err(|_| ConfigError::InvalidCycleCount { field, value })
}
