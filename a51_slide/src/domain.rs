/// Slide A5/1: Core Domain Types
///
/// Pure data. No transition logic.
/// Absent values ("not applicable", "not clocked") are `None`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bits::bits_to_string;
use crate::register::{Register, LAYOUT_X, LAYOUT_Y, LAYOUT_Z};

// ── Cipher state ───────────────────────────────────────────────────

/// The register triple (X, Y, Z) at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CipherState {
    pub x: Register,
    pub y: Register,
    pub z: Register,
}

impl CipherState {
    /// All three registers zeroed.
    pub fn zeroed() -> Self {
        Self {
            x: Register::zeroed(&LAYOUT_X),
            y: Register::zeroed(&LAYOUT_Y),
            z: Register::zeroed(&LAYOUT_Z),
        }
    }

    /// Registers in X, Y, Z order.
    pub fn registers(&self) -> [Register; 3] {
        [self.x, self.y, self.z]
    }

    pub fn from_registers([x, y, z]: [Register; 3]) -> Self {
        Self { x, y, z }
    }
}

impl Default for CipherState {
    fn default() -> Self {
        Self::zeroed()
    }
}

// ── Phases and inputs ──────────────────────────────────────────────

/// Phase label of a step record, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[serde(rename = "init")]
    Init,
    #[serde(rename = "load_Kc")]
    LoadKc,
    #[serde(rename = "load_FN")]
    LoadFn,
    #[serde(rename = "warmup")]
    Warmup,
    #[serde(rename = "keystream")]
    Keystream,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Init,
        Phase::LoadKc,
        Phase::LoadFn,
        Phase::Warmup,
        Phase::Keystream,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Init => "init",
            Phase::LoadKc => "load_Kc",
            Phase::LoadFn => "load_FN",
            Phase::Warmup => "warmup",
            Phase::Keystream => "keystream",
        }
    }

    /// Load phases clock every register unconditionally.
    pub fn is_load(&self) -> bool {
        matches!(self, Phase::LoadKc | Phase::LoadFn)
    }

    /// Warm-up and keystream use majority clocking.
    pub fn is_majority_clocked(&self) -> bool {
        matches!(self, Phase::Warmup | Phase::Keystream)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Source of an externally injected bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputSource {
    #[serde(rename = "Kc")]
    Kc,
    #[serde(rename = "FN")]
    Fn,
}

impl InputSource {
    pub fn label(&self) -> &'static str {
        match self {
            InputSource::Kc => "Kc",
            InputSource::Fn => "FN",
        }
    }

    /// Phase that consumes this source.
    pub fn phase(&self) -> Phase {
        match self {
            InputSource::Kc => Phase::LoadKc,
            InputSource::Fn => Phase::LoadFn,
        }
    }
}

/// External bit fed into a load cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputBit {
    pub source: InputSource,
    pub bit: u8,
}

// ── Step record ────────────────────────────────────────────────────

/// Immutable snapshot of one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub phase: Phase,
    /// 1-based index within `phase`.
    pub step: u32,
    pub input: Option<InputBit>,
    pub before: CipherState,
    /// X, Y, Z feedback bits; `None` for init.
    pub feedback: Option<[u8; 3]>,
    /// X, Y, Z clock-control bits; `None` for init.
    pub clocks: Option<[u8; 3]>,
    /// Warm-up and keystream only.
    pub majority: Option<u8>,
    /// `None` means the register was not clocked.
    pub injected: [Option<u8>; 3],
    pub after: CipherState,
    /// Keystream only.
    pub output: Option<u8>,
}

impl StepRecord {
    /// The single `init` record emitted before any cycle runs.
    pub fn initial(state: CipherState) -> Self {
        Self {
            phase: Phase::Init,
            step: 1,
            input: None,
            before: state,
            feedback: None,
            clocks: None,
            majority: None,
            injected: [None; 3],
            after: state,
            output: None,
        }
    }
}

/// Structured, immutable outcome of one `advance` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleOutcome {
    pub input: Option<InputBit>,
    pub feedback: [u8; 3],
    pub clocks: [u8; 3],
    pub majority: Option<u8>,
    pub injected: [Option<u8>; 3],
    pub output: Option<u8>,
}

impl CycleOutcome {
    /// Which registers were shifted this cycle.
    pub fn clocked(&self) -> [bool; 3] {
        self.injected.map(|inj| inj.is_some())
    }

    /// Freeze into a step record.
    pub fn into_record(
        self,
        phase: Phase,
        step: u32,
        before: CipherState,
        after: CipherState,
    ) -> StepRecord {
        StepRecord {
            phase,
            step,
            input: self.input,
            before,
            feedback: Some(self.feedback),
            clocks: Some(self.clocks),
            majority: self.majority,
            injected: self.injected,
            after,
            output: self.output,
        }
    }
}

// ── Keystream ──────────────────────────────────────────────────────

/// Ordered keystream bits, one per keystream cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Keystream(Vec<u8>);

impl Keystream {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with_capacity(n: usize) -> Self {
        Self(Vec::with_capacity(n))
    }

    pub fn push(&mut self, bit: u8) {
        self.0.push(bit & 1);
    }

    pub fn bits(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Keystream {
    fn from(bits: Vec<u8>) -> Self {
        Self(bits.into_iter().map(|b| b & 1).collect())
    }
}

impl fmt::Display for Keystream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bits_to_string(&self.0))
    }
}
