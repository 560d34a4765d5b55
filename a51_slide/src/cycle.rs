/// Slide A5/1: Cycle Definitions
///
/// A cycle carries intent only: which clocking discipline applies and,
/// for load cycles, the external bit. Zero transition logic.

use crate::domain::{InputBit, InputSource, Phase};

/// One clock cycle of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cycle {
    /// Unconditional shift of all three registers with `feedback ^ bit`.
    Load { source: InputSource, bit: u8 },
    /// Majority clocking, output discarded.
    Warmup,
    /// Majority clocking, output collected.
    Keystream,
}

impl Cycle {
    pub fn load(source: InputSource, bit: u8) -> Self {
        Cycle::Load {
            source,
            bit: bit & 1,
        }
    }

    /// Phase a record of this cycle is filed under.
    pub fn phase(&self) -> Phase {
        match self {
            Cycle::Load { source, .. } => source.phase(),
            Cycle::Warmup => Phase::Warmup,
            Cycle::Keystream => Phase::Keystream,
        }
    }

    pub fn input(&self) -> Option<InputBit> {
        match *self {
            Cycle::Load { source, bit } => Some(InputBit { source, bit: bit & 1 }),
            Cycle::Warmup | Cycle::Keystream => None,
        }
    }

    pub fn emits_output(&self) -> bool {
        matches!(self, Cycle::Keystream)
    }
}
