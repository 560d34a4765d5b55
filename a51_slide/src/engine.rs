/// Slide A5/1: Engine
///
/// Top-level orchestrator. Delegates every register change to
/// `transitions::advance` and every record to the trace recorder.
///
/// Strict phase order: init → load_Kc → load_FN → warmup → keystream.

use tracing::{debug, trace};

use crate::bits::value_to_bits;
use crate::config::{RunParams, SimulationConfig, FRAME_BITS, KEY_BITS};
use crate::cycle::Cycle;
use crate::domain::{CipherState, InputSource, Keystream, Phase, StepRecord};
use crate::error::ConfigError;
use crate::invariants::{try_validate_record, try_validate_run_shape};
use crate::trace::{Trace, TraceRecorder};
use crate::transitions::advance;

/// Everything a completed run produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationOutput {
    pub params: RunParams,
    pub keystream: Keystream,
    pub trace: Trace,
}

/// Stateful engine wrapping the pure transition layer.
pub struct SlideEngine {
    state: CipherState,
    recorder: TraceRecorder,
    keystream: Keystream,
    phase: Phase,
    phase_step: u32,
}

impl SlideEngine {
    /// Zeroed registers with the `init` record already emitted.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(records: usize) -> Self {
        let state = CipherState::zeroed();
        let mut recorder = TraceRecorder::with_capacity(records);
        recorder.record(StepRecord::initial(state));
        Self {
            state,
            recorder,
            keystream: Keystream::new(),
            phase: Phase::Init,
            phase_step: 1,
        }
    }

    pub fn state(&self) -> &CipherState {
        &self.state
    }

    pub fn keystream(&self) -> &Keystream {
        &self.keystream
    }

    pub fn records_len(&self) -> usize {
        self.recorder.len()
    }

    /// Apply one cycle:
    ///   1. Enforce phase order (never backwards, init only once)
    ///   2. Delegate to transitions::advance
    ///   3. Record, collect output, store the new state
    ///
    /// # Panics
    /// Panics if `cycle` belongs to a phase that has already been left.
    pub fn apply_cycle(&mut self, cycle: Cycle) -> &StepRecord {
        let phase = cycle.phase();
        if phase < self.phase {
            panic!(
                "Phase order violation: {} cycle after {}",
                phase, self.phase
            );
        }
        self.phase_step = if phase == self.phase {
            self.phase_step + 1
        } else {
            1
        };
        self.phase = phase;

        let before = self.state;
        let (after, outcome) = advance(&before, cycle);
        if let Some(bit) = outcome.output {
            self.keystream.push(bit);
        }
        let record = outcome.into_record(phase, self.phase_step, before, after);
        debug_assert!(
            try_validate_record(&record, self.recorder.last()).is_ok(),
            "engine produced an invalid record: {:?}",
            try_validate_record(&record, self.recorder.last())
        );
        trace!(
            phase = %phase,
            step = self.phase_step,
            x = %after.x,
            y = %after.y,
            z = %after.z,
            output = ?outcome.output,
            "cycle"
        );
        self.state = after;
        self.recorder.record(record)
    }

    /// Load `width` bits of `value`, MSB first.
    pub fn load(&mut self, source: InputSource, value: u64, width: u32) {
        for bit in value_to_bits(value, width) {
            self.apply_cycle(Cycle::load(source, bit));
        }
        debug!(phase = %source.phase(), bits = width, state = ?self.state, "load complete");
    }

    pub fn warm_up(&mut self, cycles: usize) {
        for _ in 0..cycles {
            self.apply_cycle(Cycle::Warmup);
        }
        debug!(cycles, state = ?self.state, "warm-up complete");
    }

    /// Run `bits` keystream cycles and return the bits produced by them.
    pub fn generate(&mut self, bits: usize) -> &[u8] {
        let start = self.keystream.len();
        for _ in 0..bits {
            self.apply_cycle(Cycle::Keystream);
        }
        debug!(bits, keystream = %self.keystream, "keystream complete");
        &self.keystream.bits()[start..]
    }

    /// Freeze the trace and keystream.
    pub fn finish(self, params: RunParams) -> SimulationOutput {
        SimulationOutput {
            params,
            keystream: self.keystream,
            trace: self.recorder.finish(),
        }
    }
}

impl Default for SlideEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate `config`, then run every phase in order.
///
/// Configuration errors are returned before any register exists.
pub fn simulate(config: &SimulationConfig) -> Result<SimulationOutput, ConfigError> {
    let params = config.validate()?;
    Ok(run(params))
}

/// Run every phase for already-validated parameters.
pub fn run(params: RunParams) -> SimulationOutput {
    let mut engine = SlideEngine::with_capacity(params.trace_len());
    engine.load(InputSource::Kc, params.key as u64, KEY_BITS);
    engine.load(InputSource::Fn, params.frame as u64, FRAME_BITS);
    engine.warm_up(params.warmup_cycles);
    engine.generate(params.keystream_bits);
    let output = engine.finish(params);
    debug_assert!(try_validate_run_shape(output.trace.records(), &params).is_ok());
    debug!(
        key = params.key,
        frame = params.frame,
        records = output.trace.len(),
        keystream = %output.keystream,
        "run complete"
    );
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_engine_emits_init() {
        let engine = SlideEngine::new();
        assert_eq!(engine.records_len(), 1);
        assert_eq!(*engine.state(), CipherState::zeroed());
        assert!(engine.keystream().is_empty());
    }

    #[test]
    fn test_phase_step_indices_restart() {
        let mut engine = SlideEngine::new();
        engine.load(InputSource::Kc, 0xBEEF, 16);
        let r = engine.apply_cycle(Cycle::load(InputSource::Fn, 0));
        assert_eq!((r.phase, r.step), (Phase::LoadFn, 1));
        let r = engine.apply_cycle(Cycle::load(InputSource::Fn, 0));
        assert_eq!(r.step, 2);
        let r = engine.apply_cycle(Cycle::Warmup);
        assert_eq!((r.phase, r.step), (Phase::Warmup, 1));
    }

    #[test]
    #[should_panic(expected = "Phase order violation")]
    fn test_backwards_phase_panics() {
        let mut engine = SlideEngine::new();
        engine.apply_cycle(Cycle::Warmup);
        engine.apply_cycle(Cycle::load(InputSource::Kc, 1));
    }

    #[test]
    fn test_generate_returns_new_bits() {
        let mut engine = SlideEngine::new();
        engine.load(InputSource::Kc, 0xBEEF, 16);
        engine.load(InputSource::Fn, 0x3A, 8);
        engine.warm_up(10);
        assert_eq!(engine.generate(3), &[1, 0, 0]);
        assert_eq!(engine.generate(5), &[1, 1, 0, 0, 0]);
        assert_eq!(engine.keystream().to_string(), "10011000");
    }

    #[test]
    fn test_default_run() {
        let out = simulate(&SimulationConfig::default()).unwrap();
        assert_eq!(out.keystream.to_string(), "10011000");
        assert_eq!(out.trace.len(), 43);
        let last = out.trace.records().last().unwrap();
        assert_eq!(last.after.x.to_string(), "11011");
        assert_eq!(last.after.y.to_string(), "010111");
        assert_eq!(last.after.z.to_string(), "1000101");
    }

    #[test]
    fn test_config_error_short_circuits() {
        let err = simulate(&SimulationConfig::new(0x1_0000, 0, 0, 0)).unwrap_err();
        assert!(matches!(err, ConfigError::ValueTooWide { .. }));
        let err = simulate(&SimulationConfig::new(0, 0, 0, -1)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCycleCount { .. }));
    }

    #[test]
    fn test_warmup_emits_no_keystream() {
        let out = simulate(&SimulationConfig::new(0xBEEF, 0x3A, 50, 0)).unwrap();
        assert!(out.keystream.is_empty());
        assert!(out.trace.phase(Phase::Warmup).all(|r| r.output.is_none()));
    }
}
