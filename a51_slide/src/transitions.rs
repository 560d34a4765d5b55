/// Slide A5/1: Transition Logic
///
/// ALL register-mutation logic lives here.
/// `advance` is pure: the input state is never touched, a new state is
/// returned alongside a structured outcome.

use std::array;

use crate::bits::majority;
use crate::cycle::Cycle;
use crate::domain::{CipherState, CycleOutcome};

/// Apply one cycle to `state` and return `(next_state, outcome)`.
pub fn advance(state: &CipherState, cycle: Cycle) -> (CipherState, CycleOutcome) {
    let regs = state.registers();
    let feedback = regs.map(|r| r.feedback());
    let clocks = regs.map(|r| r.clock_control());

    let (majority_bit, injected) = match cycle {
        Cycle::Load { bit, .. } => (None, feedback.map(|fb| Some(fb ^ (bit & 1)))),
        Cycle::Warmup | Cycle::Keystream => {
            let m = majority(clocks[0], clocks[1], clocks[2]);
            let injected: [Option<u8>; 3] =
                array::from_fn(|i| (clocks[i] == m).then_some(feedback[i]));
            (Some(m), injected)
        }
    };

    let next_regs = array::from_fn(|i| match injected[i] {
        Some(bit) => regs[i].shift(bit),
        None => regs[i],
    });
    let next = CipherState::from_registers(next_regs);

    // Output reads the post-clock MSBs.
    let output = cycle
        .emits_output()
        .then(|| next.x.msb() ^ next.y.msb() ^ next.z.msb());

    let outcome = CycleOutcome {
        input: cycle.input(),
        feedback,
        clocks,
        majority: majority_bit,
        injected,
        output,
    };
    (next, outcome)
}
