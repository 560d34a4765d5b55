/// Slide A5/1: Trace Invariant Checks
///
/// Every check recomputes what the engine should have done from the
/// record's own pre-state and compares. Messages carry an
/// `[INVARIANT:<rule>]` tag so callers can match on the rule.

use crate::bits::majority;
use crate::config::{RunParams, FRAME_BITS, KEY_BITS};
use crate::domain::{CipherState, Phase, StepRecord};
use crate::register::{LAYOUT_X, LAYOUT_Y, LAYOUT_Z};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run every trace check. Panics on the first failure.
pub fn validate_trace(records: &[StepRecord]) {
    if let Err(msg) = try_validate_trace(records) {
        panic!("Invariant violation: {}", msg);
    }
}

/// Non-panicking variant of `validate_trace`.
/// Returns `Err(message)` on the first failure, `Ok(())` if all pass.
pub fn try_validate_trace(records: &[StepRecord]) -> Result<(), String> {
    let first = records
        .first()
        .ok_or_else(|| "[INVARIANT:init_first] Trace is empty".to_string())?;
    if first.phase != Phase::Init {
        return Err(format!(
            "[INVARIANT:init_first] First record is {:?}, expected init",
            first.phase.label()
        ));
    }
    if first.before != CipherState::zeroed() {
        return Err("[INVARIANT:init_first] Registers do not start zeroed".to_string());
    }

    let mut prev: Option<&StepRecord> = None;
    for (i, record) in records.iter().enumerate() {
        try_validate_record(record, prev).map_err(|msg| format!("row {}: {}", i + 1, msg))?;
        prev = Some(record);
    }
    try_check_load_lengths(records)
}

/// Check one record, and its link to the previous one when given.
pub fn try_validate_record(record: &StepRecord, prev: Option<&StepRecord>) -> Result<(), String> {
    try_check_ordering(record, prev)?;
    try_check_layouts(&record.before)?;
    try_check_layouts(&record.after)?;
    match record.phase {
        Phase::Init => try_check_init(record),
        Phase::LoadKc | Phase::LoadFn => {
            try_check_control_bits(record)?;
            try_check_load_clocking(record)?;
            try_check_output(record)
        }
        Phase::Warmup | Phase::Keystream => {
            try_check_control_bits(record)?;
            try_check_majority_clocking(record)?;
            try_check_output(record)
        }
    }
}

/// Check the per-phase record counts of a complete run against its parameters.
pub fn try_validate_run_shape(records: &[StepRecord], params: &RunParams) -> Result<(), String> {
    let expected = [
        (Phase::Init, 1),
        (Phase::LoadKc, KEY_BITS as usize),
        (Phase::LoadFn, FRAME_BITS as usize),
        (Phase::Warmup, params.warmup_cycles),
        (Phase::Keystream, params.keystream_bits),
    ];
    for (phase, count) in expected {
        let got = records.iter().filter(|r| r.phase == phase).count();
        if got != count {
            return Err(format!(
                "[INVARIANT:phase_length] Phase {} has {} records, expected {}",
                phase, got, count
            ));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Individual checks (private)
// ---------------------------------------------------------------------------

fn try_check_ordering(record: &StepRecord, prev: Option<&StepRecord>) -> Result<(), String> {
    let Some(prev) = prev else {
        return if record.step == 1 {
            Ok(())
        } else {
            Err(format!(
                "[INVARIANT:step_index] First step index is {}, expected 1",
                record.step
            ))
        };
    };

    if record.phase < prev.phase || record.phase == Phase::Init {
        return Err(format!(
            "[INVARIANT:phase_order] Phase {} follows {}",
            record.phase, prev.phase
        ));
    }
    let expected_step = if record.phase == prev.phase {
        prev.step + 1
    } else {
        1
    };
    if record.step != expected_step {
        return Err(format!(
            "[INVARIANT:step_index] {} step {} where {} was expected",
            record.phase, record.step, expected_step
        ));
    }
    if record.before != prev.after {
        return Err(format!(
            "[INVARIANT:continuity] {} step {} starts from {:?}, previous record ended at {:?}",
            record.phase, record.step, record.before, prev.after
        ));
    }
    Ok(())
}

/// Both load phases are fixed-width and always run to completion.
fn try_check_load_lengths(records: &[StepRecord]) -> Result<(), String> {
    for (phase, width) in [(Phase::LoadKc, KEY_BITS), (Phase::LoadFn, FRAME_BITS)] {
        let got = records.iter().filter(|r| r.phase == phase).count();
        if got != width as usize {
            return Err(format!(
                "[INVARIANT:phase_length] Phase {} has {} records, expected {}",
                phase, got, width
            ));
        }
    }
    Ok(())
}

fn try_check_layouts(state: &CipherState) -> Result<(), String> {
    let expected = [&LAYOUT_X, &LAYOUT_Y, &LAYOUT_Z];
    for (reg, layout) in state.registers().iter().zip(expected) {
        if reg.layout() != layout {
            return Err(format!(
                "[INVARIANT:register_width] Register {} has width {}, expected {} of width {}",
                reg.layout().name,
                reg.width(),
                layout.name,
                layout.width
            ));
        }
    }
    Ok(())
}

fn try_check_init(record: &StepRecord) -> Result<(), String> {
    let inert = record.input.is_none()
        && record.feedback.is_none()
        && record.clocks.is_none()
        && record.majority.is_none()
        && record.injected == [None; 3]
        && record.output.is_none()
        && record.before == record.after;
    if !inert {
        return Err("[INVARIANT:init_inert] Init record carries cycle data".to_string());
    }
    Ok(())
}

fn try_check_control_bits(record: &StepRecord) -> Result<(), String> {
    let regs = record.before.registers();
    let feedback = regs.map(|r| r.feedback());
    let clocks = regs.map(|r| r.clock_control());
    if record.feedback != Some(feedback) {
        return Err(format!(
            "[INVARIANT:feedback] {} step {} records feedback {:?}, registers give {:?}",
            record.phase, record.step, record.feedback, feedback
        ));
    }
    if record.clocks != Some(clocks) {
        return Err(format!(
            "[INVARIANT:clock_bits] {} step {} records clocks {:?}, registers give {:?}",
            record.phase, record.step, record.clocks, clocks
        ));
    }
    Ok(())
}

fn try_check_load_clocking(record: &StepRecord) -> Result<(), String> {
    let input = match record.input {
        Some(input) if input.source.phase() == record.phase && input.bit <= 1 => input,
        other => {
            return Err(format!(
                "[INVARIANT:load_input] {} step {} has input {:?}",
                record.phase, record.step, other
            ))
        }
    };
    if record.majority.is_some() {
        return Err(format!(
            "[INVARIANT:load_clocking] {} step {} records a majority",
            record.phase, record.step
        ));
    }
    let before = record.before.registers();
    let after = record.after.registers();
    for i in 0..3 {
        let expected_inj = before[i].feedback() ^ input.bit;
        if record.injected[i] != Some(expected_inj) || after[i] != before[i].shift(expected_inj) {
            return Err(format!(
                "[INVARIANT:load_clocking] {} step {}: register {} not shifted with {}",
                record.phase,
                record.step,
                before[i].layout().name,
                expected_inj
            ));
        }
    }
    Ok(())
}

fn try_check_majority_clocking(record: &StepRecord) -> Result<(), String> {
    if record.input.is_some() {
        return Err(format!(
            "[INVARIANT:load_input] {} step {} carries an external input",
            record.phase, record.step
        ));
    }
    let before = record.before.registers();
    let after = record.after.registers();
    let clocks = before.map(|r| r.clock_control());
    let m = majority(clocks[0], clocks[1], clocks[2]);
    if record.majority != Some(m) {
        return Err(format!(
            "[INVARIANT:majority] {} step {} records majority {:?}, clocks give {}",
            record.phase, record.step, record.majority, m
        ));
    }
    for i in 0..3 {
        let name = before[i].layout().name;
        if clocks[i] == m {
            let fb = before[i].feedback();
            if record.injected[i] != Some(fb) || after[i] != before[i].shift(fb) {
                return Err(format!(
                    "[INVARIANT:majority_clocking] {} step {}: register {} agrees with majority but was not shifted",
                    record.phase, record.step, name
                ));
            }
        } else if record.injected[i].is_some() || after[i] != before[i] {
            return Err(format!(
                "[INVARIANT:majority_clocking] {} step {}: register {} disagrees with majority but moved",
                record.phase, record.step, name
            ));
        }
    }
    Ok(())
}

fn try_check_output(record: &StepRecord) -> Result<(), String> {
    let expected = (record.phase == Phase::Keystream)
        .then(|| record.after.x.msb() ^ record.after.y.msb() ^ record.after.z.msb());
    if record.output != expected {
        return Err(format!(
            "[INVARIANT:output] {} step {} records output {:?}, expected {:?}",
            record.phase, record.step, record.output, expected
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::engine::simulate;

    fn default_records() -> Vec<StepRecord> {
        simulate(&SimulationConfig::default())
            .unwrap()
            .trace
            .records()
            .to_vec()
    }

    #[test]
    fn test_engine_trace_passes() {
        let records = default_records();
        assert_eq!(try_validate_trace(&records), Ok(()));
        let params = SimulationConfig::default().validate().unwrap();
        assert_eq!(try_validate_run_shape(&records, &params), Ok(()));
        validate_trace(&records);
    }

    #[test]
    fn test_empty_trace_rejected() {
        let err = try_validate_trace(&[]).unwrap_err();
        assert!(err.contains("[INVARIANT:init_first]"));
    }

    #[test]
    fn test_tampered_output_rejected() {
        let mut records = default_records();
        let last = records.last_mut().unwrap();
        last.output = last.output.map(|b| b ^ 1);
        let err = try_validate_trace(&records).unwrap_err();
        assert!(err.contains("[INVARIANT:output]"), "{}", err);
        assert!(err.starts_with("row 43:"), "{}", err);
    }

    #[test]
    fn test_unshifted_load_rejected() {
        let mut records = default_records();
        records[10].after = records[10].before;
        let err = try_validate_trace(&records).unwrap_err();
        assert!(err.contains("[INVARIANT:load_clocking]"), "{}", err);
    }

    #[test]
    fn test_forced_clock_rejected() {
        let mut records = default_records();
        // warmup step 1: Z disagrees with the majority
        let idx = records
            .iter()
            .position(|r| r.phase == Phase::Warmup)
            .unwrap();
        let fb = records[idx].before.z.feedback();
        records[idx].injected[2] = Some(fb);
        let err = try_validate_record(&records[idx], Some(&records[idx - 1])).unwrap_err();
        assert!(err.contains("[INVARIANT:majority_clocking]"), "{}", err);
    }

    #[test]
    fn test_truncated_load_rejected() {
        let records = default_records();
        // init plus three load_Kc rows is internally consistent but incomplete
        let err = try_validate_trace(&records[..4]).unwrap_err();
        assert!(err.contains("[INVARIANT:phase_length]"), "{}", err);
        assert!(err.contains("load_Kc"), "{}", err);
        // all of load_Kc but only part of load_FN
        let err = try_validate_trace(&records[..20]).unwrap_err();
        assert!(err.contains("load_FN has 3 records, expected 8"), "{}", err);
        // complete loads with no warm-up or keystream are a valid run
        assert_eq!(try_validate_trace(&records[..25]), Ok(()));
    }

    #[test]
    fn test_step_gap_rejected() {
        let mut records = default_records();
        records[3].step = 7;
        let err = try_validate_trace(&records).unwrap_err();
        assert!(err.contains("[INVARIANT:step_index]"), "{}", err);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let records = default_records();
        let params = SimulationConfig::new(0xBEEF, 0x3A, 11, 8).validate().unwrap();
        let err = try_validate_run_shape(&records, &params).unwrap_err();
        assert!(err.contains("[INVARIANT:phase_length]"), "{}", err);
    }

    #[test]
    #[should_panic(expected = "Invariant violation")]
    fn test_validate_trace_panics() {
        let mut records = default_records();
        records.remove(0);
        validate_trace(&records);
    }
}
