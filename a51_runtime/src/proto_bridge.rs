//! Proto ↔ engine conversion bridge.
//!
//! Encoding is total. Decoding is strict: a missing register triple,
//! an out-of-range register value or a non-bit control value is
//! reported as `RuntimeError::Corrupt`, never defaulted.

use a51_slide::domain::{CipherState, InputBit, InputSource, Phase, StepRecord};
use a51_slide::register::{Register, RegisterLayout, LAYOUT_X, LAYOUT_Y, LAYOUT_Z};

use crate::error::{Result, RuntimeError};
use crate::proto_types::*;

/// Convert an engine record to its wire form at the given run position.
pub fn record_to_proto(sequence: u64, record: &StepRecord) -> ProtoStepRecord {
    let [injected_x, injected_y, injected_z] = record.injected.map(|b| b.map(u32::from));
    ProtoStepRecord {
        sequence,
        phase: phase_to_proto(record.phase) as i32,
        step: record.step,
        input_source: record.input.map(|i| source_to_proto(i.source) as i32),
        input_bit: record.input.map(|i| u32::from(i.bit)),
        before: Some(registers_to_proto(&record.before)),
        feedback: record.feedback.map(bits_to_proto),
        clocks: record.clocks.map(bits_to_proto),
        majority: record.majority.map(u32::from),
        injected_x,
        injected_y,
        injected_z,
        after: Some(registers_to_proto(&record.after)),
        output: record.output.map(u32::from),
    }
}

/// Convert a wire record back to an engine record.
pub fn proto_to_record(proto: &ProtoStepRecord) -> Result<StepRecord> {
    let phase = match ProtoPhase::try_from(proto.phase) {
        Ok(ProtoPhase::Init) => Phase::Init,
        Ok(ProtoPhase::LoadKc) => Phase::LoadKc,
        Ok(ProtoPhase::LoadFn) => Phase::LoadFn,
        Ok(ProtoPhase::Warmup) => Phase::Warmup,
        Ok(ProtoPhase::Keystream) => Phase::Keystream,
        _ => return Err(corrupt(proto, format!("unknown phase {}", proto.phase))),
    };

    let input = match (proto.input_source, proto.input_bit) {
        (None, None) => None,
        (Some(source), Some(bit)) => {
            let source = match ProtoInputSource::try_from(source) {
                Ok(ProtoInputSource::Kc) => InputSource::Kc,
                Ok(ProtoInputSource::Fn) => InputSource::Fn,
                _ => return Err(corrupt(proto, format!("unknown input source {}", source))),
            };
            Some(InputBit {
                source,
                bit: bit_from_proto(proto, "input_bit", bit)?,
            })
        }
        _ => return Err(corrupt(proto, "input source and bit must be set together".into())),
    };

    let before = proto
        .before
        .as_ref()
        .ok_or_else(|| corrupt(proto, "missing pre-state".into()))?;
    let after = proto
        .after
        .as_ref()
        .ok_or_else(|| corrupt(proto, "missing post-state".into()))?;

    let injected = [proto.injected_x, proto.injected_y, proto.injected_z];
    let mut injected_bits = [None; 3];
    for (slot, value) in injected_bits.iter_mut().zip(injected) {
        *slot = value
            .map(|b| bit_from_proto(proto, "injected", b))
            .transpose()?;
    }

    Ok(StepRecord {
        phase,
        step: proto.step,
        input,
        before: registers_from_proto(proto, before)?,
        feedback: proto
            .feedback
            .as_ref()
            .map(|t| bits_from_proto(proto, "feedback", t))
            .transpose()?,
        clocks: proto
            .clocks
            .as_ref()
            .map(|t| bits_from_proto(proto, "clocks", t))
            .transpose()?,
        majority: proto
            .majority
            .map(|b| bit_from_proto(proto, "majority", b))
            .transpose()?,
        injected: injected_bits,
        after: registers_from_proto(proto, after)?,
        output: proto
            .output
            .map(|b| bit_from_proto(proto, "output", b))
            .transpose()?,
    })
}

fn phase_to_proto(phase: Phase) -> ProtoPhase {
    match phase {
        Phase::Init => ProtoPhase::Init,
        Phase::LoadKc => ProtoPhase::LoadKc,
        Phase::LoadFn => ProtoPhase::LoadFn,
        Phase::Warmup => ProtoPhase::Warmup,
        Phase::Keystream => ProtoPhase::Keystream,
    }
}

fn source_to_proto(source: InputSource) -> ProtoInputSource {
    match source {
        InputSource::Kc => ProtoInputSource::Kc,
        InputSource::Fn => ProtoInputSource::Fn,
    }
}

fn registers_to_proto(state: &CipherState) -> ProtoRegisters {
    ProtoRegisters {
        x: u32::from(state.x.packed()),
        y: u32::from(state.y.packed()),
        z: u32::from(state.z.packed()),
    }
}

fn bits_to_proto([x, y, z]: [u8; 3]) -> ProtoBitTriple {
    ProtoBitTriple {
        x: u32::from(x),
        y: u32::from(y),
        z: u32::from(z),
    }
}

fn corrupt(proto: &ProtoStepRecord, detail: String) -> RuntimeError {
    RuntimeError::Corrupt(format!("record {}: {}", proto.sequence, detail))
}

fn bit_from_proto(proto: &ProtoStepRecord, field: &str, value: u32) -> Result<u8> {
    match value {
        0 | 1 => Ok(value as u8),
        _ => Err(corrupt(proto, format!("{} holds {}, expected a bit", field, value))),
    }
}

fn bits_from_proto(proto: &ProtoStepRecord, field: &str, t: &ProtoBitTriple) -> Result<[u8; 3]> {
    Ok([
        bit_from_proto(proto, field, t.x)?,
        bit_from_proto(proto, field, t.y)?,
        bit_from_proto(proto, field, t.z)?,
    ])
}

fn register_from_proto(
    proto: &ProtoStepRecord,
    layout: &'static RegisterLayout,
    value: u32,
) -> Result<Register> {
    u8::try_from(value)
        .ok()
        .and_then(|bits| Register::from_packed(layout, bits))
        .ok_or_else(|| {
            corrupt(
                proto,
                format!(
                    "register {} value {:#x} exceeds {} bits",
                    layout.name, value, layout.width
                ),
            )
        })
}

fn registers_from_proto(proto: &ProtoStepRecord, regs: &ProtoRegisters) -> Result<CipherState> {
    Ok(CipherState {
        x: register_from_proto(proto, &LAYOUT_X, regs.x)?,
        y: register_from_proto(proto, &LAYOUT_Y, regs.y)?,
        z: register_from_proto(proto, &LAYOUT_Z, regs.z)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use a51_slide::config::SimulationConfig;
    use a51_slide::simulate;
    use prost::Message;

    #[test]
    fn test_every_default_record_survives_the_wire() {
        let out = simulate(&SimulationConfig::default()).unwrap();
        for (i, record) in out.trace.iter().enumerate() {
            let bytes = record_to_proto(i as u64 + 1, record).encode_to_vec();
            let decoded = ProtoStepRecord::decode(bytes.as_slice()).unwrap();
            assert_eq!(decoded.sequence, i as u64 + 1);
            assert_eq!(&proto_to_record(&decoded).unwrap(), record);
        }
    }

    #[test]
    fn test_init_leaves_optional_fields_unset() {
        let out = simulate(&SimulationConfig::default()).unwrap();
        let proto = record_to_proto(1, &out.trace.records()[0]);
        assert_eq!(proto.phase, ProtoPhase::Init as i32);
        assert!(proto.input_source.is_none() && proto.input_bit.is_none());
        assert!(proto.feedback.is_none() && proto.clocks.is_none());
        assert!(proto.injected_x.is_none() && proto.output.is_none());
    }

    #[test]
    fn test_oversized_register_is_corrupt() {
        let out = simulate(&SimulationConfig::default()).unwrap();
        let mut proto = record_to_proto(5, &out.trace.records()[4]);
        proto.after = Some(ProtoRegisters { x: 0x20, y: 0, z: 0 });
        let err = proto_to_record(&proto).unwrap_err();
        assert!(matches!(err, RuntimeError::Corrupt(ref m) if m.contains("register X")), "{}", err);
    }

    #[test]
    fn test_non_bit_output_is_corrupt() {
        let out = simulate(&SimulationConfig::default()).unwrap();
        let mut proto = record_to_proto(43, out.trace.records().last().unwrap());
        proto.output = Some(2);
        assert!(matches!(proto_to_record(&proto), Err(RuntimeError::Corrupt(_))));
    }

    #[test]
    fn test_unknown_phase_and_half_input_are_corrupt() {
        let out = simulate(&SimulationConfig::default()).unwrap();
        let mut proto = record_to_proto(2, &out.trace.records()[1]);
        proto.input_bit = None;
        assert!(matches!(proto_to_record(&proto), Err(RuntimeError::Corrupt(_))));
        let mut proto = record_to_proto(2, &out.trace.records()[1]);
        proto.phase = 99;
        assert!(matches!(proto_to_record(&proto), Err(RuntimeError::Corrupt(_))));
    }
}
