//! Hand-written protobuf types for the persisted trace log.
//!
//! Uses prost derive macros for encode/decode without prost-build.
//! Register contents travel packed (MSB of the register in bit width-1).
//! Fields that are "not applicable" for a phase are left unset.

use prost::Message;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ProtoPhase {
    Unspecified = 0,
    Init = 1,
    LoadKc = 2,
    LoadFn = 3,
    Warmup = 4,
    Keystream = 5,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ProtoInputSource {
    Unspecified = 0,
    Kc = 1,
    Fn = 2,
}

// ── Register triple ────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct ProtoRegisters {
    #[prost(uint32, tag = "1")]
    pub x: u32,
    #[prost(uint32, tag = "2")]
    pub y: u32,
    #[prost(uint32, tag = "3")]
    pub z: u32,
}

// ── Per-register control bits ──────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct ProtoBitTriple {
    #[prost(uint32, tag = "1")]
    pub x: u32,
    #[prost(uint32, tag = "2")]
    pub y: u32,
    #[prost(uint32, tag = "3")]
    pub z: u32,
}

// ── Step record ────────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct ProtoStepRecord {
    /// 1-based position of the record across the whole run.
    #[prost(uint64, tag = "1")]
    pub sequence: u64,
    #[prost(enumeration = "ProtoPhase", tag = "2")]
    pub phase: i32,
    /// 1-based index within the phase.
    #[prost(uint32, tag = "3")]
    pub step: u32,
    #[prost(enumeration = "ProtoInputSource", optional, tag = "4")]
    pub input_source: Option<i32>,
    #[prost(uint32, optional, tag = "5")]
    pub input_bit: Option<u32>,
    #[prost(message, optional, tag = "6")]
    pub before: Option<ProtoRegisters>,
    #[prost(message, optional, tag = "7")]
    pub feedback: Option<ProtoBitTriple>,
    #[prost(message, optional, tag = "8")]
    pub clocks: Option<ProtoBitTriple>,
    #[prost(uint32, optional, tag = "9")]
    pub majority: Option<u32>,
    #[prost(uint32, optional, tag = "10")]
    pub injected_x: Option<u32>,
    #[prost(uint32, optional, tag = "11")]
    pub injected_y: Option<u32>,
    #[prost(uint32, optional, tag = "12")]
    pub injected_z: Option<u32>,
    #[prost(message, optional, tag = "13")]
    pub after: Option<ProtoRegisters>,
    #[prost(uint32, optional, tag = "14")]
    pub output: Option<u32>,
}
