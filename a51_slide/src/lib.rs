#![forbid(unsafe_code)]

//! Slide-spec A5/1 register engine.
//!
//! Three LFSRs (X: 5 bits, Y: 6 bits, Z: 7 bits) are loaded with a 16-bit
//! key and an 8-bit frame number, warmed up under majority clocking, and
//! then produce keystream bits. Every cycle is recorded in an append-only
//! trace that can be exported as a table or hashed canonically.
//!
//! ```
//! use a51_slide::{simulate, SimulationConfig};
//!
//! let out = simulate(&SimulationConfig::default()).unwrap();
//! assert_eq!(out.keystream.to_string(), "10011000");
//! assert_eq!(out.trace.len(), 43);
//! ```

/// Engine v1. Any change to the canonical trace requires a new version.
pub const ENGINE_VERSION: u32 = 1;

pub mod bits;
pub mod error;
pub mod register;
pub mod domain;
pub mod config;
pub mod cycle;
pub mod transitions;
pub mod trace;
pub mod invariants;
pub mod engine;
pub mod export;
pub mod hashing;

pub use config::{RunParams, SimulationConfig};
pub use engine::{run, simulate, SimulationOutput, SlideEngine};
pub use error::ConfigError;
