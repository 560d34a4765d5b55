#![forbid(unsafe_code)]

//! Slide A5/1: Rust Runtime
//!
//! Wraps the register engine with persistence, replay, snapshots,
//! session management, drift detection and parallel sweeps.
//!
//! No register logic lives here. Every cycle is delegated to the engine.

pub mod error;
pub mod proto_types;
pub mod proto_bridge;
pub mod trace_store;
pub mod replay;
pub mod snapshot;
pub mod session;
pub mod drift;
pub mod sweep;

pub use error::{Result, RuntimeError};
