//! Runtime error type.
//!
//! Every persistence failure funnels into [`RuntimeError`]; the engine's
//! own configuration and export errors are wrapped unchanged.

use std::io;

use thiserror::Error;

use a51_slide::error::{ConfigError, ExportError};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("protobuf decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("trace export failed: {0}")]
    Export(#[from] ExportError),

    /// Persisted data decoded but does not describe a valid trace.
    #[error("corrupt trace data: {0}")]
    Corrupt(String),

    #[error("sequence violation in trace store: expected {expected}, got {got}")]
    Sequence { expected: u64, got: u64 },

    /// A stored run and its fresh replay disagree.
    #[error("drift detected: stored hash {stored}, replayed hash {replayed}")]
    Drift { stored: String, replayed: String },

    #[error("session {0} already exists")]
    SessionExists(String),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
