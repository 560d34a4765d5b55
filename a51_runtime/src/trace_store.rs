//! Append-only trace store: binary protobuf log.
//!
//! Storage format: length-prefixed protobuf frames.
//!   [4-byte LE length][protobuf bytes][4-byte LE length][protobuf bytes]...
//!
//! Rules:
//!   - Strict append only, no mutation or reordering
//!   - fsync after every write
//!   - Sequence strictly increasing from 1 (validated on append and load)

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use prost::Message;
use tracing::{debug, info};

use a51_slide::domain::StepRecord;
use a51_slide::trace::Trace;

use crate::error::{Result, RuntimeError};
use crate::proto_bridge::{proto_to_record, record_to_proto};
use crate::proto_types::ProtoStepRecord;

/// Largest frame accepted when reading a log back.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Append-only step-record log backed by a binary file.
pub struct TraceStore {
    path: PathBuf,
    last_sequence: u64,
}

impl TraceStore {
    /// Open or create a log at the given path.
    /// Reads existing frames to determine the last sequence number.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let last_sequence = if path.exists() {
            let frames = read_all_from_file(path)?;
            frames.last().map(|f| f.sequence).unwrap_or(0)
        } else {
            0
        };
        debug!(path = %path.display(), last_sequence, "trace store opened");

        Ok(Self {
            path: path.to_path_buf(),
            last_sequence,
        })
    }

    /// Append a single wire record.
    ///
    /// Validates strict sequence ordering, writes the frame and fsyncs.
    pub fn append(&mut self, record: &ProtoStepRecord) -> Result<()> {
        let expected = self.last_sequence + 1;
        if record.sequence != expected {
            return Err(RuntimeError::Sequence {
                expected,
                got: record.sequence,
            });
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let buf = record.encode_to_vec();
        let len = buf.len() as u32;

        {
            let mut writer = BufWriter::new(&mut file);
            writer.write_all(&len.to_le_bytes())?;
            writer.write_all(&buf)?;
            writer.flush()?;
        }
        file.sync_all()?;

        self.last_sequence = record.sequence;
        Ok(())
    }

    /// Append every record of `trace`, numbering from the next free sequence.
    pub fn append_trace(&mut self, trace: &Trace) -> Result<()> {
        for record in trace {
            let proto = record_to_proto(self.last_sequence + 1, record);
            self.append(&proto)?;
        }
        info!(path = %self.path.display(), records = trace.len(), "trace persisted");
        Ok(())
    }

    /// Load all wire records in sequence order.
    pub fn load_all(&self) -> Result<Vec<ProtoStepRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        read_all_from_file(&self.path)
    }

    /// Load, decode and validate the stored trace.
    pub fn load_trace(&self) -> Result<Trace> {
        let records = self
            .load_all()?
            .iter()
            .map(proto_to_record)
            .collect::<Result<Vec<StepRecord>>>()?;
        Trace::from_records(records).map_err(RuntimeError::Corrupt)
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read all frames from a file, validating frame integrity and sequence.
fn read_all_from_file(path: &Path) -> Result<Vec<ProtoStepRecord>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut records: Vec<ProtoStepRecord> = Vec::new();
    let mut len_buf = [0u8; 4];

    loop {
        match reader.read_exact(&mut len_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }

        let len = u32::from_le_bytes(len_buf) as usize;
        if len == 0 || len > MAX_FRAME_LEN {
            return Err(RuntimeError::Corrupt(format!("invalid frame length: {}", len)));
        }

        let mut frame = vec![0u8; len];
        reader.read_exact(&mut frame).map_err(|e| {
            RuntimeError::Corrupt(format!(
                "truncated frame after record {}: {}",
                records.len(),
                e
            ))
        })?;

        let record = ProtoStepRecord::decode(frame.as_slice())?;
        let expected = records.len() as u64 + 1;
        if record.sequence != expected {
            return Err(RuntimeError::Sequence {
                expected,
                got: record.sequence,
            });
        }
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use a51_slide::config::SimulationConfig;
    use a51_slide::simulate;

    #[test]
    fn test_append_rejects_sequence_gap() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TraceStore::open(&dir.path().join("trace.log")).unwrap();
        let out = simulate(&SimulationConfig::default()).unwrap();
        let err = store
            .append(&record_to_proto(2, &out.trace.records()[0]))
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Sequence { expected: 1, got: 2 }));
        assert_eq!(store.last_sequence(), 0);
    }

    #[test]
    fn test_missing_log_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = TraceStore::open(&dir.path().join("nested").join("trace.log")).unwrap();
        assert!(store.load_all().unwrap().is_empty());
        assert!(matches!(store.load_trace(), Err(RuntimeError::Corrupt(_))));
    }

    #[test]
    fn test_truncated_frame_detected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.log");
        let out = simulate(&SimulationConfig::default()).unwrap();
        TraceStore::open(&path).unwrap().append_trace(&out.trace).unwrap();

        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();
        assert!(matches!(TraceStore::open(&path), Err(RuntimeError::Corrupt(_))));
    }

    #[test]
    fn test_log_cut_at_frame_boundary_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.log");
        let out = simulate(&SimulationConfig::default()).unwrap();
        let mut store = TraceStore::open(&path).unwrap();
        // init plus three load_Kc frames, every frame intact
        for (i, record) in out.trace.records()[..4].iter().enumerate() {
            store.append(&record_to_proto(i as u64 + 1, record)).unwrap();
        }

        let reopened = TraceStore::open(&path).unwrap();
        assert_eq!(reopened.last_sequence(), 4);
        match reopened.load_trace() {
            Err(RuntimeError::Corrupt(msg)) => {
                assert!(msg.contains("[INVARIANT:phase_length]"), "{}", msg)
            }
            other => panic!("expected corrupt trace, got {:?}", other.map(|t| t.len())),
        }
    }

    #[test]
    fn test_zero_length_frame_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.log");
        fs::write(&path, 0u32.to_le_bytes()).unwrap();
        let err = TraceStore::open(&path).err().unwrap();
        assert!(err.to_string().contains("invalid frame length: 0"));
    }
}
