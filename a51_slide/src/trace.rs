/// Slide A5/1: Trace Recorder
///
/// Append-only log of step records.
///
/// The recorder is a passive observer: the engine hands it one record per
/// cycle and it never feeds anything back. Once a run completes the log is
/// frozen into a read-only `Trace`.

use crate::domain::{Phase, StepRecord};
use crate::invariants::try_validate_trace;

/// Accumulates step records in chronological order.
#[derive(Debug, Default)]
pub struct TraceRecorder {
    records: Vec<StepRecord>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    /// Append a record and return a view of it.
    pub fn record(&mut self, record: StepRecord) -> &StepRecord {
        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&StepRecord> {
        self.records.last()
    }

    /// Freeze the log.
    pub fn finish(self) -> Trace {
        Trace {
            records: self.records,
        }
    }
}

/// Read-only, chronologically ordered step log of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    records: Vec<StepRecord>,
}

impl Trace {
    /// Rebuild a trace from persisted records.
    ///
    /// The records must satisfy every trace invariant; the first violation
    /// is returned as an `[INVARIANT:...]` message.
    pub fn from_records(records: Vec<StepRecord>) -> Result<Self, String> {
        try_validate_trace(&records)?;
        Ok(Self { records })
    }

    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StepRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records of one phase, in order.
    pub fn phase(&self, phase: Phase) -> impl Iterator<Item = &StepRecord> + '_ {
        self.records.iter().filter(move |r| r.phase == phase)
    }
}

impl<'a> IntoIterator for &'a Trace {
    type Item = &'a StepRecord;
    type IntoIter = std::slice::Iter<'a, StepRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
