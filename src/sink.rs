use std::fmt;
use std::io::Write;

use parking_lot::Mutex;

use crate::logging::FailureRecord;

/// Error returned when a sink could not store a failure record.
///
/// Sink errors never propagate past [`FailureLog`](crate::FailureLog): a broken
/// sink must not turn a handled failure into a different one.
///
/// # Examples
///
/// ```
/// use param_gate::{SinkError, SinkErrorKind};
///
/// let error = SinkError::with_message(SinkErrorKind::Io, "disk full");
/// assert_eq!(error.kind(), SinkErrorKind::Io);
/// assert_eq!(error.to_string(), "sink error (I/O error): disk full");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkError {
    kind: SinkErrorKind,
    message: Option<String>,
}

impl SinkError {
    /// Creates a sink error of the given kind.
    pub fn new(kind: SinkErrorKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    /// Creates a sink error with a message.
    pub fn with_message(kind: SinkErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> SinkErrorKind {
        self.kind
    }

    /// Returns the message, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "sink error ({}): {}", self.kind, msg),
            None => write!(f, "sink error ({})", self.kind),
        }
    }
}

impl std::error::Error for SinkError {}

impl From<std::io::Error> for SinkError {
    fn from(err: std::io::Error) -> Self {
        Self::with_message(SinkErrorKind::Io, err.to_string())
    }
}

impl From<serde_json::Error> for SinkError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_message(SinkErrorKind::Encode, err.to_string())
    }
}

/// Kind of sink error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkErrorKind {
    /// Writing to the underlying medium failed.
    Io,
    /// The record could not be encoded.
    Encode,
    /// The sink reached its capacity.
    Full,
}

impl fmt::Display for SinkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io => write!(f, "I/O error"),
            Self::Encode => write!(f, "encoding error"),
            Self::Full => write!(f, "sink full"),
        }
    }
}

/// Destination for failure records.
///
/// Sinks are shared by every boundary in the process, so they must be safe to
/// call from several threads at once.
pub trait FailureSink: Send + Sync {
    /// Stores one record.
    ///
    /// # Errors
    ///
    /// Returns `SinkError` if the record could not be stored. The caller
    /// reports and otherwise ignores it.
    fn write(&self, record: &FailureRecord) -> Result<(), SinkError>;
}

/// Emits each record as a `tracing` error event.
///
/// This is the sink a fresh [`FailureLog`](crate::FailureLog) starts with.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl FailureSink for TracingSink {
    fn write(&self, record: &FailureRecord) -> Result<(), SinkError> {
        tracing::error!(
            origin = %record.origin,
            error_type = %record.error_type,
            params = %serde_json::Value::Object(record.params.clone()),
            body = record.body.as_deref().unwrap_or(""),
            trace = %record.trace,
            "An error occurred during the validation or inside the context: {}",
            record.message,
        );
        Ok(())
    }
}

/// Keeps records in memory; useful in tests and for inspection endpoints.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use param_gate::{FailureLog, FailureSink, RecordingSink};
///
/// let sink = Arc::new(RecordingSink::new());
/// let log = FailureLog::with_sinks([sink.clone() as Arc<dyn FailureSink>]);
/// assert!(sink.is_empty());
/// assert_eq!(log.sink_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<FailureRecord>>,
    capacity: Option<usize>,
}

impl RecordingSink {
    /// Creates an unbounded sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink that refuses records once `capacity` are stored.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Mutex::new(Vec::with_capacity(capacity)),
            capacity: Some(capacity),
        }
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Returns a copy of the stored records.
    pub fn records(&self) -> Vec<FailureRecord> {
        self.records.lock().clone()
    }

    /// Removes and returns the stored records.
    pub fn take(&self) -> Vec<FailureRecord> {
        std::mem::take(&mut *self.records.lock())
    }
}

impl FailureSink for RecordingSink {
    fn write(&self, record: &FailureRecord) -> Result<(), SinkError> {
        let mut records = self.records.lock();
        if self.capacity.is_some_and(|cap| records.len() >= cap) {
            return Err(SinkError::new(SinkErrorKind::Full));
        }
        records.push(record.clone());
        Ok(())
    }
}

/// Writes each record as one line of JSON.
pub struct JsonLinesSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Returns the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W> fmt::Debug for JsonLinesSink<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonLinesSink").finish_non_exhaustive()
    }
}

impl<W: Write + Send> FailureSink for JsonLinesSink<W> {
    fn write(&self, record: &FailureRecord) -> Result<(), SinkError> {
        let line = serde_json::to_string(record)?;
        let mut writer = self.writer.lock();
        writeln!(writer, "{line}")?;
        writer.flush()?;
        Ok(())
    }
}
