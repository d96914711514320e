use std::error::Error as StdError;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use serde::Serialize;

use crate::error::ExecutionError;
use crate::sink::{FailureSink, TracingSink};
use crate::source::ParamSource;

/// Structured report of one execution failure.
///
/// Carries everything needed to diagnose the failure offline: what failed,
/// the request parameters it failed on, and where.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord {
    /// Where the failure happened (`handler`, `factory for `a``, ...).
    pub origin: String,
    /// Rust type name of the underlying error.
    pub error_type: String,
    /// Rendered error, including its source chain.
    pub message: String,
    /// Snapshot of the parameter source at the time of failure.
    pub params: serde_json::Map<String, serde_json::Value>,
    /// Request body, if the source exposes one.
    pub body: Option<String>,
    /// Backtrace of the panic site; empty for returned errors.
    pub trace: String,
}

impl FailureRecord {
    /// Builds a record for `error` raised while processing `source`.
    pub fn new(error: &ExecutionError, source: &dyn ParamSource) -> Self {
        let params = source
            .names()
            .into_iter()
            .filter_map(|name| {
                source
                    .get(name)
                    .map(|value| (name.to_string(), serde_json::Value::from(value)))
            })
            .collect();

        Self {
            origin: error.origin().to_string(),
            error_type: error.type_name().to_string(),
            message: render_chain(error),
            params,
            body: source.body().map(str::to_string),
            trace: error.trace().unwrap_or_default().to_string(),
        }
    }

    /// Serializes the record to a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

fn render_chain(error: &dyn StdError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.ends_with(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}

/// Process-wide destination for execution failures.
///
/// Every [`Boundary`](crate::Boundary) reports each execution failure here
/// exactly once. Logging can be switched off at runtime; sinks that fail are
/// reported through `tracing` and otherwise ignored.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use param_gate::{FailureLog, RecordingSink};
///
/// let log = FailureLog::empty();
/// log.add_sink(Arc::new(RecordingSink::new()));
/// assert_eq!(log.sink_count(), 1);
///
/// log.disable();
/// assert!(!log.is_enabled());
/// ```
pub struct FailureLog {
    enabled: AtomicBool,
    sinks: RwLock<Vec<Arc<dyn FailureSink>>>,
}

static GLOBAL: OnceLock<Arc<FailureLog>> = OnceLock::new();

impl FailureLog {
    /// Creates an enabled log that forwards to [`TracingSink`].
    pub fn new() -> Self {
        Self::with_sinks([Arc::new(TracingSink) as Arc<dyn FailureSink>])
    }

    /// Creates an enabled log with no sinks.
    pub fn empty() -> Self {
        Self::with_sinks([])
    }

    /// Creates an enabled log with the given sinks.
    pub fn with_sinks<I>(sinks: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn FailureSink>>,
    {
        Self {
            enabled: AtomicBool::new(true),
            sinks: RwLock::new(sinks.into_iter().collect()),
        }
    }

    /// Returns the process-wide log, creating it on first use.
    pub fn global() -> Arc<FailureLog> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(FailureLog::new())))
    }

    /// Turns recording on.
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
    }

    /// Turns recording off; records are dropped until re-enabled.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    /// Returns `true` if records are delivered.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Adds a sink.
    pub fn add_sink(&self, sink: Arc<dyn FailureSink>) {
        self.sinks.write().push(sink);
    }

    /// Removes every sink.
    pub fn clear(&self) {
        self.sinks.write().clear();
    }

    /// Returns the number of sinks.
    pub fn sink_count(&self) -> usize {
        self.sinks.read().len()
    }

    /// Delivers `record` to every sink, unless disabled.
    pub fn record(&self, record: &FailureRecord) {
        if !self.is_enabled() {
            return;
        }

        // Sinks run without the lock held so one may add or clear sinks.
        let sinks = self.sinks.read().clone();
        for sink in sinks {
            if let Err(err) = sink.write(record) {
                tracing::warn!(error = %err, "failure sink rejected a record");
            }
        }
    }
}

impl Default for FailureLog {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FailureLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FailureLog")
            .field("enabled", &self.is_enabled())
            .field("sinks", &self.sink_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExecutionError, FactoryError};
    use crate::sink::{RecordingSink, SinkError, SinkErrorKind};
    use crate::source::QueryParams;

    struct BrokenSink;

    impl FailureSink for BrokenSink {
        fn write(&self, _: &FailureRecord) -> Result<(), SinkError> {
            Err(SinkError::new(SinkErrorKind::Io))
        }
    }

    fn sample_record() -> FailureRecord {
        let params: QueryParams = [("a", "1"), ("b", "x")].into_iter().collect();
        FailureRecord::new(&ExecutionError::handler("boom"), &params)
    }

    #[test]
    fn record_snapshots_params() {
        let record = sample_record();
        assert_eq!(record.origin, "handler");
        assert_eq!(record.params["a"], "1");
        assert_eq!(record.params["b"], "x");
        assert_eq!(record.body, None);
        assert!(record.message.contains("boom"));
    }

    #[test]
    fn record_message_includes_source_chain() {
        let io = std::io::Error::other("connection reset");
        let err = ExecutionError::from_factory("a", FactoryError::internal(io));
        let record = FailureRecord::new(&err, &QueryParams::new());
        assert!(record.message.contains("connection reset"));
        assert_eq!(record.message.matches("connection reset").count(), 1);
    }

    #[test]
    fn record_serializes() {
        let json = sample_record().to_json();
        assert_eq!(json["origin"], "handler");
        assert_eq!(json["params"]["a"], "1");
    }

    #[test]
    fn disabled_log_drops_records() {
        let sink = Arc::new(RecordingSink::new());
        let log = FailureLog::with_sinks([sink.clone() as Arc<dyn FailureSink>]);

        log.disable();
        log.record(&sample_record());
        assert!(sink.is_empty());

        log.enable();
        log.record(&sample_record());
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn broken_sink_does_not_stop_others() {
        let sink = Arc::new(RecordingSink::new());
        let log = FailureLog::with_sinks([
            Arc::new(BrokenSink) as Arc<dyn FailureSink>,
            sink.clone() as Arc<dyn FailureSink>,
        ]);

        log.record(&sample_record());
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn clear_removes_sinks() {
        let log = FailureLog::new();
        assert_eq!(log.sink_count(), 1);
        log.clear();
        assert_eq!(log.sink_count(), 0);
        log.record(&sample_record());
    }

    #[test]
    fn global_is_shared() {
        assert!(Arc::ptr_eq(&FailureLog::global(), &FailureLog::global()));
    }
}
