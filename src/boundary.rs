//! The execution boundary: validate on entry, reclassify failures on exit.

use std::fmt;
use std::sync::Arc;

use crate::capture;
use crate::error::{BoxedError, Error, ExecutionError, FaultOrigin};
use crate::logging::{FailureLog, FailureRecord};
use crate::param_box::ParamBox;
use crate::pipeline::{Schema, ValidationOutcome};
use crate::source::ParamSource;

/// Runs user code against validated parameters.
///
/// Entering the boundary runs the pipeline. Bad input ends there with
/// [`Error::Validation`] and user code never runs. Otherwise user code gets
/// the [`ParamBox`]; whatever it returns on success is passed through
/// untouched, while an `Err` or a panic is logged once to the
/// [`FailureLog`] and surfaces as [`Error::Execution`].
///
/// Internal factory or predicate failures are treated the same way as
/// failures in user code.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use param_gate::{Factory, FailureLog, FailureSink, ParamGate, QueryParams, RecordingSink};
///
/// let sink = Arc::new(RecordingSink::new());
/// let log = Arc::new(FailureLog::with_sinks([sink.clone() as Arc<dyn FailureSink>]));
/// let params: QueryParams = [("n", "4")].into_iter().collect();
///
/// let err = ParamGate::new()
///     .declare("n", Factory::int())
///     .bind(&params)
///     .logger(log)
///     .enter()
///     .run(|_| Err::<(), _>("database unavailable"))
///     .unwrap_err();
///
/// assert_eq!(err.status().code(), 500);
/// assert_eq!(sink.len(), 1);
/// ```
pub struct Boundary<'s> {
    schema: Schema,
    source: &'s dyn ParamSource,
    logger: Option<Arc<FailureLog>>,
}

impl<'s> Boundary<'s> {
    /// Creates a boundary that logs to [`FailureLog::global`].
    pub fn new(schema: Schema, source: &'s dyn ParamSource) -> Self {
        Self {
            schema,
            source,
            logger: None,
        }
    }

    /// Logs to `logger` instead of the process-wide log.
    pub fn logger(mut self, logger: Arc<FailureLog>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Returns the schema this boundary enforces.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Runs the entry phase only and returns the box.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for rejected input, [`Error::Execution`] (already
    /// logged) when a factory or predicate fails internally.
    pub fn open(&self) -> Result<ParamBox, Error> {
        let checked = capture::catch(|| self.schema.check(self.source))
            .unwrap_or_else(|caught| {
                Err(ExecutionError::from_panic(FaultOrigin::Pipeline, caught))
            });

        match checked {
            Ok(ValidationOutcome::Valid(params)) => Ok(params),
            Ok(ValidationOutcome::Failed(err)) => {
                tracing::debug!(param = %err.name(), error = %err, "request parameters rejected");
                Err(Error::Validation(err))
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Validates the source, then runs `f` with the box.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] if the input was rejected (`f` is not called);
    /// [`Error::Execution`] if `f` returned an error or panicked, or if a
    /// factory or predicate failed internally.
    pub fn run<R, E, F>(self, f: F) -> Result<R, Error>
    where
        E: Into<BoxedError>,
        F: FnOnce(&ParamBox) -> Result<R, E>,
    {
        let _span = tracing::debug_span!("boundary", declared = self.schema.len()).entered();
        let params = self.open()?;

        match capture::catch(|| f(&params)) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(self.fail(ExecutionError::handler(err))),
            Err(caught) => Err(self.fail(ExecutionError::from_panic(FaultOrigin::Handler, caught))),
        }
    }

    fn fail(&self, err: ExecutionError) -> Error {
        let logger = self.logger.clone().unwrap_or_else(FailureLog::global);
        // The record snapshots the source; skip it when nobody will read it.
        if logger.is_enabled() {
            logger.record(&FailureRecord::new(&err, self.source));
        }
        Error::Execution(err)
    }
}

impl fmt::Debug for Boundary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Boundary")
            .field("schema", &self.schema)
            .field("custom_logger", &self.logger.is_some())
            .finish_non_exhaustive()
    }
}
