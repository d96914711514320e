//! Error taxonomy for the conversion pipeline and the execution boundary.
//!
//! Only two errors ever leave a [`Boundary`](crate::Boundary):
//! [`ValidationError`] for bad caller input and [`ExecutionError`] for
//! failures inside the caller's own logic. Both are carried by [`Error`].
//!
//! Factories and predicates report "expected" failures through the closed
//! sets [`FactoryError::Rejected`] and [`CheckError`]; anything flagged
//! `Internal` is a defect and surfaces as an [`ExecutionError`].

use std::any::{type_name, Any};
use std::convert::Infallible;
use std::fmt;
use std::net::AddrParseError;
use std::num::{ParseFloatError, ParseIntError};
use std::str::ParseBoolError;

use thiserror::Error;

use crate::capture::Caught;
use crate::value::ParamValue;

/// Boxed error used for foreign failures crossing the boundary.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure returned by a conversion factory.
#[derive(Debug, Error)]
pub enum FactoryError {
    /// The raw string is not a valid input for this factory (bad argument or bad type).
    #[error("{reason}")]
    Rejected {
        /// Human-readable reason, never shown to clients verbatim.
        reason: String,
    },

    /// The factory failed for a reason unrelated to the input.
    #[error("factory failure ({type_name}): {source}")]
    Internal {
        /// Rust type name of the underlying error.
        type_name: &'static str,
        /// The underlying error.
        #[source]
        source: BoxedError,
    },
}

impl FactoryError {
    /// Creates a rejection for an invalid raw value.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    /// Wraps an unexpected failure raised while converting.
    pub fn internal<E>(error: E) -> Self
    where
        E: Into<BoxedError>,
    {
        Self::Internal {
            type_name: type_name::<E>(),
            source: error.into(),
        }
    }
}

macro_rules! rejects {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for FactoryError {
                fn from(err: $ty) -> Self {
                    Self::rejected(err.to_string())
                }
            }
        )*
    };
}

rejects!(
    ParseIntError,
    ParseFloatError,
    ParseBoolError,
    std::char::ParseCharError,
    AddrParseError,
);

impl From<Infallible> for FactoryError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

/// Failure returned by a validator predicate.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The predicate did not hold; the default message is synthesized.
    #[error("predicate returned false")]
    Failed,

    /// The predicate did not hold and supplied its own message.
    #[error("{0}")]
    Rejected(String),

    /// The predicate itself failed (wrong value type, bug in the closure, ...).
    #[error("predicate failure ({type_name}): {source}")]
    Internal {
        /// Rust type name of the underlying error.
        type_name: &'static str,
        /// The underlying error.
        #[source]
        source: BoxedError,
    },
}

impl CheckError {
    /// Creates a rejection with a custom client-facing message.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }

    /// Wraps an unexpected failure raised while checking.
    pub fn internal<E>(error: E) -> Self
    where
        E: Into<BoxedError>,
    {
        Self::Internal {
            type_name: type_name::<E>(),
            source: error.into(),
        }
    }
}

/// A stored value did not have the Rust type a predicate or accessor asked for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected a value of type `{expected}`, found `{found}`")]
pub struct ValueTypeError {
    /// Requested type.
    pub expected: &'static str,
    /// Stored type.
    pub found: &'static str,
}

/// A declared parameter's raw value could not be converted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// The parameter is declared but absent from the source.
    #[error("Missing required parameter `{name}`.")]
    Missing {
        /// Parameter name.
        name: String,
    },

    /// The factory rejected the raw value.
    #[error("Invalid type of the `{name}` parameter{}", type_suffix(.expected))]
    InvalidType {
        /// Parameter name.
        name: String,
        /// Raw string as received.
        raw: String,
        /// Type name advertised by the factory, if any.
        expected: Option<&'static str>,
        /// Reason reported by the factory.
        reason: String,
    },
}

fn type_suffix(expected: &Option<&'static str>) -> String {
    match expected {
        Some(ty) => format!(": expected {ty}."),
        None => ".".to_string(),
    }
}

impl ConversionError {
    /// Returns the parameter name.
    pub fn name(&self) -> &str {
        match self {
            Self::Missing { name } | Self::InvalidType { name, .. } => name,
        }
    }

    /// Returns the raw value, `None` when the parameter was missing.
    pub fn raw(&self) -> Option<&str> {
        match self {
            Self::Missing { .. } => None,
            Self::InvalidType { raw, .. } => Some(raw),
        }
    }
}

/// A converted value failed its validator chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct PredicateError {
    /// Parameter name.
    pub name: String,
    /// Raw string as received.
    pub raw: String,
    /// Client-facing message (synthesized or caller-supplied).
    pub message: String,
}

impl PredicateError {
    /// Builds the default failure for a predicate that returned `false`.
    pub fn falsy(name: impl Into<String>, raw: impl Into<String>) -> Self {
        let name = name.into();
        let raw = raw.into();
        let message = format!("Invalid '{name}' value: {raw}.");
        Self { name, raw, message }
    }

    /// Builds the default failure for a predicate that returned `false`
    /// on `value`, naming the converted value rather than the raw string.
    pub fn falsy_value(
        name: impl Into<String>,
        raw: impl Into<String>,
        value: &dyn ParamValue,
    ) -> Self {
        let name = name.into();
        let message = format!("Invalid '{name}' value: {}.", value.render());
        Self {
            name,
            raw: raw.into(),
            message,
        }
    }
}

/// Why the pipeline refused the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureCause {
    /// Conversion failed or the parameter was missing.
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    /// A predicate did not hold.
    #[error(transparent)]
    Predicate(#[from] PredicateError),
}

/// Pre-execution failure: exactly one parameter was bad.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{cause}")]
pub struct ValidationError {
    cause: FailureCause,
}

impl ValidationError {
    /// Wraps a conversion or predicate failure.
    pub fn new(cause: impl Into<FailureCause>) -> Self {
        Self {
            cause: cause.into(),
        }
    }

    /// Returns the name of the failing parameter.
    pub fn name(&self) -> &str {
        match &self.cause {
            FailureCause::Conversion(err) => err.name(),
            FailureCause::Predicate(err) => &err.name,
        }
    }

    /// Returns the raw value of the failing parameter, `None` if it was missing.
    pub fn raw_value(&self) -> Option<&str> {
        match &self.cause {
            FailureCause::Conversion(err) => err.raw(),
            FailureCause::Predicate(err) => Some(&err.raw),
        }
    }

    /// Returns the underlying cause.
    pub fn cause(&self) -> &FailureCause {
        &self.cause
    }

    /// Returns `true` if a predicate (rather than conversion) failed.
    pub fn is_predicate(&self) -> bool {
        matches!(self.cause, FailureCause::Predicate(_))
    }
}

/// Where an internal failure originated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultOrigin {
    /// A factory reported an internal failure or panicked.
    Factory {
        /// Parameter being converted.
        param: String,
    },
    /// A predicate reported an internal failure or panicked.
    Predicate {
        /// Parameter being checked.
        param: String,
    },
    /// The pipeline panicked outside any attributable parameter.
    Pipeline,
    /// User code running inside the boundary.
    Handler,
}

impl fmt::Display for FaultOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Factory { param } => write!(f, "factory for `{param}`"),
            Self::Predicate { param } => write!(f, "predicate for `{param}`"),
            Self::Pipeline => f.write_str("validation pipeline"),
            Self::Handler => f.write_str("handler"),
        }
    }
}

/// User code panicked inside the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("panicked: {message}")]
pub struct PanicError {
    /// Panic payload rendered as text.
    pub message: String,
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Failure raised while holding the box; always logged before surfacing.
#[derive(Debug, Error)]
#[error("internal error in {origin}: {source}")]
pub struct ExecutionError {
    origin: FaultOrigin,
    type_name: &'static str,
    #[source]
    source: BoxedError,
    trace: String,
}

impl ExecutionError {
    /// Client-facing detail; internals never reach the client.
    pub const DETAIL: &'static str = "An error occurred while processing you request. \
                                      Please contact the website administrator.";

    /// Creates an execution error from its parts.
    pub fn new(origin: FaultOrigin, type_name: &'static str, source: BoxedError) -> Self {
        Self {
            origin,
            type_name,
            source,
            trace: String::new(),
        }
    }

    /// Attaches a backtrace rendered where the failure happened.
    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = trace.into();
        self
    }

    /// Wraps an error returned by user code.
    pub fn handler<E>(error: E) -> Self
    where
        E: Into<BoxedError>,
    {
        Self::new(FaultOrigin::Handler, type_name::<E>(), error.into())
    }

    pub(crate) fn from_factory(param: &str, error: FactoryError) -> Self {
        let origin = FaultOrigin::Factory {
            param: param.to_string(),
        };
        match error {
            FactoryError::Internal { type_name, source } => Self::new(origin, type_name, source),
            rejected @ FactoryError::Rejected { .. } => {
                Self::new(origin, type_name::<FactoryError>(), Box::new(rejected))
            }
        }
    }

    pub(crate) fn from_check(param: &str, error: CheckError) -> Self {
        let origin = FaultOrigin::Predicate {
            param: param.to_string(),
        };
        match error {
            CheckError::Internal { type_name, source } => Self::new(origin, type_name, source),
            other => Self::new(origin, type_name::<CheckError>(), Box::new(other)),
        }
    }

    pub(crate) fn from_panic(origin: FaultOrigin, caught: Caught) -> Self {
        Self::new(
            origin,
            type_name::<PanicError>(),
            Box::new(PanicError {
                message: caught.message,
            }),
        )
        .with_trace(caught.trace)
    }

    /// Returns where the failure happened.
    pub fn origin(&self) -> &FaultOrigin {
        &self.origin
    }

    /// Returns the Rust type name of the wrapped error.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the wrapped error.
    pub fn inner(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.source.as_ref()
    }

    /// Consumes the error and returns the wrapped error.
    pub fn into_inner(self) -> BoxedError {
        self.source
    }

    /// Attempts to view the wrapped error as a concrete type.
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.downcast_ref::<E>()
    }

    /// Returns the backtrace of the failure site, if one was captured.
    ///
    /// Panics carry the stack they were raised on. Errors returned by user
    /// code carry none unless attached with [`ExecutionError::with_trace`].
    pub fn trace(&self) -> Option<&str> {
        (!self.trace.is_empty()).then_some(self.trace.as_str())
    }

    /// Returns `true` if the failure was a panic.
    pub fn is_panic(&self) -> bool {
        self.source.is::<PanicError>()
    }
}

/// HTTP-class response an adapter should produce for an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// Client supplied bad input (400).
    BadRequest,
    /// Server-side fault (500).
    InternalServerError,
}

impl StatusClass {
    /// Returns the conventional HTTP status code.
    pub fn code(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::InternalServerError => 500,
        }
    }
}

impl fmt::Display for StatusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest => write!(f, "400 Bad Request"),
            Self::InternalServerError => write!(f, "500 Internal Server Error"),
        }
    }
}

/// The only errors allowed to leave a boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// Caller-supplied input was rejected before user code ran.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// User code (or a defective factory/predicate) failed.
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl Error {
    /// Returns the response class an adapter should use.
    pub fn status(&self) -> StatusClass {
        match self {
            Self::Validation(_) => StatusClass::BadRequest,
            Self::Execution(_) => StatusClass::InternalServerError,
        }
    }

    /// Returns the client-facing error body, `{"error": "..."}`.
    pub fn detail(&self) -> serde_json::Value {
        let message = match self {
            Self::Validation(err) => err.to_string(),
            Self::Execution(_) => ExecutionError::DETAIL.to_string(),
        };
        serde_json::json!({ "error": message })
    }

    /// Returns the validation failure, if that is what this is.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Execution(_) => None,
        }
    }

    /// Returns the execution failure, if that is what this is.
    pub fn as_execution(&self) -> Option<&ExecutionError> {
        match self {
            Self::Execution(err) => Some(err),
            Self::Validation(_) => None,
        }
    }
}

/// Reading a value out of a [`ParamBox`](crate::ParamBox) failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoxError {
    /// No value with this name is in the box.
    #[error("unknown attribute `{name}`")]
    UnknownAttribute {
        /// Requested name.
        name: String,
    },

    /// The value exists but has a different type.
    #[error("attribute `{name}`: {source}")]
    TypeMismatch {
        /// Requested name.
        name: String,
        /// Details of the mismatch.
        #[source]
        source: ValueTypeError,
    },
}

/// Settings could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A flag variable held something other than a boolean.
    #[error("invalid value `{value}` for {var}: expected a boolean flag")]
    InvalidFlag {
        /// Variable name.
        var: String,
        /// Offending value.
        value: String,
    },
}
