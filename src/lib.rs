//! Request-parameter coercion and validation with a two-tier error boundary.
//!
//! Raw string parameters are converted and checked before user code runs;
//! failures inside user code are then kept apart from failures caused by bad
//! input:
//! - **Validation**: every declared parameter is converted by its
//!   [`Factory`] and checked by its [`Validator`]s, in declaration order,
//!   stopping at the first failure ([`ValidationError`], HTTP 400)
//! - **Execution**: user code receives an immutable [`ParamBox`]; anything it
//!   returns as an error, or any panic, is logged once and surfaced as
//!   [`ExecutionError`] (HTTP 500)
//!
//! # Core Types
//!
//! - [`ParamGate`]: fluent builder for a parameter specification
//! - [`Schema`]: a frozen specification, reusable across requests
//! - [`Boundary`]: runs the pipeline on entry and wraps user code
//! - [`ParamBox`]: validated values, looked up by name and type
//! - [`Binding`]: attaches a specification to a request handler
//! - [`FailureLog`]: process-wide destination for execution failures
//!
//! # Examples
//!
//! ```
//! use param_gate::{validate, BoxError, Factory, QueryParams};
//!
//! let params: QueryParams = [("a", "10"), ("b", "2"), ("token", "abcdefghijkl")]
//!     .into_iter()
//!     .collect();
//!
//! let answer = validate(&params)
//!     .declare("a", Factory::int())
//!     .declare("b", Factory::int())
//!     .nonzero("b")
//!     .eq_by("token", 12, |token: &String| token.len())
//!     .run(|p| -> Result<i64, BoxError> {
//!         assert_eq!(p.raw("token")?, "abcdefghijkl");
//!         Ok(p.get::<i64>("a")? / p.get::<i64>("b")?)
//!     })
//!     .unwrap_or_else(|err| panic!("{err}"));
//!
//! assert_eq!(answer, 5);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod binding;
mod boundary;
mod capture;
mod config;
mod error;
mod factory;
mod gate;
mod logging;
mod param;
mod param_box;
mod pipeline;
mod sink;
mod source;
mod state;
mod validator;
mod value;

pub mod web;

pub use binding::{Binding, PreBound, Prepared};
pub use boundary::Boundary;
pub use config::{Settings, BOX_ALL_VAR, LOGGING_VAR};
pub use error::{
    BoxError, BoxedError, CheckError, ConfigError, ConversionError, Error, ExecutionError,
    FactoryError, FailureCause, FaultOrigin, PanicError, PredicateError, StatusClass,
    ValidationError, ValueTypeError,
};
pub use factory::Factory;
pub use gate::{validate, ParamGate};
pub use logging::{FailureLog, FailureRecord};
pub use param::ParamSpec;
pub use param_box::{FromParamBox, ParamBox};
pub use pipeline::{Schema, ValidationOutcome};
pub use sink::{FailureSink, JsonLinesSink, RecordingSink, SinkError, SinkErrorKind, TracingSink};
pub use source::{ParamSource, QueryParams};
pub use state::{Bound, Unbound};
pub use validator::Validator;
pub use value::{ParamValue, SharedValue};
