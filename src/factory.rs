//! Conversion factories: raw string in, typed value out.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::FactoryError;
use crate::value::{ParamValue, SharedValue};

type ConvertFn = dyn Fn(&str) -> Result<SharedValue, FactoryError> + Send + Sync;

/// Converts a raw parameter string into a typed value.
///
/// A factory reports bad input with [`FactoryError::Rejected`] (any std parse
/// error converts to it). Returning [`FactoryError::Internal`] marks a defect
/// and is surfaced as an execution failure instead.
///
/// # Examples
///
/// ```
/// use param_gate::{Factory, FactoryError};
///
/// let int = Factory::int();
/// let currency = Factory::new(|raw: &str| {
///     let amount = raw
///         .strip_suffix('$')
///         .ok_or_else(|| FactoryError::rejected("missing currency sign"))?;
///     Ok::<f64, FactoryError>(amount.parse::<f64>()?)
/// });
///
/// assert!(!int.is_identity());
/// assert!(!currency.is_identity());
/// assert!(Factory::Identity.is_identity());
/// ```
#[derive(Clone, Default)]
pub enum Factory {
    /// Keep the raw string as a `String`.
    #[default]
    Identity,
    /// Run a conversion function.
    Convert {
        /// The conversion.
        convert: Arc<ConvertFn>,
        /// Type name shown to clients when conversion fails.
        expected: Option<&'static str>,
    },
}

impl Factory {
    /// Wraps a conversion function.
    pub fn new<T, E, F>(convert: F) -> Self
    where
        T: ParamValue,
        E: Into<FactoryError>,
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
    {
        Self::Convert {
            convert: Arc::new(move |raw: &str| {
                convert(raw)
                    .map(|value| Arc::new(value) as SharedValue)
                    .map_err(Into::into)
            }),
            expected: None,
        }
    }

    /// Converts with `T::from_str`.
    pub fn parse<T>() -> Self
    where
        T: FromStr + ParamValue,
        T::Err: Into<FactoryError>,
    {
        Self::new(|raw: &str| raw.parse::<T>())
    }

    /// Parses an `i64`; failures advertise the `int` type.
    pub fn int() -> Self {
        Self::parse::<i64>().named("int")
    }

    /// Parses an `f64`; failures advertise the `float` type.
    pub fn float() -> Self {
        Self::parse::<f64>().named("float")
    }

    /// Parses a boolean flag (`true/false`, `1/0`, `yes/no`, `on/off`).
    pub fn boolean() -> Self {
        Self::new(|raw: &str| {
            parse_flag(raw).ok_or_else(|| FactoryError::rejected(format!("not a flag: {raw}")))
        })
        .named("bool")
    }

    /// Sets the type name reported when conversion fails.
    ///
    /// Has no effect on [`Factory::Identity`], which never fails.
    pub fn named(self, type_name: &'static str) -> Self {
        match self {
            Self::Identity => Self::Identity,
            Self::Convert { convert, .. } => Self::Convert {
                convert,
                expected: Some(type_name),
            },
        }
    }

    /// Returns `true` for the pass-through factory.
    pub fn is_identity(&self) -> bool {
        matches!(self, Self::Identity)
    }

    /// Returns the advertised type name, if any.
    pub fn expected(&self) -> Option<&'static str> {
        match self {
            Self::Identity => None,
            Self::Convert { expected, .. } => *expected,
        }
    }

    /// Converts a raw string.
    pub fn convert(&self, raw: &str) -> Result<SharedValue, FactoryError> {
        match self {
            Self::Identity => Ok(Arc::new(raw.to_string())),
            Self::Convert { convert, .. } => convert(raw),
        }
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => f.write_str("Identity"),
            Self::Convert { expected, .. } => f
                .debug_struct("Convert")
                .field("expected", expected)
                .finish_non_exhaustive(),
        }
    }
}

/// Parses common boolean spellings, case-insensitively.
pub(crate) fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
