//! Immutable container of validated parameter values.

use std::any::Any;
use std::fmt;

use indexmap::IndexMap;

use crate::error::BoxError;
use crate::value::{ParamValue, SharedValue};

/// Validated values keyed by parameter name.
///
/// Produced only by the pipeline and never mutated afterwards. Declared
/// parameters come first, in declaration order, followed by any undeclared
/// parameters kept as raw `String`s. Lookups of unknown names fail with
/// [`BoxError::UnknownAttribute`] rather than returning a default.
///
/// # Examples
///
/// ```
/// use param_gate::{BoxError, Factory, ParamGate, QueryParams};
///
/// let params: QueryParams = [("page", "2"), ("q", "rust")].into_iter().collect();
/// let schema = ParamGate::new().declare("page", Factory::int()).freeze();
/// let p = schema.evaluate(&params).unwrap();
///
/// assert_eq!(p.get::<i64>("page"), Ok(&2));
/// assert_eq!(p.get::<String>("q").map(String::as_str), Ok("rust"));
/// assert!(matches!(p.get::<i64>("limit"), Err(BoxError::UnknownAttribute { .. })));
/// ```
#[derive(Clone, Default)]
pub struct ParamBox {
    values: IndexMap<String, SharedValue>,
}

impl ParamBox {
    pub(crate) fn new(values: IndexMap<String, SharedValue>) -> Self {
        Self { values }
    }

    /// Returns the value of `name` as a `T`.
    pub fn get<T: Any>(&self, name: &str) -> Result<&T, BoxError> {
        self.value(name)?
            .expect_type::<T>()
            .map_err(|source| BoxError::TypeMismatch {
                name: name.to_string(),
                source,
            })
    }

    /// Returns a string value, such as an identity or undeclared parameter.
    pub fn raw(&self, name: &str) -> Result<&str, BoxError> {
        self.get::<String>(name).map(String::as_str)
    }

    /// Returns the value of `name` without fixing its type.
    pub fn value(&self, name: &str) -> Result<&dyn ParamValue, BoxError> {
        self.values
            .get(name)
            .map(|value| value.as_ref())
            .ok_or_else(|| BoxError::UnknownAttribute {
                name: name.to_string(),
            })
    }

    /// Returns a shared handle to the value of `name`.
    pub fn shared(&self, name: &str) -> Option<SharedValue> {
        self.values.get(name).cloned()
    }

    /// Returns `true` if `name` is in the box.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Returns the number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the box is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over names in box order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Iterates over `(name, value)` pairs in box order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn ParamValue)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_ref()))
    }

    /// Reads the box into a typed record.
    pub fn extract<T: FromParamBox>(&self) -> Result<T, BoxError> {
        T::from_box(self)
    }
}

/// A typed record that can be read out of a [`ParamBox`].
///
/// Useful when the parameter set is known up front:
///
/// ```
/// use param_gate::{BoxError, Factory, FromParamBox, ParamBox, ParamGate, QueryParams};
///
/// struct Division {
///     a: i64,
///     b: i64,
/// }
///
/// impl FromParamBox for Division {
///     fn from_box(params: &ParamBox) -> Result<Self, BoxError> {
///         Ok(Self {
///             a: *params.get("a")?,
///             b: *params.get("b")?,
///         })
///     }
/// }
///
/// let params: QueryParams = [("a", "9"), ("b", "3")].into_iter().collect();
/// let schema = ParamGate::new()
///     .declare("a", Factory::int())
///     .declare("b", Factory::int())
///     .freeze();
///
/// let div: Division = schema.evaluate(&params).unwrap().extract().unwrap();
/// assert_eq!(div.a / div.b, 3);
/// ```
pub trait FromParamBox: Sized {
    /// Builds `Self` from the box.
    fn from_box(params: &ParamBox) -> Result<Self, BoxError>;
}

impl PartialEq for ParamBox {
    fn eq(&self, other: &Self) -> bool {
        self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(other.values.iter())
                .all(|((a_name, a), (b_name, b))| a_name == b_name && a.dyn_eq(b.as_ref()))
    }
}

impl fmt::Debug for ParamBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ParamBox(")?;
        f.debug_map().entries(self.iter()).finish()?;
        f.write_str(")")
    }
}

impl fmt::Display for ParamBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ParamBox<")?;
        f.debug_map().entries(self.iter()).finish()?;
        f.write_str(">")
    }
}
