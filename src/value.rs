//! Dynamically typed parameter values.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use crate::error::ValueTypeError;

/// A converted parameter value.
///
/// Implemented for every `'static` type that is `Debug + PartialEq + Send + Sync`,
/// so factories can return plain Rust values. Equality is dynamic: values of
/// different types never compare equal.
pub trait ParamValue: Any + fmt::Debug + Send + Sync + 'static {
    /// Returns `self` as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Compares with another value of unknown type.
    fn dyn_eq(&self, other: &dyn ParamValue) -> bool;

    /// Returns the Rust type name of the value.
    fn type_name(&self) -> &'static str;
}

impl<T> ParamValue for T
where
    T: Any + fmt::Debug + PartialEq + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn ParamValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

impl dyn ParamValue {
    /// Returns the value as `T` if that is its type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Returns the value as `T`, or a type error naming both types.
    pub fn expect_type<T: Any>(&self) -> Result<&T, ValueTypeError> {
        self.downcast_ref::<T>().ok_or_else(|| ValueTypeError {
            expected: type_name::<T>(),
            found: self.type_name(),
        })
    }

    /// Renders the value for messages: strings as-is, anything else through
    /// its `Debug` form.
    pub fn render(&self) -> String {
        match self.downcast_ref::<String>() {
            Some(text) => text.clone(),
            None => format!("{self:?}"),
        }
    }

    /// Returns `true` if the value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

/// Shared handle to a converted value.
pub type SharedValue = Arc<dyn ParamValue>;

/// Compares a numeric value against zero.
///
/// Returns `Ok(None)` for NaN and an error when the value is not a primitive
/// number.
pub(crate) fn sign(value: &dyn ParamValue) -> Result<Option<std::cmp::Ordering>, ValueTypeError> {
    macro_rules! try_int {
        ($($ty:ty),*) => {
            $(
                if let Some(v) = value.downcast_ref::<$ty>() {
                    return Ok(Some(v.cmp(&0)));
                }
            )*
        };
    }
    macro_rules! try_float {
        ($($ty:ty),*) => {
            $(
                if let Some(v) = value.downcast_ref::<$ty>() {
                    return Ok(v.partial_cmp(&0.0));
                }
            )*
        };
    }

    try_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
    try_float!(f32, f64);

    Err(ValueTypeError {
        expected: "number",
        found: value.type_name(),
    })
}
