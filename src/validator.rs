//! Short-circuiting predicate chains over converted values.

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::error::CheckError;
use crate::value::{sign, ParamValue};

type CheckFn = dyn Fn(&dyn ParamValue) -> Result<(), CheckError> + Send + Sync;

/// An ordered chain of predicates over one converted value.
///
/// Predicates run in the order they were added and evaluation stops at the
/// first one that fails. Typed predicates downcast the value first; a value of
/// the wrong type is reported as [`CheckError::Internal`], since it means the
/// factory and the predicate disagree.
///
/// # Examples
///
/// ```
/// use param_gate::{CheckError, Validator};
///
/// let price = Validator::new(|price: &f64| *price > 0.0)
///     .and(|price: &f64| *price < 10_000.0);
/// assert!(price.test(&12.5_f64).is_ok());
/// assert!(matches!(price.test(&0.0_f64), Err(CheckError::Failed)));
///
/// let token = Validator::try_new(|token: &String| {
///     if token.len() == 12 {
///         Ok(())
///     } else {
///         Err(CheckError::rejected("token must be 12 characters"))
///     }
/// });
/// let err = token.test(&"short".to_string()).unwrap_err();
/// assert_eq!(err.to_string(), "token must be 12 characters");
/// ```
#[derive(Clone, Default)]
pub struct Validator {
    checks: Vec<Arc<CheckFn>>,
}

impl Validator {
    /// Creates a validator from a boolean predicate.
    pub fn new<T, P>(predicate: P) -> Self
    where
        T: Any,
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self::default().and(predicate)
    }

    /// Creates a validator from a predicate that may supply its own message.
    pub fn try_new<T, P>(predicate: P) -> Self
    where
        T: Any,
        P: Fn(&T) -> Result<(), CheckError> + Send + Sync + 'static,
    {
        Self::default().try_and(predicate)
    }

    /// Creates a validator that tests `predicate(transform(value))`.
    ///
    /// The transformed value is only used for the test; the box keeps the
    /// converted value.
    pub fn with_transform<T, U, F, P>(transform: F, predicate: P) -> Self
    where
        T: Any,
        F: Fn(&T) -> U + Send + Sync + 'static,
        P: Fn(&U) -> bool + Send + Sync + 'static,
    {
        Self::new(move |value: &T| predicate(&transform(value)))
    }

    /// Appends a boolean predicate.
    pub fn and<T, P>(self, predicate: P) -> Self
    where
        T: Any,
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.try_and(move |value: &T| {
            if predicate(value) {
                Ok(())
            } else {
                Err(CheckError::Failed)
            }
        })
    }

    /// Appends a predicate that may supply its own message.
    pub fn try_and<T, P>(mut self, predicate: P) -> Self
    where
        T: Any,
        P: Fn(&T) -> Result<(), CheckError> + Send + Sync + 'static,
    {
        self.checks.push(Arc::new(move |value: &dyn ParamValue| {
            let value = value.expect_type::<T>().map_err(CheckError::internal)?;
            predicate(value)
        }));
        self
    }

    /// Appends a predicate over the value's sign; works for every primitive number.
    pub(crate) fn and_sign<P>(mut self, accept: P) -> Self
    where
        P: Fn(Option<Ordering>) -> bool + Send + Sync + 'static,
    {
        self.checks.push(Arc::new(move |value: &dyn ParamValue| {
            let ordering = sign(value).map_err(CheckError::internal)?;
            if accept(ordering) {
                Ok(())
            } else {
                Err(CheckError::Failed)
            }
        }));
        self
    }

    /// Appends every predicate of `other`, preserving order.
    pub fn extend(mut self, other: Validator) -> Self {
        self.checks.extend(other.checks);
        self
    }

    /// Returns the number of predicates.
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Returns `true` if no predicate has been added.
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Runs the chain against `value`, stopping at the first failure.
    pub fn test(&self, value: &dyn ParamValue) -> Result<(), CheckError> {
        self.checks.iter().try_for_each(|check| check(value))
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("predicates", &self.checks.len())
            .finish()
    }
}
