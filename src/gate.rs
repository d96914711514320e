use std::any::Any;
use std::cmp::Ordering;
use std::sync::Arc;

use indexmap::map::Entry;
use indexmap::IndexMap;

use crate::boundary::Boundary;
use crate::error::{BoxedError, CheckError, Error};
use crate::factory::Factory;
use crate::logging::FailureLog;
use crate::param::ParamSpec;
use crate::param_box::ParamBox;
use crate::pipeline::Schema;
use crate::source::ParamSource;
use crate::state::{Bound, Unbound};
use crate::validator::Validator;
use crate::value::{sign, ParamValue};

/// Fluent builder for a parameter specification.
///
/// A gate collects factories and validators per parameter name, in
/// declaration order. It is consumed by [`ParamGate::freeze`] (yielding a
/// reusable [`Schema`]) or, once bound to a source, by
/// [`ParamGate::enter`]/[`ParamGate::run`]. Either way no parameter can be
/// added after validation has started.
///
/// Attaching a validator to a name that has no factory declares that name
/// with the identity factory, so it becomes required.
///
/// # Examples
///
/// ```
/// use param_gate::{BoxError, Factory, ParamGate, QueryParams};
///
/// let params: QueryParams = [("a", "10"), ("b", "2")].into_iter().collect();
///
/// let quotient = ParamGate::new()
///     .declare("a", Factory::int())
///     .declare("b", Factory::int())
///     .nonzero("b")
///     .bind(&params)
///     .run(|p| -> Result<i64, BoxError> { Ok(p.get::<i64>("a")? / p.get::<i64>("b")?) })
///     .unwrap_or_else(|err| panic!("{err}"));
/// assert_eq!(quotient, 5);
/// ```
#[derive(Debug, Clone)]
pub struct ParamGate<S = Unbound> {
    specs: IndexMap<String, ParamSpec>,
    box_all: bool,
    state: S,
}

impl ParamGate<Unbound> {
    /// Creates an empty gate.
    pub fn new() -> Self {
        Self {
            specs: IndexMap::new(),
            box_all: true,
            state: Unbound::new(),
        }
    }

    /// Attaches the gate to one request's parameters.
    pub fn bind<'s>(self, source: &'s dyn ParamSource) -> ParamGate<Bound<'s>> {
        ParamGate {
            specs: self.specs,
            box_all: self.box_all,
            state: Bound::new(source),
        }
    }
}

impl Default for ParamGate<Unbound> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> ParamGate<S> {
    /// Declares `name` with `factory`, replacing any earlier factory.
    ///
    /// Validators already attached to `name` are kept, as is its position.
    pub fn declare(mut self, name: impl Into<String>, factory: Factory) -> Self {
        match self.specs.entry(name.into()) {
            Entry::Occupied(mut entry) => entry.get_mut().set_factory(factory),
            Entry::Vacant(entry) => {
                let spec = ParamSpec::new(entry.key().clone(), factory);
                entry.insert(spec);
            }
        }
        self
    }

    /// Declares several parameters at once.
    pub fn declare_all<I, K>(self, factories: I) -> Self
    where
        I: IntoIterator<Item = (K, Factory)>,
        K: Into<String>,
    {
        factories
            .into_iter()
            .fold(self, |gate, (name, factory)| gate.declare(name, factory))
    }

    /// Appends a validator to `name`.
    pub fn validator(mut self, name: impl Into<String>, validator: Validator) -> Self {
        self.spec_mut(name.into()).push_validator(validator);
        self
    }

    /// Appends one validator per entry.
    pub fn validators<I, K>(self, validators: I) -> Self
    where
        I: IntoIterator<Item = (K, Validator)>,
        K: Into<String>,
    {
        validators
            .into_iter()
            .fold(self, |gate, (name, validator)| gate.validator(name, validator))
    }

    /// Appends a boolean predicate over the converted value.
    ///
    /// When it returns `false` the failure message is
    /// `Invalid '<name>' value: <value>.`, where `<value>` is the converted
    /// value (strings unquoted, other types through `Debug`).
    pub fn predicate<T, P>(self, name: impl Into<String>, predicate: P) -> Self
    where
        T: Any,
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.validator(name, Validator::new(predicate))
    }

    /// Appends a boolean predicate with a custom failure message.
    pub fn predicate_with<T, P>(
        self,
        name: impl Into<String>,
        predicate: P,
        message: impl Into<String>,
    ) -> Self
    where
        T: Any,
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let message = message.into();
        self.try_predicate(name, move |value: &T| {
            if predicate(value) {
                Ok(())
            } else {
                Err(CheckError::rejected(message.clone()))
            }
        })
    }

    /// Appends a predicate that reports its own outcome.
    pub fn try_predicate<T, P>(self, name: impl Into<String>, predicate: P) -> Self
    where
        T: Any,
        P: Fn(&T) -> Result<(), CheckError> + Send + Sync + 'static,
    {
        self.validator(name, Validator::try_new(predicate))
    }

    /// Requires the converted value to equal `expected`.
    pub fn eq<T>(self, name: impl Into<String>, expected: T) -> Self
    where
        T: PartialEq + Any + Send + Sync,
    {
        self.predicate(name, move |value: &T| *value == expected)
    }

    /// Requires `transform(value)` to equal `expected`.
    pub fn eq_by<T, U, F>(self, name: impl Into<String>, expected: U, transform: F) -> Self
    where
        T: Any,
        U: PartialEq + Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        self.validator(
            name,
            Validator::with_transform(transform, move |value: &U| *value == expected),
        )
    }

    /// Requires the converted value to be strictly greater than `bound`.
    pub fn gt<T>(self, name: impl Into<String>, bound: T) -> Self
    where
        T: PartialOrd + Any + Send + Sync,
    {
        self.predicate(name, move |value: &T| *value > bound)
    }

    /// Requires `transform(value)` to be strictly greater than `bound`.
    pub fn gt_by<T, U, F>(self, name: impl Into<String>, bound: U, transform: F) -> Self
    where
        T: Any,
        U: PartialOrd + Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        self.validator(
            name,
            Validator::with_transform(transform, move |value: &U| *value > bound),
        )
    }

    /// Requires the converted value to be strictly less than `bound`.
    pub fn lt<T>(self, name: impl Into<String>, bound: T) -> Self
    where
        T: PartialOrd + Any + Send + Sync,
    {
        self.predicate(name, move |value: &T| *value < bound)
    }

    /// Requires `transform(value)` to be strictly less than `bound`.
    pub fn lt_by<T, U, F>(self, name: impl Into<String>, bound: U, transform: F) -> Self
    where
        T: Any,
        U: PartialOrd + Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        self.validator(
            name,
            Validator::with_transform(transform, move |value: &U| *value < bound),
        )
    }

    /// Requires a numeric value other than zero. Works for every primitive
    /// number type; NaN passes.
    pub fn nonzero(self, name: impl Into<String>) -> Self {
        self.validator(
            name,
            Validator::default().and_sign(|ordering| ordering != Some(Ordering::Equal)),
        )
    }

    /// Requires `transform(value)` to be a number other than zero.
    pub fn nonzero_by<T, U, F>(self, name: impl Into<String>, transform: F) -> Self
    where
        T: Any,
        U: ParamValue,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        self.sign_by(name, transform, |ordering| ordering != Some(Ordering::Equal))
    }

    /// Requires a numeric value of zero or more. NaN fails.
    pub fn positive(self, name: impl Into<String>) -> Self {
        self.validator(name, Validator::default().and_sign(non_negative))
    }

    /// Requires `transform(value)` to be a number of zero or more.
    pub fn positive_by<T, U, F>(self, name: impl Into<String>, transform: F) -> Self
    where
        T: Any,
        U: ParamValue,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        self.sign_by(name, transform, non_negative)
    }

    /// Controls whether source parameters that were never declared are boxed
    /// as raw strings. Enabled by default.
    pub fn box_all(mut self, enabled: bool) -> Self {
        self.box_all = enabled;
        self
    }

    /// Returns `true` if undeclared parameters will be boxed.
    pub fn boxes_all(&self) -> bool {
        self.box_all
    }

    /// Returns the declared parameters in declaration order.
    pub fn specs(&self) -> impl Iterator<Item = &ParamSpec> {
        self.specs.values()
    }

    /// Returns the number of declared parameters.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Returns `true` if nothing has been declared.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Freezes the specification into a reusable, shareable schema.
    pub fn freeze(self) -> Schema {
        Schema::new(self.specs, self.box_all)
    }

    fn spec_mut(&mut self, name: String) -> &mut ParamSpec {
        self.specs
            .entry(name)
            .or_insert_with_key(|name| ParamSpec::identity(name.clone()))
    }

    fn sign_by<T, U, F, A>(self, name: impl Into<String>, transform: F, accept: A) -> Self
    where
        T: Any,
        U: ParamValue,
        F: Fn(&T) -> U + Send + Sync + 'static,
        A: Fn(Option<Ordering>) -> bool + Send + Sync + 'static,
    {
        self.try_predicate(name, move |value: &T| {
            let transformed = transform(value);
            let ordering = sign(&transformed).map_err(CheckError::internal)?;
            if accept(ordering) {
                Ok(())
            } else {
                Err(CheckError::Failed)
            }
        })
    }
}

impl<'s> ParamGate<Bound<'s>> {
    /// Uses `logger` instead of the process-wide failure log.
    pub fn logger(mut self, logger: Arc<FailureLog>) -> Self {
        self.state.logger = Some(logger);
        self
    }

    /// Returns the bound parameter source.
    pub fn source(&self) -> &'s dyn ParamSource {
        self.state.source
    }

    /// Freezes the specification and opens an execution boundary over the
    /// bound source.
    pub fn enter(self) -> Boundary<'s> {
        let Bound { source, logger } = self.state;
        let boundary = Boundary::new(Schema::new(self.specs, self.box_all), source);
        match logger {
            Some(logger) => boundary.logger(logger),
            None => boundary,
        }
    }

    /// Validates the bound source and runs `f` with the resulting box.
    ///
    /// Shorthand for `self.enter().run(f)`.
    pub fn run<R, E, F>(self, f: F) -> Result<R, Error>
    where
        E: Into<BoxedError>,
        F: FnOnce(&ParamBox) -> Result<R, E>,
    {
        self.enter().run(f)
    }
}

/// Starts a gate already bound to `source`.
///
/// ```
/// use std::collections::HashMap;
/// use param_gate::{validate, Factory};
///
/// let mut params = HashMap::new();
/// params.insert("page".to_string(), "3".to_string());
///
/// let page = validate(&params)
///     .declare("page", Factory::int())
///     .positive("page")
///     .run(|p| p.get::<i64>("page").copied())
///     .unwrap_or_else(|err| panic!("{err}"));
/// assert_eq!(page, 3);
/// ```
pub fn validate(source: &dyn ParamSource) -> ParamGate<Bound<'_>> {
    ParamGate::new().bind(source)
}

fn non_negative(ordering: Option<Ordering>) -> bool {
    matches!(ordering, Some(Ordering::Greater | Ordering::Equal))
}
