use crate::capture;
use crate::error::{
    CheckError, ConversionError, ExecutionError, FactoryError, FailureCause, FaultOrigin,
    PredicateError,
};
use crate::factory::Factory;
use crate::validator::Validator;
use crate::value::SharedValue;

/// One declared parameter: a name, its factory, and its validator chain.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    name: String,
    factory: Factory,
    validators: Vec<Validator>,
}

/// Why a single parameter failed.
pub(crate) enum ParamFailure {
    Invalid(FailureCause),
    Fault(ExecutionError),
}

impl ParamSpec {
    /// Declares a parameter with a conversion factory.
    pub fn new(name: impl Into<String>, factory: Factory) -> Self {
        Self {
            name: name.into(),
            factory,
            validators: Vec::new(),
        }
    }

    /// Declares a parameter kept as its raw string.
    pub fn identity(name: impl Into<String>) -> Self {
        Self::new(name, Factory::Identity)
    }

    /// Returns the parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the factory.
    pub fn factory(&self) -> &Factory {
        &self.factory
    }

    /// Returns the attached validators in evaluation order.
    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    pub(crate) fn set_factory(&mut self, factory: Factory) {
        self.factory = factory;
    }

    /// Attaches a validator. Empty validators are ignored.
    pub(crate) fn push_validator(&mut self, validator: Validator) {
        if !validator.is_empty() {
            self.validators.push(validator);
        }
    }

    /// Converts `raw` and runs every validator against the result.
    ///
    /// A panic in the factory or in a predicate is reported as a fault
    /// attributed to this parameter.
    pub(crate) fn resolve(&self, raw: Option<&str>) -> Result<SharedValue, ParamFailure> {
        let raw = raw.ok_or_else(|| {
            ParamFailure::Invalid(
                ConversionError::Missing {
                    name: self.name.clone(),
                }
                .into(),
            )
        })?;

        let converted = capture::catch(|| self.factory.convert(raw)).map_err(|caught| {
            ParamFailure::Fault(ExecutionError::from_panic(
                FaultOrigin::Factory {
                    param: self.name.clone(),
                },
                caught,
            ))
        })?;

        let value = converted.map_err(|err| match err {
            FactoryError::Rejected { reason } => ParamFailure::Invalid(
                ConversionError::InvalidType {
                    name: self.name.clone(),
                    raw: raw.to_string(),
                    expected: self.factory.expected(),
                    reason,
                }
                .into(),
            ),
            internal => ParamFailure::Fault(ExecutionError::from_factory(&self.name, internal)),
        })?;

        for validator in &self.validators {
            let checked = capture::catch(|| validator.test(&*value)).map_err(|caught| {
                ParamFailure::Fault(ExecutionError::from_panic(
                    FaultOrigin::Predicate {
                        param: self.name.clone(),
                    },
                    caught,
                ))
            })?;

            checked.map_err(|err| match err {
                CheckError::Failed => ParamFailure::Invalid(
                    PredicateError::falsy_value(&self.name, raw, &*value).into(),
                ),
                CheckError::Rejected(message) => ParamFailure::Invalid(
                    PredicateError {
                        name: self.name.clone(),
                        raw: raw.to_string(),
                        message,
                    }
                    .into(),
                ),
                internal => ParamFailure::Fault(ExecutionError::from_check(&self.name, internal)),
            })?;
        }

        Ok(value)
    }
}
