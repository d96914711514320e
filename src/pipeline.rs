//! Fail-fast evaluation of a frozen specification.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::boundary::Boundary;
use crate::error::{BoxedError, Error, ExecutionError, ValidationError};
use crate::param::{ParamFailure, ParamSpec};
use crate::param_box::ParamBox;
use crate::source::ParamSource;
use crate::value::SharedValue;

/// A frozen, cheaply clonable parameter specification.
///
/// Built by [`ParamGate::freeze`](crate::ParamGate::freeze). A schema holds no
/// per-request state: the same schema can validate any number of sources, from
/// any number of threads.
#[derive(Debug, Clone)]
pub struct Schema {
    specs: Arc<IndexMap<String, ParamSpec>>,
    box_all: bool,
}

/// Result of running the pipeline over one source.
#[derive(Debug)]
pub enum ValidationOutcome {
    /// Every declared parameter converted and passed its validators.
    Valid(ParamBox),
    /// The first parameter, in declaration order, that did not.
    Failed(ValidationError),
}

impl ValidationOutcome {
    /// Returns `true` for [`ValidationOutcome::Valid`].
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Converts into a `Result`.
    pub fn into_result(self) -> Result<ParamBox, ValidationError> {
        match self {
            Self::Valid(params) => Ok(params),
            Self::Failed(err) => Err(err),
        }
    }
}

impl Schema {
    pub(crate) fn new(specs: IndexMap<String, ParamSpec>, box_all: bool) -> Self {
        Self {
            specs: Arc::new(specs),
            box_all,
        }
    }

    /// Returns the declared parameters in evaluation order.
    pub fn specs(&self) -> impl Iterator<Item = &ParamSpec> {
        self.specs.values()
    }

    /// Looks up one declared parameter.
    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.specs.get(name)
    }

    /// Returns `true` if undeclared parameters are boxed too.
    pub fn boxes_all(&self) -> bool {
        self.box_all
    }

    /// Returns the number of declared parameters.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Returns `true` if nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Runs the pipeline over `source`.
    ///
    /// Parameters are converted and validated in declaration order and
    /// evaluation stops at the first failure, so at most one
    /// [`ValidationError`] is produced. Internal factory or predicate
    /// failures (including panics) are returned as `Err` and are not logged
    /// here; [`Boundary`] does that.
    ///
    /// The source is only read, so checking the same source twice yields
    /// equal outcomes.
    pub fn check(&self, source: &dyn ParamSource) -> Result<ValidationOutcome, ExecutionError> {
        let mut values: IndexMap<String, SharedValue> = IndexMap::with_capacity(self.specs.len());

        for (name, spec) in self.specs.iter() {
            match spec.resolve(source.get(name)) {
                Ok(value) => {
                    values.insert(name.clone(), value);
                }
                Err(ParamFailure::Invalid(cause)) => {
                    tracing::debug!(param = %name, "parameter rejected");
                    return Ok(ValidationOutcome::Failed(ValidationError::new(cause)));
                }
                Err(ParamFailure::Fault(err)) => return Err(err),
            }
        }

        if self.box_all {
            for name in source.names() {
                if self.specs.contains_key(name) {
                    continue;
                }
                if let Some(raw) = source.get(name) {
                    values.insert(name.to_string(), Arc::new(raw.to_string()));
                }
            }
        }

        Ok(ValidationOutcome::Valid(ParamBox::new(values)))
    }

    /// Runs the pipeline and folds both failure kinds into [`Error`].
    ///
    /// Nothing is logged; use [`Schema::enter`] to get the full boundary.
    pub fn evaluate(&self, source: &dyn ParamSource) -> Result<ParamBox, Error> {
        Ok(self.check(source)?.into_result()?)
    }

    /// Opens an execution boundary over `source`.
    pub fn enter<'s>(&self, source: &'s dyn ParamSource) -> Boundary<'s> {
        Boundary::new(self.clone(), source)
    }

    /// Validates `source` and runs `f` inside a boundary.
    pub fn run<R, E, F>(&self, source: &dyn ParamSource, f: F) -> Result<R, Error>
    where
        E: Into<BoxedError>,
        F: FnOnce(&ParamBox) -> Result<R, E>,
    {
        self.enter(source).run(f)
    }
}
