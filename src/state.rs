//! Type-state markers for builder progression.
//!
//! A [`ParamGate`](crate::ParamGate) starts [`Unbound`]: it only describes
//! parameters. Binding it to a source yields a [`Bound`] gate, the only state
//! that can enter a boundary and run user code.

use std::fmt;
use std::sync::Arc;

use crate::logging::FailureLog;
use crate::source::ParamSource;

/// Marker for a gate that is not attached to any parameter source.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbound {
    _private: (),
}

impl Unbound {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

/// State of a gate attached to one request's parameters.
///
/// Holds a borrowed source for exactly as long as the gate lives; the gate
/// never outlives the request it validates.
#[derive(Clone)]
pub struct Bound<'s> {
    pub(crate) source: &'s dyn ParamSource,
    pub(crate) logger: Option<Arc<FailureLog>>,
}

impl<'s> Bound<'s> {
    pub(crate) fn new(source: &'s dyn ParamSource) -> Self {
        Self {
            source,
            logger: None,
        }
    }
}

impl fmt::Debug for Bound<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bound")
            .field("params", &self.source.names())
            .field("custom_logger", &self.logger.is_some())
            .finish()
    }
}
