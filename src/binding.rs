//! Handler binding: validate a request's parameters, then call the handler
//! with the resulting box appended.

use std::fmt;
use std::sync::Arc;

use crate::error::{BoxedError, Error};
use crate::factory::Factory;
use crate::gate::ParamGate;
use crate::logging::FailureLog;
use crate::param_box::ParamBox;
use crate::pipeline::Schema;
use crate::source::{ParamSource, QueryParams};
use crate::validator::Validator;
use crate::web::RequestParams;

type RequestWrapper = dyn Fn(QueryParams) -> QueryParams + Send + Sync;

/// Declarative parameter binding for request handlers.
///
/// Collects factories, validators and the box-all flag once; the `wrap*`
/// methods then turn a handler that expects a [`ParamBox`] as its last
/// argument into one that takes only the request (plus any other
/// arguments). Every call builds a fresh box from that call's request.
///
/// # Examples
///
/// ```
/// use param_gate::{Binding, Factory, ParamBox, QueryParams, Validator};
/// use param_gate::BoxError;
///
/// let divide = Binding::new([("a", Factory::int()), ("b", Factory::int())])
///     .validators([("b", Validator::new(|b: &i64| *b != 0))])
///     .wrap(|_req: &QueryParams, p: &ParamBox| -> Result<i64, BoxError> {
///         Ok(p.get::<i64>("a")? / p.get::<i64>("b")?)
///     });
///
/// let ok: QueryParams = [("a", "10"), ("b", "2")].into_iter().collect();
/// assert_eq!(divide(&ok).unwrap(), 5);
///
/// let bad: QueryParams = [("a", "10"), ("b", "0")].into_iter().collect();
/// assert_eq!(divide(&bad).unwrap_err().status().code(), 400);
/// ```
#[derive(Clone, Default)]
pub struct Binding {
    gate: ParamGate,
    logger: Option<Arc<FailureLog>>,
    wrapper: Option<Arc<RequestWrapper>>,
}

impl Binding {
    /// Starts a binding from `(name, factory)` pairs.
    pub fn new<I, K>(factories: I) -> Self
    where
        I: IntoIterator<Item = (K, Factory)>,
        K: Into<String>,
    {
        Self::from_gate(ParamGate::new().declare_all(factories))
    }

    /// Starts a binding from an already configured gate.
    pub fn from_gate(gate: ParamGate) -> Self {
        Self {
            gate,
            logger: None,
            wrapper: None,
        }
    }

    /// Attaches validators by parameter name.
    pub fn validators<I, K>(mut self, validators: I) -> Self
    where
        I: IntoIterator<Item = (K, Validator)>,
        K: Into<String>,
    {
        self.gate = self.gate.validators(validators);
        self
    }

    /// Controls whether undeclared parameters are boxed. Enabled by default.
    pub fn box_all(mut self, enabled: bool) -> Self {
        self.gate = self.gate.box_all(enabled);
        self
    }

    /// Logs execution failures to `logger` instead of the process-wide log.
    pub fn logger(mut self, logger: Arc<FailureLog>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Rewrites each request's parameters before validation.
    ///
    /// Useful to normalize framework quirks, e.g. dropping empty values or
    /// renaming legacy keys.
    pub fn request_wrapper<W>(mut self, wrapper: W) -> Self
    where
        W: Fn(QueryParams) -> QueryParams + Send + Sync + 'static,
    {
        self.wrapper = Some(Arc::new(wrapper));
        self
    }

    /// Freezes the binding for repeated use.
    pub fn prepare(self) -> Prepared {
        Prepared {
            schema: self.gate.freeze(),
            logger: self.logger,
            wrapper: self.wrapper,
        }
    }

    /// Wraps `f(request, box)` into `f(request)`.
    pub fn wrap<Req, R, E, F>(self, f: F) -> impl Fn(&Req) -> Result<R, Error>
    where
        Req: RequestParams + ?Sized,
        E: Into<BoxedError>,
        F: Fn(&Req, &ParamBox) -> Result<R, E>,
    {
        let prepared = self.prepare();
        move |request: &Req| prepared.call(request, |params| f(request, params))
    }

    /// Wraps `f(request, arg, box)` into `f(request, arg)`.
    pub fn wrap_with<Req, A, R, E, F>(self, f: F) -> impl Fn(&Req, A) -> Result<R, Error>
    where
        Req: RequestParams + ?Sized,
        E: Into<BoxedError>,
        F: Fn(&Req, A, &ParamBox) -> Result<R, E>,
    {
        let prepared = self.prepare();
        move |request: &Req, arg: A| prepared.call(request, |params| f(request, arg, params))
    }

    /// Wraps a method-style `f(receiver, request, arg, box)`, where the
    /// request is the second argument, into `f(receiver, request, arg)`.
    pub fn wrap_method<S, Req, A, R, E, F>(self, f: F) -> impl Fn(&S, &Req, A) -> Result<R, Error>
    where
        S: ?Sized,
        Req: RequestParams + ?Sized,
        E: Into<BoxedError>,
        F: Fn(&S, &Req, A, &ParamBox) -> Result<R, E>,
    {
        let prepared = self.prepare();
        move |receiver: &S, request: &Req, arg: A| {
            prepared.call(request, |params| f(receiver, request, arg, params))
        }
    }

    /// Pre-binds the request, for frameworks where the handler never
    /// receives it as an argument.
    pub fn with_request<Req>(self, request: Req) -> PreBound<Req>
    where
        Req: RequestParams,
    {
        PreBound {
            prepared: self.prepare(),
            request,
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("gate", &self.gate)
            .field("custom_logger", &self.logger.is_some())
            .field("request_wrapper", &self.wrapper.is_some())
            .finish()
    }
}

/// A frozen [`Binding`], callable any number of times.
#[derive(Clone)]
pub struct Prepared {
    schema: Schema,
    logger: Option<Arc<FailureLog>>,
    wrapper: Option<Arc<RequestWrapper>>,
}

impl Prepared {
    /// Returns the frozen schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Validates `request` and runs `f` with its box inside a boundary.
    pub fn call<Req, R, E, F>(&self, request: &Req, f: F) -> Result<R, Error>
    where
        Req: RequestParams + ?Sized,
        E: Into<BoxedError>,
        F: FnOnce(&ParamBox) -> Result<R, E>,
    {
        let source = request.params();
        match &self.wrapper {
            Some(wrap) => {
                let rewritten = Rewritten {
                    params: wrap(QueryParams::snapshot(source)),
                    body: source.body(),
                };
                self.run(&rewritten, f)
            }
            None => self.run(source, f),
        }
    }

    fn run<R, E, F>(&self, source: &dyn ParamSource, f: F) -> Result<R, Error>
    where
        E: Into<BoxedError>,
        F: FnOnce(&ParamBox) -> Result<R, E>,
    {
        let boundary = self.schema.enter(source);
        let boundary = match &self.logger {
            Some(logger) => boundary.logger(Arc::clone(logger)),
            None => boundary,
        };
        boundary.run(f)
    }
}

impl fmt::Debug for Prepared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prepared")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// A [`Binding`] with its request supplied up front.
#[derive(Debug, Clone)]
pub struct PreBound<Req> {
    prepared: Prepared,
    request: Req,
}

impl<Req: RequestParams> PreBound<Req> {
    /// Returns the bound request.
    pub fn request(&self) -> &Req {
        &self.request
    }

    /// Validates the bound request and calls `f(request, box)`.
    pub fn call<R, E, F>(&self, f: F) -> Result<R, Error>
    where
        E: Into<BoxedError>,
        F: FnOnce(&Req, &ParamBox) -> Result<R, E>,
    {
        self.prepared
            .call(&self.request, |params| f(&self.request, params))
    }

    /// Wraps `f(request, box)` into a zero-argument handler.
    pub fn wrap<R, E, F>(self, f: F) -> impl Fn() -> Result<R, Error>
    where
        E: Into<BoxedError>,
        F: Fn(&Req, &ParamBox) -> Result<R, E>,
    {
        move || self.call(&f)
    }
}

struct Rewritten<'a> {
    params: QueryParams,
    body: Option<&'a str>,
}

impl ParamSource for Rewritten<'_> {
    fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    fn names(&self) -> Vec<&str> {
        self.params.names()
    }

    fn get_all(&self, name: &str) -> Vec<&str> {
        ParamSource::get_all(&self.params, name)
    }

    fn body(&self) -> Option<&str> {
        self.body
    }
}
