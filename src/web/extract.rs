//! Extraction boundary trait for web integration.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::source::{ParamSource, QueryParams};

/// Exposes a request's parameters as a [`ParamSource`].
///
/// This is the only thing a [`Binding`](crate::Binding) needs from a
/// request. Framework integrations implement it for their request type; the
/// crate implements it for [`ParamRequest`](super::ParamRequest) and for the
/// plain map types, so handlers can be called with a bare parameter map in
/// tests.
///
/// # Examples
///
/// ```
/// use param_gate::{ParamSource, QueryParams};
/// use param_gate::web::RequestParams;
///
/// struct MyFrameworkRequest {
///     path: String,
///     query: QueryParams,
/// }
///
/// impl RequestParams for MyFrameworkRequest {
///     fn params(&self) -> &dyn ParamSource {
///         &self.query
///     }
/// }
///
/// let req = MyFrameworkRequest {
///     path: "/api/divide".to_string(),
///     query: [("a", "1")].into_iter().collect(),
/// };
/// assert_eq!(req.params().get("a"), Some("1"));
/// ```
pub trait RequestParams {
    /// Returns the request's parameters.
    fn params(&self) -> &dyn ParamSource;
}

impl RequestParams for QueryParams {
    fn params(&self) -> &dyn ParamSource {
        self
    }
}

impl<S: BuildHasher> RequestParams for HashMap<String, String, S> {
    fn params(&self) -> &dyn ParamSource {
        self
    }
}

impl RequestParams for BTreeMap<String, String> {
    fn params(&self) -> &dyn ParamSource {
        self
    }
}

impl<S: BuildHasher> RequestParams for IndexMap<String, String, S> {
    fn params(&self) -> &dyn ParamSource {
        self
    }
}

impl<T: RequestParams + ?Sized> RequestParams for &T {
    fn params(&self) -> &dyn ParamSource {
        (**self).params()
    }
}

impl<T: RequestParams + ?Sized> RequestParams for Arc<T> {
    fn params(&self) -> &dyn ParamSource {
        (**self).params()
    }
}
