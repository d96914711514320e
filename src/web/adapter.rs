//! Owned request representation for framework integrations.

use crate::source::{ParamSource, QueryParams};

use super::RequestParams;

/// A request reduced to what parameter validation needs.
///
/// Framework-specific code builds one of these from its own request type
/// (or implements [`RequestParams`] directly). The body is never validated;
/// it is only attached to failure reports.
///
/// # Examples
///
/// ```
/// use param_gate::ParamSource;
/// use param_gate::web::{ParamRequest, RequestParams};
///
/// let mut request = ParamRequest::new("req-12345");
/// request.add_query_param("search", "user input");
/// request.set_body("{}");
///
/// assert_eq!(request.request_id(), "req-12345");
/// assert_eq!(request.params().get("search"), Some("user input"));
/// assert_eq!(request.params().body(), Some("{}"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamRequest {
    request_id: String,
    query: QueryParams,
    body: Option<String>,
}

impl ParamRequest {
    /// Creates a request with no parameters and no body.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            query: QueryParams::new(),
            body: None,
        }
    }

    /// Creates a request from query pairs.
    pub fn with_query<I, K, V>(request_id: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            request_id: request_id.into(),
            query: pairs.into_iter().collect(),
            body: None,
        }
    }

    /// Appends a query parameter. Repeated keys keep every value.
    pub fn add_query_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.query.insert(key, value);
    }

    /// Sets the request body.
    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = Some(body.into());
    }

    /// Returns the request identifier.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns the query parameters.
    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    /// Returns the body, if any.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

impl ParamSource for ParamRequest {
    fn get(&self, name: &str) -> Option<&str> {
        self.query.get(name)
    }

    fn names(&self) -> Vec<&str> {
        self.query.names()
    }

    fn get_all(&self, name: &str) -> Vec<&str> {
        ParamSource::get_all(&self.query, name)
    }

    fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

impl RequestParams for ParamRequest {
    fn params(&self) -> &dyn ParamSource {
        self
    }
}
