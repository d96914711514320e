//! Mapping boundary errors to HTTP-style responses.
//!
//! Frameworks differ in how they build responses, so this module stops at a
//! framework-neutral [`ErrorResponse`]: a status code plus the JSON body the
//! client should see. Validation failures carry their message; execution
//! failures carry only the generic detail.

use serde::Serialize;

use crate::error::{Error, StatusClass};

/// Client-facing rendering of a boundary [`Error`].
///
/// # Examples
///
/// ```
/// use param_gate::{Factory, ParamGate, QueryParams};
/// use param_gate::web::ErrorResponse;
///
/// let params: QueryParams = [("b", "zero")].into_iter().collect();
/// let err = ParamGate::new()
///     .declare("b", Factory::int())
///     .bind(&params)
///     .run(|_| Ok::<_, std::convert::Infallible>(()))
///     .unwrap_err();
///
/// let response = ErrorResponse::from(&err);
/// assert_eq!(response.status, 400);
/// assert_eq!(
///     response.body["error"],
///     "Invalid type of the `b` parameter: expected int."
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    /// HTTP status code.
    pub status: u16,
    /// JSON body, `{"error": "..."}`.
    pub body: serde_json::Value,
}

impl ErrorResponse {
    /// Returns the status class.
    pub fn class(&self) -> StatusClass {
        if self.status >= 500 {
            StatusClass::InternalServerError
        } else {
            StatusClass::BadRequest
        }
    }
}

impl From<&Error> for ErrorResponse {
    fn from(err: &Error) -> Self {
        Self {
            status: err.status().code(),
            body: err.detail(),
        }
    }
}

impl From<Error> for ErrorResponse {
    fn from(err: Error) -> Self {
        Self::from(&err)
    }
}

/// Converts a handler result so its error side is ready to send.
pub fn respond<R>(result: Result<R, Error>) -> Result<R, ErrorResponse> {
    result.map_err(ErrorResponse::from)
}
