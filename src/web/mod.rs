//! Web framework integration surface.
//!
//! This module is the seam between HTTP frameworks and the validation core.
//! It contains no framework-specific code; it defines what a framework
//! integration must provide and what it gets back:
//! - [`RequestParams`]: expose a request's parameters as a
//!   [`ParamSource`](crate::ParamSource)
//! - [`ParamRequest`]: an owned, framework-neutral request
//! - [`ErrorResponse`]: the status code and JSON body for a boundary
//!   [`Error`](crate::Error)
//!
//! # Integration Model
//!
//! ```text
//! HTTP request
//!   ↓
//! framework code implements RequestParams (or builds a ParamRequest)
//!   ↓
//! Binding::wrap / validate(..).run(..)
//!   ↓
//! Ok(response)  |  Err(Error) → ErrorResponse (400 or 500)
//! ```

mod adapter;
pub mod example_handler;
mod extract;
mod middleware;

pub use adapter::ParamRequest;
pub use extract::RequestParams;
pub use middleware::{respond, ErrorResponse};
