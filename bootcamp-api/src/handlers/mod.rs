//! HTTP handlers
//!
//! Handlers are thin: parse the request, make the repository call, wrap the
//! result in the `{success, ...}` envelope. Failures are returned as
//! [`crate::error::Error`] and rendered in one place.

pub mod bootcamps;
pub mod courses;
pub mod general;
mod response;

pub use response::{ItemResponse, JsonBody, ListResponse};
