//! Structured error handling for the route lookup engine.
//!
//! Every asynchronous operation in the core reports through the uniform
//! [`TaskOutcome`](crate::scheduler::TaskOutcome) pair; the error enum here
//! covers the synchronous seams (configuration, validation, orchestration)
//! where a typed `Result` is the natural shape.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteScoutError {
    /// Connection failures and non-2xx responses from the remote API.
    #[error("transport error: {0}")]
    Transport(String),

    /// Response bodies that cannot be parsed into the expected shape.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Missing, empty, or unopenable cache artifacts.
    #[error("cache error: {0}")]
    Cache(String),

    /// Missing config fields, invalid dates, unresolved city names.
    #[error("validation error: {0}")]
    Validation(String),

    /// Duplicate in-flight task ids and post-shutdown submissions.
    #[error("scheduling error: {0}")]
    Scheduling(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, RouteScoutError>;
