//! The seam between the Acknowledger and a host HTTP framework.
//!
//! # Responsibilities
//! - Read a named request header and the request target
//! - Read the raw request body once
//! - Write response headers and a JSON body with a status code
//! - Abort further request processing with a JSON body
//!
//! # Design Decisions
//! - Generic, not object-safe: hosts are known at compile time
//! - Body reads are async; everything else is a plain in-memory update
//! - Write failures stay inside the adapter (logged there), never surfaced

use std::future::Future;

use axum::body::Bytes;
use serde::Serialize;
use thiserror::Error;

/// Failure to obtain the raw request body.
#[derive(Debug, Error)]
pub enum BodyError {
    /// The body was already taken by an earlier read.
    #[error("request body already consumed")]
    Consumed,

    /// The transport failed or the body exceeded the configured limit.
    #[error("failed to read request body: {0}")]
    Read(String),
}

/// Capabilities a host framework must provide for one in-flight request.
pub trait RequestContext {
    /// Value of a request header, if present and valid text.
    fn header(&self, name: &str) -> Option<&str>;

    /// The request target (path plus query).
    fn location(&self) -> String;

    /// Read the whole request body.
    fn read_body(&mut self) -> impl Future<Output = Result<Bytes, BodyError>> + Send;

    /// Set a response header, replacing any previous value.
    fn set_header(&mut self, name: &'static str, value: &str);

    /// Write `body` as the JSON response with `status`.
    fn write_json<T: Serialize>(&mut self, status: u16, body: &T);

    /// Write `body` as the JSON response with `status` and stop the request
    /// from being processed any further.
    fn abort_with_json<T: Serialize>(&mut self, status: u16, body: &T);
}
