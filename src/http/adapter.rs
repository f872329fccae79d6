//! Axum host for the Acknowledger.
//!
//! # Responsibilities
//! - Surface request headers, target and body to the Acknowledger
//! - Collect the response the Acknowledger writes
//! - Turn the collected response into an axum `Response`
//!
//! # Design Decisions
//! - The body is read at most once and capped at a configured size
//! - Header values that are not valid HTTP text are skipped, not fatal
//! - Aborted responses carry an [`Aborted`] extension for outer layers

use axum::body::{Body, Bytes};
use axum::extract::Request;
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::http::context::{BodyError, RequestContext};

/// Marker extension on responses produced by an abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aborted;

/// One axum request and the response being built for it.
pub struct AxumContext {
    parts: Parts,
    body: Option<Body>,
    body_limit: usize,
    status: StatusCode,
    headers: HeaderMap,
    payload: Option<Bytes>,
    aborted: bool,
}

impl AxumContext {
    /// Wrap a request, allowing at most `body_limit` bytes of body.
    pub fn new(request: Request, body_limit: usize) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            parts,
            body: Some(body),
            body_limit,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            payload: None,
            aborted: false,
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    fn store_json<T: Serialize>(&mut self, status: u16, body: &T) {
        self.status = StatusCode::from_u16(status).unwrap_or_else(|_| {
            tracing::warn!(status, "Invalid status code, responding 500");
            StatusCode::INTERNAL_SERVER_ERROR
        });

        match serde_json::to_vec(body) {
            Ok(bytes) => {
                self.headers
                    .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                self.payload = Some(Bytes::from(bytes));
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode response body");
                self.status = StatusCode::INTERNAL_SERVER_ERROR;
                self.payload = None;
            }
        }
    }
}

impl RequestContext for AxumContext {
    fn header(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name).and_then(|v| v.to_str().ok())
    }

    fn location(&self) -> String {
        self.parts.uri.to_string()
    }

    async fn read_body(&mut self) -> Result<Bytes, BodyError> {
        let body = self.body.take().ok_or(BodyError::Consumed)?;
        axum::body::to_bytes(body, self.body_limit)
            .await
            .map_err(|e| BodyError::Read(e.to_string()))
    }

    fn set_header(&mut self, name: &'static str, value: &str) {
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => tracing::warn!(header = name, "Skipping header with invalid name or value"),
        }
    }

    fn write_json<T: Serialize>(&mut self, status: u16, body: &T) {
        self.store_json(status, body);
    }

    fn abort_with_json<T: Serialize>(&mut self, status: u16, body: &T) {
        self.store_json(status, body);
        self.aborted = true;
    }
}

impl IntoResponse for AxumContext {
    fn into_response(self) -> Response {
        let body = self.payload.map(Body::from).unwrap_or_else(Body::empty);
        let mut response = (self.status, self.headers, body).into_response();
        if self.aborted {
            response.extensions_mut().insert(Aborted);
        }
        response
    }
}
