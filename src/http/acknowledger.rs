//! Request-bound acknowledgment.
//!
//! # Lifecycle
//! ```text
//! begin(ctx)            correlation id + location read, timer started
//!     → ack_mut()       handler adjusts status / payload kind
//!     → send(..)        success path: headers, metrics, JSON body
//!     | abort_with_error(..)
//!                       error path: headers, metrics, aborted JSON body
//! ```
//!
//! `send` and `abort_with_error` take the Acknowledger by value, so a
//! finalized ack cannot be touched again. `decode_body_or_abort` hands the
//! Acknowledger back only when the body decoded; on failure the response
//! has already been written and the handler must stop.
//!
//! A request dropped before finalize produces no response and no metrics.

use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::ServiceIdentity;
use crate::envelope::{kinds, Ack};
use crate::http::context::{BodyError, RequestContext};
use crate::http::headers::{ack_headers, REQUEST_UUID};
use crate::observability::AckMetrics;

const POST_DATA_MESSAGE: &str = "There was a problem with the posted data";
const UNMARSHAL_MESSAGE: &str = "There was a problem unmarshaling data";

/// Why `decode_body_or_abort` refused the request.
///
/// By the time this is returned the error envelope has been written.
#[derive(Debug, Error)]
pub enum AckError {
    #[error("request body could not be read")]
    PostData(#[source] BodyError),

    #[error("request body could not be decoded")]
    Unmarshal(#[source] serde_json::Error),
}

/// Shared, read-only state for creating acknowledgers.
#[derive(Debug, Clone)]
pub struct AckService {
    identity: ServiceIdentity,
    metrics: AckMetrics,
}

impl AckService {
    pub fn new(identity: ServiceIdentity, metrics: AckMetrics) -> Self {
        Self { identity, metrics }
    }

    pub fn identity(&self) -> &ServiceIdentity {
        &self.identity
    }

    pub fn metrics(&self) -> &AckMetrics {
        &self.metrics
    }

    /// Start acknowledging the request behind `ctx`.
    pub fn begin<'a, C: RequestContext>(&'a self, ctx: &'a mut C) -> Acknowledger<'a, C> {
        Acknowledger::begin(ctx, &self.identity, &self.metrics)
    }
}

/// One envelope bound to one in-flight request.
pub struct Acknowledger<'a, C: RequestContext> {
    ack: Ack,
    ctx: &'a mut C,
    metrics: &'a AckMetrics,
}

impl<'a, C: RequestContext> Acknowledger<'a, C> {
    /// Create the envelope for the request behind `ctx`.
    pub fn begin(ctx: &'a mut C, identity: &ServiceIdentity, metrics: &'a AckMetrics) -> Self {
        let correlation_id = ctx.header(REQUEST_UUID).unwrap_or_default().to_string();
        let location = ctx.location();
        let ack = Ack::new(identity, correlation_id, location);

        tracing::debug!(
            ack_uuid = %ack.instance_id(),
            req_uuid = %ack.correlation_id(),
            location = %ack.location(),
            "Ack started"
        );

        Self { ack, ctx, metrics }
    }

    pub fn ack(&self) -> &Ack {
        &self.ack
    }

    pub fn ack_mut(&mut self) -> &mut Ack {
        &mut self.ack
    }

    pub fn set_payload_kind(&mut self, payload_kind: impl Into<String>) {
        self.ack.set_payload_kind(payload_kind);
    }

    /// Record an error without finishing the request.
    ///
    /// A later [`Acknowledger::send`] delivers it as a regular response.
    pub fn record_error(
        &mut self,
        status_code: u16,
        error_kind: impl Into<String>,
        error_message: impl Into<String>,
    ) {
        self.ack.record_error(status_code, error_kind, error_message);
        self.metrics.increment_error_kind(self.ack.error_kind());
    }

    /// Finish the request with `payload` as the envelope body.
    ///
    /// A payload that cannot be encoded as JSON turns into a `PayloadError` abort.
    pub fn send<P: Serialize>(mut self, payload_kind: impl Into<String>, payload: P) {
        let payload_kind = payload_kind.into();
        let payload = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(err) => {
                tracing::error!(
                    ack_uuid = %self.ack.instance_id(),
                    payload_type = %payload_kind,
                    error = %err,
                    "Payload is not JSON-encodable"
                );
                return self.abort_with_error(500, kinds::PAYLOAD_ERROR, err.to_string());
            }
        };

        self.ack.set_payload(payload_kind, payload);
        let elapsed = self.ack.elapsed().unwrap_or_default();

        self.apply_headers();
        self.metrics.increment_status_code(self.ack.status_code());
        self.metrics
            .observe_duration(self.ack.payload_kind(), elapsed.as_secs_f64());
        self.metrics.increment_payload_kind(self.ack.payload_kind());

        tracing::debug!(
            ack_uuid = %self.ack.instance_id(),
            req_uuid = %self.ack.correlation_id(),
            status = self.ack.status_code(),
            payload_type = %self.ack.payload_kind(),
            duration = %self.ack.elapsed_text(),
            "Ack sent"
        );

        self.ctx.write_json(self.ack.status_code(), &self.ack);
    }

    /// Finish the request with an error envelope and stop further processing.
    pub fn abort_with_error(
        mut self,
        status_code: u16,
        error_kind: impl Into<String>,
        error_message: impl Into<String>,
    ) {
        self.ack.record_error(status_code, error_kind, error_message);
        self.ack.stamp_elapsed(Instant::now());

        self.apply_headers();
        self.metrics.increment_status_code(self.ack.status_code());
        self.metrics.increment_error_kind(self.ack.error_kind());
        self.metrics.increment_payload_kind(self.ack.payload_kind());

        tracing::warn!(
            ack_uuid = %self.ack.instance_id(),
            req_uuid = %self.ack.correlation_id(),
            status = self.ack.status_code(),
            error_code = %self.ack.error_kind(),
            error_message = %self.ack.error_message(),
            "Ack aborted"
        );

        self.ctx.abort_with_json(self.ack.status_code(), &self.ack);
    }

    /// Read the request body and decode it, aborting the request on failure.
    pub async fn decode_body_or_abort<T: DeserializeOwned>(mut self) -> Result<(T, Self), AckError> {
        match self.ctx.read_body().await {
            Ok(body) => self.decode_or_abort(&body),
            Err(err) => {
                self.ack
                    .set_payload(kinds::ERROR_MESSAGE, Value::from(POST_DATA_MESSAGE));
                self.metrics.increment_post_body_error();
                self.abort_with_error(500, kinds::POST_DATA_ERROR, err.to_string());
                Err(AckError::PostData(err))
            }
        }
    }

    /// Decode `data`, aborting the request on failure.
    pub fn decode_or_abort<T: DeserializeOwned>(mut self, data: &[u8]) -> Result<(T, Self), AckError> {
        match serde_json::from_slice(data) {
            Ok(value) => Ok((value, self)),
            Err(err) => {
                self.ack
                    .set_payload(kinds::ERROR_MESSAGE, Value::from(UNMARSHAL_MESSAGE));
                self.metrics.increment_unmarshal_error();
                self.abort_with_error(500, kinds::UNMARSHAL_ERROR, err.to_string());
                Err(AckError::Unmarshal(err))
            }
        }
    }

    fn apply_headers(&mut self) {
        for (name, value) in ack_headers(&self.ack) {
            self.ctx.set_header(name, &value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::headers::{X_ACK_DURATION, X_ACK_PAYLOAD_TYPE, X_ACK_REQ_UUID, X_ACK_UUID};
    use axum::body::Bytes;
    use metrics_exporter_prometheus::PrometheusHandle;
    use serde::Deserialize;
    use std::collections::HashMap;

    /// In-memory host recording everything the Acknowledger writes.
    #[derive(Default)]
    struct MockContext {
        request_headers: HashMap<String, String>,
        target: String,
        body: Option<Result<Vec<u8>, String>>,
        response_headers: HashMap<&'static str, String>,
        status: Option<u16>,
        written: Option<Value>,
        aborted: bool,
        writes: usize,
    }

    impl MockContext {
        fn get(target: &str) -> Self {
            Self {
                target: target.to_string(),
                ..Default::default()
            }
        }

        fn with_header(mut self, name: &str, value: &str) -> Self {
            self.request_headers.insert(name.to_string(), value.to_string());
            self
        }

        fn with_body(mut self, body: &str) -> Self {
            self.body = Some(Ok(body.as_bytes().to_vec()));
            self
        }

        fn with_broken_body(mut self, cause: &str) -> Self {
            self.body = Some(Err(cause.to_string()));
            self
        }

        fn body(&self) -> &Value {
            self.written.as_ref().unwrap()
        }
    }

    impl RequestContext for MockContext {
        fn header(&self, name: &str) -> Option<&str> {
            self.request_headers.get(name).map(String::as_str)
        }

        fn location(&self) -> String {
            self.target.clone()
        }

        async fn read_body(&mut self) -> Result<Bytes, BodyError> {
            match self.body.take() {
                Some(Ok(bytes)) => Ok(Bytes::from(bytes)),
                Some(Err(cause)) => Err(BodyError::Read(cause)),
                None => Err(BodyError::Consumed),
            }
        }

        fn set_header(&mut self, name: &'static str, value: &str) {
            self.response_headers.insert(name, value.to_string());
        }

        fn write_json<T: Serialize>(&mut self, status: u16, body: &T) {
            self.status = Some(status);
            self.written = Some(serde_json::to_value(body).unwrap());
            self.writes += 1;
        }

        fn abort_with_json<T: Serialize>(&mut self, status: u16, body: &T) {
            self.write_json(status, body);
            self.aborted = true;
        }
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Order {
        id: u32,
        item: String,
    }

    fn service() -> (AckService, PrometheusHandle) {
        let (metrics, handle) = AckMetrics::prometheus();
        let identity = ServiceIdentity {
            agent: "orders-api".into(),
            service_env: "test".into(),
            service_ns: "shop".into(),
        };
        (AckService::new(identity, metrics), handle)
    }

    #[test]
    fn test_begin_reads_request_identity() {
        let (service, _) = service();
        let mut ctx = MockContext::get("/orders?page=2").with_header("uuid", "abc-123");

        let ack = service.begin(&mut ctx);

        assert_eq!(ack.ack().correlation_id(), "abc-123");
        assert_eq!(ack.ack().location(), "/orders?page=2");
        assert_eq!(ack.ack().agent(), "orders-api");
        assert!(ack.ack().is_success());
    }

    #[test]
    fn test_begin_without_correlation_header() {
        let (service, _) = service();
        let mut ctx = MockContext::get("/");

        let ack = service.begin(&mut ctx);
        assert_eq!(ack.ack().correlation_id(), "");
    }

    #[test]
    fn test_send_message() {
        let (service, handle) = service();
        let mut ctx = MockContext::get("/test").with_header("uuid", "abc-123");

        service.begin(&mut ctx).send("Message", "hello");

        assert_eq!(ctx.status, Some(200));
        assert!(!ctx.aborted);
        let body = ctx.body();
        assert_eq!(body["success"], true);
        assert_eq!(body["payload_type"], "Message");
        assert_eq!(body["payload"], "hello");
        assert_eq!(body["req_uuid"], "abc-123");
        assert_eq!(ctx.response_headers[X_ACK_PAYLOAD_TYPE], "Message");
        assert_eq!(ctx.response_headers[X_ACK_REQ_UUID], "abc-123");
        assert_eq!(ctx.response_headers[X_ACK_UUID], body["ack_uuid"].as_str().unwrap());
        assert!(!ctx.response_headers[X_ACK_DURATION].is_empty());

        let text = handle.render();
        assert!(text.contains(r#"ack_code_count{code="200"} 1"#), "{text}");
        assert!(text.contains(r#"ack_payload_type_count{payload_type="Message"} 1"#), "{text}");
        assert!(text.contains(r#"ack_duration_count{payload_type="Message"} 1"#), "{text}");
    }

    #[test]
    fn test_send_structured_payload() {
        let (service, _) = service();
        let mut ctx = MockContext::get("/orders/7");
        let order = Order { id: 7, item: "lamp".into() };

        service.begin(&mut ctx).send("Order", &order);

        assert_eq!(ctx.body()["payload"]["id"], 7);
        assert_eq!(ctx.body()["payload"]["item"], "lamp");
    }

    #[test]
    fn test_send_unencodable_payload_aborts() {
        let (service, handle) = service();
        let mut ctx = MockContext::get("/broken");
        let mut payload = HashMap::new();
        payload.insert((1u8, 2u8), "tuple keys are not JSON");

        service.begin(&mut ctx).send("Broken", payload);

        assert!(ctx.aborted);
        assert_eq!(ctx.status, Some(500));
        assert_eq!(ctx.body()["error_code"], kinds::PAYLOAD_ERROR);
        assert_eq!(ctx.writes, 1);
        assert!(handle
            .render()
            .contains(r#"ack_error_count{error_type="PayloadError"} 1"#));
    }

    #[test]
    fn test_abort_with_error() {
        let (service, handle) = service();
        let mut ctx = MockContext::get("/orders/99");

        service
            .begin(&mut ctx)
            .abort_with_error(404, "NotFound", "no order 99");

        assert!(ctx.aborted);
        assert_eq!(ctx.status, Some(404));
        let body = ctx.body();
        assert_eq!(body["success"], false);
        assert_eq!(body["server_code"], 404);
        assert_eq!(body["error_code"], "NotFound");
        assert_eq!(body["error_message"], "no order 99");
        assert_eq!(body["payload_type"], kinds::ERROR_MESSAGE);
        assert!(!body["duration"].as_str().unwrap().is_empty());
        assert_eq!(ctx.response_headers[X_ACK_PAYLOAD_TYPE], kinds::ERROR_MESSAGE);

        let text = handle.render();
        assert!(text.contains(r#"ack_code_count{code="404"} 1"#), "{text}");
        assert!(text.contains(r#"ack_error_count{error_type="NotFound"} 1"#), "{text}");
        assert!(text.contains(r#"ack_payload_type_count{payload_type="ErrorMessage"} 1"#), "{text}");
    }

    #[test]
    fn test_record_error_then_send() {
        let (service, handle) = service();
        let mut ctx = MockContext::get("/orders");

        let mut ack = service.begin(&mut ctx);
        ack.record_error(409, "Conflict", "order already exists");
        ack.send(kinds::ERROR_MESSAGE, "order 7 exists");

        assert!(!ctx.aborted);
        assert_eq!(ctx.status, Some(409));
        assert_eq!(ctx.body()["success"], false);
        assert_eq!(ctx.body()["payload"], "order 7 exists");
        assert!(handle
            .render()
            .contains(r#"ack_error_count{error_type="Conflict"} 1"#));
    }

    #[test]
    fn test_send_owned_payload_kind() {
        let (service, handle) = service();
        let mut ctx = MockContext::get("/orders/7");
        let kind = format!("Order{}", "V2");

        service.begin(&mut ctx).send(kind, Order { id: 7, item: "lamp".into() });

        assert_eq!(ctx.body()["payload_type"], "OrderV2");
        assert_eq!(ctx.response_headers[X_ACK_PAYLOAD_TYPE], "OrderV2");
        assert!(handle
            .render()
            .contains(r#"ack_payload_type_count{payload_type="OrderV2"} 1"#));
    }

    #[test]
    fn test_error_display_leaves_cause_to_source() {
        let err = serde_json::from_slice::<Order>(b"{oops").unwrap_err();
        let cause = err.to_string();
        let err = AckError::Unmarshal(err);

        assert_eq!(err.to_string(), "request body could not be decoded");
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source, Some(cause));

        let err = AckError::PostData(BodyError::Consumed);
        assert!(!err.to_string().contains(&BodyError::Consumed.to_string()));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[tokio::test]
    async fn test_decode_body_success() {
        let (service, _) = service();
        let mut ctx = MockContext::get("/orders").with_body(r#"{"id": 3, "item": "desk"}"#);

        let (order, ack) = service
            .begin(&mut ctx)
            .decode_body_or_abort::<Order>()
            .await
            .unwrap();
        assert_eq!(order, Order { id: 3, item: "desk".into() });
        ack.send("Order", order);

        assert_eq!(ctx.status, Some(200));
        assert_eq!(ctx.writes, 1);
    }

    #[tokio::test]
    async fn test_decode_body_unmarshal_error() {
        let (service, handle) = service();
        let mut ctx = MockContext::get("/orders").with_body("{not json");

        let result = service.begin(&mut ctx).decode_body_or_abort::<Order>().await;

        assert!(matches!(result, Err(AckError::Unmarshal(_))));
        drop(result);
        assert!(ctx.aborted);
        assert_eq!(ctx.writes, 1);
        let body = ctx.body();
        assert_eq!(body["server_code"], 500);
        assert_eq!(body["error_code"], kinds::UNMARSHAL_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["payload"], UNMARSHAL_MESSAGE);

        let text = handle.render();
        assert!(text.contains("ack_unmarshal_error_count 1"), "{text}");
        assert!(text.contains(r#"ack_code_count{code="500"} 1"#), "{text}");
    }

    #[tokio::test]
    async fn test_decode_body_read_error() {
        let (service, handle) = service();
        let mut ctx = MockContext::get("/orders").with_broken_body("connection reset");

        let result = service.begin(&mut ctx).decode_body_or_abort::<Order>().await;

        assert!(matches!(result, Err(AckError::PostData(BodyError::Read(_)))));
        drop(result);
        assert!(ctx.aborted);
        let body = ctx.body();
        assert_eq!(body["error_code"], kinds::POST_DATA_ERROR);
        assert_eq!(body["payload"], POST_DATA_MESSAGE);
        assert!(body["error_message"]
            .as_str()
            .unwrap()
            .contains("connection reset"));

        let text = handle.render();
        assert!(text.contains("ack_postbody_error_count 1"), "{text}");
        assert!(!text.contains("ack_unmarshal_error_count 1"), "{text}");
    }

    #[test]
    fn test_decode_or_abort_from_bytes() {
        let (service, _) = service();
        let mut ctx = MockContext::get("/import");

        let (order, ack) = service
            .begin(&mut ctx)
            .decode_or_abort::<Order>(br#"{"id": 1, "item": "pen"}"#)
            .unwrap();
        drop(ack);

        assert_eq!(order.item, "pen");
        assert!(ctx.written.is_none());
    }

    #[test]
    fn test_dropped_ack_has_no_side_effects() {
        let (service, handle) = service();
        let mut ctx = MockContext::get("/cancelled");

        drop(service.begin(&mut ctx));

        assert!(ctx.written.is_none());
        assert!(ctx.response_headers.is_empty());
        assert!(!handle.render().contains("ack_code_count{"));
    }
}
