//! Metrics collection for acknowledgments.
//!
//! # Metrics
//! - `ack_version` (gauge): envelope schema version
//! - `ack_code_count{code}` (counter): acks sent per status code
//! - `ack_error_count{error_type}` (counter): error acks per error kind
//! - `ack_unmarshal_error_count` (counter): request bodies that failed to decode
//! - `ack_postbody_error_count` (counter): request bodies that failed to read
//! - `ack_payload_type_count{payload_type}` (counter): acks per payload kind
//! - `ack_duration{payload_type}` (summary): seconds from ack creation to send
//!
//! # Design Decisions
//! - Registry is injected, never a hidden global, so tests get isolated registries
//! - Emission is an in-memory update; a broken exporter cannot fail a request
//! - Labels are bounded: status code, error kind, payload kind. Never ids.

use std::fmt;
use std::sync::Arc;

use metrics::{Key, KeyName, Label, Level, Metadata, NoopRecorder, Recorder, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::envelope::VERSION;

pub const ACK_VERSION: &str = "ack_version";
pub const ACK_CODE_COUNT: &str = "ack_code_count";
pub const ACK_ERROR_COUNT: &str = "ack_error_count";
pub const ACK_UNMARSHAL_ERROR_COUNT: &str = "ack_unmarshal_error_count";
pub const ACK_POSTBODY_ERROR_COUNT: &str = "ack_postbody_error_count";
pub const ACK_PAYLOAD_TYPE_COUNT: &str = "ack_payload_type_count";
pub const ACK_DURATION: &str = "ack_duration";

static METADATA: Metadata<'static> = Metadata::new(module_path!(), Level::INFO, Some(module_path!()));

/// Process-wide ack metrics, backed by an injected recorder.
///
/// Cloning is cheap and every clone feeds the same registry.
#[derive(Clone)]
pub struct AckMetrics {
    recorder: Arc<dyn Recorder + Send + Sync>,
}

impl AckMetrics {
    /// Wrap a recorder, describe every ack metric and publish the version gauge.
    pub fn new(recorder: Arc<dyn Recorder + Send + Sync>) -> Self {
        let metrics = Self { recorder };
        metrics.describe();
        metrics
            .recorder
            .register_gauge(&Key::from_name(ACK_VERSION), &METADATA)
            .set(f64::from(VERSION));
        metrics
    }

    /// Metrics backed by a fresh Prometheus registry.
    ///
    /// The handle renders the text exposition for a `/metrics` endpoint.
    pub fn prometheus() -> (Self, PrometheusHandle) {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        (Self::new(Arc::new(recorder)), handle)
    }

    /// Metrics that go nowhere.
    pub fn noop() -> Self {
        Self::new(Arc::new(NoopRecorder))
    }

    pub fn increment_status_code(&self, code: u16) {
        self.counter(ACK_CODE_COUNT, vec![Label::new("code", code.to_string())]);
    }

    pub fn increment_error_kind(&self, kind: &str) {
        self.counter(ACK_ERROR_COUNT, vec![Label::new("error_type", kind.to_string())]);
    }

    pub fn increment_payload_kind(&self, kind: &str) {
        self.counter(ACK_PAYLOAD_TYPE_COUNT, vec![Label::new("payload_type", kind.to_string())]);
    }

    pub fn increment_unmarshal_error(&self) {
        self.counter(ACK_UNMARSHAL_ERROR_COUNT, Vec::new());
    }

    pub fn increment_post_body_error(&self) {
        self.counter(ACK_POSTBODY_ERROR_COUNT, Vec::new());
    }

    /// Record seconds between ack creation and send for a payload kind.
    pub fn observe_duration(&self, kind: &str, elapsed_secs: f64) {
        let key = Key::from_parts(ACK_DURATION, vec![Label::new("payload_type", kind.to_string())]);
        self.recorder.register_histogram(&key, &METADATA).record(elapsed_secs);
    }

    fn counter(&self, name: &'static str, labels: Vec<Label>) {
        let key = Key::from_parts(name, labels);
        self.recorder.register_counter(&key, &METADATA).increment(1);
    }

    fn describe(&self) {
        let r = &self.recorder;
        r.describe_gauge(KeyName::from(ACK_VERSION), None, "Ack Version".into());
        r.describe_counter(
            KeyName::from(ACK_CODE_COUNT),
            None,
            "Total Acks for a code.".into(),
        );
        r.describe_counter(
            KeyName::from(ACK_ERROR_COUNT),
            None,
            "Total Error Acks for an error type.".into(),
        );
        r.describe_counter(
            KeyName::from(ACK_UNMARSHAL_ERROR_COUNT),
            None,
            "Total Unmarshal Error Acks.".into(),
        );
        r.describe_counter(
            KeyName::from(ACK_POSTBODY_ERROR_COUNT),
            None,
            "The number of errors from attempting to retrieve a POST body.".into(),
        );
        r.describe_counter(
            KeyName::from(ACK_PAYLOAD_TYPE_COUNT),
            None,
            "Total Acks for a payload type.".into(),
        );
        r.describe_histogram(
            KeyName::from(ACK_DURATION),
            Some(Unit::Seconds),
            "The time it took between creating the Ack and sending it by type.".into(),
        );
    }
}

impl fmt::Debug for AckMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AckMetrics").finish_non_exhaustive()
    }
}
