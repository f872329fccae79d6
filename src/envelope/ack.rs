//! The acknowledgment envelope.

use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::config::ServiceIdentity;
use crate::envelope::kinds;

/// Envelope shape version reported as `ack_version`.
pub const VERSION: u32 = 8;

/// A versioned acknowledgment returned as the body of every response.
///
/// Identity fields are fixed at construction. `elapsed` stays empty until
/// the payload is set or an error is stamped; setting the payload again
/// recomputes it from the same start instant, so the value only grows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ack {
    #[serde(rename = "ack_version")]
    version: u32,

    agent: String,

    #[serde(rename = "srv_env")]
    service_env: String,

    #[serde(rename = "srv_ns")]
    service_ns: String,

    #[serde(rename = "ack_uuid")]
    instance_id: String,

    #[serde(rename = "req_uuid")]
    correlation_id: String,

    #[serde(rename = "date_time")]
    created_at: String,

    success: bool,

    #[serde(rename = "error_code")]
    error_kind: String,

    error_message: String,

    #[serde(rename = "server_code")]
    status_code: u16,

    location: String,

    #[serde(rename = "payload_type")]
    payload_kind: String,

    #[serde(default)]
    payload: Value,

    #[serde(rename = "duration")]
    elapsed_text: String,

    #[serde(skip, default = "Instant::now")]
    started_at: Instant,

    #[serde(skip)]
    elapsed: Option<Duration>,
}

impl Ack {
    /// Create a successful envelope and start its timer.
    pub fn new(
        identity: &ServiceIdentity,
        correlation_id: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            version: VERSION,
            agent: identity.agent.clone(),
            service_env: identity.service_env.clone(),
            service_ns: identity.service_ns.clone(),
            instance_id: Uuid::new_v4().to_string(),
            correlation_id: correlation_id.into(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            success: true,
            error_kind: String::new(),
            error_message: String::new(),
            status_code: 200,
            location: location.into(),
            payload_kind: String::new(),
            payload: Value::Null,
            elapsed_text: String::new(),
            started_at: Instant::now(),
            elapsed: None,
        }
    }

    /// Mark the envelope failed.
    ///
    /// Last write wins: a second call replaces the previous error entirely.
    pub fn record_error(
        &mut self,
        status_code: u16,
        error_kind: impl Into<String>,
        error_message: impl Into<String>,
    ) {
        self.status_code = status_code;
        self.success = false;
        self.payload_kind = kinds::ERROR_MESSAGE.to_string();
        self.error_kind = error_kind.into();
        self.error_message = error_message.into();
    }

    /// Assign the payload and stamp the elapsed time.
    pub fn set_payload(&mut self, payload_kind: impl Into<String>, payload: Value) {
        self.set_payload_at(payload_kind, payload, Instant::now());
    }

    /// Same as [`Ack::set_payload`], measuring elapsed time up to `now`.
    pub fn set_payload_at(&mut self, payload_kind: impl Into<String>, payload: Value, now: Instant) {
        self.payload_kind = payload_kind.into();
        self.payload = payload;
        self.stamp_elapsed(now);
    }

    /// Change the payload kind without touching payload or timing.
    pub fn set_payload_kind(&mut self, payload_kind: impl Into<String>) {
        self.payload_kind = payload_kind.into();
    }

    /// Record time since creation. Monotonic clock, saturating at zero.
    pub fn stamp_elapsed(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.started_at);
        self.elapsed = Some(elapsed);
        self.elapsed_text = format!("{elapsed:?}");
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn agent(&self) -> &str {
        &self.agent
    }

    pub fn service_env(&self) -> &str {
        &self.service_env
    }

    pub fn service_ns(&self) -> &str {
        &self.service_ns
    }

    /// Unique per envelope, generated once at construction.
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Copied from the inbound request; empty when none was supplied.
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// RFC3339 creation timestamp.
    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn error_kind(&self) -> &str {
        &self.error_kind
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn payload_kind(&self) -> &str {
        &self.payload_kind
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Elapsed time as last stamped, `None` before finalize.
    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed
    }

    /// Elapsed time as it appears on the wire (`duration`).
    pub fn elapsed_text(&self) -> &str {
        &self.elapsed_text
    }

    /// Monotonic instant captured at construction.
    pub fn started_at(&self) -> Instant {
        self.started_at
    }
}
