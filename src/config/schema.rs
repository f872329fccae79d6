//! Configuration schema definitions.
//!
//! This module defines the configuration structure for an ack-speaking
//! service. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Environment variable naming the emitting agent.
pub const AGENT_ENV: &str = "AGENT";

/// Environment variable naming the deployment environment.
pub const SERVICE_ENV_ENV: &str = "SERVICE_ENV";

/// Environment variable naming the service namespace.
pub const SERVICE_NS_ENV: &str = "SERVICE_NS";

/// Root configuration for the ack server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AckServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Identity stamped on every envelope.
    pub identity: ServiceIdentity,

    /// Request limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Identity of the emitting process.
///
/// Loaded once at startup; every envelope copies it verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceIdentity {
    /// Agent name (`AGENT`).
    pub agent: String,

    /// Deployment environment (`SERVICE_ENV`).
    pub service_env: String,

    /// Service namespace (`SERVICE_NS`).
    pub service_ns: String,
}

impl ServiceIdentity {
    /// Read identity from the process environment. Unset variables are empty.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build identity from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            agent: lookup(AGENT_ENV).unwrap_or_default(),
            service_env: lookup(SERVICE_ENV_ENV).unwrap_or_default(),
            service_ns: lookup(SERVICE_NS_ENV).unwrap_or_default(),
        }
    }

    /// Overlay non-empty fields of `other` onto this identity.
    pub fn overlay(&mut self, other: ServiceIdentity) {
        if !other.agent.is_empty() {
            self.agent = other.agent;
        }
        if !other.service_env.is_empty() {
            self.service_env = other.service_env;
        }
        if !other.service_ns.is_empty() {
            self.service_ns = other.service_ns;
        }
    }
}

/// Request limits enforced by the HTTP adapter.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024, // 2MB
            request_timeout_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Serve `/metrics` from the ack server.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
        }
    }
}
