//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Acknowledger finalize:
//!     → metrics.rs (counters, version gauge, duration summary)
//!     → tracing events (structured, request-scoped fields)
//!
//! Consumers:
//!     → Metrics endpoint (Prometheus scrape via PrometheusHandle)
//!     → Log aggregation (stdout)
//! ```
//!
//! # Design Decisions
//! - Metrics are cheap (atomic increments)
//! - Correlation and instance ids go to logs, never to metric labels

pub mod logging;
pub mod metrics;

pub use self::metrics::AckMetrics;
