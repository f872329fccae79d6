//! Standardized acknowledgment envelopes for HTTP services.
//!
//! Every endpoint answers with the same versioned [`Ack`] body, carrying
//! status, correlation ids, timing and an arbitrary JSON payload, while the
//! [`Acknowledger`] emits counters, a duration summary and `X-Ack-*` headers.

pub mod config;
pub mod envelope;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::{AckServerConfig, ServiceIdentity};
pub use envelope::{Ack, VERSION};
pub use http::{AckService, Acknowledger, AxumContext, HttpServer, RequestContext};
pub use lifecycle::Shutdown;
pub use observability::AckMetrics;
