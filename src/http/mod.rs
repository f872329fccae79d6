//! HTTP binding for acknowledgments.
//!
//! # Data Flow
//! ```text
//! axum request
//!     → adapter.rs (AxumContext: headers, target, body)
//!     → acknowledger.rs (begin → send | abort_with_error)
//!         → headers.rs (X-Ack-* diagnostics)
//!         → observability::metrics (counters, duration)
//!     → AxumContext::into_response
//!     → Send to client
//! ```

pub mod acknowledger;
pub mod adapter;
pub mod context;
pub mod headers;
pub mod server;

pub use acknowledger::{AckError, AckService, Acknowledger};
pub use adapter::{Aborted, AxumContext};
pub use context::{BodyError, RequestContext};
pub use server::HttpServer;
