//! Acknowledgment envelope subsystem.
//!
//! # Data Flow
//! ```text
//! request entry
//!     → Ack::new (identity, correlation id, location, timer start)
//!     → handler mutates status / payload
//!     → Ack::set_payload or Ack::record_error (elapsed stamped)
//!     → serialized as the response body
//! ```
//!
//! # Design Decisions
//! - Transport-agnostic: nothing here knows about HTTP
//! - Payload is a `serde_json::Value` so any JSON-encodable value fits
//! - Wire field names are fixed for consumers of older versions

pub mod ack;
pub mod kinds;

pub use self::ack::{Ack, VERSION};
