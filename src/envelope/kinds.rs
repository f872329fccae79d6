//! Well-known payload and error kinds.
//!
//! Both sets double as metric label values, so they must stay small.
//! Applications may add their own kinds alongside these.

/// Payload kind for plain text messages.
pub const MESSAGE: &str = "Message";

/// Payload kind stamped on every error envelope.
pub const ERROR_MESSAGE: &str = "ErrorMessage";

/// The request body could not be read from the transport.
pub const POST_DATA_ERROR: &str = "PostDataError";

/// The request body was read but did not deserialize.
pub const UNMARSHAL_ERROR: &str = "UnmarshalError";

/// The outgoing payload could not be encoded as JSON.
pub const PAYLOAD_ERROR: &str = "PayloadError";
