//! Diagnostic `X-Ack-*` response headers.

use crate::envelope::Ack;

pub const X_ACK_VERSION: &str = "X-Ack-Version";
pub const X_ACK_AGENT: &str = "X-Ack-Agent";
pub const X_ACK_SRV_ENV: &str = "X-Ack-Srv-Env";
pub const X_ACK_SRV_NS: &str = "X-Ack-Srv-NS";
pub const X_ACK_UUID: &str = "X-Ack-Uuid";
pub const X_ACK_REQ_UUID: &str = "X-Ack-Req-Uuid";
pub const X_ACK_PAYLOAD_TYPE: &str = "X-Ack-Payload-Type";
pub const X_ACK_DURATION: &str = "X-Ack-Duration";

/// Inbound header carrying the caller's correlation id.
pub const REQUEST_UUID: &str = "uuid";

/// Header pairs mirroring the envelope, in a fixed order.
pub fn ack_headers(ack: &Ack) -> [(&'static str, String); 8] {
    [
        (X_ACK_VERSION, ack.version().to_string()),
        (X_ACK_AGENT, ack.agent().to_string()),
        (X_ACK_SRV_ENV, ack.service_env().to_string()),
        (X_ACK_SRV_NS, ack.service_ns().to_string()),
        (X_ACK_UUID, ack.instance_id().to_string()),
        (X_ACK_REQ_UUID, ack.correlation_id().to_string()),
        (X_ACK_PAYLOAD_TYPE, ack.payload_kind().to_string()),
        (X_ACK_DURATION, ack.elapsed_text().to_string()),
    ]
}
