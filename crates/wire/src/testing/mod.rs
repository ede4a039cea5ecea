//! Testing utilities for the transport layer.

mod memory;

pub use memory::MemoryTransport;

use serde::Serialize;

/// Frame a JSON-serializable value the way [`crate::MessageCodec`] does.
///
/// ```
/// use wire::testing::frame_message;
/// use serde_json::json;
///
/// let bytes = frame_message(&json!({"type": "reply", "id": 1, "name": "init"}));
/// assert!(bytes.starts_with(b"Content-Length: "));
/// ```
pub fn frame_message(msg: &impl Serialize) -> Vec<u8> {
    let json = serde_json::to_string(msg).expect("failed to serialize message");
    format!("Content-Length: {}\r\n\r\n{}", json.len(), json).into_bytes()
}
