//! tokio-util codec for framed envelopes.

use bytes::{Buf, BufMut, BytesMut};
use serde_json::Value;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::CodecError;
use crate::message::Message;

/// Largest envelope accepted unless configured otherwise. Sprite sheets travel
/// base64 encoded inside a single envelope.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

const HEADER_END: &[u8] = b"\r\n\r\n";
const LENGTH_FIELD: &str = "Content-Length:";

/// Frames [`Message`]s as `Content-Length` headed JSON bodies.
#[derive(Debug, Clone, Copy)]
pub struct MessageCodec {
    max_message_size: usize,
}

impl MessageCodec {
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_MAX_MESSAGE_SIZE)
    }

    /// Bodies longer than `max_message_size` bytes are rejected with
    /// [`CodecError::MessageTooLarge`] before they are buffered.
    pub fn with_max_size(max_message_size: usize) -> Self {
        Self { max_message_size }
    }
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for MessageCodec {
    type Item = Message;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>, CodecError> {
        let Some(header_len) = src
            .windows(HEADER_END.len())
            .position(|window| window == HEADER_END)
        else {
            return Ok(None);
        };

        let body_len = body_length(&src[..header_len])?;
        if body_len > self.max_message_size {
            return Err(CodecError::MessageTooLarge {
                size: body_len,
                max: self.max_message_size,
            });
        }

        let frame_len = header_len + HEADER_END.len() + body_len;
        if src.len() < frame_len {
            src.reserve(frame_len - src.len());
            return Ok(None);
        }

        src.advance(header_len + HEADER_END.len());
        let body = src.split_to(body_len);
        parse_envelope(&body).map(Some)
    }
}

impl Encoder<Message> for MessageCodec {
    type Error = CodecError;

    fn encode(&mut self, message: Message, dst: &mut BytesMut) -> Result<(), CodecError> {
        let body = serde_json::to_vec(&message).map_err(CodecError::JsonSerialize)?;
        let header = format!("{LENGTH_FIELD} {}\r\n\r\n", body.len());

        dst.reserve(header.len() + body.len());
        dst.put_slice(header.as_bytes());
        dst.put_slice(&body);
        Ok(())
    }
}

fn body_length(header: &[u8]) -> Result<usize, CodecError> {
    let header = std::str::from_utf8(header).map_err(|_| CodecError::InvalidUtf8)?;
    let value = header
        .lines()
        .find_map(|line| line.strip_prefix(LENGTH_FIELD))
        .ok_or(CodecError::MissingContentLength)?;
    value
        .trim()
        .parse()
        .map_err(|_| CodecError::MalformedContentLength)
}

fn parse_envelope(body: &[u8]) -> Result<Message, CodecError> {
    let value: Value = serde_json::from_slice(body).map_err(CodecError::JsonDeserialize)?;
    match value.get("type").and_then(Value::as_str) {
        Some("request" | "reply") => {
            serde_json::from_value(value).map_err(CodecError::JsonDeserialize)
        }
        other => Err(CodecError::UnknownEnvelope {
            kind: other.unwrap_or_default().to_string(),
        }),
    }
}
