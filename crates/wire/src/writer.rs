//! Outgoing message sink.

use futures::SinkExt;
use tokio::io::AsyncWrite;
use tokio_util::codec::FramedWrite;

use crate::codec::MessageCodec;
use crate::error::CodecError;
use crate::message::Message;

/// Encodes envelopes onto the backend's input.
pub struct MessageWriter<W> {
    frames: FramedWrite<W, MessageCodec>,
}

impl<W> MessageWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(writer: W, codec: MessageCodec) -> Self {
        Self {
            frames: FramedWrite::new(writer, codec),
        }
    }

    /// Encode `message` and flush it through to the underlying writer.
    pub async fn send(&mut self, message: Message) -> Result<(), CodecError> {
        self.frames.send(message).await
    }
}
