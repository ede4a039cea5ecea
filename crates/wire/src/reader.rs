//! Incoming message stream.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use pin_project_lite::pin_project;
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;

use crate::codec::MessageCodec;
use crate::error::CodecError;
use crate::message::Message;

pin_project! {
    /// Envelopes decoded from the backend's output.
    ///
    /// The stream ends after the first [`CodecError`]; a desynchronised
    /// `Content-Length` stream cannot be resumed.
    pub struct MessageReader<R> {
        #[pin]
        frames: FramedRead<R, MessageCodec>,
    }
}

impl<R> MessageReader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(reader: R, codec: MessageCodec) -> Self {
        Self {
            frames: FramedRead::new(reader, codec),
        }
    }
}

impl<R> Stream for MessageReader<R>
where
    R: AsyncRead + Unpin,
{
    type Item = Result<Message, CodecError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().frames.poll_next(cx)
    }
}
