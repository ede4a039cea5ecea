//! Byte streams that can carry the message protocol.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, ChildStdin, ChildStdout};

use crate::codec::MessageCodec;
use crate::reader::MessageReader;
use crate::writer::MessageWriter;

/// A duplex byte stream that splits into independently owned halves.
pub trait Transport: Send + 'static {
    type Read: AsyncRead + Unpin + Send + 'static;
    type Write: AsyncWrite + Unpin + Send + 'static;

    fn into_split(self) -> (Self::Read, Self::Write);
}

/// The stdio pipes of a spawned backend process.
///
/// The backend reads requests on its stdin and writes replies and host
/// commands on its stdout.
pub struct ChildStdio {
    stdout: ChildStdout,
    stdin: ChildStdin,
}

impl ChildStdio {
    /// Take the piped stdio handles out of `child`.
    ///
    /// Returns `None` unless both stdin and stdout were configured with
    /// `Stdio::piped()`.
    pub fn take(child: &mut Child) -> Option<Self> {
        let stdout = child.stdout.take()?;
        let stdin = child.stdin.take()?;
        Some(Self { stdout, stdin })
    }
}

impl Transport for ChildStdio {
    type Read = ChildStdout;
    type Write = ChildStdin;

    fn into_split(self) -> (Self::Read, Self::Write) {
        (self.stdout, self.stdin)
    }
}

/// Split a transport into a message reader and writer sharing one codec
/// configuration.
pub fn split<T: Transport>(
    transport: T,
    codec: MessageCodec,
) -> (MessageReader<T::Read>, MessageWriter<T::Write>) {
    let (read, write) = transport.into_split();
    (MessageReader::new(read, codec), MessageWriter::new(write, codec))
}
