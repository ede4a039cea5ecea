//! In-memory transport for testing.

use tokio::io::{DuplexStream, duplex};

use crate::transport::Transport;

/// A bidirectional in-memory transport built from two tokio duplex pipes.
///
/// ```
/// use wire::testing::MemoryTransport;
/// use wire::{MessageCodec, split};
///
/// let (controller, backend) = MemoryTransport::pair();
/// let (controller_reader, controller_writer) = split(controller, MessageCodec::new());
/// let (backend_reader, backend_writer) = split(backend, MessageCodec::new());
/// ```
pub struct MemoryTransport {
    read: DuplexStream,
    write: DuplexStream,
}

impl MemoryTransport {
    /// Create a connected pair with a 64KB buffer in each direction.
    pub fn pair() -> (Self, Self) {
        Self::pair_with_buffer_size(64 * 1024)
    }

    pub fn pair_with_buffer_size(buffer_size: usize) -> (Self, Self) {
        let (a_to_b_write, a_to_b_read) = duplex(buffer_size);
        let (b_to_a_write, b_to_a_read) = duplex(buffer_size);

        let a = MemoryTransport {
            read: b_to_a_read,
            write: a_to_b_write,
        };
        let b = MemoryTransport {
            read: a_to_b_read,
            write: b_to_a_write,
        };

        (a, b)
    }
}

impl Transport for MemoryTransport {
    type Read = DuplexStream;
    type Write = DuplexStream;

    fn into_split(self) -> (Self::Read, Self::Write) {
        (self.read, self.write)
    }
}
