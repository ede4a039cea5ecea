//! Async message transport for the cart-studio controller.
//!
//! The controller and its backend exchange JSON envelopes over a byte stream.
//! Each envelope is framed with a `Content-Length` header:
//!
//! ```text
//! Content-Length: <length>\r\n
//! \r\n
//! {"type": "request" | "reply", "id": <u64>, "name": <verb>, "payload": <any>}
//! ```
//!
//! Only framing lives here. Correlating replies with requests and dispatching
//! host commands belong in the `bridge` crate.

mod codec;
mod error;
mod message;
mod reader;
mod transport;
mod writer;

pub mod testing;

pub use codec::{DEFAULT_MAX_MESSAGE_SIZE, MessageCodec};
pub use error::CodecError;
pub use message::{Message, MessageId, Reply, Request};
pub use reader::MessageReader;
pub use transport::{ChildStdio, Transport, split};
pub use writer::MessageWriter;
