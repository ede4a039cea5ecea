use std::time::Duration;

use protocol::{ProtocolError, Verb};
use wire::CodecError;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The backend answered with an `error` reply.
    #[error("{0}")]
    Backend(String),

    #[error("sending request")]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("unexpected reply payload for {verb}")]
    UnexpectedReply {
        verb: Verb,
        #[source]
        source: serde_json::Error,
    },

    #[error("bridge closed")]
    Closed,

    #[error("request cancelled")]
    Cancelled,

    #[error("no reply to {verb} after {after:?}")]
    Timeout { verb: Verb, after: Duration },
}
