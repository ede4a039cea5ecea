use std::io;

/// Failures while framing or parsing envelopes.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("backend stream: {0}")]
    Io(#[from] io::Error),

    #[error("envelope header is not UTF-8")]
    InvalidUtf8,

    #[error("Content-Length is not a number")]
    MalformedContentLength,

    #[error("envelope header has no Content-Length")]
    MissingContentLength,

    #[error("envelope of {size} bytes is over the {max} byte limit")]
    MessageTooLarge { size: usize, max: usize },

    /// The body parsed as JSON but is neither a request nor a reply.
    #[error("unknown envelope type {kind:?}")]
    UnknownEnvelope { kind: String },

    #[error("decoding envelope: {0}")]
    JsonDeserialize(#[source] serde_json::Error),

    #[error("encoding envelope: {0}")]
    JsonSerialize(#[source] serde_json::Error),
}
