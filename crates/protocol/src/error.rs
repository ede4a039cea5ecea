#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid payload for {verb}: {source}")]
    Payload {
        verb: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ProtocolError {
    pub(crate) fn payload(verb: &'static str) -> impl FnOnce(serde_json::Error) -> Self {
        move |source| Self::Payload { verb, source }
    }
}
