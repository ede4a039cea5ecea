use protocol::{Request, Verb};
use serde::de::DeserializeOwned;
use serde_json::Value;
use wire::Reply;

use crate::error::BridgeError;

/// Something that answers controller requests: the real [`crate::Bridge`] or
/// a scripted stand-in for tests.
#[allow(async_fn_in_trait)]
pub trait Backend {
    /// Send `request` and wait for its single reply.
    ///
    /// Transport failures are errors; an `error` reply is not, callers
    /// inspect it (or use [`Backend::call`]).
    async fn send(&self, request: Request) -> Result<Reply, BridgeError>;

    /// Send `request` and decode the success payload.
    async fn call<T: DeserializeOwned>(&self, request: Request) -> Result<T, BridgeError> {
        let verb = request.verb();
        let reply = self.send(request).await?;
        decode_reply(verb, reply)
    }
}

/// Turn an `error` reply into [`BridgeError::Backend`], otherwise decode the
/// payload.
pub fn decode_reply<T: DeserializeOwned>(verb: Verb, reply: Reply) -> Result<T, BridgeError> {
    if reply.is_error() {
        let message = match reply.payload {
            Value::String(message) => message,
            other => other.to_string(),
        };
        return Err(BridgeError::Backend(message));
    }

    serde_json::from_value(reply.payload)
        .map_err(|source| BridgeError::UnexpectedReply { verb, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::SaveReply;
    use serde_json::json;

    #[test]
    fn error_reply_is_backend_error() {
        let reply = Reply::error(1, "Failed to open file: no such file");

        let err = decode_reply::<SaveReply>(Verb::Save, reply).unwrap_err();
        assert!(matches!(err, BridgeError::Backend(m) if m == "Failed to open file: no such file"));
    }

    #[test]
    fn non_string_error_payload_is_stringified() {
        let reply = Reply {
            id: 1,
            name: "error".to_string(),
            payload: json!({"code": 3}),
        };

        let err = decode_reply::<Value>(Verb::Run, reply).unwrap_err();
        assert!(matches!(err, BridgeError::Backend(m) if m == r#"{"code":3}"#));
    }

    #[test]
    fn success_payload_is_decoded() {
        let reply = Reply {
            id: 2,
            name: "save".to_string(),
            payload: json!({"path": "/src/main.go"}),
        };

        let saved: SaveReply = decode_reply(Verb::Save, reply).unwrap();
        assert_eq!(saved.path, std::path::PathBuf::from("/src/main.go"));
    }

    #[test]
    fn wrong_shape_is_unexpected_reply() {
        let reply = Reply {
            id: 3,
            name: "save".to_string(),
            payload: json!(42),
        };

        let err = decode_reply::<SaveReply>(Verb::Save, reply).unwrap_err();
        assert!(matches!(err, BridgeError::UnexpectedReply { verb: Verb::Save, .. }));
    }
}
