//! Envelope types exchanged between the controller and the backend.
//!
//! The protocol is symmetric: either side may send a [`Request`], and the
//! receiving side answers it with exactly one [`Reply`] carrying the same id.
//! The controller sends verbs such as `load` and `run`; the backend sends host
//! commands such as `about` and `reload`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier used to correlate a reply with the request it answers.
pub type MessageId = u64;

/// A framed envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    Request(Request),
    Reply(Reply),
}

/// A request for the other side to perform `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: MessageId,
    /// The verb to execute.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// The single answer to a [`Request`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    /// Id of the request this reply answers.
    pub id: MessageId,
    /// Either the echoed verb or [`Reply::ERROR`].
    pub name: String,
    #[serde(default)]
    pub payload: Value,
}

impl Reply {
    /// Reply name that marks a failure regardless of the request verb.
    pub const ERROR: &'static str = "error";

    pub fn error(id: MessageId, message: impl Into<String>) -> Self {
        Self {
            id,
            name: Self::ERROR.to_string(),
            payload: Value::String(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.name == Self::ERROR
    }
}
