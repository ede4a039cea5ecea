use std::fmt;

use serde_json::Value;

use crate::error::ProtocolError;
use crate::payloads::{PathArgs, SourceArgs};

/// Verbs the controller may send to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Init,
    Load,
    LoadSprites,
    Run,
    Save,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Init => "init",
            Verb::Load => "load",
            Verb::LoadSprites => "loadSprites",
            Verb::Run => "run",
            Verb::Save => "save",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request from the controller to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Sent once at startup with the controller's working directory.
    Init { context: Option<String> },
    Load(PathArgs),
    LoadSprites(PathArgs),
    Run(SourceArgs),
    Save(SourceArgs),
}

impl Request {
    pub fn verb(&self) -> Verb {
        match self {
            Request::Init { .. } => Verb::Init,
            Request::Load(_) => Verb::Load,
            Request::LoadSprites(_) => Verb::LoadSprites,
            Request::Run(_) => Verb::Run,
            Request::Save(_) => Verb::Save,
        }
    }

    /// The JSON payload to put on the wire.
    pub fn payload(&self) -> Result<Option<Value>, ProtocolError> {
        let verb = self.verb().as_str();
        let value = match self {
            Request::Init { context } => return Ok(context.clone().map(Value::String)),
            Request::Load(args) | Request::LoadSprites(args) => serde_json::to_value(args),
            Request::Run(args) | Request::Save(args) => serde_json::to_value(args),
        };
        value.map(Some).map_err(ProtocolError::payload(verb))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn run_payload_shape() {
        let request = Request::Run(SourceArgs {
            path: PathBuf::from("/home/user/.config/cart-studio"),
            source: "package main".to_string(),
        });

        assert_eq!(request.verb().as_str(), "run");
        assert_eq!(
            request.payload().unwrap(),
            Some(json!({"path": "/home/user/.config/cart-studio", "source": "package main"}))
        );
    }

    #[test]
    fn init_without_context_has_no_payload() {
        let request = Request::Init { context: None };
        assert_eq!(request.payload().unwrap(), None);
    }

    #[test]
    fn load_sprites_verb_is_camel_case() {
        assert_eq!(Verb::LoadSprites.to_string(), "loadSprites");
    }
}
