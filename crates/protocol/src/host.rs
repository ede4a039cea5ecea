use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Value;

use crate::error::ProtocolError;

/// A command sent by the host window chrome (menu clicks) or the backend's
/// file watcher to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    /// Show the about box with the given text.
    About(String),
    /// Start an untitled document from the given template source.
    New(String),
    Open,
    /// The file at this path changed on disk.
    Reload(PathBuf),
    Run,
    Save,
    SaveAs,
}

impl HostCommand {
    /// Parse an inbound request.
    ///
    /// Unknown verbs yield `Ok(None)` and are to be ignored.
    pub fn parse(name: &str, payload: Option<Value>) -> Result<Option<Self>, ProtocolError> {
        let text = |verb: &'static str, payload: Option<Value>| {
            Option::<String>::deserialize(payload.unwrap_or(Value::Null))
                .map(Option::unwrap_or_default)
                .map_err(ProtocolError::payload(verb))
        };

        let command = match name {
            "about" => HostCommand::About(text("about", payload)?),
            "new" => HostCommand::New(text("new", payload)?),
            "open" => HostCommand::Open,
            "reload" => HostCommand::Reload(
                PathBuf::deserialize(payload.unwrap_or(Value::Null))
                    .map_err(ProtocolError::payload("reload"))?,
            ),
            "run" => HostCommand::Run,
            "save" => HostCommand::Save,
            "saveAs" => HostCommand::SaveAs,
            _ => return Ok(None),
        };
        Ok(Some(command))
    }

    pub fn name(&self) -> &'static str {
        match self {
            HostCommand::About(_) => "about",
            HostCommand::New(_) => "new",
            HostCommand::Open => "open",
            HostCommand::Reload(_) => "reload",
            HostCommand::Run => "run",
            HostCommand::Save => "save",
            HostCommand::SaveAs => "saveAs",
        }
    }

    /// The acknowledgement returned synchronously to the host.
    pub fn ack(&self) -> Value {
        Value::String(format!("{} clicked!", self.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_every_verb() {
        let cases = [
            ("about", Some(json!("Welcome")), HostCommand::About("Welcome".into())),
            ("new", Some(json!("package main")), HostCommand::New("package main".into())),
            ("open", Some(json!("open this")), HostCommand::Open),
            ("reload", Some(json!("/src/main.go")), HostCommand::Reload("/src/main.go".into())),
            ("run", Some(json!("run code")), HostCommand::Run),
            ("save", None, HostCommand::Save),
            ("saveAs", Some(json!("saveAs this")), HostCommand::SaveAs),
        ];

        for (name, payload, expected) in cases {
            let parsed = HostCommand::parse(name, payload).unwrap();
            assert_eq!(parsed, Some(expected.clone()), "verb {name}");
            assert_eq!(expected.name(), name);
        }
    }

    #[test]
    fn unknown_verb_is_ignored() {
        assert_eq!(HostCommand::parse("quit", None).unwrap(), None);
    }

    #[test]
    fn reload_requires_a_path() {
        assert!(HostCommand::parse("reload", None).is_err());
    }

    #[test]
    fn about_without_payload_is_empty() {
        let parsed = HostCommand::parse("about", None).unwrap();
        assert_eq!(parsed, Some(HostCommand::About(String::new())));
    }

    #[test]
    fn ack_names_the_verb() {
        assert_eq!(HostCommand::SaveAs.ack(), json!("saveAs clicked!"));
    }
}
