//! Compiler diagnostics carried by `run` replies.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    #[default]
    Error,
    Warning,
    Info,
}

/// A single compiler-reported problem.
///
/// `row` is 1-based as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileDiagnostic {
    pub row: u32,
    #[serde(alias = "col")]
    pub column: u32,
    pub text: String,
    #[serde(rename = "type", default)]
    pub kind: DiagnosticKind,
}

/// The compiler's verdict on a `run` request.
///
/// An empty `errors` list means the cart compiled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub errors: Vec<CompileDiagnostic>,
    #[serde(default)]
    pub raw: String,
}

impl CompileResult {
    /// The newline-joined diagnostic texts, for an error dialog.
    pub fn message(&self) -> String {
        self.errors
            .iter()
            .map(|d| d.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
