//! Request and reply payload shapes.

use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

use crate::diagnostics::CompileResult;

/// Payload of `load` and `loadSprites`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathArgs {
    pub path: PathBuf,
}

/// Payload of `run` and `save`.
///
/// For `run`, `path` is the working directory the compiled cart is written
/// into; for `save` it is the destination file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceArgs {
    pub path: PathBuf,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReply {
    pub path: PathBuf,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpritesReply {
    pub sprite_data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveReply {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comp_resp: Option<CompileResult>,
    #[serde(default, deserialize_with = "zero_as_none")]
    pub screen_width: Option<u32>,
    #[serde(default, deserialize_with = "zero_as_none")]
    pub screen_height: Option<u32>,
}

impl RunReply {
    /// Whether the compiler reported at least one diagnostic.
    pub fn has_diagnostics(&self) -> bool {
        self.comp_resp
            .as_ref()
            .is_some_and(|resp| !resp.errors.is_empty())
    }

    pub fn screen_size(&self) -> ScreenSize {
        let default = ScreenSize::default();
        ScreenSize {
            width: self.screen_width.unwrap_or(default.width),
            height: self.screen_height.unwrap_or(default.height),
        }
    }
}

/// Dimensions of the run surface's canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ScreenSize {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
        }
    }
}

// The backend sends 0 when a field is unset.
fn zero_as_none<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<u32>::deserialize(deserializer)?;
    Ok(value.filter(|v| *v != 0))
}
