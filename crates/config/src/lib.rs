//! Configuration management
//!
//! This crate reads the cart-studio configuration file. Every field has a default, so a missing
//! file is not an error, but a file that does not parse is.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use eyre::Context;
use serde::Deserialize;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding the cart sources and the generated cart. Defaults to the current
    /// directory.
    pub working_directory: Option<PathBuf>,
    /// Files with this extension open as source, anything else as sprite data.
    pub source_extension: String,
    /// Seconds to wait for a backend reply. Zero waits forever.
    pub request_timeout_secs: u64,
    /// Where the controller state lives. Defaults to the platform data directory.
    pub state_path: Option<PathBuf>,
    /// Largest envelope accepted from the backend, in bytes. Raise it for large sprite sheets.
    /// Defaults to the transport's own limit.
    pub max_message_bytes: Option<usize>,
    pub backend: BackendConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            working_directory: None,
            source_extension: protocol::DEFAULT_SOURCE_EXTENSION.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            state_path: None,
            max_message_bytes: None,
            backend: BackendConfig::default(),
        }
    }
}

/// How to start the backend process.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            program: "cart-backend".to_string(),
            args: Vec::new(),
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    /// Resolve relative paths against `root`.
    pub fn resolve(&mut self, root: impl AsRef<Path>) {
        let root = root.as_ref();
        for path in [&mut self.working_directory, &mut self.state_path]
            .into_iter()
            .flatten()
        {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }
    }
}

/// Default location of the configuration file.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("cart-studio").join("config.toml"))
}

pub fn from_str(contents: &str) -> eyre::Result<Config> {
    let config = toml::from_str(contents).wrap_err("parsing configuration")?;
    Ok(config)
}

pub fn load(mut r: impl std::io::Read) -> eyre::Result<Config> {
    let mut contents = String::new();
    r.read_to_string(&mut contents)
        .wrap_err("reading configuration contents")?;
    from_str(&contents)
}

/// Load the configuration at `path`, or at [`default_path`] if `path` is `None`.
///
/// Relative paths in the file are resolved against the file's directory.
pub fn load_from_path(path: Option<&Path>) -> eyre::Result<Config> {
    let Some(path) = path.map(Path::to_path_buf).or_else(default_path) else {
        tracing::debug!("no configuration directory, using defaults");
        return Ok(Config::default());
    };
    let span = tracing::debug_span!("load_config", path = %path.display());
    let _guard = span.enter();

    let f = match std::fs::File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("configuration file not found, using defaults");
            return Ok(Config::default());
        }
        Err(e) => {
            return Err(e).wrap_err_with(|| format!("opening config file {}", path.display()));
        }
    };

    let mut config = load(f).wrap_err_with(|| format!("loading {}", path.display()))?;
    if let Some(root) = path.parent() {
        config.resolve(root);
    }
    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}
