//! The state module persists the controller state that must survive a reload of the sandbox surface.
//!
//! Two pieces of state cross that boundary: the flag that lets the sandbox run the generated cart,
//! and the sprite data handed over to the sprite editor.

use std::{
    io::Read,
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use eyre::Context;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

mod store;

pub use store::{ArmStore, MemoryStore, SpriteStore};

const STATE_VERSION: &str = "1";

/// Whether the sandbox may execute the most recently generated cart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArmState {
    Armed,
    #[default]
    Disarmed,
}

impl ArmState {
    pub fn is_armed(self) -> bool {
        matches!(self, ArmState::Armed)
    }
}

// stored as the strings "true" and "false" so other surfaces can read the flag without
// knowing about this type
impl Serialize for ArmState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if self.is_armed() { "true" } else { "false" })
    }
}

impl<'de> Deserialize<'de> for ArmState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(if value == "true" {
            ArmState::Armed
        } else {
            ArmState::Disarmed
        })
    }
}

/// Sprite data for the sprite editor surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteAsset {
    pub data: String,
}

/// State that is persisted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Persistence {
    pub version: String,
    pub run_cart: ArmState,
    pub sprites: Option<SpriteAsset>,
    pub sprite_reload_pending: bool,
}

/// File-backed state, written through on every change.
///
/// Handles are cheap to clone and share the same state, so the sandbox gate
/// and the sprite loader can each own one.
#[derive(Clone)]
pub struct StateManager {
    save_path: PathBuf,
    current: Arc<Mutex<Persistence>>,
}

impl StateManager {
    pub fn new(path: impl Into<PathBuf>) -> eyre::Result<Self> {
        let path = path.into();
        let span = tracing::debug_span!("StateManager", state_path = %path.display());
        let _guard = span.enter();

        tracing::debug!("attempting to load state");
        let state = match crate::load_from(&path) {
            Ok(state) => {
                tracing::debug!(run_cart = ?state.run_cart, "state loaded");
                state
            }
            Err(e) => {
                tracing::debug!(error = %e, "no usable state file, starting fresh");
                let state = Persistence {
                    version: STATE_VERSION.to_string(),
                    ..Default::default()
                };
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("creating state directory {}", parent.display()))?;
                }
                crate::save_to(&state, &path).wrap_err("saving state file")?;
                state
            }
        };

        Ok(Self {
            save_path: path,
            current: Arc::new(Mutex::new(state)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.save_path
    }

    pub fn current(&self) -> Persistence {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Persistence> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply `f` and persist the result. Memory only changes once the write has
    /// succeeded.
    fn update(&self, f: impl FnOnce(&mut Persistence)) -> eyre::Result<()> {
        let mut current = self.lock();
        let mut next = current.clone();
        f(&mut next);
        crate::save_to(&next, &self.save_path).wrap_err("saving state")?;
        *current = next;
        Ok(())
    }
}

impl ArmStore for StateManager {
    fn read_arm(&self) -> ArmState {
        self.lock().run_cart
    }

    fn write_arm(&self, state: ArmState) -> eyre::Result<()> {
        tracing::debug!(?state, "persisting arm state");
        self.update(|current| current.run_cart = state)
    }
}

impl SpriteStore for StateManager {
    fn put_sprites(&self, sprites: SpriteAsset) -> eyre::Result<()> {
        self.update(|current| {
            current.sprites = Some(sprites);
            current.sprite_reload_pending = true;
        })
    }

    fn sprites(&self) -> Option<SpriteAsset> {
        self.lock().sprites.clone()
    }

    fn take_pending_sprites(&self) -> eyre::Result<Option<SpriteAsset>> {
        let mut taken = None;
        self.update(|current| {
            if std::mem::take(&mut current.sprite_reload_pending) {
                taken = current.sprites.clone();
            }
        })?;
        Ok(taken)
    }
}

pub fn save(state: &Persistence, writer: impl Write) -> eyre::Result<()> {
    serde_json::to_writer(writer, state).context("saving controller state")?;
    Ok(())
}

/// Replace the file at `path` with `state`.
///
/// The state is written to a sibling temporary file which is then renamed over
/// `path`, so a concurrent reader sees either the old or the new state.
pub fn save_to(state: &Persistence, path: impl AsRef<Path>) -> eyre::Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut f = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temporary state file in {}", dir.display()))?;
    save(state, &mut f).context("saving state")?;
    f.as_file().sync_all().context("flushing state")?;
    f.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

pub fn load(reader: impl Read) -> eyre::Result<Persistence> {
    let st = serde_json::from_reader(reader).context("reading controller state")?;
    Ok(st)
}

pub fn load_from(path: impl AsRef<Path>) -> eyre::Result<Persistence> {
    let path = path.as_ref();
    let f = std::fs::File::open(path)
        .with_context(|| format!("opening save state {}", path.display()))?;
    let state = load(f).context("reading from state file")?;
    Ok(state)
}

/// Default location of the state file.
pub fn default_state_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("cart-studio").join("state.json"))
}
