use std::sync::{Arc, Mutex, MutexGuard};

use crate::{ArmState, Persistence, SpriteAsset};

/// Storage for the sandbox arm flag.
pub trait ArmStore {
    fn read_arm(&self) -> ArmState;

    /// Persist `state`. Once this returns, a freshly initialised sandbox surface
    /// sees the new value.
    fn write_arm(&self, state: ArmState) -> eyre::Result<()>;
}

/// Side-channel storage read by the sprite editor surface.
pub trait SpriteStore {
    /// Store sprite data and flag it for reload.
    fn put_sprites(&self, sprites: SpriteAsset) -> eyre::Result<()>;

    fn sprites(&self) -> Option<SpriteAsset>;

    /// Clear the reload flag, returning the data if it was set.
    fn take_pending_sprites(&self) -> eyre::Result<Option<SpriteAsset>>;
}

/// In-memory state with the same sharing semantics as [`crate::StateManager`].
#[derive(Clone, Default)]
pub struct MemoryStore {
    current: Arc<Mutex<Persistence>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: Persistence) -> Self {
        Self {
            current: Arc::new(Mutex::new(state)),
        }
    }

    pub fn current(&self) -> Persistence {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Persistence> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ArmStore for MemoryStore {
    fn read_arm(&self) -> ArmState {
        self.lock().run_cart
    }

    fn write_arm(&self, state: ArmState) -> eyre::Result<()> {
        self.lock().run_cart = state;
        Ok(())
    }
}

impl SpriteStore for MemoryStore {
    fn put_sprites(&self, sprites: SpriteAsset) -> eyre::Result<()> {
        let mut current = self.lock();
        current.sprites = Some(sprites);
        current.sprite_reload_pending = true;
        Ok(())
    }

    fn sprites(&self) -> Option<SpriteAsset> {
        self.lock().sprites.clone()
    }

    fn take_pending_sprites(&self) -> eyre::Result<Option<SpriteAsset>> {
        let mut current = self.lock();
        if std::mem::take(&mut current.sprite_reload_pending) {
            Ok(current.sprites.clone())
        } else {
            Ok(None)
        }
    }
}
