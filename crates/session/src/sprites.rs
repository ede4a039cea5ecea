use std::path::{Path, PathBuf};

use bridge::Backend;
use eyre::WrapErr;
use protocol::{PathArgs, Request, SaveReply, SourceArgs, SpritesReply};
use state::{SpriteAsset, SpriteStore};

use crate::ui::{Editor, Frontend, Shell, View, titles};

/// Moves sprite data between the backend and the sprite editor's store.
///
/// Failures are shown and returned, never retried. Nothing is stored unless
/// the backend succeeded.
pub struct SpriteLoader<St> {
    store: St,
}

impl<St> SpriteLoader<St>
where
    St: SpriteStore,
{
    pub fn new(store: St) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &St {
        &self.store
    }

    #[tracing::instrument(skip(self, backend, ui))]
    pub async fn load_sprites<E, S>(
        &self,
        backend: &impl Backend,
        ui: &mut Frontend<E, S>,
        path: &Path,
    ) -> eyre::Result<()>
    where
        E: Editor,
        S: Shell,
    {
        let request = Request::LoadSprites(PathArgs {
            path: path.to_path_buf(),
        });
        let reply: SpritesReply = match backend.call(request).await {
            Ok(reply) => reply,
            Err(e) => return Err(ui.surface(titles::LOAD_ERROR, e)),
        };

        self.store
            .put_sprites(SpriteAsset {
                data: reply.sprite_data,
            })
            .wrap_err("storing sprite data")?;
        tracing::debug!("sprites loaded");
        ui.shell.switch_view(View::Sprites);
        Ok(())
    }

    /// Save the sprite editor's current data to `path`.
    #[tracing::instrument(skip(self, backend, ui))]
    pub async fn save_sprites<E, S>(
        &self,
        backend: &impl Backend,
        ui: &mut Frontend<E, S>,
        path: &Path,
    ) -> eyre::Result<PathBuf>
    where
        E: Editor,
        S: Shell,
    {
        let Some(sprites) = self.store.sprites() else {
            ui.shell.show_error(titles::SAVE_ERROR, "no sprite data to save");
            eyre::bail!("no sprite data to save");
        };

        let request = Request::Save(SourceArgs {
            path: path.to_path_buf(),
            source: sprites.data,
        });
        match backend.call::<SaveReply>(request).await {
            Ok(reply) => {
                tracing::debug!(path = %reply.path.display(), "sprites saved");
                Ok(reply.path)
            }
            Err(e) => Err(ui.surface(titles::SAVE_ERROR, e)),
        }
    }
}
