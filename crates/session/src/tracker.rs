use std::path::{Path, PathBuf};

use bridge::Backend;
use protocol::{LoadReply, PathArgs, Request, SaveReply, SourceArgs};

use crate::ui::{Editor, Frontend, Shell, View, titles};

/// The document open in the editor, as last loaded or saved.
///
/// The live buffer belongs to the editor widget; this only remembers what it
/// held after the last successful load or save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceDocument {
    path: Option<PathBuf>,
    loaded_text: String,
}

impl SourceDocument {
    /// `None` for an untitled buffer.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn loaded_text(&self) -> &str {
        &self.loaded_text
    }

    /// Whether `live` has edits that were never saved.
    pub fn is_modified(&self, live: &str) -> bool {
        live != self.loaded_text
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    Loaded,
    /// The user kept their edits.
    Declined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenTarget {
    Source,
    Sprites,
}

/// Keeps the open document in step with the backend and decides when a
/// reload would discard work.
pub struct SourceTracker {
    document: SourceDocument,
    source_extension: String,
}

impl SourceTracker {
    pub fn new(source_extension: impl Into<String>) -> Self {
        Self {
            document: SourceDocument::default(),
            source_extension: source_extension.into(),
        }
    }

    pub fn document(&self) -> &SourceDocument {
        &self.document
    }

    /// Load `path` into the editor, replacing whatever it holds.
    #[tracing::instrument(skip(self, backend, ui))]
    pub async fn load<E, S>(
        &mut self,
        backend: &impl Backend,
        ui: &mut Frontend<E, S>,
        path: &Path,
    ) -> eyre::Result<()>
    where
        E: Editor,
        S: Shell,
    {
        let request = Request::Load(PathArgs {
            path: path.to_path_buf(),
        });
        let reply: LoadReply = match backend.call(request).await {
            Ok(reply) => reply,
            Err(e) => return Err(ui.surface(titles::LOAD_ERROR, e)),
        };

        tracing::debug!(path = %reply.path.display(), bytes = reply.source.len(), "source loaded");
        ui.shell.set_title(&reply.path.display().to_string());
        ui.editor.set_text(&reply.source);
        self.document = SourceDocument {
            path: Some(reply.path),
            loaded_text: reply.source,
        };
        ui.shell.switch_view(View::Code);
        Ok(())
    }

    /// Reload `path`, asking first if the buffer has unsaved edits.
    #[tracing::instrument(skip(self, backend, ui))]
    pub async fn request_reload<E, S>(
        &mut self,
        backend: &impl Backend,
        ui: &mut Frontend<E, S>,
        path: &Path,
    ) -> eyre::Result<ReloadOutcome>
    where
        E: Editor,
        S: Shell,
    {
        if self.document.is_modified(&ui.editor.text()) && !ui.shell.confirm_discard() {
            tracing::debug!("reload declined, keeping edits");
            return Ok(ReloadOutcome::Declined);
        }

        self.load(backend, ui, path).await?;
        Ok(ReloadOutcome::Loaded)
    }

    /// Save the live buffer to `path`.
    #[tracing::instrument(skip(self, backend, ui))]
    pub async fn save<E, S>(
        &mut self,
        backend: &impl Backend,
        ui: &mut Frontend<E, S>,
        path: &Path,
    ) -> eyre::Result<()>
    where
        E: Editor,
        S: Shell,
    {
        let source = ui.editor.text();
        let request = Request::Save(SourceArgs {
            path: path.to_path_buf(),
            source: source.clone(),
        });
        let reply: SaveReply = match backend.call(request).await {
            Ok(reply) => reply,
            Err(e) => return Err(ui.surface(titles::SAVE_ERROR, e)),
        };

        tracing::debug!(path = %reply.path.display(), "source saved");
        ui.shell.set_title(&reply.path.display().to_string());
        self.document = SourceDocument {
            path: Some(reply.path),
            loaded_text: source,
        };
        Ok(())
    }

    /// How a picked file should be opened, judged only by its extension.
    pub fn classify(&self, path: &Path) -> OpenTarget {
        match path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case(&self.source_extension) => OpenTarget::Source,
            _ => OpenTarget::Sprites,
        }
    }

    /// Start an untitled document from `template`.
    ///
    /// The loaded snapshot is kept, so the template counts as unsaved edits.
    pub fn new_document<E, S>(&mut self, ui: &mut Frontend<E, S>, template: &str)
    where
        E: Editor,
        S: Shell,
    {
        self.document.path = None;
        ui.shell.set_title(titles::UNTITLED);
        ui.editor.set_text(template);
    }
}
