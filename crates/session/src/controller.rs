use std::path::{Path, PathBuf};

use bridge::Backend;
use protocol::{HostCommand, Request};
use state::{ArmStore, SpriteStore};

use crate::gate::{Activation, ModuleHost, SandboxGate};
use crate::orchestrator::{Orchestrator, RunOutcome};
use crate::sprites::SpriteLoader;
use crate::tracker::{OpenTarget, ReloadOutcome, SourceTracker};
use crate::ui::{Editor, Frontend, Shell, titles};

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub working_directory: PathBuf,
    pub source_extension: String,
}

impl SessionOptions {
    pub fn new(working_directory: impl Into<PathBuf>) -> Self {
        Self {
            working_directory: working_directory.into(),
            source_extension: protocol::DEFAULT_SOURCE_EXTENSION.to_string(),
        }
    }
}

/// One editing session.
///
/// Every transition takes `&mut self`, so two of them never interleave.
pub struct Controller<B, E, S, St> {
    backend: B,
    ui: Frontend<E, S>,
    tracker: SourceTracker,
    orchestrator: Orchestrator,
    gate: SandboxGate<St>,
    sprites: SpriteLoader<St>,
    working_directory: PathBuf,
}

impl<B, E, S, St> Controller<B, E, S, St>
where
    B: Backend,
    E: Editor,
    S: Shell,
    St: ArmStore + SpriteStore + Clone,
{
    /// Build the session. The sandbox is disarmed before this returns.
    pub fn new(
        backend: B,
        ui: Frontend<E, S>,
        store: St,
        options: SessionOptions,
    ) -> eyre::Result<Self> {
        let gate = SandboxGate::new(store.clone(), &options.working_directory)?;
        Ok(Self {
            backend,
            ui,
            tracker: SourceTracker::new(options.source_extension),
            orchestrator: Orchestrator::new(options.working_directory.clone()),
            gate,
            sprites: SpriteLoader::new(store),
            working_directory: options.working_directory,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn ui(&self) -> &Frontend<E, S> {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut Frontend<E, S> {
        &mut self.ui
    }

    pub fn tracker(&self) -> &SourceTracker {
        &self.tracker
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn gate(&self) -> &SandboxGate<St> {
        &self.gate
    }

    pub fn sprites(&self) -> &SpriteLoader<St> {
        &self.sprites
    }

    /// Initialise the backend with the working directory.
    #[tracing::instrument(skip_all)]
    pub async fn start(&mut self) -> eyre::Result<()> {
        let request = Request::Init {
            context: Some(self.working_directory.display().to_string()),
        };
        match self.backend.call::<serde_json::Value>(request).await {
            Ok(_) => {
                tracing::debug!("backend initialised");
                Ok(())
            }
            Err(e) => Err(self.ui.surface(titles::INIT_ERROR, e)),
        }
    }

    /// Handle one host command.
    #[tracing::instrument(skip(self), fields(command = command.name()))]
    pub async fn dispatch(&mut self, command: HostCommand) -> eyre::Result<()> {
        match command {
            HostCommand::About(text) => {
                self.ui.shell.show_message(titles::ABOUT, &text);
            }
            HostCommand::New(template) => self.tracker.new_document(&mut self.ui, &template),
            HostCommand::Open => {
                if let Some(path) = self.ui.shell.pick_open_file() {
                    self.open(&path).await?;
                }
            }
            HostCommand::Reload(path) => {
                self.reload(&path).await?;
            }
            HostCommand::Run => {
                self.run().await?;
            }
            HostCommand::Save => match self.tracker.document().path() {
                Some(path) => {
                    let path = path.to_path_buf();
                    self.save(&path).await?;
                }
                None => self.save_as().await?,
            },
            HostCommand::SaveAs => self.save_as().await?,
        }
        Ok(())
    }

    /// Open `path` as source or sprite data, by extension.
    pub async fn open(&mut self, path: &Path) -> eyre::Result<OpenTarget> {
        let target = self.tracker.classify(path);
        tracing::debug!(path = %path.display(), ?target, "opening file");
        match target {
            OpenTarget::Source => self.load(path).await?,
            OpenTarget::Sprites => {
                self.sprites
                    .load_sprites(&self.backend, &mut self.ui, path)
                    .await?
            }
        }
        Ok(target)
    }

    pub async fn load(&mut self, path: &Path) -> eyre::Result<()> {
        self.tracker.load(&self.backend, &mut self.ui, path).await
    }

    pub async fn reload(&mut self, path: &Path) -> eyre::Result<ReloadOutcome> {
        self.tracker
            .request_reload(&self.backend, &mut self.ui, path)
            .await
    }

    pub async fn save(&mut self, path: &Path) -> eyre::Result<()> {
        self.tracker.save(&self.backend, &mut self.ui, path).await
    }

    /// Ask for a path and save there. Does nothing if the user backs out.
    pub async fn save_as(&mut self) -> eyre::Result<()> {
        match self.ui.shell.pick_save_file() {
            Some(path) => self.save(&path).await,
            None => Ok(()),
        }
    }

    pub async fn run(&mut self) -> eyre::Result<RunOutcome> {
        self.orchestrator
            .run(&self.backend, &mut self.ui, &self.gate)
            .await
    }

    pub async fn save_sprites(&mut self, path: &Path) -> eyre::Result<PathBuf> {
        self.sprites
            .save_sprites(&self.backend, &mut self.ui, path)
            .await
    }

    /// The run surface has (re)initialised.
    pub fn activate_sandbox(&self, host: &mut impl ModuleHost) -> eyre::Result<Activation> {
        self.gate.activate(host)
    }
}
