use std::path::{Path, PathBuf};

use bridge::Backend;
use eyre::WrapErr;
use protocol::{CompileResult, Request, RunReply, ScreenSize, SourceArgs};
use state::ArmStore;

use crate::gate::SandboxGate;
use crate::ui::{Annotation, Editor, Frontend, Position, Shell, View, titles};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    /// The last run failed to compile and its diagnostics are on screen.
    Annotated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The cart compiled and the run surface was reloaded to execute it.
    Launched(ScreenSize),
    /// The cart did not compile.
    Annotated { diagnostics: usize },
}

/// Compiles the live buffer and decides what the run surface does with it.
pub struct Orchestrator {
    state: RunState,
    working_directory: PathBuf,
    screen_size: Option<ScreenSize>,
}

impl Orchestrator {
    pub fn new(working_directory: impl Into<PathBuf>) -> Self {
        Self {
            state: RunState::Idle,
            working_directory: working_directory.into(),
            screen_size: None,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// The screen size reported by the last successful run.
    pub fn screen_size(&self) -> Option<ScreenSize> {
        self.screen_size
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    /// Compile and run the live buffer.
    ///
    /// Annotations and the raw output panel are cleared before the request
    /// goes out. Only a clean compile arms `gate`.
    #[tracing::instrument(skip_all)]
    pub async fn run<E, S, A>(
        &mut self,
        backend: &impl Backend,
        ui: &mut Frontend<E, S>,
        gate: &SandboxGate<A>,
    ) -> eyre::Result<RunOutcome>
    where
        E: Editor,
        S: Shell,
        A: ArmStore,
    {
        ui.editor.clear_annotations();
        ui.shell.set_raw_output("");
        self.state = RunState::Running;

        let request = Request::Run(SourceArgs {
            path: self.working_directory.clone(),
            source: ui.editor.text(),
        });
        let reply: RunReply = match backend.call(request).await {
            Ok(reply) => reply,
            Err(e) => {
                self.state = RunState::Idle;
                return Err(ui.surface(titles::RUN_ERROR, e));
            }
        };

        if reply.has_diagnostics() {
            let result = reply.comp_resp.unwrap_or_default();
            let diagnostics = self.annotate(ui, &result);
            self.state = RunState::Annotated;
            return Ok(RunOutcome::Annotated { diagnostics });
        }

        let screen_size = reply.screen_size();
        let launched = self.launch(ui, gate, screen_size);
        self.state = RunState::Idle;
        if let Err(e) = &launched {
            ui.shell.show_error(titles::RUN_ERROR, &format!("{e:#}"));
        }
        launched.map(|()| RunOutcome::Launched(screen_size))
    }

    fn annotate<E, S>(&self, ui: &mut Frontend<E, S>, result: &CompileResult) -> usize
    where
        E: Editor,
        S: Shell,
    {
        let annotations: Vec<Annotation> = result
            .errors
            .iter()
            .map(|d| Annotation {
                position: Position::new(d.row.saturating_sub(1), d.column),
                text: d.text.clone(),
                kind: d.kind,
            })
            .collect();
        let count = annotations.len();
        tracing::debug!(count, "compile failed");

        if let Some(first) = annotations.first() {
            let row = first.position.row;
            ui.editor.move_cursor(Position::new(row, 0));
            ui.editor.scroll_to_line(row);
        }
        ui.editor.set_annotations(annotations);
        ui.shell.set_raw_output(&result.raw);
        ui.shell.show_error(titles::COMPILE_ERROR, &result.message());
        count
    }

    fn launch<E, S, A>(
        &mut self,
        ui: &mut Frontend<E, S>,
        gate: &SandboxGate<A>,
        screen_size: ScreenSize,
    ) -> eyre::Result<()>
    where
        E: Editor,
        S: Shell,
        A: ArmStore,
    {
        ui.editor.clear_annotations();

        // the run surface reads the flag while it reloads
        gate.arm().wrap_err("preparing the run surface")?;
        self.screen_size = Some(screen_size);
        ui.shell.reload_sandbox();
        ui.shell.switch_view(View::Run);
        tracing::debug!(?screen_size, "cart launched");
        Ok(())
    }
}
