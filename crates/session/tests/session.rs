use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use bridge::HostHandler;
use protocol::{HostCommand, PathArgs, Request, ScreenSize, SourceArgs, Verb};
use serde_json::json;
use session::testing::{
    RecordingEditor, RecordingModuleHost, RecordingShell, ScriptedBackend, ShellEvent,
};
use session::{
    Activation, CommandForwarder, Controller, Frontend, OpenTarget, Position, ReloadOutcome,
    RunOutcome, RunState, SessionOptions, View,
};
use state::{ArmState, ArmStore, MemoryStore, Persistence, SpriteAsset, SpriteStore, StateManager};
use tracing_subscriber::EnvFilter;

// test suite "constructor"
#[ctor::ctor]
fn init() {
    if std::io::stderr().is_terminal() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .json()
            .try_init();
    }

    let _ = color_eyre::install();
}

const WORKING_DIRECTORY: &str = "/work";

type TestController = Controller<ScriptedBackend, RecordingEditor, RecordingShell, MemoryStore>;

struct Harness {
    controller: TestController,
    store: MemoryStore,
}

impl Harness {
    fn new() -> Self {
        Self::with_store(MemoryStore::new(), RecordingEditor::default())
    }

    fn with_editor(editor: RecordingEditor) -> Self {
        Self::with_store(MemoryStore::new(), editor)
    }

    fn with_store(store: MemoryStore, editor: RecordingEditor) -> Self {
        let shell = RecordingShell::default().observe_arm(store.clone());
        let controller = Controller::new(
            ScriptedBackend::new(),
            Frontend::new(editor, shell),
            store.clone(),
            SessionOptions::new(WORKING_DIRECTORY),
        )
        .unwrap();
        Self { controller, store }
    }

    fn backend(&self) -> &ScriptedBackend {
        self.controller.backend()
    }

    fn editor(&self) -> &RecordingEditor {
        &self.controller.ui().editor
    }

    fn editor_mut(&mut self) -> &mut RecordingEditor {
        &mut self.controller.ui_mut().editor
    }

    fn shell(&self) -> &RecordingShell {
        &self.controller.ui().shell
    }

    fn shell_mut(&mut self) -> &mut RecordingShell {
        &mut self.controller.ui_mut().shell
    }

    /// Load `source` from `path` and check it landed.
    async fn loaded(mut self, path: &str, source: &str) -> Self {
        self.backend().load_reply(path, source);
        self.controller.load(Path::new(path)).await.unwrap();
        assert_eq!(self.editor().buffer, source);
        self
    }
}

fn diagnostic_reply() -> serde_json::Value {
    json!({
        "compResp": {
            "errors": [{"row": 5, "column": 0, "text": "undefined: foo", "type": "error"}],
            "raw": "line 5: undefined: foo",
        },
    })
}

#[tokio::test]
async fn start_sends_working_directory() {
    let mut h = Harness::new();
    h.backend().reply(Verb::Init, json!(null));

    h.controller.start().await.unwrap();

    assert_eq!(
        h.backend().requests(),
        vec![Request::Init {
            context: Some(WORKING_DIRECTORY.to_string())
        }]
    );
    assert!(h.shell().errors().is_empty());
}

#[tokio::test]
async fn init_failure_is_shown() {
    let mut h = Harness::new();
    h.backend().fail(Verb::Init, "Failed to create directory");

    assert!(h.controller.start().await.is_err());

    assert_eq!(
        h.shell().errors(),
        vec![(
            "Init Error".to_string(),
            "Failed to create directory".to_string()
        )]
    );
}

#[tokio::test]
async fn process_start_disarms_a_persisted_armed_flag() {
    let store = MemoryStore::with_state(Persistence {
        run_cart: ArmState::Armed,
        ..Default::default()
    });
    let h = Harness::with_store(store, RecordingEditor::default());

    assert_eq!(h.store.read_arm(), ArmState::Disarmed);

    let mut host = RecordingModuleHost::default();
    assert_eq!(
        h.controller.activate_sandbox(&mut host).unwrap(),
        Activation::Idle
    );
    assert!(host.executed.is_empty());
}

#[tokio::test]
async fn successful_run_arms_then_reloads_then_switches_view() {
    let mut h = Harness::with_editor(RecordingEditor::with_text("package main"));
    h.backend().reply(
        Verb::Run,
        json!({"compResp": {"errors": [], "raw": ""}, "screenWidth": 128, "screenHeight": 96}),
    );

    let outcome = h.controller.run().await.unwrap();

    let size = ScreenSize {
        width: 128,
        height: 96,
    };
    assert_eq!(outcome, RunOutcome::Launched(size));
    assert_eq!(h.controller.orchestrator().screen_size(), Some(size));
    assert_eq!(h.controller.orchestrator().state(), RunState::Idle);
    assert_eq!(
        h.backend().requests(),
        vec![Request::Run(SourceArgs {
            path: PathBuf::from(WORKING_DIRECTORY),
            source: "package main".to_string(),
        })]
    );

    let events = &h.shell().events;
    assert_eq!(
        events[events.len() - 2..],
        [
            ShellEvent::ReloadSandbox(Some(ArmState::Armed)),
            ShellEvent::View(View::Run),
        ]
    );
    assert_eq!(h.store.read_arm(), ArmState::Armed);

    let mut host = RecordingModuleHost::default();
    assert_eq!(
        h.controller.activate_sandbox(&mut host).unwrap(),
        Activation::Executed(PathBuf::from("/work/Local Storage/cart.js"))
    );
}

#[tokio::test]
async fn run_without_screen_size_uses_default() {
    let mut h = Harness::new();
    h.backend().reply(Verb::Run, json!({}));

    let outcome = h.controller.run().await.unwrap();

    assert_eq!(outcome, RunOutcome::Launched(ScreenSize::default()));
}

#[tokio::test]
async fn compile_errors_annotate_without_arming() {
    let mut h = Harness::with_editor(RecordingEditor::with_text("package main\n\nfoo()"));
    h.backend().reply(Verb::Run, diagnostic_reply());

    let outcome = h.controller.run().await.unwrap();

    assert_eq!(outcome, RunOutcome::Annotated { diagnostics: 1 });
    assert_eq!(h.controller.orchestrator().state(), RunState::Annotated);

    let annotations = &h.editor().annotations;
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0].position, Position::new(4, 0));
    assert_eq!(annotations[0].text, "undefined: foo");
    assert_eq!(h.editor().cursor, Some(Position::new(4, 0)));
    assert_eq!(h.editor().scrolled_to, Some(4));

    assert_eq!(h.store.read_arm(), ArmState::Disarmed);
    assert_eq!(h.shell().view(), None);
    assert_eq!(h.shell().raw_output(), Some("line 5: undefined: foo"));
    assert_eq!(
        h.shell().errors(),
        vec![("Compile Error".to_string(), "undefined: foo".to_string())]
    );
    assert!(
        !h.shell()
            .events
            .iter()
            .any(|e| matches!(e, ShellEvent::ReloadSandbox(_)))
    );
}

#[tokio::test]
async fn cursor_jumps_to_first_diagnostic_row_at_column_zero() {
    let mut h = Harness::new();
    h.backend().reply(
        Verb::Run,
        json!({
            "compResp": {
                "errors": [
                    {"row": 12, "col": 7, "text": "x declared and not used", "type": "warning"},
                    {"row": 3, "column": 2, "text": "missing return", "type": "error"},
                    {"row": 0, "column": 0, "text": "package clause missing"},
                ],
                "raw": "",
            },
        }),
    );

    let outcome = h.controller.run().await.unwrap();

    assert_eq!(outcome, RunOutcome::Annotated { diagnostics: 3 });
    let positions: Vec<_> = h.editor().annotations.iter().map(|a| a.position).collect();
    assert_eq!(
        positions,
        vec![Position::new(11, 7), Position::new(2, 2), Position::new(0, 0)]
    );
    assert_eq!(h.editor().cursor, Some(Position::new(11, 0)));
    assert_eq!(
        h.shell().errors()[0].1,
        "x declared and not used\nmissing return\npackage clause missing"
    );
}

#[tokio::test]
async fn run_clears_previous_diagnostics_before_sending() {
    let mut h = Harness::new();
    h.backend().reply(Verb::Run, diagnostic_reply());
    h.controller.run().await.unwrap();
    assert_eq!(h.editor().annotations.len(), 1);

    h.backend().fail(Verb::Run, "backend crashed");
    assert!(h.controller.run().await.is_err());

    assert!(h.editor().annotations.is_empty());
    assert_eq!(h.shell().raw_output(), Some(""));
    assert_eq!(h.controller.orchestrator().state(), RunState::Idle);
    assert_eq!(h.store.read_arm(), ArmState::Disarmed);
    assert_eq!(
        h.shell().errors().last(),
        Some(&("Run Error".to_string(), "backend crashed".to_string()))
    );
}

#[tokio::test]
async fn failed_run_after_success_leaves_gate_armed() {
    let mut h = Harness::new();
    h.backend().reply(Verb::Run, json!({}));
    h.controller.run().await.unwrap();

    h.backend().reply(Verb::Run, diagnostic_reply());
    h.controller.run().await.unwrap();

    assert_eq!(h.store.read_arm(), ArmState::Armed);
    assert_eq!(h.shell().view(), Some(View::Run));
}

#[tokio::test]
async fn arm_flag_is_on_disk_before_the_sandbox_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let store = StateManager::new(&path).unwrap();

    // reads the file, as the freshly reloaded surface would
    struct DiskProbe(PathBuf);
    impl ArmStore for DiskProbe {
        fn read_arm(&self) -> ArmState {
            state::load_from(&self.0)
                .map(|p| p.run_cart)
                .unwrap_or_default()
        }

        fn write_arm(&self, _state: ArmState) -> eyre::Result<()> {
            eyre::bail!("read only")
        }
    }

    let shell = RecordingShell::default().observe_arm(DiskProbe(path.clone()));
    let mut controller = Controller::new(
        ScriptedBackend::new(),
        Frontend::new(RecordingEditor::default(), shell),
        store,
        SessionOptions::new(WORKING_DIRECTORY),
    )
    .unwrap();
    assert_eq!(
        state::load_from(&path).unwrap().run_cart,
        ArmState::Disarmed
    );

    controller.backend().reply(Verb::Run, json!({}));
    controller.run().await.unwrap();

    assert!(
        controller
            .ui()
            .shell
            .events
            .contains(&ShellEvent::ReloadSandbox(Some(ArmState::Armed)))
    );
}

#[tokio::test]
async fn unpersisted_arm_flag_does_not_run_the_cart() {
    let dir = tempfile::tempdir().unwrap();
    let state_dir = dir.path().join("state");
    let store = StateManager::new(state_dir.join("state.json")).unwrap();

    let mut controller = Controller::new(
        ScriptedBackend::new(),
        Frontend::new(RecordingEditor::default(), RecordingShell::default()),
        store.clone(),
        SessionOptions::new(WORKING_DIRECTORY),
    )
    .unwrap();
    std::fs::remove_dir_all(&state_dir).unwrap();

    controller.backend().reply(Verb::Run, json!({}));
    assert!(controller.run().await.is_err());

    assert_eq!(store.read_arm(), ArmState::Disarmed);
    assert_eq!(controller.orchestrator().state(), RunState::Idle);
    assert_eq!(controller.orchestrator().screen_size(), None);

    let shell = &controller.ui().shell;
    let errors = shell.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, "Run Error");
    assert!(errors[0].1.starts_with("preparing the run surface"));
    assert_eq!(shell.view(), None);
    assert!(
        !shell
            .events
            .iter()
            .any(|e| matches!(e, ShellEvent::ReloadSandbox(_)))
    );

    let mut host = RecordingModuleHost::default();
    assert_eq!(
        controller.activate_sandbox(&mut host).unwrap(),
        Activation::Idle
    );
    assert!(host.executed.is_empty());
}

#[tokio::test]
async fn load_twice_is_idempotent() {
    let h = Harness::new()
        .loaded("/src/main.go", "package main")
        .await
        .loaded("/src/main.go", "package main")
        .await;

    assert_eq!(h.controller.tracker().document().loaded_text(), "package main");
    assert_eq!(
        h.controller.tracker().document().path(),
        Some(Path::new("/src/main.go"))
    );
    assert_eq!(h.shell().confirmations(), 0);
    assert_eq!(h.shell().title(), Some("/src/main.go"));
    assert_eq!(h.shell().view(), Some(View::Code));
}

#[tokio::test]
async fn load_failure_changes_nothing() {
    let mut h = Harness::new().loaded("/src/main.go", "package main").await;
    h.editor_mut().buffer.push_str("\n// edit");
    h.backend().fail(Verb::Load, "Failed to open file: permission denied");

    assert!(h.controller.load(Path::new("/src/other.go")).await.is_err());

    assert_eq!(h.editor().buffer, "package main\n// edit");
    assert_eq!(
        h.controller.tracker().document().path(),
        Some(Path::new("/src/main.go"))
    );
    assert_eq!(
        h.shell().errors(),
        vec![(
            "Load Error".to_string(),
            "Failed to open file: permission denied".to_string()
        )]
    );
}

#[tokio::test]
async fn save_then_load_round_trips() {
    let mut h = Harness::new().loaded("/src/main.go", "package main").await;
    h.editor_mut().buffer = "package main\n\nfunc main() {}".to_string();
    h.backend().save_reply("/src/main.go");

    h.controller.save(Path::new("/src/main.go")).await.unwrap();

    let saved = h.editor().buffer.clone();
    assert_eq!(h.controller.tracker().document().loaded_text(), saved);
    assert_eq!(
        h.backend().requests().last(),
        Some(&Request::Save(SourceArgs {
            path: PathBuf::from("/src/main.go"),
            source: saved.clone(),
        }))
    );

    let h = h.loaded("/src/main.go", &saved).await;
    assert_eq!(h.controller.tracker().document().loaded_text(), saved);
    assert_eq!(h.shell().confirmations(), 0);
}

#[tokio::test]
async fn save_failure_keeps_snapshot() {
    let mut h = Harness::new().loaded("/src/main.go", "package main").await;
    h.editor_mut().buffer.push_str("\n// edit");
    h.backend().fail(Verb::Save, "disk full");

    assert!(h.controller.save(Path::new("/src/main.go")).await.is_err());

    assert_eq!(h.controller.tracker().document().loaded_text(), "package main");
    assert_eq!(h.shell().errors()[0].0, "Save Error");
}

#[tokio::test]
async fn scenario_a_unmodified_reload_loads_without_asking() {
    let mut h = Harness::new().loaded("/src/main.go", "package main").await;
    h.backend().load_reply("/src/main.go", "package main // changed on disk");

    h.controller
        .dispatch(HostCommand::Reload(PathBuf::from("/src/main.go")))
        .await
        .unwrap();

    assert_eq!(h.shell().confirmations(), 0);
    assert_eq!(h.editor().buffer, "package main // changed on disk");
    assert_eq!(h.backend().verbs(), vec![Verb::Load, Verb::Load]);
}

#[tokio::test]
async fn scenario_b_modified_reload_confirmed_discards_edits() {
    let mut h = Harness::new().loaded("/src/main.go", "package main").await;
    h.editor_mut().buffer.push_str("\n// unsaved");
    h.shell_mut().confirm = true;
    h.backend().load_reply("/src/main.go", "package main");

    let outcome = h.controller.reload(Path::new("/src/main.go")).await.unwrap();

    assert_eq!(outcome, ReloadOutcome::Loaded);
    assert_eq!(h.shell().confirmations(), 1);
    assert_eq!(h.editor().buffer, "package main");
}

#[tokio::test]
async fn scenario_c_modified_reload_declined_sends_nothing() {
    let mut h = Harness::new().loaded("/src/main.go", "package main").await;
    h.editor_mut().buffer.push_str("\n// unsaved");
    h.shell_mut().confirm = false;

    let outcome = h.controller.reload(Path::new("/src/main.go")).await.unwrap();

    assert_eq!(outcome, ReloadOutcome::Declined);
    assert_eq!(h.shell().confirmations(), 1);
    assert_eq!(h.editor().buffer, "package main\n// unsaved");
    assert_eq!(h.backend().verbs(), vec![Verb::Load]);
}

#[tokio::test]
async fn scenario_d_single_diagnostic() {
    let mut h = Harness::new();
    h.backend().reply(Verb::Run, diagnostic_reply());

    h.controller.dispatch(HostCommand::Run).await.unwrap();

    assert_eq!(h.editor().annotations.len(), 1);
    assert_eq!(h.editor().annotations[0].position.row, 4);
    assert_eq!(h.editor().cursor.map(|c| c.row), Some(4));
    assert_eq!(h.controller.gate().state(), ArmState::Disarmed);
}

#[tokio::test]
async fn scenario_e_picker_routes_by_extension() {
    let mut h = Harness::new();
    h.backend()
        .load_reply("main.go", "package main")
        .reply(Verb::LoadSprites, json!({"spriteData": "R0lGODlh"}));

    assert_eq!(
        h.controller.open(Path::new("main.go")).await.unwrap(),
        OpenTarget::Source
    );
    assert_eq!(
        h.controller.open(Path::new("sheet.png")).await.unwrap(),
        OpenTarget::Sprites
    );

    assert_eq!(
        h.backend().requests(),
        vec![
            Request::Load(PathArgs {
                path: PathBuf::from("main.go")
            }),
            Request::LoadSprites(PathArgs {
                path: PathBuf::from("sheet.png")
            }),
        ]
    );
    assert_eq!(
        h.store.take_pending_sprites().unwrap(),
        Some(SpriteAsset {
            data: "R0lGODlh".to_string()
        })
    );
    assert_eq!(h.shell().view(), Some(View::Sprites));
}

#[tokio::test]
async fn open_command_uses_picker() {
    let mut h = Harness::new();
    h.shell_mut().open_pick = Some(PathBuf::from("/carts/demo.go"));
    h.backend().load_reply("/carts/demo.go", "package demo");

    h.controller.dispatch(HostCommand::Open).await.unwrap();
    assert_eq!(h.editor().buffer, "package demo");

    h.shell_mut().open_pick = None;
    h.controller.dispatch(HostCommand::Open).await.unwrap();
    assert_eq!(h.backend().verbs(), vec![Verb::Load]);
}

#[tokio::test]
async fn sprite_load_failure_stores_nothing() {
    let mut h = Harness::new();
    h.backend().fail(Verb::LoadSprites, "Failed to open file: sheet.gif");

    assert!(h.controller.open(Path::new("sheet.gif")).await.is_err());

    assert_eq!(h.store.sprites(), None);
    assert_eq!(h.store.take_pending_sprites().unwrap(), None);
    assert_eq!(h.shell().view(), None);
    assert_eq!(h.shell().errors()[0].0, "Load Error");
}

#[tokio::test]
async fn save_sprites_sends_sprite_data() {
    let mut h = Harness::new();
    h.store
        .put_sprites(SpriteAsset {
            data: "R0lGODlhAQABAAAAACw=".to_string(),
        })
        .unwrap();
    h.backend().save_reply("/carts/sheet.gif");

    let saved = h
        .controller
        .save_sprites(Path::new("/carts/sheet.gif"))
        .await
        .unwrap();

    assert_eq!(saved, PathBuf::from("/carts/sheet.gif"));
    assert_eq!(
        h.backend().requests(),
        vec![Request::Save(SourceArgs {
            path: PathBuf::from("/carts/sheet.gif"),
            source: "R0lGODlhAQABAAAAACw=".to_string(),
        })]
    );
}

#[tokio::test]
async fn save_sprites_without_data_sends_nothing() {
    let mut h = Harness::new();

    assert!(
        h.controller
            .save_sprites(Path::new("/carts/sheet.gif"))
            .await
            .is_err()
    );

    assert!(h.backend().requests().is_empty());
    assert_eq!(h.shell().errors()[0].0, "Save Error");
}

#[tokio::test]
async fn save_command_on_untitled_buffer_asks_for_path() {
    let mut h = Harness::with_editor(RecordingEditor::with_text("package main"));
    h.shell_mut().save_pick = Some(PathBuf::from("/carts/new.go"));
    h.backend().save_reply("/carts/new.go");

    h.controller.dispatch(HostCommand::Save).await.unwrap();

    assert_eq!(
        h.controller.tracker().document().path(),
        Some(Path::new("/carts/new.go"))
    );
    assert_eq!(h.shell().title(), Some("/carts/new.go"));
}

#[tokio::test]
async fn save_as_cancelled_sends_nothing() {
    let mut h = Harness::new();

    h.controller.dispatch(HostCommand::SaveAs).await.unwrap();

    assert!(h.backend().requests().is_empty());
}

#[tokio::test]
async fn save_command_reuses_current_path() {
    let mut h = Harness::new().loaded("/src/main.go", "package main").await;
    h.backend().save_reply("/src/main.go");

    h.controller.dispatch(HostCommand::Save).await.unwrap();

    assert_eq!(h.backend().verbs(), vec![Verb::Load, Verb::Save]);
}

#[tokio::test]
async fn new_document_is_untitled_and_unsaved() {
    let mut h = Harness::new().loaded("/src/main.go", "package main").await;

    h.controller
        .dispatch(HostCommand::New("package main\n\nfunc main() {}\n".to_string()))
        .await
        .unwrap();

    assert_eq!(h.shell().title(), Some("<untitled>"));
    assert_eq!(h.controller.tracker().document().path(), None);
    assert!(
        h.controller
            .tracker()
            .document()
            .is_modified(&h.editor().buffer)
    );
}

#[tokio::test]
async fn about_shows_message() {
    let mut h = Harness::new();

    h.controller
        .dispatch(HostCommand::About("cart-studio 0.1".to_string()))
        .await
        .unwrap();

    assert_eq!(
        h.shell().events,
        vec![ShellEvent::Message {
            title: "About".to_string(),
            message: "cart-studio 0.1".to_string()
        }]
    );
}

#[tokio::test]
async fn queued_host_commands_run_in_order() {
    let mut h = Harness::new();
    h.shell_mut().open_pick = Some(PathBuf::from("/src/main.go"));
    h.backend()
        .load_reply("/src/main.go", "package main")
        .reply(Verb::Run, json!({}));

    let (forwarder, mut rx) = CommandForwarder::channel();
    assert_eq!(forwarder.handle(HostCommand::Open), json!("open clicked!"));
    assert_eq!(forwarder.handle(HostCommand::Run), json!("run clicked!"));
    drop(forwarder);

    while let Some(command) = rx.recv().await {
        h.controller.dispatch(command).await.unwrap();
    }

    assert_eq!(h.backend().verbs(), vec![Verb::Load, Verb::Run]);
    assert_eq!(h.backend().unused(), 0);
    assert_eq!(h.shell().view(), Some(View::Run));
}
