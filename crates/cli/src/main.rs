use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::rc::Rc;
use std::sync::Mutex;

use bridge::{Bridge, BridgeOptions};
use clap::Parser;
use color_eyre::eyre::{self, Context};
use protocol::HostCommand;
use session::{CommandForwarder, Controller, Editor, Frontend, SessionOptions};
use state::{SpriteStore, StateManager};
use tokio::process::ChildStdin;
use tokio::sync::mpsc;
use tracing_subscriber::filter::EnvFilter;
use wire::ChildStdio;

mod terminal;

use terminal::{Prompts, TerminalEditor, TerminalModuleHost, TerminalShell};

const NEW_TEMPLATE: &str = "package main\n\nfunc main() {\n}\n";

type App = Controller<Bridge<ChildStdin>, TerminalEditor, TerminalShell, StateManager>;

#[derive(Debug, Parser)]
struct Args {
    /// Source or sprite file to open at startup.
    file: Option<PathBuf>,

    /// Configuration file.
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Directory for cart sources and the generated cart.
    #[clap(short, long)]
    working_dir: Option<PathBuf>,

    /// State file shared with the run surface.
    #[clap(long)]
    state: Option<PathBuf>,

    #[clap(long, default_value = "cart-studio.log")]
    log_file: PathBuf,
}

enum ShouldQuit {
    True,
    False,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install().context("installing color_eyre")?;
    let args = Args::parse();

    let log_file = std::fs::File::create(&args.log_file).context("creating log file")?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(Mutex::new(log_file))
        .init();

    let config = config::load_from_path(args.config.as_deref()).context("loading config")?;
    let working_directory = match args.working_dir.or(config.working_directory.clone()) {
        Some(dir) => dir,
        None => std::env::current_dir().context("finding current directory")?,
    };
    let state_path = args
        .state
        .or(config.state_path.clone())
        .or_else(state::default_state_path)
        .unwrap_or_else(|| PathBuf::from("/tmp/cart-studio/state.json"));
    tracing::debug!(
        working_directory = %working_directory.display(),
        state_path = %state_path.display(),
        "starting"
    );
    let state_manager = StateManager::new(&state_path).wrap_err("loading state")?;

    tracing::debug!(program = %config.backend.program, args = ?config.backend.args, "spawning backend");
    let mut child = tokio::process::Command::new(&config.backend.program)
        .args(&config.backend.args)
        .current_dir(&working_directory)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .wrap_err_with(|| format!("spawning backend {}", config.backend.program))?;
    let stdio = ChildStdio::take(&mut child).ok_or_else(|| eyre::eyre!("backend stdio not piped"))?;

    let (forwarder, mut host_rx) = CommandForwarder::channel();
    let bridge = Bridge::over(
        stdio,
        forwarder,
        BridgeOptions {
            request_timeout: config.request_timeout(),
            max_message_size: config
                .max_message_bytes
                .unwrap_or(wire::DEFAULT_MAX_MESSAGE_SIZE),
        },
    );

    let mut busy = bridge.busy();
    tokio::spawn(async move {
        while let Some(is_busy) = busy.changed().await {
            tracing::debug!(is_busy, "loader");
        }
    });

    let prompts = Rc::new(Prompts::default());
    let sprite_store = state_manager.clone();
    let mut app = Controller::new(
        bridge,
        Frontend::new(TerminalEditor::default(), TerminalShell::new(prompts.clone())),
        state_manager,
        SessionOptions {
            working_directory,
            source_extension: config.source_extension.clone(),
        },
    )
    .context("creating session")?;

    if let Err(e) = app.start().await {
        tracing::warn!(error = %e, "backend initialisation failed");
    }
    activate_sandbox(&app);

    if let Some(file) = &args.file {
        if let Err(e) = app.open(file).await {
            tracing::warn!(error = %e, "opening initial file");
        }
    }
    if prompts.take_sprite_view() {
        open_sprite_editor(&sprite_store);
    }

    let mut input_rx = spawn_input_thread();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let should_quit = tokio::select! {
            Some(command) = host_rx.recv() => {
                println!();
                if let Err(e) = app.dispatch(command).await {
                    tracing::warn!(error = %e, "host command failed");
                }
                ShouldQuit::False
            }
            input = input_rx.recv() => match input {
                Some(input) => handle_input(&mut app, &prompts, &input).await,
                None => ShouldQuit::True,
            },
        };

        if prompts.take_sandbox_reload() {
            activate_sandbox(&app);
        }
        if prompts.take_sprite_view() {
            open_sprite_editor(&sprite_store);
        }
        if let ShouldQuit::True = should_quit {
            break;
        }
    }

    drop(app);
    let _ = child.kill().await;
    Ok(())
}

fn spawn_input_thread() -> mpsc::UnboundedReceiver<String> {
    let (input_tx, input_rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if input_tx.send(line.trim().to_owned()).is_err() {
                break;
            }
        }
    });
    input_rx
}

/// The run surface has reloaded; let the gate decide what it runs.
fn activate_sandbox(app: &App) {
    if let Err(e) = app.activate_sandbox(&mut TerminalModuleHost) {
        println!("[Run Error] {e:#}");
    }
}

/// The sprite view has come up; hand it any sheet loaded for it.
fn open_sprite_editor(store: &StateManager) {
    match store.take_pending_sprites() {
        Ok(Some(sheet)) => println!("sprite editor: sheet of {} bytes", sheet.data.len()),
        Ok(None) => println!("sprite editor: no new sheet"),
        Err(e) => println!("[Load Error] {e:#}"),
    }
}

#[tracing::instrument(skip(app, prompts))]
async fn handle_input(app: &mut App, prompts: &Prompts, input: &str) -> ShouldQuit {
    let (command, argument) = match input.split_once(' ') {
        Some((command, argument)) => (command, Some(argument.trim())),
        None => (input, None),
    };

    let result = match (command, argument) {
        ("q" | "quit", _) => return ShouldQuit::True,
        ("", _) => Ok(()),
        ("run", _) => app.dispatch(HostCommand::Run).await,
        ("save", _) => app.dispatch(HostCommand::Save).await,
        ("saveas", Some(path)) => {
            prompts.answer_save(PathBuf::from(path));
            app.dispatch(HostCommand::SaveAs).await
        }
        ("open", Some(path)) => {
            prompts.answer_open(PathBuf::from(path));
            app.dispatch(HostCommand::Open).await
        }
        ("reload" | "reload!", _) => {
            if command == "reload!" {
                prompts.force_discard();
            }
            let reloaded = reload(app).await;
            prompts.reset_discard();
            reloaded
        }
        ("new", _) => {
            app.dispatch(HostCommand::New(NEW_TEMPLATE.to_string()))
                .await
        }
        ("edit", Some(path)) => edit(app, Path::new(path)),
        ("savesprites", Some(path)) => app.save_sprites(Path::new(path)).await.map(|_| ()),
        ("show", _) => {
            app.ui().editor.show();
            Ok(())
        }
        ("activate", _) => {
            activate_sandbox(app);
            Ok(())
        }
        (other, _) => {
            println!("Unhandled command: '{other}'");
            Ok(())
        }
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "command failed");
    }
    ShouldQuit::False
}

async fn reload(app: &mut App) -> eyre::Result<()> {
    let Some(path) = app.tracker().document().path().map(Path::to_path_buf) else {
        println!("nothing to reload");
        return Ok(());
    };
    app.reload(&path).await.map(|_| ())
}

/// Replace the live buffer with a local file, as if it had been typed in.
fn edit(app: &mut App, path: &Path) -> eyre::Result<()> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("reading {}", path.display()))?;
    app.ui_mut().editor.set_text(&text);
    Ok(())
}
