//! Testing utilities for the session.
//!
//! A [`ScriptedBackend`] answers requests from a queue of canned replies, and
//! the recording editor, shell and module host remember everything the session
//! asked of them.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use bridge::{Backend, BridgeError, Reply};
use protocol::{Request, Verb};
use serde_json::{Value, json};
use state::{ArmState, ArmStore};

use crate::gate::ModuleHost;
use crate::ui::{Annotation, Editor, Position, Shell, View};

/// A backend that replays scripted replies in order.
///
/// Every request is recorded. A request arriving with nothing scripted fails
/// with [`BridgeError::Closed`], as does one whose verb does not match the
/// next scripted reply.
#[derive(Default)]
pub struct ScriptedBackend {
    script: RefCell<VecDeque<(Verb, Result<Value, String>)>>,
    requests: RefCell<Vec<Request>>,
    next_id: Cell<u64>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a success reply for the next `verb` request.
    pub fn reply(&self, verb: Verb, payload: Value) -> &Self {
        self.script.borrow_mut().push_back((verb, Ok(payload)));
        self
    }

    /// Queue an `error` reply for the next `verb` request.
    pub fn fail(&self, verb: Verb, message: impl Into<String>) -> &Self {
        self.script.borrow_mut().push_back((verb, Err(message.into())));
        self
    }

    /// Queue a `load` reply echoing `path` with `source`.
    pub fn load_reply(&self, path: impl AsRef<Path>, source: &str) -> &Self {
        self.reply(
            Verb::Load,
            json!({"path": path.as_ref(), "source": source}),
        )
    }

    /// Queue a `save` reply echoing `path`.
    pub fn save_reply(&self, path: impl AsRef<Path>) -> &Self {
        self.reply(Verb::Save, json!({"path": path.as_ref()}))
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.borrow().clone()
    }

    /// Verbs of every request received so far.
    pub fn verbs(&self) -> Vec<Verb> {
        self.requests.borrow().iter().map(Request::verb).collect()
    }

    /// Scripted replies nobody asked for.
    pub fn unused(&self) -> usize {
        self.script.borrow().len()
    }
}

impl Backend for ScriptedBackend {
    async fn send(&self, request: Request) -> Result<Reply, BridgeError> {
        let verb = request.verb();
        self.requests.borrow_mut().push(request);

        let id = self.next_id.get() + 1;
        self.next_id.set(id);

        let (expected, outcome) = self.script.borrow_mut().pop_front().ok_or(BridgeError::Closed)?;
        if expected != verb {
            tracing::error!(%expected, %verb, "unexpected request");
            return Err(BridgeError::Closed);
        }

        Ok(match outcome {
            Ok(payload) => Reply {
                id,
                name: verb.as_str().to_string(),
                payload,
            },
            Err(message) => Reply::error(id, message),
        })
    }
}

/// An editor that keeps its buffer in memory and records what it was told.
#[derive(Debug, Default)]
pub struct RecordingEditor {
    pub buffer: String,
    pub annotations: Vec<Annotation>,
    pub cursor: Option<Position>,
    pub scrolled_to: Option<u32>,
    pub annotation_clears: usize,
}

impl RecordingEditor {
    pub fn with_text(text: &str) -> Self {
        Self {
            buffer: text.to_string(),
            ..Default::default()
        }
    }
}

impl Editor for RecordingEditor {
    fn text(&self) -> String {
        self.buffer.clone()
    }

    fn set_text(&mut self, text: &str) {
        self.buffer = text.to_string();
    }

    fn set_annotations(&mut self, annotations: Vec<Annotation>) {
        self.annotations = annotations;
    }

    fn clear_annotations(&mut self) {
        self.annotations.clear();
        self.annotation_clears += 1;
    }

    fn move_cursor(&mut self, position: Position) {
        self.cursor = Some(position);
    }

    fn scroll_to_line(&mut self, row: u32) {
        self.scrolled_to = Some(row);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    Error { title: String, message: String },
    Message { title: String, message: String },
    ConfirmDiscard,
    Title(String),
    RawOutput(String),
    View(View),
    /// The sandbox surface reloaded and saw this arm state.
    ReloadSandbox(Option<ArmState>),
}

/// A shell that records every call and answers dialogs from canned values.
#[derive(Default)]
pub struct RecordingShell {
    pub events: Vec<ShellEvent>,
    /// Answer to discard confirmations.
    pub confirm: bool,
    pub open_pick: Option<PathBuf>,
    pub save_pick: Option<PathBuf>,
    arm_probe: Option<Box<dyn ArmStore>>,
}

impl RecordingShell {
    /// Record the arm state a reloading sandbox surface would read.
    pub fn observe_arm(mut self, store: impl ArmStore + 'static) -> Self {
        self.arm_probe = Some(Box::new(store));
        self
    }

    pub fn errors(&self) -> Vec<(String, String)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ShellEvent::Error { title, message } => Some((title.clone(), message.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn confirmations(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, ShellEvent::ConfirmDiscard))
            .count()
    }

    pub fn title(&self) -> Option<&str> {
        self.events.iter().rev().find_map(|e| match e {
            ShellEvent::Title(title) => Some(title.as_str()),
            _ => None,
        })
    }

    pub fn view(&self) -> Option<View> {
        self.events.iter().rev().find_map(|e| match e {
            ShellEvent::View(view) => Some(*view),
            _ => None,
        })
    }

    pub fn raw_output(&self) -> Option<&str> {
        self.events.iter().rev().find_map(|e| match e {
            ShellEvent::RawOutput(text) => Some(text.as_str()),
            _ => None,
        })
    }
}

impl Shell for RecordingShell {
    fn show_error(&mut self, title: &str, message: &str) {
        self.events.push(ShellEvent::Error {
            title: title.to_string(),
            message: message.to_string(),
        });
    }

    fn show_message(&mut self, title: &str, message: &str) {
        self.events.push(ShellEvent::Message {
            title: title.to_string(),
            message: message.to_string(),
        });
    }

    fn confirm_discard(&mut self) -> bool {
        self.events.push(ShellEvent::ConfirmDiscard);
        self.confirm
    }

    fn pick_open_file(&mut self) -> Option<PathBuf> {
        self.open_pick.clone()
    }

    fn pick_save_file(&mut self) -> Option<PathBuf> {
        self.save_pick.clone()
    }

    fn set_title(&mut self, title: &str) {
        self.events.push(ShellEvent::Title(title.to_string()));
    }

    fn set_raw_output(&mut self, text: &str) {
        self.events.push(ShellEvent::RawOutput(text.to_string()));
    }

    fn switch_view(&mut self, view: View) {
        self.events.push(ShellEvent::View(view));
    }

    fn reload_sandbox(&mut self) {
        let seen = self.arm_probe.as_ref().map(|store| store.read_arm());
        self.events.push(ShellEvent::ReloadSandbox(seen));
    }
}

/// A module host that records which modules it was asked to run.
#[derive(Debug, Default)]
pub struct RecordingModuleHost {
    pub executed: Vec<PathBuf>,
    pub noops: usize,
    /// Make `execute_module` fail.
    pub fail: bool,
}

impl ModuleHost for RecordingModuleHost {
    fn execute_module(&mut self, path: &Path) -> eyre::Result<()> {
        if self.fail {
            eyre::bail!("module {} failed to load", path.display());
        }
        self.executed.push(path.to_path_buf());
        Ok(())
    }

    fn attach_noop(&mut self) {
        self.noops += 1;
    }
}
