//! Terminal stand-ins for the editor widget, the window chrome and the run surface.

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use eyre::WrapErr;
use session::{Annotation, Editor, ModuleHost, Position, Shell, View};

/// Answers for the dialogs, given ahead of time on the command line.
#[derive(Default)]
pub struct Prompts {
    open_pick: RefCell<Option<PathBuf>>,
    save_pick: RefCell<Option<PathBuf>>,
    force_discard: Cell<bool>,
    sandbox_reload: Cell<bool>,
    sprite_view: Cell<bool>,
}

impl Prompts {
    pub fn answer_open(&self, path: PathBuf) {
        *self.open_pick.borrow_mut() = Some(path);
    }

    pub fn answer_save(&self, path: PathBuf) {
        *self.save_pick.borrow_mut() = Some(path);
    }

    /// Confirm the next discard prompt.
    pub fn force_discard(&self) {
        self.force_discard.set(true);
    }

    pub fn reset_discard(&self) {
        self.force_discard.set(false);
    }

    /// Whether the run surface was asked to reload since the last call.
    pub fn take_sandbox_reload(&self) -> bool {
        self.sandbox_reload.take()
    }

    /// Whether the sprite view was brought up since the last call.
    pub fn take_sprite_view(&self) -> bool {
        self.sprite_view.take()
    }
}

#[derive(Default)]
pub struct TerminalEditor {
    buffer: String,
    annotations: Vec<Annotation>,
    cursor: Position,
}

impl TerminalEditor {
    /// Print the buffer with line numbers, marking annotated lines and the cursor.
    pub fn show(&self) {
        for (row, line) in self.buffer.lines().enumerate() {
            let row = row as u32;
            let marker = if self.annotations.iter().any(|a| a.position.row == row) {
                '!'
            } else if self.cursor.row == row {
                '>'
            } else {
                ' '
            };
            println!("{marker}{:>4} | {line}", row + 1);
        }
    }
}

impl Editor for TerminalEditor {
    fn text(&self) -> String {
        self.buffer.clone()
    }

    fn set_text(&mut self, text: &str) {
        self.buffer = text.to_string();
        self.cursor = Position::default();
    }

    fn set_annotations(&mut self, annotations: Vec<Annotation>) {
        for annotation in &annotations {
            println!(
                "  {}:{}: {:?}: {}",
                annotation.position.row + 1,
                annotation.position.column,
                annotation.kind,
                annotation.text
            );
        }
        self.annotations = annotations;
    }

    fn clear_annotations(&mut self) {
        self.annotations.clear();
    }

    fn move_cursor(&mut self, position: Position) {
        self.cursor = position;
    }

    fn scroll_to_line(&mut self, row: u32) {
        tracing::trace!(row, "scroll");
    }
}

pub struct TerminalShell {
    prompts: Rc<Prompts>,
}

impl TerminalShell {
    pub fn new(prompts: Rc<Prompts>) -> Self {
        Self { prompts }
    }
}

impl Shell for TerminalShell {
    fn show_error(&mut self, title: &str, message: &str) {
        println!("[{title}] {message}");
    }

    fn show_message(&mut self, title: &str, message: &str) {
        println!("[{title}] {message}");
    }

    fn confirm_discard(&mut self) -> bool {
        if self.prompts.force_discard.take() {
            return true;
        }
        println!("buffer has unsaved changes, use `reload!` to discard them");
        false
    }

    fn pick_open_file(&mut self) -> Option<PathBuf> {
        self.prompts.open_pick.borrow_mut().take()
    }

    fn pick_save_file(&mut self) -> Option<PathBuf> {
        self.prompts.save_pick.borrow_mut().take()
    }

    fn set_title(&mut self, title: &str) {
        println!("== {title} ==");
    }

    fn set_raw_output(&mut self, text: &str) {
        if !text.is_empty() {
            println!("{text}");
        }
    }

    fn switch_view(&mut self, view: View) {
        let name = match view {
            View::Code => "code",
            View::Sprites => {
                self.prompts.sprite_view.set(true);
                "sprites"
            }
            View::Run => "run",
        };
        println!("[view: {name}]");
    }

    fn reload_sandbox(&mut self) {
        self.prompts.sandbox_reload.set(true);
    }
}

/// Stands in for the run surface: reports the cart it would execute.
pub struct TerminalModuleHost;

impl ModuleHost for TerminalModuleHost {
    fn execute_module(&mut self, path: &Path) -> eyre::Result<()> {
        let metadata = std::fs::metadata(path)
            .wrap_err_with(|| format!("reading generated cart {}", path.display()))?;
        println!("running cart {} ({} bytes)", path.display(), metadata.len());
        Ok(())
    }

    fn attach_noop(&mut self) {
        println!("sandbox idle");
    }
}
