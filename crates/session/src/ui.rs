use std::path::PathBuf;

use bridge::BridgeError;
use protocol::DiagnosticKind;

/// Titles of the error boxes the session raises.
pub mod titles {
    pub const INIT_ERROR: &str = "Init Error";
    pub const LOAD_ERROR: &str = "Load Error";
    pub const SAVE_ERROR: &str = "Save Error";
    pub const COMPILE_ERROR: &str = "Compile Error";
    pub const RUN_ERROR: &str = "Run Error";
    pub const ABOUT: &str = "About";
    pub const UNTITLED: &str = "<untitled>";
}

/// A 0-based position in the editor buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub row: u32,
    pub column: u32,
}

impl Position {
    pub fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }
}

/// A compiler diagnostic pinned to the editor gutter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub position: Position,
    pub text: String,
    pub kind: DiagnosticKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Code,
    Sprites,
    Run,
}

/// The text editor widget.
pub trait Editor {
    /// The live buffer.
    fn text(&self) -> String;
    fn set_text(&mut self, text: &str);
    fn set_annotations(&mut self, annotations: Vec<Annotation>);
    fn clear_annotations(&mut self);
    fn move_cursor(&mut self, position: Position);
    fn scroll_to_line(&mut self, row: u32);
}

/// Window chrome: dialogs, pickers, title, panels and surfaces.
pub trait Shell {
    fn show_error(&mut self, title: &str, message: &str);
    fn show_message(&mut self, title: &str, message: &str);
    /// Ask before throwing away unsaved edits. `true` means go ahead.
    fn confirm_discard(&mut self) -> bool;
    fn pick_open_file(&mut self) -> Option<PathBuf>;
    fn pick_save_file(&mut self) -> Option<PathBuf>;
    fn set_title(&mut self, title: &str);
    /// Contents of the raw compiler output panel.
    fn set_raw_output(&mut self, text: &str);
    fn switch_view(&mut self, view: View);
    /// Re-initialise the sandbox run surface.
    fn reload_sandbox(&mut self);
}

/// The editor and shell a session drives.
pub struct Frontend<E, S> {
    pub editor: E,
    pub shell: S,
}

impl<E, S> Frontend<E, S>
where
    E: Editor,
    S: Shell,
{
    pub fn new(editor: E, shell: S) -> Self {
        Self { editor, shell }
    }

    /// Show `error` in a titled error box and hand it back as a report.
    pub(crate) fn surface(&mut self, title: &'static str, error: BridgeError) -> eyre::Report {
        tracing::warn!(%title, %error, "request failed");
        self.shell.show_error(title, &error.to_string());
        eyre::Report::new(error).wrap_err(title)
    }
}
