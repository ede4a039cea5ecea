//! The cart editor session.
//!
//! A [`Controller`] owns everything one editing session needs: the
//! [`SourceTracker`] for the open document, the [`Orchestrator`] that compiles
//! and runs it, the [`SandboxGate`] deciding whether the run surface may
//! execute the generated cart, and the [`SpriteLoader`] side channel. The
//! editor widget and window chrome are reached through the [`Editor`] and
//! [`Shell`] traits, the backend through [`bridge::Backend`].
//!
//! Host commands arrive on the bridge's reader task. [`CommandForwarder`]
//! queues them and the controller handles them one at a time.

mod controller;
mod dispatch;
mod gate;
mod orchestrator;
mod sprites;
mod tracker;
mod ui;

pub mod testing;

pub use controller::{Controller, SessionOptions};
pub use dispatch::CommandForwarder;
pub use gate::{Activation, ModuleHost, SandboxGate, cart_path};
pub use orchestrator::{Orchestrator, RunOutcome, RunState};
pub use sprites::SpriteLoader;
pub use tracker::{OpenTarget, ReloadOutcome, SourceDocument, SourceTracker};
pub use ui::{Annotation, Editor, Frontend, Position, Shell, View, titles};
