//! Typed view of the messages exchanged with the cart backend.
//!
//! The wire envelopes in the `wire` crate carry a verb name and an untyped
//! JSON payload. This crate turns them into tagged unions over the finite
//! verb sets, so adding a verb is a compile-time-checked change:
//!
//! - [`Request`]: what the controller asks of the backend
//! - [`HostCommand`]: what the window chrome asks of the controller
//! - reply payloads such as [`LoadReply`] and [`RunReply`]
mod diagnostics;
mod error;
mod host;
mod payloads;
mod request;

pub use diagnostics::{CompileDiagnostic, CompileResult, DiagnosticKind};
pub use error::ProtocolError;
pub use host::HostCommand;
pub use payloads::{LoadReply, PathArgs, RunReply, SaveReply, ScreenSize, SourceArgs, SpritesReply};
pub use request::{Request, Verb};

/// Extension of source files the backend knows how to compile.
pub const DEFAULT_SOURCE_EXTENSION: &str = "go";
