//! audc-run - Tree-walking interpreter for type-checked Aud programs.
//!
//! The interpreter owns two private collaborators: the [`Environment`]
//! (function table, bounded call-context stack, block scopes and the slot
//! store that gives variables their reference semantics) and the
//! [`DomainWorld`] (the folder/file/audio object graph mirroring the backing
//! filesystem). `print`/`input` go through the [`Console`] seam so tests can
//! script them.
//!
//! Execution is fail-fast: the first runtime fault unwinds every scope and
//! call context and is returned as a single [`Fault`].

pub mod console;
pub mod env;
pub mod interp;
pub mod value;
pub mod world;

pub use console::{BufferConsole, Console, StdConsole};
pub use env::Environment;
pub use interp::Interpreter;
pub use value::Value;
pub use world::{AudioMeta, Backing, DirEntry, DiskBacking, DomainWorld, MemoryBacking};

use audc_util::{DiagnosticKind, Span};
use thiserror::Error;

/// A runtime fault: one diagnostic, then the run terminates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("[{}, {}] {kind}", .span.line, .span.column)]
pub struct Fault {
    pub kind: DiagnosticKind,
    pub span: Span,
}

impl Fault {
    pub fn new(kind: DiagnosticKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Result type used throughout the interpreter.
pub type RunResult<T> = Result<T, Fault>;
