//! Diagnostic reporting infrastructure.
//!
//! Every stage of the pipeline reports problems through a shared [`Handler`].
//! Compile-time stages accumulate and keep going where they can resynchronize;
//! the interpreter reports exactly one fault and stops. Either way the user
//! sees one line per diagnostic in the `[line, column] <Message>` format.
//!
//! # Examples
//!
//! ```
//! use audc_util::{DiagnosticKind, Handler, Span};
//!
//! let handler = Handler::new();
//! handler.report(DiagnosticKind::InvalidSymbol, Span::point(1, 3));
//!
//! assert!(handler.has_errors());
//! assert_eq!(handler.render(), "[1, 3] Invalid symbol");
//! ```

use std::cell::RefCell;
use std::fmt;

use thiserror::Error;

use crate::span::Span;

/// Every kind of problem the pipeline can report, compile-time and runtime.
///
/// The `Display` text is the exact message printed to the user; two kinds
/// (`UndeclaredVariable`, `InvalidCondition`) are shared between the type
/// checker and the interpreter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum DiagnosticKind {
    // Lexer.
    #[error("Invalid symbol")]
    InvalidSymbol,
    #[error("Missing comment close")]
    MissingCommentClose,
    #[error("Max string length exceeded")]
    MaxStringLengthExceeded,
    #[error("Max identifier length exceeded")]
    MaxIdentifierLengthExceeded,
    #[error("Max comment length exceeded")]
    MaxCommentLengthExceeded,
    #[error("Invalid value")]
    InvalidValue,

    // Parser.
    #[error("Unexpected token")]
    UnexpectedToken,
    #[error("Missing parentheses")]
    MissingParentheses,

    // Type checker.
    #[error("Invalid declaration")]
    InvalidDeclaration,
    #[error("Invalid condition")]
    InvalidCondition,
    #[error("Invalid type")]
    InvalidType,
    #[error("Invalid argument type")]
    InvalidArgumentType,
    #[error("Function/Method redeclaration")]
    FunctionRedeclaration,
    #[error("Undeclared variable")]
    UndeclaredVariable,

    // Interpreter.
    #[error("Type conversion exception")]
    TypeConversionException,
    #[error("File not found")]
    FileNotFound,
    #[error("List index out of bounds")]
    ListIndexOutOfBounds,
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Call stack limit exceeded")]
    CallStackLimitExceeded,
}

/// A single reported problem: what went wrong and where.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, span: Span) -> Self {
        Self { kind, span }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}] {}",
            self.span.line, self.span.column, self.kind
        )
    }
}

/// Collects diagnostics across the stages of one run.
///
/// Interior mutability lets the lexer, parser and checker share one handler
/// by plain reference; emission order is source order because every stage
/// walks the source front to back.
#[derive(Debug, Default)]
pub struct Handler {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl Handler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a diagnostic at the given position.
    pub fn report(&self, kind: DiagnosticKind, span: Span) {
        self.diagnostics.borrow_mut().push(Diagnostic::new(kind, span));
    }

    /// True if anything has been reported. Any diagnostic prevents the next
    /// stage from running.
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.borrow().is_empty()
    }

    /// Number of reported diagnostics.
    pub fn error_count(&self) -> usize {
        self.diagnostics.borrow().len()
    }

    /// Snapshot of everything reported so far, in emission order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Render all diagnostics, one `[line, column] <Message>` per line.
    pub fn render(&self) -> String {
        self.diagnostics
            .borrow()
            .iter()
            .map(Diagnostic::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
