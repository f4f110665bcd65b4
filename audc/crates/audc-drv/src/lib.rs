//! audc-drv - Pipeline driver for the Aud interpreter.
//!
//! A [`Session`] runs one source text through the four stages in order:
//! lex, parse, type-check, interpret. Any diagnostic from a stage stops the
//! pipeline before the next stage; a [`RunMode`] other than the default
//! stops it early on purpose and renders that stage's result instead.

use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing::debug;

use audc_lex::Lexer;
use audc_par::{pretty, Parser};
use audc_run::{Backing, Console, Interpreter};
use audc_sem::TypeChecker;
use audc_util::{Handler, Limits};

/// How far the pipeline runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunMode {
    /// Emit tokens, then stop.
    Lex,
    /// Emit the pretty-printed tree, then stop.
    Parse,
    /// Run the type checker, then stop.
    Check,
    /// Full execution.
    #[default]
    Run,
}

/// Result of one session: stage output (for the early-stop modes), rendered
/// diagnostics, and whether the run succeeded.
#[derive(Debug)]
pub struct Report {
    /// Token dump or pretty-printed tree, present for `lex`/`parse` modes.
    pub output: Option<String>,
    /// One `[line, column] <Message>` per line, in source order; empty on
    /// success.
    pub diagnostics: String,
    pub success: bool,
}

impl Report {
    fn failure(handler: &Handler) -> Self {
        Self {
            output: None,
            diagnostics: handler.render(),
            success: false,
        }
    }

    fn success(output: Option<String>) -> Self {
        Self {
            output,
            diagnostics: String::new(),
            success: true,
        }
    }
}

/// One interpreter invocation.
pub struct Session {
    mode: RunMode,
    limits: Limits,
}

impl Session {
    pub fn new(mode: RunMode, limits: Limits) -> Self {
        Self { mode, limits }
    }

    /// Runs the pipeline over `source`.
    ///
    /// The console and backing store are injected so the command line can
    /// pass real stdio and the real filesystem while tests script both.
    pub fn run(
        &self,
        source: &str,
        console: &mut dyn Console,
        backing: Box<dyn Backing>,
    ) -> Report {
        let handler = Handler::new();

        debug!("lexing");
        let mut lexer = Lexer::new(source, self.limits.clone(), &handler);
        let tokens = lexer.tokenize();
        if self.mode == RunMode::Lex {
            let dump = tokens
                .iter()
                .map(|t| format!("[{}, {}] {}", t.span.line, t.span.column, t.kind))
                .collect::<Vec<_>>()
                .join("\n");
            if handler.has_errors() {
                let mut report = Report::failure(&handler);
                report.output = Some(dump);
                return report;
            }
            return Report::success(Some(dump));
        }
        if handler.has_errors() {
            debug!(errors = handler.error_count(), "lexing failed");
            return Report::failure(&handler);
        }

        debug!("parsing");
        let program = Parser::new(tokens, &handler).parse_program();
        if self.mode == RunMode::Parse {
            if handler.has_errors() {
                return Report::failure(&handler);
            }
            return Report::success(Some(pretty::program(&program)));
        }
        if handler.has_errors() {
            debug!(errors = handler.error_count(), "parsing failed");
            return Report::failure(&handler);
        }

        debug!("type checking");
        TypeChecker::new(&handler).check(&program);
        if handler.has_errors() {
            debug!(errors = handler.error_count(), "type checking failed");
            return Report::failure(&handler);
        }
        if self.mode == RunMode::Check {
            return Report::success(None);
        }

        debug!("interpreting");
        let mut interp = Interpreter::new(self.limits.clone(), backing, console);
        match interp.run(&program) {
            Ok(()) => Report::success(None),
            Err(fault) => Report {
                output: None,
                diagnostics: fault.to_string(),
                success: false,
            },
        }
    }
}

/// Loads the limits configuration from a JSON file. Unknown keys are
/// ignored; missing keys take their defaults.
pub fn load_limits(path: &Path) -> anyhow::Result<Limits> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse configuration {}", path.display()))
}
