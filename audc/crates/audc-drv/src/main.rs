//! audc - command-line entry point for the Aud interpreter.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use audc_drv::{load_limits, RunMode, Session};
use audc_run::{DiskBacking, StdConsole};
use audc_util::Limits;

/// Interpreter for the Aud language.
#[derive(Parser, Debug)]
#[command(name = "audc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Interpreter for the Aud language", long_about = None)]
struct Cli {
    /// Aud source file to run
    #[arg(required_unless_present = "eval")]
    file: Option<PathBuf>,

    /// Inline source code instead of a file
    #[arg(short, long, conflicts_with = "file")]
    eval: Option<String>,

    /// Stop after an earlier pipeline stage
    #[arg(short, long, value_enum, default_value = "run")]
    mode: Mode,

    /// Path to a JSON configuration file with interpreter limits
    #[arg(short, long, env = "AUDC_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, env = "AUDC_VERBOSE")]
    verbose: bool,
}

/// Pipeline stop point.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    /// Emit tokens and stop
    Lex,
    /// Emit the parse tree and stop
    Parse,
    /// Type-check and stop
    Check,
    /// Full execution (default)
    Run,
}

impl From<Mode> for RunMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Lex => RunMode::Lex,
            Mode::Parse => RunMode::Parse,
            Mode::Check => RunMode::Check,
            Mode::Run => RunMode::Run,
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(success) => {
            if success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<bool> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let limits = match &cli.config {
        Some(path) => load_limits(path)?,
        None => Limits::default(),
    };

    let source = match (&cli.file, &cli.eval) {
        (_, Some(code)) => code.clone(),
        (Some(path), None) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => unreachable!("clap requires a source"),
    };

    let session = Session::new(cli.mode.into(), limits);
    let mut console = StdConsole;
    let report = session.run(&source, &mut console, Box::new(DiskBacking));

    if let Some(output) = &report.output {
        println!("{output}");
    }
    if !report.diagnostics.is_empty() {
        eprintln!("{}", report.diagnostics);
    }
    Ok(report.success)
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init();
}
