//! End-to-end pipeline tests over the library interface.
//!
//! Each test feeds a source text through a full [`Session`] with a scripted
//! console and an in-memory backing store, checking the observable contract:
//! stdout lines, rendered diagnostics, and exit status.

use audc_drv::{RunMode, Session};
use audc_run::{AudioMeta, BufferConsole, MemoryBacking};
use audc_util::Limits;

fn run_mode(source: &str, mode: RunMode, limits: Limits) -> (audc_drv::Report, Vec<String>) {
    let mut console = BufferConsole::new();
    let session = Session::new(mode, limits);
    let report = session.run(source, &mut console, Box::new(MemoryBacking::new()));
    (report, console.output)
}

fn run(source: &str) -> (audc_drv::Report, Vec<String>) {
    run_mode(source, RunMode::Run, Limits::default())
}

#[test]
fn hello_world() {
    let (report, output) = run("print(\"Hello world\");");
    assert!(report.success);
    assert!(report.diagnostics.is_empty());
    assert_eq!(output, vec!["Hello world"]);
}

#[test]
fn division_by_zero_diagnostic() {
    let (report, _) = run("int x = 10 / 0;");
    assert!(!report.success);
    assert_eq!(report.diagnostics, "[1, 9] Division by zero");
}

#[test]
fn type_error_skips_interpreter() {
    let (report, output) = run("print(\"side effect\");\nint x = \"abc\";");
    assert!(!report.success);
    assert_eq!(report.diagnostics, "[2, 9] Invalid type");
    // The interpreter never ran: no side effect reached the console.
    assert!(output.is_empty());
}

#[test]
fn unbounded_recursion_hits_stack_limit() {
    let (report, _) = run("func int r(int v) { return r(v + 1); }\nint y = r(1);");
    assert!(!report.success);
    assert!(report.diagnostics.contains("Call stack limit exceeded"));
}

#[test]
fn lexer_error_skips_parser() {
    let (report, _) = run("int x = 34a7;");
    assert!(!report.success);
    // Only the lexical diagnostic appears; parsing never ran.
    assert_eq!(report.diagnostics, "[1, 9] Invalid value");
}

#[test]
fn list_index_out_of_bounds() {
    let (report, _) = run("List<int> a = [10, 20]; print(itos(a.get(2)));");
    assert!(!report.success);
    // Column 36 is the start of the failing `a.get(2)` member call.
    assert_eq!(report.diagnostics, "[1, 36] List index out of bounds");
}

#[test]
fn multiple_parse_errors_reported_together() {
    let (report, _) = run("int x = ;\nint y = 2;\nint z = ;");
    assert!(!report.success);
    let lines: Vec<&str> = report.diagnostics.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("[1, "));
    assert!(lines[1].starts_with("[3, "));
}

#[test]
fn lex_mode_emits_tokens_and_stops() {
    let (report, output) = run_mode("int x = 1;", RunMode::Lex, Limits::default());
    assert!(report.success);
    assert!(output.is_empty());
    let dump = report.output.unwrap();
    assert!(dump.starts_with("[1, 1] int"));
    assert!(dump.contains("[1, 5] x"));
    assert!(dump.ends_with("<eof>"));
}

#[test]
fn lex_mode_still_reports_errors() {
    let (report, _) = run_mode("int @ = 1;", RunMode::Lex, Limits::default());
    assert!(!report.success);
    assert_eq!(report.diagnostics, "[1, 5] Invalid symbol");
    // Tokens are still emitted in lex mode.
    assert!(report.output.is_some());
}

#[test]
fn parse_mode_pretty_prints_and_stops() {
    let (report, output) = run_mode(
        "print(\"unreached\"); int x = 1 + 2;",
        RunMode::Parse,
        Limits::default(),
    );
    assert!(report.success);
    assert!(output.is_empty());
    let tree = report.output.unwrap();
    assert!(tree.contains("int x = 1 + 2;"));
}

#[test]
fn check_mode_stops_before_interpretation() {
    let (report, output) = run_mode("print(\"unreached\");", RunMode::Check, Limits::default());
    assert!(report.success);
    assert!(report.output.is_none());
    assert!(output.is_empty());
}

#[test]
fn configured_limits_are_honored() {
    let limits = Limits {
        max_func_depth: 3,
        ..Limits::default()
    };
    let source = "func int r(int v) {\n\
         if (v > 0) { return r(v - 1); }\n\
         return 0;\n\
     }\n\
     int y = r(10);";
    let (report, _) = run_mode(source, RunMode::Run, limits);
    assert!(!report.success);
    assert!(report.diagnostics.contains("Call stack limit exceeded"));
}

#[test]
fn domain_scenario_with_seeded_backing() {
    let mut backing = MemoryBacking::new();
    backing.add_entry("/library", "podcasts", true);
    backing.add_entry("/library", "intro.mp3", false);
    backing.add_audio(
        "/library/intro.mp3",
        AudioMeta {
            length: 30_000,
            bitrate: 192_000,
            title: "intro".into(),
            bytes: vec![1, 2, 3],
        },
    );

    let source = "Folder lib = Folder(\"/library\");\n\
         Audio intro = ftoa(lib.files.get(0));\n\
         if (intro == null) {\n\
             print(\"not audio\");\n\
         } else {\n\
             intro.cut(0, 10000);\n\
             print(itos(intro.length));\n\
             print(intro.title);\n\
         }\n\
         Folder target = Folder(\"/library/podcasts\");\n\
         File plain = atof(intro);\n\
         plain.move(target);\n\
         print(itos(target.files.len()));";

    let mut console = BufferConsole::new();
    let session = Session::new(RunMode::Run, Limits::default());
    let report = session.run(source, &mut console, Box::new(backing));
    assert!(report.success, "{}", report.diagnostics);
    assert_eq!(console.output, vec!["10000", "intro", "1"]);
}

#[test]
fn input_round_trip() {
    let mut console = BufferConsole::new();
    console.push_input("21");
    let session = Session::new(RunMode::Run, Limits::default());
    let report = session.run(
        "int n = stoi(input());\nprint(itos(n * 2));",
        &mut console,
        Box::new(MemoryBacking::new()),
    );
    assert!(report.success, "{}", report.diagnostics);
    assert_eq!(console.output, vec!["42"]);
}

#[test]
fn shadowing_scope_property() {
    let (report, output) = run(
        "int x = 41;\n\
         if (true) { int x = 5; x = x + 1; }\n\
         print(itos(x));",
    );
    assert!(report.success);
    assert_eq!(output, vec!["41"]);
}

#[test]
fn composite_reference_passing_property() {
    let (report, output) = run(
        "func void rename(Audio a) {\n\
             a.change_title(\"after\");\n\
             return;\n\
         }\n\
         Audio song = Audio(\"s.mp3\");\n\
         rename(song);\n\
         print(song.title);",
    );
    assert!(report.success, "{}", report.diagnostics);
    assert_eq!(output, vec!["after"]);
}
