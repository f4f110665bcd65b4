//! Pretty-printer: renders a syntax tree back to canonical Aud source.
//!
//! Printing a parsed program and parsing the result again yields a
//! structurally equal tree; the printer is its own fixpoint over the valid
//! subset of the language. The driver uses it for the `parse` run mode.

use std::fmt::Write;

use crate::ast::{Block, Expr, Program, Stmt};

const INDENT: &str = "    ";

/// Renders a whole program.
pub fn program(program: &Program) -> String {
    let mut out = String::new();
    for stmt in &program.stmts {
        write_stmt(&mut out, stmt, 0);
    }
    out
}

/// Renders a single expression.
pub fn expr(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr);
    out
}

fn write_stmt(out: &mut String, stmt: &Stmt, depth: usize) {
    let pad = INDENT.repeat(depth);
    match stmt {
        Stmt::VarDecl { ty, name, init, .. } => {
            let _ = write!(out, "{pad}{ty} {name} = ");
            write_expr(out, init);
            out.push_str(";\n");
        }
        Stmt::Assign { name, value, .. } => {
            let _ = write!(out, "{pad}{name} = ");
            write_expr(out, value);
            out.push_str(";\n");
        }
        Stmt::If {
            cond,
            then_block,
            else_block,
            ..
        } => {
            let _ = write!(out, "{pad}if (");
            write_expr(out, cond);
            out.push_str(") ");
            write_block(out, then_block, depth);
            if let Some(else_block) = else_block {
                out.push_str(" else ");
                write_block(out, else_block, depth);
            }
            out.push('\n');
        }
        Stmt::While { cond, body, .. } => {
            let _ = write!(out, "{pad}while (");
            write_expr(out, cond);
            out.push_str(") ");
            write_block(out, body, depth);
            out.push('\n');
        }
        Stmt::Expr { expr, .. } => {
            out.push_str(&pad);
            write_expr(out, expr);
            out.push_str(";\n");
        }
        Stmt::Return { value, .. } => match value {
            Some(value) => {
                let _ = write!(out, "{pad}return ");
                write_expr(out, value);
                out.push_str(";\n");
            }
            None => {
                let _ = writeln!(out, "{pad}return;");
            }
        },
        Stmt::FuncDef {
            ret,
            name,
            params,
            body,
            ..
        } => {
            let _ = write!(out, "{pad}func {ret} {name}(");
            for (i, param) in params.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                let _ = write!(out, "{} {}", param.ty, param.name);
            }
            out.push_str(") ");
            write_block(out, body, depth);
            out.push('\n');
        }
    }
}

fn write_block(out: &mut String, block: &Block, depth: usize) {
    out.push_str("{\n");
    for stmt in &block.stmts {
        write_stmt(out, stmt, depth + 1);
    }
    let _ = write!(out, "{}}}", INDENT.repeat(depth));
}

fn write_expr(out: &mut String, expr: &Expr) {
    match expr {
        Expr::IntLit { value, .. } => {
            let _ = write!(out, "{value}");
        }
        Expr::FloatLit { value, .. } => {
            out.push_str(&float_text(*value));
        }
        Expr::StringLit { value, .. } => {
            out.push('"');
            for c in value.chars() {
                match c {
                    '\n' => out.push_str("\\n"),
                    '\t' => out.push_str("\\t"),
                    '"' => out.push_str("\\\""),
                    '\\' => out.push_str("\\\\"),
                    other => out.push(other),
                }
            }
            out.push('"');
        }
        Expr::BoolLit { value, .. } => {
            out.push_str(if *value { "true" } else { "false" });
        }
        Expr::NullLit { .. } => out.push_str("null"),
        Expr::Ident { name, .. } => out.push_str(name),
        Expr::Unary { operand, .. } => {
            out.push('-');
            write_expr(out, operand);
        }
        Expr::Binary { op, left, right, .. } => {
            write_expr(out, left);
            let _ = write!(out, " {op} ");
            write_expr(out, right);
        }
        Expr::Call { callee, args, .. } => {
            out.push_str(callee);
            write_args(out, args);
        }
        Expr::Member {
            target, name, args, ..
        } => {
            write_expr(out, target);
            out.push('.');
            out.push_str(name);
            if let Some(args) = args {
                write_args(out, args);
            }
        }
        Expr::Ctor { kind, args, .. } => {
            out.push_str(kind.name());
            write_args(out, args);
        }
        Expr::ListLit { items, .. } => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, item);
            }
            out.push(']');
        }
        Expr::Paren { inner, .. } => {
            out.push('(');
            write_expr(out, inner);
            out.push(')');
        }
    }
}

fn write_args(out: &mut String, args: &[Expr]) {
    out.push('(');
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_expr(out, arg);
    }
    out.push(')');
}

/// Float text that lexes back to the same value: always carries a decimal
/// point.
fn float_text(value: f64) -> String {
    let text = format!("{value}");
    if text.contains('.') {
        text
    } else {
        format!("{text}.0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parser;
    use audc_lex::Lexer;
    use audc_util::{Handler, Limits};

    fn parse(source: &str) -> Program {
        let handler = Handler::new();
        let tokens = Lexer::new(source, Limits::default(), &handler).tokenize();
        let program = Parser::new(tokens, &handler).parse_program();
        assert!(!handler.has_errors(), "{}", handler.render());
        program
    }

    /// Printing is a fixpoint: parse → print → parse → print yields the
    /// same text, so the reparse is structurally equal.
    fn assert_round_trips(source: &str) {
        let first = program(&parse(source));
        let second = program(&parse(&first));
        assert_eq!(first, second);
    }

    #[test]
    fn test_round_trip_statements() {
        assert_round_trips(
            "int x = 1 + 2 * 3;\n\
             string s = \"he\\\"llo\\n\";\n\
             x = -x;\n\
             print(itos(x));",
        );
    }

    #[test]
    fn test_round_trip_control_flow() {
        assert_round_trips(
            "if (x < 10) { x = x + 1; } else if (x < 20) { x = 0; } else { x = 1; }\n\
             while (x > 0) { x = x - 1; }",
        );
    }

    #[test]
    fn test_round_trip_functions_and_domain() {
        assert_round_trips(
            "func int twice(int v) { return v * 2; }\n\
             Folder root = Folder(\"/music\");\n\
             List<File> files = root.files;\n\
             File f = files.get(0);\n\
             f.move(root);",
        );
    }

    #[test]
    fn test_round_trip_floats() {
        assert_round_trips("float f = 3.5;\nfloat g = 12.0;\nfloat h = 0.25;");
    }

    #[test]
    fn test_round_trip_parens_and_lists() {
        assert_round_trips("int x = (1 + 2) * 3;\nList<int> xs = [1, 2, 3];\nList<int> ys = [];");
    }

    #[test]
    fn test_float_text_always_has_point() {
        assert_eq!(float_text(12.0), "12.0");
        assert_eq!(float_text(3.5), "3.5");
    }
}
