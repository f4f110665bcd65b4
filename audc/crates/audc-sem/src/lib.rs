//! audc-sem - Static type checking for Aud programs.
//!
//! A single pass over the syntax tree. Function signatures are collected
//! first so calls can be resolved regardless of definition order; bodies are
//! then checked in source order, each in an isolated scope that sees only
//! its parameters (functions are closed over nothing - global variables are
//! not visible inside them).
//!
//! The checker reports every problem it can find and never aborts early; the
//! driver refuses to run a program that produced any diagnostic.

pub mod builtins;
pub mod scope;

pub use builtins::{builtin_sig, member_sig, Member};
pub use scope::SymbolTable;

use audc_par::{BinOp, Block, Expr, FuncSig, Program, Stmt, TypeSig};
use audc_util::{DiagnosticKind, Handler};
use indexmap::IndexMap;

/// The static type of a checked expression.
///
/// `null` has no type of its own; it adopts any composite type it is
/// compared against or assigned to.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprType {
    Known(TypeSig),
    Null,
}

impl ExprType {
    /// True when a value of this type can inhabit `expected`.
    pub fn matches(&self, expected: &TypeSig) -> bool {
        match self {
            ExprType::Known(ty) => ty == expected,
            ExprType::Null => expected.is_composite(),
        }
    }
}

/// The Aud type checker.
///
/// # Examples
///
/// ```
/// use audc_lex::Lexer;
/// use audc_par::Parser;
/// use audc_sem::TypeChecker;
/// use audc_util::{Handler, Limits};
///
/// let handler = Handler::new();
/// let tokens = Lexer::new("int x = 1;", Limits::default(), &handler).tokenize();
/// let program = Parser::new(tokens, &handler).parse_program();
/// TypeChecker::new(&handler).check(&program);
/// assert!(!handler.has_errors());
/// ```
pub struct TypeChecker<'a> {
    handler: &'a Handler,
    scopes: SymbolTable,
    functions: IndexMap<String, FuncSig>,
    /// Declared return type of the function being checked; `None` at top
    /// level, where a bare `return;` terminates the program.
    current_ret: Option<TypeSig>,
}

impl<'a> TypeChecker<'a> {
    pub fn new(handler: &'a Handler) -> Self {
        Self {
            handler,
            scopes: SymbolTable::new(),
            functions: IndexMap::new(),
            current_ret: None,
        }
    }

    /// User-defined function signatures collected by [`check`](Self::check),
    /// in definition order.
    pub fn functions(&self) -> &IndexMap<String, FuncSig> {
        &self.functions
    }

    /// Checks the whole program.
    pub fn check(&mut self, program: &Program) {
        self.collect_functions(program);
        for stmt in &program.stmts {
            self.check_stmt(stmt);
        }
    }

    /// Prescan: register every top-level function so definition order does
    /// not matter for calls. Reusing a built-in name or an earlier function
    /// name is a redeclaration.
    fn collect_functions(&mut self, program: &Program) {
        for stmt in &program.stmts {
            let Stmt::FuncDef {
                ret,
                name,
                params,
                span,
                ..
            } = stmt
            else {
                continue;
            };
            if builtin_sig(name).is_some() || self.functions.contains_key(name) {
                self.handler
                    .report(DiagnosticKind::FunctionRedeclaration, *span);
                continue;
            }
            self.functions.insert(
                name.clone(),
                FuncSig {
                    params: params.iter().map(|p| p.ty.clone()).collect(),
                    ret: ret.clone(),
                },
            );
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::VarDecl {
                ty,
                name,
                init,
                span,
            } => {
                if let Some(init_ty) = self.check_expr(init, Some(ty)) {
                    if !init_ty.matches(ty) {
                        self.handler
                            .report(DiagnosticKind::InvalidType, init.span());
                    }
                }
                if self.scopes.declare(name, ty.clone(), *span).is_err() {
                    self.handler
                        .report(DiagnosticKind::UndeclaredVariable, *span);
                }
            }

            Stmt::Assign { name, value, span } => {
                let Some(var) = self.scopes.lookup(name).cloned() else {
                    self.handler
                        .report(DiagnosticKind::UndeclaredVariable, *span);
                    self.check_expr(value, None);
                    return;
                };
                if let Some(value_ty) = self.check_expr(value, Some(&var.ty)) {
                    if !value_ty.matches(&var.ty) {
                        self.handler
                            .report(DiagnosticKind::InvalidType, value.span());
                    }
                }
            }

            Stmt::If {
                cond,
                then_block,
                else_block,
                ..
            } => {
                self.check_condition(cond);
                self.check_block(then_block);
                if let Some(else_block) = else_block {
                    self.check_block(else_block);
                }
            }

            Stmt::While { cond, body, .. } => {
                self.check_condition(cond);
                self.check_block(body);
            }

            Stmt::Expr { expr, .. } => {
                self.check_expr(expr, None);
            }

            Stmt::Return { value, span } => {
                let expected = self.current_ret.clone().unwrap_or(TypeSig::Void);
                match (value, expected) {
                    (None, TypeSig::Void) => {}
                    (Some(value), TypeSig::Void) => {
                        self.check_expr(value, None);
                        self.handler
                            .report(DiagnosticKind::InvalidType, value.span());
                    }
                    (None, _) => {
                        self.handler.report(DiagnosticKind::InvalidType, *span);
                    }
                    (Some(value), expected) => {
                        if let Some(value_ty) = self.check_expr(value, Some(&expected)) {
                            if !value_ty.matches(&expected) {
                                self.handler
                                    .report(DiagnosticKind::InvalidType, value.span());
                            }
                        }
                    }
                }
            }

            Stmt::FuncDef {
                ret, params, body, ..
            } => {
                // Closed function: a fresh table whose outermost frame holds
                // only the parameters. The body block gets its own frame, so
                // locals may shadow parameters.
                let outer_scopes = std::mem::take(&mut self.scopes);
                for param in params {
                    if self
                        .scopes
                        .declare(&param.name, param.ty.clone(), param.span)
                        .is_err()
                    {
                        self.handler
                            .report(DiagnosticKind::InvalidDeclaration, param.span);
                    }
                }
                let outer_ret = self.current_ret.replace(ret.clone());
                self.check_block(body);
                self.current_ret = outer_ret;
                self.scopes = outer_scopes;
            }
        }
    }

    fn check_block(&mut self, block: &Block) {
        self.scopes.push_frame();
        for stmt in &block.stmts {
            self.check_stmt(stmt);
        }
        self.scopes.pop_frame();
    }

    fn check_condition(&mut self, cond: &Expr) {
        if let Some(ty) = self.check_expr(cond, Some(&TypeSig::Bool)) {
            if ty != ExprType::Known(TypeSig::Bool) {
                self.handler
                    .report(DiagnosticKind::InvalidCondition, cond.span());
            }
        }
    }

    /// Types an expression. `expected` threads the surrounding type context
    /// down so that list literals (including empty ones) can be inferred.
    ///
    /// Returns `None` when the expression could not be typed; the error has
    /// already been reported, so callers stay quiet to avoid cascades.
    fn check_expr(&mut self, expr: &Expr, expected: Option<&TypeSig>) -> Option<ExprType> {
        match expr {
            Expr::IntLit { .. } => Some(ExprType::Known(TypeSig::Int)),
            Expr::FloatLit { .. } => Some(ExprType::Known(TypeSig::Float)),
            Expr::StringLit { .. } => Some(ExprType::Known(TypeSig::String)),
            Expr::BoolLit { .. } => Some(ExprType::Known(TypeSig::Bool)),
            Expr::NullLit { .. } => Some(ExprType::Null),

            Expr::Ident { name, span } => match self.scopes.lookup(name) {
                Some(var) => Some(ExprType::Known(var.ty.clone())),
                None => {
                    self.handler
                        .report(DiagnosticKind::UndeclaredVariable, *span);
                    None
                }
            },

            Expr::Unary { operand, span } => {
                let ty = self.check_expr(operand, Some(&TypeSig::Int))?;
                if ty != ExprType::Known(TypeSig::Int) {
                    self.handler.report(DiagnosticKind::InvalidType, *span);
                    return None;
                }
                Some(ExprType::Known(TypeSig::Int))
            }

            Expr::Binary {
                op,
                left,
                right,
                span,
            } => self.check_binary(*op, left, right, *span),

            Expr::Call { callee, args, span } => {
                let sig = match builtin_sig(callee).or_else(|| self.functions.get(callee).cloned())
                {
                    Some(sig) => sig,
                    None => {
                        self.handler
                            .report(DiagnosticKind::UndeclaredVariable, *span);
                        for arg in args {
                            self.check_expr(arg, None);
                        }
                        return None;
                    }
                };
                self.check_args(&sig, args, *span);
                Some(ExprType::Known(sig.ret))
            }

            Expr::Member {
                target,
                name,
                args,
                span,
            } => {
                let target_ty = self.check_expr(target, None)?;
                let ExprType::Known(target_ty) = target_ty else {
                    self.handler
                        .report(DiagnosticKind::InvalidType, target.span());
                    return None;
                };
                match member_sig(&target_ty, name) {
                    Some(Member::Attr(ty)) => {
                        if args.is_some() {
                            // An attribute is not callable.
                            self.handler.report(DiagnosticKind::InvalidType, *span);
                            return None;
                        }
                        Some(ExprType::Known(ty))
                    }
                    Some(Member::Method(sig)) => {
                        let Some(args) = args else {
                            // A method needs its argument list.
                            self.handler.report(DiagnosticKind::InvalidType, *span);
                            return None;
                        };
                        self.check_args(&sig, args, *span);
                        Some(ExprType::Known(sig.ret))
                    }
                    None => {
                        self.handler.report(DiagnosticKind::InvalidType, *span);
                        None
                    }
                }
            }

            Expr::Ctor { kind, args, span } => {
                let sig = FuncSig {
                    params: vec![TypeSig::String],
                    ret: kind.type_sig(),
                };
                self.check_args(&sig, args, *span);
                Some(ExprType::Known(kind.type_sig()))
            }

            Expr::ListLit { items, span } => {
                if let Some(TypeSig::List(elem)) = expected {
                    for item in items {
                        if let Some(item_ty) = self.check_expr(item, Some(elem)) {
                            if !item_ty.matches(elem) {
                                self.handler
                                    .report(DiagnosticKind::InvalidType, item.span());
                            }
                        }
                    }
                    return Some(ExprType::Known(TypeSig::List(elem.clone())));
                }

                // No surrounding context: infer the element type from the
                // first item. An empty literal has nothing to infer from.
                let Some(first) = items.first() else {
                    self.handler.report(DiagnosticKind::InvalidType, *span);
                    return None;
                };
                let first_ty = self.check_expr(first, None)?;
                let ExprType::Known(elem) = first_ty else {
                    self.handler
                        .report(DiagnosticKind::InvalidType, first.span());
                    return None;
                };
                for item in &items[1..] {
                    if let Some(item_ty) = self.check_expr(item, Some(&elem)) {
                        if !item_ty.matches(&elem) {
                            self.handler
                                .report(DiagnosticKind::InvalidType, item.span());
                        }
                    }
                }
                Some(ExprType::Known(TypeSig::List(Box::new(elem))))
            }

            Expr::Paren { inner, .. } => self.check_expr(inner, expected),
        }
    }

    fn check_binary(
        &mut self,
        op: BinOp,
        left: &Expr,
        right: &Expr,
        span: audc_util::Span,
    ) -> Option<ExprType> {
        let left_ty = self.check_expr(left, None);
        let right_ty = self.check_expr(right, None);
        let (left_ty, right_ty) = (left_ty?, right_ty?);

        use ExprType::{Known, Null};
        use TypeSig::{Bool, Int, String as Str};

        match op {
            BinOp::Add => match (&left_ty, &right_ty) {
                (Known(Int), Known(Int)) => Some(Known(Int)),
                (Known(Str), Known(Str)) => Some(Known(Str)),
                _ => {
                    self.handler.report(DiagnosticKind::InvalidType, span);
                    None
                }
            },
            BinOp::Sub | BinOp::Mul | BinOp::Div => match (&left_ty, &right_ty) {
                (Known(Int), Known(Int)) => Some(Known(Int)),
                _ => {
                    self.handler.report(DiagnosticKind::InvalidType, span);
                    None
                }
            },
            BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq => {
                match (&left_ty, &right_ty) {
                    (Known(Int), Known(Int)) => Some(Known(Bool)),
                    _ => {
                        self.handler.report(DiagnosticKind::InvalidType, span);
                        None
                    }
                }
            }
            BinOp::Eq | BinOp::NotEq => {
                let ok = match (&left_ty, &right_ty) {
                    (Known(a), Known(b)) if a == b => {
                        matches!(a, TypeSig::Int | TypeSig::String | TypeSig::File | TypeSig::Folder)
                    }
                    (Known(ty), Null) | (Null, Known(ty)) => ty.is_composite(),
                    (Null, Null) => true,
                    _ => false,
                };
                if !ok {
                    self.handler.report(DiagnosticKind::InvalidType, span);
                    return None;
                }
                Some(Known(Bool))
            }
            BinOp::And | BinOp::Or => match (&left_ty, &right_ty) {
                (Known(Bool), Known(Bool)) => Some(Known(Bool)),
                _ => {
                    self.handler.report(DiagnosticKind::InvalidType, span);
                    None
                }
            },
        }
    }

    /// Checks an argument list against a signature: arity first, then each
    /// argument with the parameter type as context.
    fn check_args(&mut self, sig: &FuncSig, args: &[Expr], span: audc_util::Span) {
        if args.len() != sig.params.len() {
            self.handler
                .report(DiagnosticKind::InvalidArgumentType, span);
            for arg in args {
                self.check_expr(arg, None);
            }
            return;
        }
        for (arg, param) in args.iter().zip(&sig.params) {
            if let Some(arg_ty) = self.check_expr(arg, Some(param)) {
                if !arg_ty.matches(param) {
                    self.handler
                        .report(DiagnosticKind::InvalidArgumentType, arg.span());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audc_lex::Lexer;
    use audc_par::Parser;
    use audc_util::Limits;

    fn check(source: &str) -> Handler {
        let handler = Handler::new();
        let tokens = Lexer::new(source, Limits::default(), &handler).tokenize();
        let program = Parser::new(tokens, &handler).parse_program();
        assert!(!handler.has_errors(), "parse failed: {}", handler.render());
        TypeChecker::new(&handler).check(&program);
        handler
    }

    fn first_kind(handler: &Handler) -> DiagnosticKind {
        handler.diagnostics()[0].kind
    }

    #[test]
    fn test_valid_program_passes() {
        let handler = check(
            "int x = 1 + 2;\n\
             string s = \"a\" + \"b\";\n\
             bool b = x < 3 && true;\n\
             if (b) { x = x * 2; }\n\
             while (x > 0) { x = x - 1; }\n\
             print(itos(x));",
        );
        assert!(!handler.has_errors(), "{}", handler.render());
    }

    #[test]
    fn test_decl_type_mismatch_position() {
        let handler = check("int x = \"abc\";");
        let diags = handler.diagnostics();
        assert_eq!(diags[0].kind, DiagnosticKind::InvalidType);
        assert_eq!((diags[0].span.line, diags[0].span.column), (1, 9));
    }

    #[test]
    fn test_same_frame_redeclaration() {
        let handler = check("int x = 1; int x = 2;");
        assert_eq!(first_kind(&handler), DiagnosticKind::UndeclaredVariable);
    }

    #[test]
    fn test_shadowing_in_nested_block_is_fine() {
        let handler = check("int x = 1; if (true) { int x = 2; x = 3; }");
        assert!(!handler.has_errors(), "{}", handler.render());
    }

    #[test]
    fn test_undeclared_read_and_write() {
        let handler = check("x = 1;");
        assert_eq!(first_kind(&handler), DiagnosticKind::UndeclaredVariable);

        let handler = check("int y = x;");
        assert_eq!(first_kind(&handler), DiagnosticKind::UndeclaredVariable);
    }

    #[test]
    fn test_block_scope_expires() {
        let handler = check("if (true) { int x = 1; } x = 2;");
        assert_eq!(first_kind(&handler), DiagnosticKind::UndeclaredVariable);
    }

    #[test]
    fn test_invalid_condition() {
        let handler = check("if (1 + 2) { print(\"x\"); }");
        assert_eq!(first_kind(&handler), DiagnosticKind::InvalidCondition);

        let handler = check("while (\"s\") { print(\"x\"); }");
        assert_eq!(first_kind(&handler), DiagnosticKind::InvalidCondition);
    }

    #[test]
    fn test_no_float_comparison() {
        let handler = check("bool b = 1.0 < 2.0;");
        assert_eq!(first_kind(&handler), DiagnosticKind::InvalidType);
    }

    #[test]
    fn test_no_implicit_numeric_coercion() {
        let handler = check("int x = 1 + 1.5;");
        assert_eq!(first_kind(&handler), DiagnosticKind::InvalidType);
    }

    #[test]
    fn test_string_concat_only_plus() {
        let handler = check("string s = \"a\" - \"b\";");
        assert_eq!(first_kind(&handler), DiagnosticKind::InvalidType);
    }

    #[test]
    fn test_equality_rules() {
        assert!(!check("bool b = 1 == 2;").has_errors());
        assert!(!check("bool b = \"a\" != \"b\";").has_errors());
        assert!(!check("File f = File(\"a.txt\"); bool b = f == null;").has_errors());
        assert!(!check("bool b = null == null;").has_errors());

        // bools and floats are outside the equality set.
        assert_eq!(
            first_kind(&check("bool b = true == false;")),
            DiagnosticKind::InvalidType
        );
        assert_eq!(
            first_kind(&check("bool b = 1.0 == 1.0;")),
            DiagnosticKind::InvalidType
        );
        // Simple types never compare against null.
        assert_eq!(
            first_kind(&check("bool b = 1 == null;")),
            DiagnosticKind::InvalidType
        );
    }

    #[test]
    fn test_builtin_arg_type() {
        let handler = check("print(42);");
        assert_eq!(first_kind(&handler), DiagnosticKind::InvalidArgumentType);
    }

    #[test]
    fn test_builtin_arity() {
        let handler = check("print(\"a\", \"b\");");
        assert_eq!(first_kind(&handler), DiagnosticKind::InvalidArgumentType);
    }

    #[test]
    fn test_unknown_function() {
        let handler = check("frobnicate(1);");
        assert_eq!(first_kind(&handler), DiagnosticKind::UndeclaredVariable);
    }

    #[test]
    fn test_void_call_is_not_a_value() {
        let handler = check("int x = print(\"a\");");
        assert_eq!(first_kind(&handler), DiagnosticKind::InvalidType);
    }

    #[test]
    fn test_function_calls_check_against_signature() {
        let handler = check(
            "func int double(int v) { return v * 2; }\n\
             int x = double(21);",
        );
        assert!(!handler.has_errors(), "{}", handler.render());

        let handler = check(
            "func int double(int v) { return v * 2; }\n\
             int x = double(\"no\");",
        );
        assert_eq!(first_kind(&handler), DiagnosticKind::InvalidArgumentType);
    }

    #[test]
    fn test_forward_call_is_fine() {
        let handler = check(
            "int x = later(1);\n\
             func int later(int v) { return v; }",
        );
        assert!(!handler.has_errors(), "{}", handler.render());
    }

    #[test]
    fn test_function_redeclaration() {
        let handler = check(
            "func int f(int v) { return v; }\n\
             func int f(int v) { return v; }",
        );
        assert_eq!(first_kind(&handler), DiagnosticKind::FunctionRedeclaration);
    }

    #[test]
    fn test_builtin_name_redeclaration() {
        let handler = check("func string itos(int v) { return \"\"; }");
        assert_eq!(first_kind(&handler), DiagnosticKind::FunctionRedeclaration);
    }

    #[test]
    fn test_functions_are_closed() {
        let handler = check(
            "int global = 1;\n\
             func int f(int v) { return v + global; }",
        );
        assert_eq!(first_kind(&handler), DiagnosticKind::UndeclaredVariable);
    }

    #[test]
    fn test_duplicate_param_names() {
        let handler = check("func int f(int a, int a) { return a; }");
        assert_eq!(first_kind(&handler), DiagnosticKind::InvalidDeclaration);
    }

    #[test]
    fn test_local_may_shadow_param() {
        let handler = check("func int f(int a) { int a = 2; return a; }");
        assert!(!handler.has_errors(), "{}", handler.render());
    }

    #[test]
    fn test_return_type_mismatch() {
        let handler = check("func int f(int v) { return \"s\"; }");
        assert_eq!(first_kind(&handler), DiagnosticKind::InvalidType);
    }

    #[test]
    fn test_void_return_with_value() {
        let handler = check("func void f(int v) { return v; }");
        assert_eq!(first_kind(&handler), DiagnosticKind::InvalidType);
    }

    #[test]
    fn test_composite_accepts_null() {
        let handler = check("File f = null; f = null;");
        assert!(!handler.has_errors(), "{}", handler.render());

        let handler = check("int x = null;");
        assert_eq!(first_kind(&handler), DiagnosticKind::InvalidType);
    }

    #[test]
    fn test_member_access_typing() {
        let handler = check(
            "Folder root = Folder(\"/music\");\n\
             List<File> files = root.files;\n\
             File f = files.get(0);\n\
             string n = f.filename;\n\
             f.move(root);",
        );
        assert!(!handler.has_errors(), "{}", handler.render());
    }

    #[test]
    fn test_audio_members() {
        let handler = check(
            "Audio a = Audio(\"x.mp3\");\n\
             int ms = a.length;\n\
             a.cut(0, 100);\n\
             a.change_title(\"new\");",
        );
        assert!(!handler.has_errors(), "{}", handler.render());
    }

    #[test]
    fn test_unknown_member() {
        let handler = check("File f = File(\"a\"); int x = f.size;");
        assert_eq!(first_kind(&handler), DiagnosticKind::InvalidType);
    }

    #[test]
    fn test_audio_metadata_not_on_plain_file() {
        let handler = check("File f = File(\"a\"); int x = f.length;");
        assert_eq!(first_kind(&handler), DiagnosticKind::InvalidType);
    }

    #[test]
    fn test_member_on_simple_type() {
        let handler = check("int x = 1; int y = x.len();");
        assert_eq!(first_kind(&handler), DiagnosticKind::InvalidType);
    }

    #[test]
    fn test_list_literal_inference() {
        assert!(!check("List<int> xs = [1, 2, 3];").has_errors());
        assert!(!check("List<int> xs = [];").has_errors());
        assert_eq!(
            first_kind(&check("List<int> xs = [1, \"a\"];")),
            DiagnosticKind::InvalidType
        );
    }

    #[test]
    fn test_empty_list_needs_context() {
        let handler = check("[].len();");
        assert_eq!(first_kind(&handler), DiagnosticKind::InvalidType);
    }

    #[test]
    fn test_list_set_element_type() {
        let handler = check("List<int> xs = [1]; xs.set(0, \"a\");");
        assert_eq!(first_kind(&handler), DiagnosticKind::InvalidArgumentType);
    }

    #[test]
    fn test_conversion_builtins() {
        let handler = check(
            "float f = itof(3);\n\
             int i = ftoi(f);\n\
             string s = ftos(f);\n\
             float g = stof(s);\n\
             Audio a = Audio(\"x.mp3\");\n\
             File plain = atof(a);\n\
             Audio back = ftoa(plain);",
        );
        assert!(!handler.has_errors(), "{}", handler.render());
    }

    #[test]
    fn test_audio_is_not_a_file_without_atof() {
        let handler = check("Audio a = Audio(\"x.mp3\"); File f = a;");
        assert_eq!(first_kind(&handler), DiagnosticKind::InvalidType);
    }

    #[test]
    fn test_top_level_return_takes_no_value() {
        assert!(!check("return;").has_errors());
        assert_eq!(
            first_kind(&check("return 1;")),
            DiagnosticKind::InvalidType
        );
    }
}
