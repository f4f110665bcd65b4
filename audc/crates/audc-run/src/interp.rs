//! The tree-walking evaluator.
//!
//! Statements execute in source order; expressions evaluate strictly left to
//! right with `&&`/`||` short-circuiting. User calls push a bounded call
//! context whose parameters alias the caller's slots when the argument was a
//! plain variable. The first fault unwinds everything and ends the run.

use std::rc::Rc;

use audc_par::{ast::Param, BinOp, Block, CtorKind, Expr, Program, Stmt};
use audc_util::{DiagnosticKind, FxHashMap, Limits, Span};

use crate::console::Console;
use crate::env::{Environment, Heap};
use crate::value::Value;
use crate::world::{Backing, DomainWorld};
use crate::{Fault, RunResult};

/// A user function as the interpreter stores it.
struct FuncDef {
    params: Vec<Param>,
    body: Block,
}

/// Signal propagated out of statement execution.
enum Flow {
    Normal,
    Return(Value),
}

/// The Aud interpreter.
///
/// # Examples
///
/// ```
/// use audc_lex::Lexer;
/// use audc_par::Parser;
/// use audc_run::{BufferConsole, Interpreter, MemoryBacking};
/// use audc_util::{Handler, Limits};
///
/// let handler = Handler::new();
/// let tokens = Lexer::new("print(\"Hello world\");", Limits::default(), &handler).tokenize();
/// let program = Parser::new(tokens, &handler).parse_program();
///
/// let mut console = BufferConsole::new();
/// let mut interp = Interpreter::new(
///     Limits::default(),
///     Box::new(MemoryBacking::new()),
///     &mut console,
/// );
/// interp.run(&program).unwrap();
/// assert_eq!(console.output, vec!["Hello world"]);
/// ```
pub struct Interpreter<'a> {
    limits: Limits,
    env: Environment,
    heap: Heap,
    world: DomainWorld,
    console: &'a mut dyn Console,
    functions: FxHashMap<String, Rc<FuncDef>>,
}

impl<'a> Interpreter<'a> {
    pub fn new(limits: Limits, backing: Box<dyn Backing>, console: &'a mut dyn Console) -> Self {
        let max_folder_depth = limits.max_folder_depth;
        Self {
            limits,
            env: Environment::new(),
            heap: Heap::new(),
            world: DomainWorld::new(backing, max_folder_depth),
            console,
            functions: FxHashMap::default(),
        }
    }

    /// The world, for inspection after a run.
    pub fn world(&self) -> &DomainWorld {
        &self.world
    }

    /// Executes a type-checked program.
    ///
    /// Returns after the last top-level statement, at a top-level `return`,
    /// or with the first runtime fault.
    pub fn run(&mut self, program: &Program) -> RunResult<()> {
        for stmt in &program.stmts {
            if let Stmt::FuncDef {
                name, params, body, ..
            } = stmt
            {
                self.functions.insert(
                    name.clone(),
                    Rc::new(FuncDef {
                        params: params.clone(),
                        body: body.clone(),
                    }),
                );
            }
        }

        for stmt in &program.stmts {
            if matches!(stmt, Stmt::FuncDef { .. }) {
                continue;
            }
            if let Flow::Return(_) = self.exec_stmt(stmt)? {
                break;
            }
        }
        Ok(())
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn exec_stmt(&mut self, stmt: &Stmt) -> RunResult<Flow> {
        match stmt {
            Stmt::VarDecl { name, init, .. } => {
                let value = self.eval_expr(init)?;
                self.env.declare(name, value);
                Ok(Flow::Normal)
            }

            Stmt::Assign { name, value, span } => {
                let slot = self
                    .env
                    .lookup(name)
                    .ok_or_else(|| Fault::new(DiagnosticKind::UndeclaredVariable, *span))?;
                let value = self.eval_expr(value)?;
                self.env.set(slot, value);
                Ok(Flow::Normal)
            }

            Stmt::If {
                cond,
                then_block,
                else_block,
                ..
            } => {
                if self.eval_condition(cond)? {
                    self.exec_block(then_block)
                } else if let Some(else_block) = else_block {
                    self.exec_block(else_block)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { cond, body, .. } => {
                while self.eval_condition(cond)? {
                    if let Flow::Return(value) = self.exec_block(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Expr { expr, .. } => {
                self.eval_expr(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(value) => self.eval_expr(value)?,
                    None => Value::Void,
                };
                Ok(Flow::Return(value))
            }

            Stmt::FuncDef { .. } => Ok(Flow::Normal),
        }
    }

    /// Runs a block in its own scope; the scope is popped on every exit
    /// path, faults included.
    fn exec_block(&mut self, block: &Block) -> RunResult<Flow> {
        self.env.push_scope();
        let result = self.exec_stmts(&block.stmts);
        self.env.pop_scope();
        result
    }

    fn exec_stmts(&mut self, stmts: &[Stmt]) -> RunResult<Flow> {
        for stmt in stmts {
            match self.exec_stmt(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    /// A condition value that is not a `bool` is re-raised dynamically.
    fn eval_condition(&mut self, cond: &Expr) -> RunResult<bool> {
        match self.eval_expr(cond)? {
            Value::Bool(value) => Ok(value),
            _ => Err(Fault::new(DiagnosticKind::InvalidCondition, cond.span())),
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn eval_expr(&mut self, expr: &Expr) -> RunResult<Value> {
        match expr {
            Expr::IntLit { value, .. } => Ok(Value::Int(*value)),
            Expr::FloatLit { value, .. } => Ok(Value::Float(*value)),
            Expr::StringLit { value, .. } => Ok(Value::Str(value.clone())),
            Expr::BoolLit { value, .. } => Ok(Value::Bool(*value)),
            Expr::NullLit { .. } => Ok(Value::Null),

            Expr::Ident { name, span } => {
                let slot = self
                    .env
                    .lookup(name)
                    .ok_or_else(|| Fault::new(DiagnosticKind::UndeclaredVariable, *span))?;
                Ok(self.env.get(slot).clone())
            }

            Expr::Unary { operand, span } => {
                let value = self.eval_expr(operand)?;
                let value = self.as_int(value, *span)?;
                Ok(Value::Int(value.wrapping_neg()))
            }

            Expr::Binary {
                op,
                left,
                right,
                span,
            } => self.eval_binary(*op, left, right, *span),

            Expr::Call { callee, args, span } => {
                if self.functions.contains_key(callee) {
                    self.call_function(callee, args, *span)
                } else {
                    self.call_builtin(callee, args, *span)
                }
            }

            Expr::Member {
                target,
                name,
                args,
                span,
            } => {
                let target_value = self.eval_expr(target)?;
                match args {
                    None => self.read_attribute(target_value, name, *span),
                    Some(args) => self.call_method(target_value, name, args, *span),
                }
            }

            Expr::Ctor { kind, args, span } => {
                let arg = args
                    .first()
                    .ok_or_else(|| Fault::new(DiagnosticKind::InvalidValue, *span))?;
                let path = self.eval_expr(arg)?;
                let path = self.as_str(path, *span)?;
                let value = match kind {
                    CtorKind::Folder => Value::Folder(self.world.open_folder(&path)),
                    CtorKind::File => Value::File(self.world.create_file(&path)),
                    CtorKind::Audio => Value::Audio(self.world.create_audio(&path)),
                };
                Ok(value)
            }

            Expr::ListLit { items, .. } => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expr(item)?);
                }
                Ok(Value::List(self.heap.alloc_list(values)))
            }

            Expr::Paren { inner, .. } => self.eval_expr(inner),
        }
    }

    fn eval_binary(
        &mut self,
        op: BinOp,
        left: &Expr,
        right: &Expr,
        span: Span,
    ) -> RunResult<Value> {
        // Short-circuit forms evaluate the right operand only when needed.
        match op {
            BinOp::And => {
                let left_value = self.eval_expr(left)?;
                if !self.as_bool(left_value, left.span())? {
                    return Ok(Value::Bool(false));
                }
                let right_value = self.eval_expr(right)?;
                let right_value = self.as_bool(right_value, right.span())?;
                return Ok(Value::Bool(right_value));
            }
            BinOp::Or => {
                let left_value = self.eval_expr(left)?;
                if self.as_bool(left_value, left.span())? {
                    return Ok(Value::Bool(true));
                }
                let right_value = self.eval_expr(right)?;
                let right_value = self.as_bool(right_value, right.span())?;
                return Ok(Value::Bool(right_value));
            }
            _ => {}
        }

        let left_value = self.eval_expr(left)?;
        let right_value = self.eval_expr(right)?;

        match op {
            BinOp::Add => match (left_value, right_value) {
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_add(b))),
                (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
                _ => Err(Fault::new(DiagnosticKind::InvalidValue, span)),
            },
            BinOp::Sub => {
                let (a, b) = self.int_pair(left_value, right_value, span)?;
                Ok(Value::Int(a.wrapping_sub(b)))
            }
            BinOp::Mul => {
                let (a, b) = self.int_pair(left_value, right_value, span)?;
                Ok(Value::Int(a.wrapping_mul(b)))
            }
            BinOp::Div => {
                let (a, b) = self.int_pair(left_value, right_value, span)?;
                if b == 0 {
                    return Err(Fault::new(DiagnosticKind::DivisionByZero, span));
                }
                // Truncates toward zero; i64::MIN / -1 wraps.
                Ok(Value::Int(a.wrapping_div(b)))
            }
            BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq => {
                let (a, b) = self.int_pair(left_value, right_value, span)?;
                let result = match op {
                    BinOp::Lt => a < b,
                    BinOp::LtEq => a <= b,
                    BinOp::Gt => a > b,
                    _ => a >= b,
                };
                Ok(Value::Bool(result))
            }
            BinOp::Eq => Ok(Value::Bool(self.values_equal(&left_value, &right_value))),
            BinOp::NotEq => Ok(Value::Bool(!self.values_equal(&left_value, &right_value))),
            BinOp::And | BinOp::Or => unreachable!("handled above"),
        }
    }

    /// Runtime equality. Files and folders compare by path and parent;
    /// `null` equals only `null`.
    fn values_equal(&self, left: &Value, right: &Value) -> bool {
        match (left, right) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::File(a) | Value::Audio(a), Value::File(b) | Value::Audio(b)) => {
                self.world.files_equal(*a, *b)
            }
            (Value::Folder(a), Value::Folder(b)) => self.world.folders_equal(*a, *b),
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }

    // =========================================================================
    // Calls
    // =========================================================================

    /// Calls a user function with reference-passing semantics: an lvalue
    /// argument binds the parameter to the caller's slot, an rvalue gets a
    /// fresh slot local to the call.
    fn call_function(&mut self, name: &str, args: &[Expr], span: Span) -> RunResult<Value> {
        let def = self
            .functions
            .get(name)
            .cloned()
            .ok_or_else(|| Fault::new(DiagnosticKind::UndeclaredVariable, span))?;

        let mut bindings = Vec::with_capacity(def.params.len());
        for (param, arg) in def.params.iter().zip(args) {
            let slot = match arg {
                Expr::Ident {
                    name: arg_name,
                    span: arg_span,
                } => self
                    .env
                    .lookup(arg_name)
                    .ok_or_else(|| Fault::new(DiagnosticKind::UndeclaredVariable, *arg_span))?,
                _ => {
                    let value = self.eval_expr(arg)?;
                    self.env.alloc_slot(value)
                }
            };
            bindings.push((param.name.clone(), slot));
        }

        self.env
            .push_context(name, self.limits.max_func_depth, self.limits.max_rec_depth)
            .map_err(|kind| Fault::new(kind, span))?;
        for (param_name, slot) in bindings {
            self.env.bind(&param_name, slot);
        }
        // Body declarations live above the parameter scope.
        self.env.push_scope();

        let result = self.exec_stmts(&def.body.stmts);
        self.env.pop_context();

        match result? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Void),
        }
    }

    fn call_builtin(&mut self, name: &str, args: &[Expr], span: Span) -> RunResult<Value> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_expr(arg)?);
        }

        match (name, values.as_mut_slice()) {
            ("print", [Value::Str(text)]) => {
                self.console.print_line(text);
                Ok(Value::Void)
            }
            ("input", []) => Ok(Value::Str(self.console.read_line().unwrap_or_default())),
            ("btos", [Value::Bool(value)]) => {
                let text = if *value { "true" } else { "false" };
                Ok(Value::Str(text.to_string()))
            }
            ("itos", [Value::Int(value)]) => Ok(Value::Str(value.to_string())),
            ("stoi", [Value::Str(text)]) => parse_int_prefix(text)
                .map(Value::Int)
                .ok_or_else(|| Fault::new(DiagnosticKind::TypeConversionException, span)),
            ("stof", [Value::Str(text)]) => parse_float_prefix(text)
                .map(Value::Float)
                .ok_or_else(|| Fault::new(DiagnosticKind::TypeConversionException, span)),
            ("ftos", [Value::Float(value)]) => Ok(Value::Str(float_text(*value))),
            ("itof", [Value::Int(value)]) => Ok(Value::Float(*value as f64)),
            ("ftoi", [Value::Float(value)]) => Ok(Value::Int(value.trunc() as i64)),
            ("atof", [Value::Audio(id)]) => {
                self.world.ensure_live(*id, span)?;
                Ok(Value::File(*id))
            }
            ("ftoa", [Value::File(id)]) => {
                if self.world.probe_audio(*id, span)? {
                    Ok(Value::Audio(*id))
                } else {
                    Ok(Value::Null)
                }
            }
            ("atof" | "ftoa", [Value::Null]) => {
                Err(Fault::new(DiagnosticKind::FileNotFound, span))
            }
            _ => Err(Fault::new(DiagnosticKind::InvalidValue, span)),
        }
    }

    // =========================================================================
    // Domain members
    // =========================================================================

    fn read_attribute(&mut self, target: Value, name: &str, span: Span) -> RunResult<Value> {
        match (&target, name) {
            (Value::File(id) | Value::Audio(id), "filename") => {
                self.world.ensure_live(*id, span)?;
                Ok(Value::Str(self.world.file(*id).filename.clone()))
            }
            (Value::File(id) | Value::Audio(id), "parent") => {
                self.world.ensure_live(*id, span)?;
                Ok(match self.world.file(*id).parent {
                    Some(parent) => Value::Folder(parent),
                    None => Value::Null,
                })
            }
            (Value::Audio(id), "length") => {
                Ok(Value::Int(self.world.audio_meta(*id, span)?.length))
            }
            (Value::Audio(id), "bitrate") => {
                Ok(Value::Int(self.world.audio_meta(*id, span)?.bitrate))
            }
            (Value::Audio(id), "title") => {
                Ok(Value::Str(self.world.audio_meta(*id, span)?.title.clone()))
            }
            (Value::Folder(id), "files") => {
                let items: Vec<Value> = self
                    .world
                    .folder(*id)
                    .files
                    .iter()
                    .map(|&file| Value::File(file))
                    .collect();
                Ok(Value::List(self.heap.alloc_list(items)))
            }
            (Value::Folder(id), "subfolders") => {
                let items: Vec<Value> = self
                    .world
                    .folder(*id)
                    .subfolders
                    .iter()
                    .map(|&sub| Value::Folder(sub))
                    .collect();
                Ok(Value::List(self.heap.alloc_list(items)))
            }
            (Value::Folder(id), "is_root") => Ok(Value::Bool(self.world.folder(*id).is_root)),
            (Value::Null, _) => Err(Fault::new(DiagnosticKind::FileNotFound, span)),
            _ => Err(Fault::new(DiagnosticKind::InvalidValue, span)),
        }
    }

    fn call_method(
        &mut self,
        target: Value,
        name: &str,
        args: &[Expr],
        span: Span,
    ) -> RunResult<Value> {
        match target {
            Value::List(list) => match name {
                "len" => {
                    if !args.is_empty() {
                        return Err(Fault::new(DiagnosticKind::InvalidValue, span));
                    }
                    Ok(Value::Int(self.heap.list(list).len() as i64))
                }
                "get" => {
                    let index = self.eval_index(args, list, span)?;
                    Ok(self.heap.list(list)[index].clone())
                }
                "set" => {
                    let index = self.eval_index(args, list, span)?;
                    let arg = args
                        .get(1)
                        .ok_or_else(|| Fault::new(DiagnosticKind::InvalidValue, span))?;
                    let value = self.eval_expr(arg)?;
                    self.heap.list_mut(list)[index] = value;
                    Ok(Value::Void)
                }
                _ => Err(Fault::new(DiagnosticKind::InvalidValue, span)),
            },

            Value::File(id) | Value::Audio(id) => {
                let is_audio = matches!(target, Value::Audio(_));
                match name {
                    "move" => {
                        let arg = args
                            .first()
                            .ok_or_else(|| Fault::new(DiagnosticKind::InvalidValue, span))?;
                        let folder = self.eval_expr(arg)?;
                        let Value::Folder(folder) = folder else {
                            return Err(Fault::new(DiagnosticKind::FileNotFound, span));
                        };
                        self.world.move_file(id, folder, span)?;
                        Ok(Value::Void)
                    }
                    "delete" => {
                        self.world.delete_file(id, span)?;
                        Ok(Value::Void)
                    }
                    "cut" if is_audio => {
                        let start = self.eval_arg(args, 0, span)?;
                        let start = self.as_int(start, span)?;
                        let end = self.eval_arg(args, 1, span)?;
                        let end = self.as_int(end, span)?;
                        self.world.cut_audio(id, start, end, span)?;
                        Ok(Value::Void)
                    }
                    "concat" if is_audio => {
                        let other = self.eval_arg(args, 0, span)?;
                        let Value::Audio(other) = other else {
                            return Err(Fault::new(DiagnosticKind::FileNotFound, span));
                        };
                        self.world.concat_audio(id, other, span)?;
                        Ok(Value::Void)
                    }
                    "change_title" if is_audio => {
                        let title = self.eval_arg(args, 0, span)?;
                        let title = self.as_str(title, span)?;
                        self.world.change_title(id, title, span)?;
                        Ok(Value::Void)
                    }
                    "change_format" if is_audio => {
                        let format = self.eval_arg(args, 0, span)?;
                        let format = self.as_str(format, span)?;
                        self.world.change_format(id, &format, span)?;
                        Ok(Value::Void)
                    }
                    "change_volume" if is_audio => {
                        let factor = self.eval_arg(args, 0, span)?;
                        let Value::Float(factor) = factor else {
                            return Err(Fault::new(DiagnosticKind::InvalidValue, span));
                        };
                        self.world.change_volume(id, factor, span)?;
                        Ok(Value::Void)
                    }
                    _ => Err(Fault::new(DiagnosticKind::InvalidValue, span)),
                }
            }

            Value::Null => Err(Fault::new(DiagnosticKind::FileNotFound, span)),
            _ => Err(Fault::new(DiagnosticKind::InvalidValue, span)),
        }
    }

    /// Evaluates `args[0]` as a list index and bounds-checks it.
    fn eval_index(
        &mut self,
        args: &[Expr],
        list: crate::value::ListId,
        span: Span,
    ) -> RunResult<usize> {
        let value = self.eval_arg(args, 0, span)?;
        let index = self.as_int(value, span)?;
        let len = self.heap.list(list).len();
        if index < 0 || index as usize >= len {
            return Err(Fault::new(DiagnosticKind::ListIndexOutOfBounds, span));
        }
        Ok(index as usize)
    }

    fn eval_arg(&mut self, args: &[Expr], index: usize, span: Span) -> RunResult<Value> {
        let arg = args
            .get(index)
            .ok_or_else(|| Fault::new(DiagnosticKind::InvalidValue, span))?;
        self.eval_expr(arg)
    }

    // =========================================================================
    // Value coercions (statically guaranteed; faults are defensive)
    // =========================================================================

    fn as_int(&self, value: Value, span: Span) -> RunResult<i64> {
        match value {
            Value::Int(value) => Ok(value),
            _ => Err(Fault::new(DiagnosticKind::InvalidValue, span)),
        }
    }

    fn as_bool(&self, value: Value, span: Span) -> RunResult<bool> {
        match value {
            Value::Bool(value) => Ok(value),
            _ => Err(Fault::new(DiagnosticKind::InvalidCondition, span)),
        }
    }

    fn as_str(&self, value: Value, span: Span) -> RunResult<String> {
        match value {
            Value::Str(value) => Ok(value),
            _ => Err(Fault::new(DiagnosticKind::InvalidValue, span)),
        }
    }

    fn int_pair(&self, left: Value, right: Value, span: Span) -> RunResult<(i64, i64)> {
        match (left, right) {
            (Value::Int(a), Value::Int(b)) => Ok((a, b)),
            _ => Err(Fault::new(DiagnosticKind::InvalidValue, span)),
        }
    }
}

// =============================================================================
// Conversions
// =============================================================================

/// Longest optional-sign integer prefix of `text`. `None` when no digits
/// lead, or the prefix overflows an `i64`.
fn parse_int_prefix(text: &str) -> Option<i64> {
    let bytes = text.as_bytes();
    let mut pos = 0;
    let negative = match bytes.first() {
        Some(b'+') => {
            pos = 1;
            false
        }
        Some(b'-') => {
            pos = 1;
            true
        }
        _ => false,
    };

    let mut value: i64 = 0;
    let mut digits = 0;
    while let Some(b @ b'0'..=b'9') = bytes.get(pos) {
        let digit = i64::from(b - b'0');
        // Accumulate negatively so i64::MIN parses.
        value = value.checked_mul(10)?.checked_sub(digit)?;
        pos += 1;
        digits += 1;
    }
    if digits == 0 {
        return None;
    }
    if negative {
        Some(value)
    } else {
        value.checked_neg()
    }
}

/// Longest optional-sign float prefix: digits, optional `.`, digits.
fn parse_float_prefix(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let mut pos = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        pos = 1;
    }
    let int_start = pos;
    while matches!(bytes.get(pos), Some(b'0'..=b'9')) {
        pos += 1;
    }
    if pos == int_start {
        return None;
    }
    if bytes.get(pos) == Some(&b'.') {
        pos += 1;
        while matches!(bytes.get(pos), Some(b'0'..=b'9')) {
            pos += 1;
        }
    }
    text[..pos].parse().ok()
}

/// Shortest text that round-trips the float, with at least one fractional
/// digit for finite values.
fn float_text(value: f64) -> String {
    let text = format!("{value}");
    if text.contains('.') || text.contains('e') || text.contains("inf") || text.contains("NaN") {
        text
    } else {
        format!("{text}.0")
    }
}
