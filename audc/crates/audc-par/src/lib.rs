//! audc-par - Recursive-descent parser for Aud.
//!
//! The parser consumes the token stream with a single token of lookahead and
//! builds the typed syntax tree defined in [`ast`]. Statement dispatch
//! follows the language's disambiguation rules: a leading type keyword means
//! a variable declaration, `func` means a function definition (top level
//! only), and an identifier is an assignment or a call depending on the next
//! token.
//!
//! On `Unexpected token` or `Missing parentheses` the parser records the
//! diagnostic and resynchronizes to the next `;` or closing `}` at the
//! current nesting depth, so several parse errors can be reported per
//! program. A tree produced alongside any parse error is not handed to the
//! type checker.

pub mod ast;
mod expr;
pub mod pretty;

pub use ast::{BinOp, Block, CtorKind, Expr, FuncSig, Param, Program, Stmt, TypeSig};

use audc_lex::{Token, TokenKind};
use audc_util::{DiagnosticKind, Handler, Span};

/// The Aud parser.
///
/// # Examples
///
/// ```
/// use audc_lex::Lexer;
/// use audc_par::Parser;
/// use audc_util::{Handler, Limits};
///
/// let handler = Handler::new();
/// let tokens = Lexer::new("int x = 1;", Limits::default(), &handler).tokenize();
/// let program = Parser::new(tokens, &handler).parse_program();
/// assert!(!handler.has_errors());
/// assert_eq!(program.stmts.len(), 1);
/// ```
pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    handler: &'a Handler,
}

impl<'a> Parser<'a> {
    /// Creates a parser over a token stream. The stream is expected to end
    /// with `EOF`; one is appended if the lexer did not provide it.
    pub fn new(mut tokens: Vec<Token>, handler: &'a Handler) -> Self {
        if !tokens.last().map(Token::is_eof).unwrap_or(false) {
            tokens.push(Token::new(TokenKind::Eof, Span::DUMMY));
        }
        Self {
            tokens,
            pos: 0,
            handler,
        }
    }

    /// Parses the whole program: top-level statements and function
    /// definitions in source order.
    pub fn parse_program(&mut self) -> Program {
        let mut stmts = Vec::new();
        while !self.current().is_eof() {
            let parsed = if self.current().kind == TokenKind::Func {
                self.parse_func_def()
            } else {
                self.parse_block_stmt()
            };
            match parsed {
                Some(stmt) => stmts.push(stmt),
                None => self.synchronize(),
            }
        }
        Program { stmts }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Parses one block-level statement.
    fn parse_block_stmt(&mut self) -> Option<Stmt> {
        match self.current().kind.clone() {
            kind if kind.starts_type() => self.parse_var_decl(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Func => {
                // Function definitions are only valid at top level.
                self.unexpected_here();
                None
            }
            TokenKind::Ident(_) if self.peek(1).kind == TokenKind::Assign => {
                self.parse_assignment()
            }
            _ => self.parse_expr_stmt(),
        }
    }

    /// `type name = expr;`
    fn parse_var_decl(&mut self) -> Option<Stmt> {
        let start = self.current().span;
        let ty = self.parse_type()?;
        let (name, _) = self.expect_ident()?;
        self.expect(TokenKind::Assign)?;
        let init = self.parse_expr()?;
        self.expect(TokenKind::Semicolon)?;
        Some(Stmt::VarDecl {
            ty,
            name,
            init,
            span: start.merge(self.prev_span()),
        })
    }

    /// `name = expr;`
    fn parse_assignment(&mut self) -> Option<Stmt> {
        let (name, start) = self.expect_ident()?;
        self.expect(TokenKind::Assign)?;
        let value = self.parse_expr()?;
        self.expect(TokenKind::Semicolon)?;
        Some(Stmt::Assign {
            name,
            value,
            span: start.merge(self.prev_span()),
        })
    }

    /// `if (cond) { … }` with an optional `else` block or `else if` chain.
    fn parse_if(&mut self) -> Option<Stmt> {
        let start = self.current().span;
        self.advance();
        self.expect_lparen()?;
        let cond = self.parse_expr()?;
        self.expect_rparen()?;
        let then_block = self.parse_code_block()?;

        let else_block = if self.eat(TokenKind::Else) {
            if self.current().kind == TokenKind::If {
                // `else if` desugars to an else block holding one statement.
                let nested = self.parse_if()?;
                let span = nested.span();
                Some(Block {
                    stmts: vec![nested],
                    span,
                })
            } else {
                Some(self.parse_code_block()?)
            }
        } else {
            None
        };

        Some(Stmt::If {
            cond,
            then_block,
            else_block,
            span: start.merge(self.prev_span()),
        })
    }

    /// `while (cond) { … }`
    fn parse_while(&mut self) -> Option<Stmt> {
        let start = self.current().span;
        self.advance();
        self.expect_lparen()?;
        let cond = self.parse_expr()?;
        self.expect_rparen()?;
        let body = self.parse_code_block()?;
        Some(Stmt::While {
            cond,
            body,
            span: start.merge(self.prev_span()),
        })
    }

    /// `return;` or `return expr;`
    fn parse_return(&mut self) -> Option<Stmt> {
        let start = self.current().span;
        self.advance();
        let value = if self.current().kind == TokenKind::Semicolon {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::Semicolon)?;
        Some(Stmt::Return {
            value,
            span: start.merge(self.prev_span()),
        })
    }

    /// An expression standing alone as a statement.
    fn parse_expr_stmt(&mut self) -> Option<Stmt> {
        let expr = self.parse_expr()?;
        if self.current().kind == TokenKind::Assign {
            // Only plain variables are assignable; writing through an
            // attribute read is a type error.
            self.handler
                .report(DiagnosticKind::InvalidType, expr.span());
            return None;
        }
        self.expect(TokenKind::Semicolon)?;
        let span = expr.span().merge(self.prev_span());
        Some(Stmt::Expr { expr, span })
    }

    /// `func type name(params) { … return …; }`
    fn parse_func_def(&mut self) -> Option<Stmt> {
        let start = self.current().span;
        self.advance();
        let ret = self.parse_return_type()?;
        let (name, _) = self.expect_ident()?;
        self.expect_lparen()?;

        let mut params = Vec::new();
        if self.current().kind != TokenKind::RParen {
            loop {
                let param_start = self.current().span;
                let ty = self.parse_type()?;
                let (pname, pspan) = self.expect_ident()?;
                params.push(Param {
                    ty,
                    name: pname,
                    span: param_start.merge(pspan),
                });
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect_rparen()?;

        let body = self.parse_function_body()?;
        Some(Stmt::FuncDef {
            ret,
            name,
            params,
            body,
            span: start.merge(self.prev_span()),
        })
    }

    /// A code block: `{` statements `}`. Pushes no scope itself; scoping is
    /// the checker's and interpreter's concern.
    fn parse_code_block(&mut self) -> Option<Block> {
        let open = self.current().span;
        self.expect(TokenKind::LBrace)?;
        let stmts = self.parse_stmts_until_brace();
        self.expect(TokenKind::RBrace)?;
        Some(Block {
            stmts,
            span: open.merge(self.prev_span()),
        })
    }

    /// A function body: a code block whose last statement must be `return`,
    /// for `void` functions included. A missing trailing return is an
    /// `Unexpected token` at the closing brace.
    fn parse_function_body(&mut self) -> Option<Block> {
        let open = self.current().span;
        self.expect(TokenKind::LBrace)?;
        let stmts = self.parse_stmts_until_brace();
        let close = self.current().span;
        self.expect(TokenKind::RBrace)?;
        if !matches!(stmts.last(), Some(Stmt::Return { .. })) {
            self.handler.report(DiagnosticKind::UnexpectedToken, close);
        }
        Some(Block {
            stmts,
            span: open.merge(self.prev_span()),
        })
    }

    /// Parses statements until the closing brace of the current block,
    /// resynchronizing after each failed statement.
    fn parse_stmts_until_brace(&mut self) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        while self.current().kind != TokenKind::RBrace && !self.current().is_eof() {
            match self.parse_block_stmt() {
                Some(stmt) => stmts.push(stmt),
                None => self.synchronize(),
            }
        }
        stmts
    }

    // =========================================================================
    // Types
    // =========================================================================

    /// A type signature: a simple type keyword or `List<…>`.
    fn parse_type(&mut self) -> Option<TypeSig> {
        let ty = match self.current().kind.clone() {
            TokenKind::Int => TypeSig::Int,
            TokenKind::Float => TypeSig::Float,
            TokenKind::Bool => TypeSig::Bool,
            TokenKind::String => TypeSig::String,
            TokenKind::Folder => TypeSig::Folder,
            TokenKind::File => TypeSig::File,
            TokenKind::Audio => TypeSig::Audio,
            TokenKind::List => {
                self.advance();
                self.expect(TokenKind::Lt)?;
                let elem = self.parse_type()?;
                self.expect(TokenKind::Gt)?;
                return Some(TypeSig::List(Box::new(elem)));
            }
            _ => {
                self.unexpected_here();
                return None;
            }
        };
        self.advance();
        Some(ty)
    }

    /// A function return type: `void` or any value type.
    fn parse_return_type(&mut self) -> Option<TypeSig> {
        if self.current().kind == TokenKind::Void {
            self.advance();
            return Some(TypeSig::Void);
        }
        self.parse_type()
    }

    // =========================================================================
    // Token stream helpers
    // =========================================================================

    pub(crate) fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub(crate) fn peek(&self, k: usize) -> &Token {
        &self.tokens[(self.pos + k).min(self.tokens.len() - 1)]
    }

    /// Consumes and returns the current token. Does not move past `EOF`.
    pub(crate) fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if !token.is_eof() {
            self.pos += 1;
        }
        token
    }

    /// Span of the most recently consumed token.
    pub(crate) fn prev_span(&self) -> Span {
        if self.pos == 0 {
            return self.current().span;
        }
        self.tokens[self.pos - 1].span
    }

    /// Consumes the current token if it matches.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.current().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Requires the given token, reporting `Unexpected token` otherwise.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> Option<Span> {
        if self.current().kind == kind {
            Some(self.advance().span)
        } else {
            self.unexpected_here();
            None
        }
    }

    /// Requires `(`, reporting `Missing parentheses` otherwise.
    pub(crate) fn expect_lparen(&mut self) -> Option<Span> {
        if self.current().kind == TokenKind::LParen {
            Some(self.advance().span)
        } else {
            self.handler
                .report(DiagnosticKind::MissingParentheses, self.current().span);
            None
        }
    }

    /// Requires `)`, reporting `Missing parentheses` otherwise.
    pub(crate) fn expect_rparen(&mut self) -> Option<Span> {
        if self.current().kind == TokenKind::RParen {
            Some(self.advance().span)
        } else {
            self.handler
                .report(DiagnosticKind::MissingParentheses, self.current().span);
            None
        }
    }

    /// Requires an identifier, returning its text and span.
    pub(crate) fn expect_ident(&mut self) -> Option<(String, Span)> {
        if let TokenKind::Ident(name) = &self.current().kind {
            let name = name.clone();
            let span = self.advance().span;
            Some((name, span))
        } else {
            self.unexpected_here();
            None
        }
    }

    /// Reports `Unexpected token` at the current token.
    pub(crate) fn unexpected_here(&self) {
        self.handler
            .report(DiagnosticKind::UnexpectedToken, self.current().span);
    }

    /// Skips to the next `;` or to the closing `}` at the current nesting
    /// depth, so statement parsing can resume.
    fn synchronize(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.current().kind.clone() {
                TokenKind::Eof => return,
                TokenKind::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                TokenKind::LBrace => {
                    depth += 1;
                    self.advance();
                }
                TokenKind::RBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                    self.advance();
                }
                _ => {
                    self.advance();
                }
            }
        }
    }
}
