//! Main lexer for Aud source code.
//!
//! The lexer transforms source text into a stream of [`Token`]s using direct
//! dispatch on the first character of each lexeme. Whitespace and block
//! comments are consumed by an internal filter before every token.
//!
//! Recoverable errors are reported to the shared [`Handler`] and lexing
//! continues, so a single pass can surface every lexical problem in the file.

use audc_util::{DiagnosticKind, Handler, Limits, Span};

use crate::cursor::Cursor;
use crate::token::{Token, TokenKind};

/// The Aud lexer.
///
/// # Examples
///
/// ```
/// use audc_lex::{Lexer, TokenKind};
/// use audc_util::{Handler, Limits};
///
/// let handler = Handler::new();
/// let mut lexer = Lexer::new("int x = 42;", Limits::default(), &handler);
///
/// assert_eq!(lexer.next_token().kind, TokenKind::Int);
/// assert_eq!(lexer.next_token().kind, TokenKind::Ident("x".into()));
/// ```
pub struct Lexer<'a> {
    cursor: Cursor,
    limits: Limits,
    handler: &'a Handler,

    /// Start state of the token being lexed.
    token_start: usize,
    token_start_line: u32,
    token_start_column: u32,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer over the given raw source. Line endings are
    /// normalized by the cursor before any position is assigned.
    pub fn new(source: &str, limits: Limits, handler: &'a Handler) -> Self {
        Self {
            cursor: Cursor::new(source),
            limits,
            handler,
            token_start: 0,
            token_start_line: 1,
            token_start_column: 1,
        }
    }

    /// The normalized source the lexer operates on.
    pub fn source(&self) -> &str {
        self.cursor.source()
    }

    /// Lexes the whole input, returning every token up to and including
    /// `EOF`.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.is_eof();
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    /// Returns the next token from the source.
    ///
    /// Skips whitespace and comments first; lexemes that turn out invalid
    /// are reported and skipped, so the method loops until it can produce a
    /// real token or `EOF`.
    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_whitespace_and_comments();
            self.begin_token();

            if self.cursor.is_at_end() {
                return self.make(TokenKind::Eof);
            }

            match self.cursor.current_char() {
                '(' => return self.single(TokenKind::LParen),
                ')' => return self.single(TokenKind::RParen),
                '{' => return self.single(TokenKind::LBrace),
                '}' => return self.single(TokenKind::RBrace),
                '[' => return self.single(TokenKind::LBracket),
                ']' => return self.single(TokenKind::RBracket),
                ',' => return self.single(TokenKind::Comma),
                ';' => return self.single(TokenKind::Semicolon),
                '.' => return self.single(TokenKind::Dot),
                '+' => return self.single(TokenKind::Plus),
                '-' => return self.single(TokenKind::Minus),
                '*' => return self.single(TokenKind::Star),
                // A comment opener was already consumed by the filter, so a
                // slash here is always division.
                '/' => return self.single(TokenKind::Slash),
                '=' => {
                    self.cursor.advance();
                    if self.cursor.match_char('=') {
                        return self.make(TokenKind::EqEq);
                    }
                    return self.make(TokenKind::Assign);
                }
                '<' => {
                    self.cursor.advance();
                    if self.cursor.match_char('=') {
                        return self.make(TokenKind::LtEq);
                    }
                    return self.make(TokenKind::Lt);
                }
                '>' => {
                    self.cursor.advance();
                    if self.cursor.match_char('=') {
                        return self.make(TokenKind::GtEq);
                    }
                    return self.make(TokenKind::Gt);
                }
                '!' => {
                    if self.cursor.peek(1) == '=' {
                        self.cursor.advance();
                        self.cursor.advance();
                        return self.make(TokenKind::NotEq);
                    }
                    self.invalid_symbol();
                }
                '&' => {
                    if self.cursor.peek(1) == '&' {
                        self.cursor.advance();
                        self.cursor.advance();
                        return self.make(TokenKind::AndAnd);
                    }
                    self.invalid_symbol();
                }
                '|' => {
                    if self.cursor.peek(1) == '|' {
                        self.cursor.advance();
                        self.cursor.advance();
                        return self.make(TokenKind::OrOr);
                    }
                    self.invalid_symbol();
                }
                '"' => {
                    if let Some(token) = self.lex_string() {
                        return token;
                    }
                }
                c if c.is_alphabetic() => return self.lex_identifier(),
                c if c.is_ascii_digit() => {
                    if let Some(token) = self.lex_number() {
                        return token;
                    }
                }
                _ => self.invalid_symbol(),
            }
        }
    }

    /// Records the start state of the next token.
    fn begin_token(&mut self) {
        self.token_start = self.cursor.position();
        self.token_start_line = self.cursor.line();
        self.token_start_column = self.cursor.column();
    }

    /// Builds a token spanning from the recorded start to the current
    /// position.
    fn make(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.token_span())
    }

    fn token_span(&self) -> Span {
        Span::new(
            self.token_start,
            self.cursor.position(),
            self.token_start_line,
            self.token_start_column,
        )
    }

    /// Consumes one character and produces a token of the given kind.
    fn single(&mut self, kind: TokenKind) -> Token {
        self.cursor.advance();
        self.make(kind)
    }

    /// Reports the current character as an invalid symbol and skips it.
    fn invalid_symbol(&mut self) {
        self.handler.report(
            DiagnosticKind::InvalidSymbol,
            Span::point(self.cursor.line(), self.cursor.column()),
        );
        self.cursor.advance();
    }

    /// Skips spaces, tabs, newlines and block comments.
    ///
    /// Block comments do not nest. An unterminated comment is reported at
    /// its opening position; an overlong comment (measured `/*` to `*/`
    /// inclusive, in characters) is reported but consumed fully.
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.cursor.current_char() {
                ' ' | '\t' | '\n' => {
                    self.cursor.advance();
                }
                '/' if self.cursor.peek(1) == '*' => {
                    let open = Span::point(self.cursor.line(), self.cursor.column());
                    self.cursor.advance();
                    self.cursor.advance();
                    let mut length: usize = 2;
                    loop {
                        if self.cursor.is_at_end() {
                            self.handler.report(DiagnosticKind::MissingCommentClose, open);
                            return;
                        }
                        if self.cursor.current_char() == '*' && self.cursor.peek(1) == '/' {
                            self.cursor.advance();
                            self.cursor.advance();
                            length += 2;
                            break;
                        }
                        self.cursor.advance();
                        length += 1;
                    }
                    if length > self.limits.max_comment_length {
                        self.handler
                            .report(DiagnosticKind::MaxCommentLengthExceeded, open);
                    }
                }
                _ => return,
            }
        }
    }

    /// Lexes an identifier or keyword.
    ///
    /// Starts with a letter; continues with letters, digits or `_`. The
    /// token is produced even when the identifier exceeds the length limit.
    fn lex_identifier(&mut self) -> Token {
        let mut length = 0usize;
        loop {
            let c = self.cursor.current_char();
            if !c.is_alphanumeric() && c != '_' {
                break;
            }
            self.cursor.advance();
            length += 1;
        }

        if length > self.limits.max_identifier_length {
            self.handler.report(
                DiagnosticKind::MaxIdentifierLengthExceeded,
                self.token_span(),
            );
        }

        let text = self.cursor.slice_from(self.token_start);
        match TokenKind::keyword(text) {
            Some(kind) => self.make(kind),
            None => self.make(TokenKind::Ident(text.to_string())),
        }
    }

    /// Lexes an integer or float literal.
    ///
    /// Returns `None` when the lexeme is malformed (`34a7`, leading zeros,
    /// out-of-range value); the whole alphanumeric run is consumed and an
    /// `Invalid value` diagnostic anchors at the literal start.
    fn lex_number(&mut self) -> Option<Token> {
        while self.cursor.current_char().is_ascii_digit() {
            self.cursor.advance();
        }

        if self.cursor.current_char() == '.' {
            self.cursor.advance();
            while self.cursor.current_char().is_ascii_digit() {
                self.cursor.advance();
            }
            let text = self.cursor.slice_from(self.token_start);
            return match text.parse::<f64>() {
                Ok(value) => Some(self.make(TokenKind::FloatLit(value))),
                Err(_) => {
                    self.handler
                        .report(DiagnosticKind::InvalidValue, self.token_span());
                    None
                }
            };
        }

        let next = self.cursor.current_char();
        if next.is_alphabetic() || next == '_' {
            self.handler
                .report(DiagnosticKind::InvalidValue, self.token_span());
            self.consume_alphanumeric_run();
            return None;
        }

        let text = self.cursor.slice_from(self.token_start);
        if text.len() > 1 && text.starts_with('0') {
            self.handler
                .report(DiagnosticKind::InvalidValue, self.token_span());
            return None;
        }
        match text.parse::<i64>() {
            Ok(value) => Some(self.make(TokenKind::IntLit(value))),
            Err(_) => {
                self.handler
                    .report(DiagnosticKind::InvalidValue, self.token_span());
                None
            }
        }
    }

    fn consume_alphanumeric_run(&mut self) {
        loop {
            let c = self.cursor.current_char();
            if !c.is_alphanumeric() && c != '_' {
                break;
            }
            self.cursor.advance();
        }
    }

    /// Lexes a string literal.
    ///
    /// Supports the `\n`, `\t`, `\"` and `\\` escapes; an unknown escape
    /// keeps the escaped character. The length limit counts source
    /// characters between the quotes. Returns `None` for a string left open
    /// at end of input.
    fn lex_string(&mut self) -> Option<Token> {
        let open = Span::point(self.cursor.line(), self.cursor.column());
        self.cursor.advance();

        let mut value = String::new();
        let mut source_length = 0usize;
        loop {
            if self.cursor.is_at_end() {
                self.handler.report(DiagnosticKind::InvalidValue, open);
                return None;
            }
            match self.cursor.current_char() {
                '"' => {
                    self.cursor.advance();
                    break;
                }
                '\\' => {
                    self.cursor.advance();
                    source_length += 1;
                    if self.cursor.is_at_end() {
                        continue;
                    }
                    let escaped = self.cursor.advance();
                    source_length += 1;
                    value.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        '"' => '"',
                        '\\' => '\\',
                        other => other,
                    });
                }
                c => {
                    self.cursor.advance();
                    source_length += 1;
                    value.push(c);
                }
            }
        }

        if source_length > self.limits.max_string_length {
            self.handler
                .report(DiagnosticKind::MaxStringLengthExceeded, open);
        }
        Some(self.make(TokenKind::StringLit(value)))
    }
}
