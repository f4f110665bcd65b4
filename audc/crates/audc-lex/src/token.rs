//! Token definitions for the Aud language.

use std::fmt;

use audc_util::Span;

/// A lexical unit: its kind (with any literal payload) plus the position of
/// its first character.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// True for the end-of-input marker.
    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

/// Kind of a token, carrying the literal payload where one exists.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Keywords.
    /// "func" - function definition keyword.
    Func,
    /// "void" - return type of value-less functions.
    Void,
    /// "int" - integer type keyword.
    Int,
    /// "float" - floating point type keyword.
    Float,
    /// "bool" - boolean type keyword.
    Bool,
    /// "string" - string type keyword.
    String,
    /// "Folder" - folder type keyword / constructor name.
    Folder,
    /// "File" - file type keyword / constructor name.
    File,
    /// "Audio" - audio type keyword / constructor name.
    Audio,
    /// "List" - generic list type keyword.
    List,
    /// "if" - conditional keyword.
    If,
    /// "else" - alternative branch keyword.
    Else,
    /// "while" - loop keyword.
    While,
    /// "return" - function return keyword.
    Return,
    /// "true" boolean literal.
    True,
    /// "false" boolean literal.
    False,
    /// "null" - absent composite value.
    Null,

    // Identifier and literals.
    Ident(std::string::String),
    IntLit(i64),
    FloatLit(f64),
    StringLit(std::string::String),

    // Operators.
    /// "+"
    Plus,
    /// "-"
    Minus,
    /// "*"
    Star,
    /// "/"
    Slash,
    /// "<"
    Lt,
    /// "<="
    LtEq,
    /// ">"
    Gt,
    /// ">="
    GtEq,
    /// "=="
    EqEq,
    /// "!="
    NotEq,
    /// "&&"
    AndAnd,
    /// "||"
    OrOr,
    /// "="
    Assign,

    // Punctuation.
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Dot,

    /// End of input marker.
    Eof,
}

impl TokenKind {
    /// Maps identifier-shaped text to its reserved word, if it is one.
    pub fn keyword(text: &str) -> Option<TokenKind> {
        let kind = match text {
            "func" => TokenKind::Func,
            "void" => TokenKind::Void,
            "int" => TokenKind::Int,
            "float" => TokenKind::Float,
            "bool" => TokenKind::Bool,
            "string" => TokenKind::String,
            "Folder" => TokenKind::Folder,
            "File" => TokenKind::File,
            "Audio" => TokenKind::Audio,
            "List" => TokenKind::List,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "return" => TokenKind::Return,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            _ => return None,
        };
        Some(kind)
    }

    /// True for keywords that can begin a type signature.
    pub fn starts_type(&self) -> bool {
        matches!(
            self,
            TokenKind::Int
                | TokenKind::Float
                | TokenKind::Bool
                | TokenKind::String
                | TokenKind::Folder
                | TokenKind::File
                | TokenKind::Audio
                | TokenKind::List
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Func => write!(f, "func"),
            TokenKind::Void => write!(f, "void"),
            TokenKind::Int => write!(f, "int"),
            TokenKind::Float => write!(f, "float"),
            TokenKind::Bool => write!(f, "bool"),
            TokenKind::String => write!(f, "string"),
            TokenKind::Folder => write!(f, "Folder"),
            TokenKind::File => write!(f, "File"),
            TokenKind::Audio => write!(f, "Audio"),
            TokenKind::List => write!(f, "List"),
            TokenKind::If => write!(f, "if"),
            TokenKind::Else => write!(f, "else"),
            TokenKind::While => write!(f, "while"),
            TokenKind::Return => write!(f, "return"),
            TokenKind::True => write!(f, "true"),
            TokenKind::False => write!(f, "false"),
            TokenKind::Null => write!(f, "null"),
            TokenKind::Ident(name) => write!(f, "{name}"),
            TokenKind::IntLit(v) => write!(f, "{v}"),
            TokenKind::FloatLit(v) => write!(f, "{v}"),
            TokenKind::StringLit(s) => write!(f, "{s:?}"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Lt => write!(f, "<"),
            TokenKind::LtEq => write!(f, "<="),
            TokenKind::Gt => write!(f, ">"),
            TokenKind::GtEq => write!(f, ">="),
            TokenKind::EqEq => write!(f, "=="),
            TokenKind::NotEq => write!(f, "!="),
            TokenKind::AndAnd => write!(f, "&&"),
            TokenKind::OrOr => write!(f, "||"),
            TokenKind::Assign => write!(f, "="),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::LBrace => write!(f, "{{"),
            TokenKind::RBrace => write!(f, "}}"),
            TokenKind::LBracket => write!(f, "["),
            TokenKind::RBracket => write!(f, "]"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Semicolon => write!(f, ";"),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Eof => write!(f, "<eof>"),
        }
    }
}
