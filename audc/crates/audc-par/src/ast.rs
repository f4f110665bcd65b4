//! Syntax tree node definitions for Aud programs.
//!
//! Every node carries the span of its first token so later stages can anchor
//! diagnostics without holding on to the token stream.

use std::fmt;

use audc_util::Span;

/// A type signature as written in source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeSig {
    Void,
    Bool,
    Int,
    Float,
    String,
    Folder,
    File,
    Audio,
    List(Box<TypeSig>),
}

impl TypeSig {
    /// True for types whose values are handles with reference semantics.
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            TypeSig::Folder | TypeSig::File | TypeSig::Audio | TypeSig::List(_)
        )
    }
}

impl fmt::Display for TypeSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSig::Void => write!(f, "void"),
            TypeSig::Bool => write!(f, "bool"),
            TypeSig::Int => write!(f, "int"),
            TypeSig::Float => write!(f, "float"),
            TypeSig::String => write!(f, "string"),
            TypeSig::Folder => write!(f, "Folder"),
            TypeSig::File => write!(f, "File"),
            TypeSig::Audio => write!(f, "Audio"),
            TypeSig::List(elem) => write!(f, "List<{elem}>"),
        }
    }
}

/// The signature of a function: parameter types and return type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FuncSig {
    pub params: Vec<TypeSig>,
    pub ret: TypeSig,
}

/// A parsed program: top-level statements and function definitions in
/// source order.
#[derive(Clone, Debug)]
pub struct Program {
    pub stmts: Vec<Stmt>,
}

/// A braced sequence of statements.
#[derive(Clone, Debug)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

/// A function parameter.
#[derive(Clone, Debug)]
pub struct Param {
    pub ty: TypeSig,
    pub name: String,
    pub span: Span,
}

/// Statement node.
#[derive(Clone, Debug)]
pub enum Stmt {
    /// `type name = expr;`
    VarDecl {
        ty: TypeSig,
        name: String,
        init: Expr,
        span: Span,
    },
    /// `name = expr;`
    Assign {
        name: String,
        value: Expr,
        span: Span,
    },
    /// `if (cond) { … } else { … }`
    If {
        cond: Expr,
        then_block: Block,
        else_block: Option<Block>,
        span: Span,
    },
    /// `while (cond) { … }`
    While {
        cond: Expr,
        body: Block,
        span: Span,
    },
    /// An expression standing alone, `expr;`
    Expr { expr: Expr, span: Span },
    /// `return;` or `return expr;`
    Return { value: Option<Expr>, span: Span },
    /// `func type name(params) { … }` - top level only.
    FuncDef {
        ret: TypeSig,
        name: String,
        params: Vec<Param>,
        body: Block,
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::VarDecl { span, .. }
            | Stmt::Assign { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::Expr { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::FuncDef { span, .. } => *span,
        }
    }
}

/// Constructible domain types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CtorKind {
    Folder,
    File,
    Audio,
}

impl CtorKind {
    pub fn type_sig(self) -> TypeSig {
        match self {
            CtorKind::Folder => TypeSig::Folder,
            CtorKind::File => TypeSig::File,
            CtorKind::Audio => TypeSig::Audio,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CtorKind::Folder => "Folder",
            CtorKind::File => "File",
            CtorKind::Audio => "Audio",
        }
    }
}

/// Binary operators, grouped by precedence level in the parser.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eq,
    NotEq,
    And,
    Or,
}

impl BinOp {
    /// True for the non-associative comparison level.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq | BinOp::Eq | BinOp::NotEq
        )
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Lt => "<",
            BinOp::LtEq => "<=",
            BinOp::Gt => ">",
            BinOp::GtEq => ">=",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        };
        write!(f, "{text}")
    }
}

/// Expression node.
#[derive(Clone, Debug)]
pub enum Expr {
    IntLit {
        value: i64,
        span: Span,
    },
    FloatLit {
        value: f64,
        span: Span,
    },
    StringLit {
        value: String,
        span: Span,
    },
    BoolLit {
        value: bool,
        span: Span,
    },
    NullLit {
        span: Span,
    },
    Ident {
        name: String,
        span: Span,
    },
    /// Unary minus.
    Unary {
        operand: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    /// Free function call, `name(args)`.
    Call {
        callee: String,
        args: Vec<Expr>,
        span: Span,
    },
    /// `target.name` (attribute read) or `target.name(args)` (method call).
    Member {
        target: Box<Expr>,
        name: String,
        args: Option<Vec<Expr>>,
        span: Span,
    },
    /// `Folder(…)`, `File(…)` or `Audio(…)`.
    Ctor {
        kind: CtorKind,
        args: Vec<Expr>,
        span: Span,
    },
    /// `[a, b, c]`
    ListLit {
        items: Vec<Expr>,
        span: Span,
    },
    /// `(inner)`
    Paren {
        inner: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::IntLit { span, .. }
            | Expr::FloatLit { span, .. }
            | Expr::StringLit { span, .. }
            | Expr::BoolLit { span, .. }
            | Expr::NullLit { span }
            | Expr::Ident { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Call { span, .. }
            | Expr::Member { span, .. }
            | Expr::Ctor { span, .. }
            | Expr::ListLit { span, .. }
            | Expr::Paren { span, .. } => *span,
        }
    }

    /// True when the expression names a variable slot the caller owns, which
    /// makes a call argument pass by alias.
    pub fn is_lvalue(&self) -> bool {
        matches!(self, Expr::Ident { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_sig_display() {
        assert_eq!(TypeSig::Int.to_string(), "int");
        assert_eq!(
            TypeSig::List(Box::new(TypeSig::Folder)).to_string(),
            "List<Folder>"
        );
        assert_eq!(
            TypeSig::List(Box::new(TypeSig::List(Box::new(TypeSig::Int)))).to_string(),
            "List<List<int>>"
        );
    }

    #[test]
    fn test_is_composite() {
        assert!(TypeSig::Folder.is_composite());
        assert!(TypeSig::List(Box::new(TypeSig::Int)).is_composite());
        assert!(!TypeSig::Int.is_composite());
        assert!(!TypeSig::Void.is_composite());
    }

    #[test]
    fn test_binop_comparison_level() {
        assert!(BinOp::Lt.is_comparison());
        assert!(BinOp::Eq.is_comparison());
        assert!(!BinOp::Add.is_comparison());
        assert!(!BinOp::And.is_comparison());
    }

    #[test]
    fn test_lvalue_shape() {
        let ident = Expr::Ident {
            name: "x".into(),
            span: Span::DUMMY,
        };
        assert!(ident.is_lvalue());
        let lit = Expr::IntLit {
            value: 1,
            span: Span::DUMMY,
        };
        assert!(!lit.is_lvalue());
    }
}
