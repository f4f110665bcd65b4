//! Expression parsing.
//!
//! Layered recursive descent matching the language's precedence table, from
//! loosest to tightest: `||`, `&&`, comparison (non-associative), additive,
//! multiplicative, unary `-`, then postfix member access over a primary.

use audc_lex::TokenKind;

use crate::ast::{BinOp, CtorKind, Expr};
use crate::Parser;

impl<'a> Parser<'a> {
    /// Entry point for a full expression.
    pub(crate) fn parse_expr(&mut self) -> Option<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Option<Expr> {
        let mut left = self.parse_and()?;
        while self.eat(TokenKind::OrOr) {
            let right = self.parse_and()?;
            let span = left.span().merge(right.span());
            left = Expr::Binary {
                op: BinOp::Or,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        Some(left)
    }

    fn parse_and(&mut self) -> Option<Expr> {
        let mut left = self.parse_comparison()?;
        while self.eat(TokenKind::AndAnd) {
            let right = self.parse_comparison()?;
            let span = left.span().merge(right.span());
            left = Expr::Binary {
                op: BinOp::And,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        Some(left)
    }

    /// Comparison is non-associative: `a < b < c` is rejected at the second
    /// operator.
    fn parse_comparison(&mut self) -> Option<Expr> {
        let left = self.parse_additive()?;
        let Some(op) = comparison_op(&self.current().kind) else {
            return Some(left);
        };
        self.advance();
        let right = self.parse_additive()?;
        if comparison_op(&self.current().kind).is_some() {
            self.unexpected_here();
            return None;
        }
        let span = left.span().merge(right.span());
        Some(Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            span,
        })
    }

    fn parse_additive(&mut self) -> Option<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            let span = left.span().merge(right.span());
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        Some(left)
    }

    fn parse_multiplicative(&mut self) -> Option<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            let span = left.span().merge(right.span());
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        Some(left)
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        if self.current().kind == TokenKind::Minus {
            let start = self.current().span;
            self.advance();
            let operand = self.parse_unary()?;
            let span = start.merge(operand.span());
            return Some(Expr::Unary {
                operand: Box::new(operand),
                span,
            });
        }
        self.parse_postfix()
    }

    /// A primary followed by a left-associative chain of `.ident` attribute
    /// reads and `.ident(args)` method calls.
    fn parse_postfix(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary()?;
        while self.eat(TokenKind::Dot) {
            let (name, _) = self.expect_ident()?;
            let args = if self.current().kind == TokenKind::LParen {
                Some(self.parse_args()?)
            } else {
                None
            };
            let span = expr.span().merge(self.prev_span());
            expr = Expr::Member {
                target: Box::new(expr),
                name,
                args,
                span,
            };
        }
        Some(expr)
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        let span = self.current().span;
        match self.current().kind.clone() {
            TokenKind::IntLit(value) => {
                self.advance();
                Some(Expr::IntLit { value, span })
            }
            TokenKind::FloatLit(value) => {
                self.advance();
                Some(Expr::FloatLit { value, span })
            }
            TokenKind::StringLit(value) => {
                self.advance();
                Some(Expr::StringLit { value, span })
            }
            TokenKind::True => {
                self.advance();
                Some(Expr::BoolLit { value: true, span })
            }
            TokenKind::False => {
                self.advance();
                Some(Expr::BoolLit { value: false, span })
            }
            TokenKind::Null => {
                self.advance();
                Some(Expr::NullLit { span })
            }
            TokenKind::Ident(name) => {
                self.advance();
                if self.current().kind == TokenKind::LParen {
                    let args = self.parse_args()?;
                    let span = span.merge(self.prev_span());
                    Some(Expr::Call {
                        callee: name,
                        args,
                        span,
                    })
                } else {
                    Some(Expr::Ident { name, span })
                }
            }
            TokenKind::Folder => self.parse_ctor(CtorKind::Folder),
            TokenKind::File => self.parse_ctor(CtorKind::File),
            TokenKind::Audio => self.parse_ctor(CtorKind::Audio),
            TokenKind::LBracket => {
                self.advance();
                let mut items = Vec::new();
                if self.current().kind != TokenKind::RBracket {
                    loop {
                        items.push(self.parse_expr()?);
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RBracket)?;
                let span = span.merge(self.prev_span());
                Some(Expr::ListLit { items, span })
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect_rparen()?;
                let span = span.merge(self.prev_span());
                Some(Expr::Paren {
                    inner: Box::new(inner),
                    span,
                })
            }
            _ => {
                self.unexpected_here();
                None
            }
        }
    }

    fn parse_ctor(&mut self, kind: CtorKind) -> Option<Expr> {
        let start = self.current().span;
        self.advance();
        let args = self.parse_args()?;
        let span = start.merge(self.prev_span());
        Some(Expr::Ctor { kind, args, span })
    }

    /// `( expr, … )` - the argument list of calls, methods and constructors.
    pub(crate) fn parse_args(&mut self) -> Option<Vec<Expr>> {
        self.expect_lparen()?;
        let mut args = Vec::new();
        if self.current().kind != TokenKind::RParen {
            loop {
                args.push(self.parse_expr()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect_rparen()?;
        Some(args)
    }
}

fn comparison_op(kind: &TokenKind) -> Option<BinOp> {
    let op = match kind {
        TokenKind::Lt => BinOp::Lt,
        TokenKind::LtEq => BinOp::LtEq,
        TokenKind::Gt => BinOp::Gt,
        TokenKind::GtEq => BinOp::GtEq,
        TokenKind::EqEq => BinOp::Eq,
        TokenKind::NotEq => BinOp::NotEq,
        _ => return None,
    };
    Some(op)
}
