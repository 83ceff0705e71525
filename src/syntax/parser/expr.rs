use crate::cst::*;
use crate::lexeme::Lexeme;
use crate::span::Spanned;
use crate::types::{BinOp, UnOp};

use super::Parser;

impl Parser {
    pub(super) fn parse_expr(&mut self) -> Spanned<Expr> {
        if !self.enter_nesting() {
            let span = self.current_span();
            while !self.at(&Lexeme::Eof) {
                self.advance();
            }
            return Spanned::new(Expr::Int(0), span);
        }
        let expr = self.parse_expr_bp(0);
        self.exit_nesting();
        expr
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Spanned<Expr> {
        let mut lhs = self.parse_unary();

        loop {
            let Some(op) = binary_op(self.peek()) else {
                break;
            };

            let (l_bp, r_bp) = op.binding_power();
            if l_bp < min_bp {
                break;
            }

            self.advance(); // consume operator
            let rhs = self.parse_expr_bp(r_bp);
            let span = lhs.span.merge(rhs.span);

            if op.is_comparison() {
                if let Expr::Binary { op: inner, .. } = &lhs.node {
                    if inner.is_comparison() {
                        self.note_ambiguity(
                            format!(
                                "chained comparison: '{}' applies to the result of '{}'",
                                op.as_str(),
                                inner.as_str()
                            ),
                            span,
                        );
                    }
                }
            }

            lhs = Spanned::new(
                Expr::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }

        lhs
    }

    fn parse_unary(&mut self) -> Spanned<Expr> {
        let start = self.current_span();
        let op = match self.peek() {
            Lexeme::Bang => UnOp::Not,
            Lexeme::Tilde => UnOp::BitNot,
            _ => return self.parse_primary(),
        };
        self.advance();
        if !self.enter_nesting() {
            return Spanned::new(Expr::Int(0), start);
        }
        let operand = self.parse_unary();
        self.exit_nesting();
        let span = start.merge(operand.span);
        Spanned::new(
            Expr::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        )
    }

    fn parse_primary(&mut self) -> Spanned<Expr> {
        let start = self.current_span();

        match self.peek().clone() {
            Lexeme::Integer(n) => {
                self.advance();
                Spanned::new(Expr::Int(n), start)
            }
            Lexeme::Bytes(bytes) => {
                self.advance();
                Spanned::new(Expr::Bytes(bytes), start)
            }
            Lexeme::LParen => {
                self.advance();
                let inner = self.parse_expr();
                self.expect(&Lexeme::RParen);
                let span = start.merge(self.prev_span());
                Spanned::new(Expr::Group(Box::new(inner)), span)
            }
            Lexeme::If => self.parse_if_expr(),
            Lexeme::Ident(name) => {
                self.advance();
                let name = Spanned::new(name, start);
                self.parse_name_suffix(name)
            }
            _ => {
                self.error_with_help(
                    &format!("expected expression, found {}", self.peek().description()),
                    "expressions are literals, names, calls, field accesses or operators",
                );
                Spanned::new(Expr::Int(0), start)
            }
        }
    }

    /// `if cond { a } else { b }` in expression position.
    fn parse_if_expr(&mut self) -> Spanned<Expr> {
        let start = self.current_span();
        self.expect(&Lexeme::If);
        let cond = self.parse_expr();
        self.expect(&Lexeme::LBrace);
        let then_expr = self.parse_expr();
        self.expect(&Lexeme::RBrace);
        if !self.at(&Lexeme::Else) {
            self.error_with_help(
                &format!("expected 'else', found {}", self.peek().description()),
                "an if-expression must have both branches",
            );
        } else {
            self.advance();
        }
        self.expect(&Lexeme::LBrace);
        let else_expr = self.parse_expr();
        self.expect(&Lexeme::RBrace);
        let span = start.merge(self.prev_span());
        Spanned::new(
            Expr::If {
                cond: Box::new(cond),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            span,
        )
    }

    /// What may follow a name: a call, an index, a field or a method call.
    fn parse_name_suffix(&mut self, name: Spanned<String>) -> Spanned<Expr> {
        let start = name.span;

        if self.eat(&Lexeme::LParen) {
            let args = self.parse_call_args();
            self.expect(&Lexeme::RParen);
            let span = start.merge(self.prev_span());
            return Spanned::new(Expr::Call { name, args }, span);
        }

        let base = if self.eat(&Lexeme::LBracket) {
            let index = self.parse_expr();
            self.expect(&Lexeme::RBracket);
            let span = start.merge(self.prev_span());
            Spanned::new(
                Expr::Index {
                    base: name,
                    index: Box::new(index),
                },
                span,
            )
        } else if self.at(&Lexeme::Dot) {
            // Method call on a bare name: `itxn.begin()`.
            if matches!(self.peek_nth(1), Lexeme::Ident(_))
                && matches!(self.peek_nth(2), Lexeme::LParen)
            {
                self.advance(); // .
                let method = self.expect_ident();
                self.expect(&Lexeme::LParen);
                let args = self.parse_call_args();
                self.expect(&Lexeme::RParen);
                let span = start.merge(self.prev_span());
                return Spanned::new(
                    Expr::MethodCall {
                        base: name,
                        method,
                        args,
                    },
                    span,
                );
            }
            Spanned::new(Expr::Var(name.node), start)
        } else {
            return Spanned::new(Expr::Var(name.node), start);
        };

        if !self.eat(&Lexeme::Dot) {
            return base;
        }
        let field = self.expect_ident();
        let index = if self.eat(&Lexeme::LBracket) {
            let index = self.parse_expr();
            self.expect(&Lexeme::RBracket);
            Some(Box::new(index))
        } else {
            None
        };
        let span = start.merge(self.prev_span());
        Spanned::new(
            Expr::Member {
                base: Box::new(base),
                field,
                index,
            },
            span,
        )
    }

    fn parse_call_args(&mut self) -> Vec<Spanned<Expr>> {
        let mut args = Vec::new();
        while !self.at(&Lexeme::RParen) && !self.at(&Lexeme::Eof) {
            args.push(self.parse_expr());
            if !self.eat(&Lexeme::Comma) {
                break;
            }
        }
        args
    }
}

fn binary_op(lexeme: &Lexeme) -> Option<BinOp> {
    let op = match lexeme {
        Lexeme::PipePipe => BinOp::Or,
        Lexeme::AmpAmp => BinOp::And,
        Lexeme::EqEq => BinOp::Eq,
        Lexeme::NotEq => BinOp::NotEq,
        Lexeme::Lt => BinOp::Lt,
        Lexeme::LtEq => BinOp::LtEq,
        Lexeme::Gt => BinOp::Gt,
        Lexeme::GtEq => BinOp::GtEq,
        Lexeme::Plus => BinOp::Add,
        Lexeme::Minus => BinOp::Sub,
        Lexeme::Pipe => BinOp::BitOr,
        Lexeme::Caret => BinOp::BitXor,
        Lexeme::Star => BinOp::Mul,
        Lexeme::Slash => BinOp::Div,
        Lexeme::Percent => BinOp::Mod,
        Lexeme::Amp => BinOp::BitAnd,
        _ => return None,
    };
    Some(op)
}
