use crate::cst::*;
use crate::lexeme::Lexeme;
use crate::span::Spanned;

use super::Parser;

impl Parser {
    pub(super) fn parse_block(&mut self) -> Spanned<Block> {
        if !self.enter_nesting() {
            let span = self.current_span();
            // Abort: the depth error is already recorded.
            while !self.at(&Lexeme::Eof) {
                self.advance();
            }
            return Spanned::new(Block { stmts: Vec::new() }, span);
        }

        let start = self.current_span();
        self.expect(&Lexeme::LBrace);

        let mut stmts = Vec::new();
        while !self.at(&Lexeme::RBrace) && !self.at(&Lexeme::Eof) {
            let before = self.fatal_count();
            let pos = self.pos;
            if let Some(stmt) = self.parse_stmt() {
                stmts.push(stmt);
            }
            if self.fatal_count() > before {
                self.synchronize();
            }
            if self.pos == pos {
                self.advance();
            }
        }

        let end = self.current_span();
        self.expect(&Lexeme::RBrace);
        self.exit_nesting();
        Spanned::new(Block { stmts }, start.merge(end))
    }

    fn parse_stmt(&mut self) -> Option<Spanned<Stmt>> {
        let start = self.current_span();
        let stmt = match self.peek() {
            Lexeme::Let | Lexeme::Const => {
                let is_const = self.at(&Lexeme::Const);
                let decl = self.parse_decl();
                self.expect(&Lexeme::Semicolon);
                if is_const {
                    Stmt::Const(decl)
                } else {
                    Stmt::Let(decl)
                }
            }
            Lexeme::Return => {
                self.advance();
                let value = self.parse_expr();
                self.expect(&Lexeme::Semicolon);
                Stmt::Return(value)
            }
            Lexeme::Error => {
                self.advance();
                self.expect(&Lexeme::Semicolon);
                Stmt::Error
            }
            Lexeme::Break => {
                self.advance();
                self.expect(&Lexeme::Semicolon);
                Stmt::Break
            }
            Lexeme::If => return Some(self.parse_if_stmt()),
            Lexeme::For => {
                self.advance();
                let cond = self.parse_expr();
                let body = self.parse_block();
                Stmt::For { cond, body }
            }
            _ => return self.parse_assign_or_expr(),
        };
        Some(Spanned::new(stmt, start.merge(self.prev_span())))
    }

    fn parse_if_stmt(&mut self) -> Spanned<Stmt> {
        let start = self.current_span();
        self.expect(&Lexeme::If);
        let cond = self.parse_expr();
        let then_block = self.parse_block();
        let else_block = if self.eat(&Lexeme::Else) {
            if self.at(&Lexeme::If) {
                // `else if` is `else { if ... }`
                let inner_if = self.parse_if_stmt();
                let span = inner_if.span;
                Some(Spanned::new(
                    Block {
                        stmts: vec![inner_if],
                    },
                    span,
                ))
            } else {
                Some(self.parse_block())
            }
        } else {
            None
        };
        let span = start.merge(self.prev_span());
        Spanned::new(
            Stmt::If {
                cond,
                then_block,
                else_block,
            },
            span,
        )
    }

    /// `target (, target)* = expr ;` or `expr ;`.
    fn parse_assign_or_expr(&mut self) -> Option<Spanned<Stmt>> {
        let start = self.current_span();
        let first = self.parse_expr();

        if !self.at(&Lexeme::Comma) && !self.at(&Lexeme::Assign) {
            self.expect(&Lexeme::Semicolon);
            let span = start.merge(self.prev_span());
            return Some(Spanned::new(Stmt::Expr(first), span));
        }

        let mut targets = vec![self.expr_to_target(first)?];
        while self.eat(&Lexeme::Comma) {
            let expr = self.parse_expr();
            targets.push(self.expr_to_target(expr)?);
        }
        self.expect(&Lexeme::Assign);
        let value = self.parse_expr();
        self.expect(&Lexeme::Semicolon);
        let span = start.merge(self.prev_span());
        Some(Spanned::new(Stmt::Assign { targets, value }, span))
    }

    fn expr_to_target(&mut self, expr: Spanned<Expr>) -> Option<Spanned<Target>> {
        let target = match expr.node {
            Expr::Var(name) => Target::Var(name),
            Expr::Member {
                base,
                field,
                index: None,
            } => match base.node {
                Expr::Var(base) => Target::Field { base, field },
                _ => {
                    self.error_at("invalid assignment target", expr.span);
                    return None;
                }
            },
            _ => {
                self.error_at("invalid assignment target", expr.span);
                return None;
            }
        };
        Some(Spanned::new(target, expr.span))
    }
}
