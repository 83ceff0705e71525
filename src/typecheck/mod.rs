//! Type checker: a bottom-up walk over the built program.
//!
//! Every subtree is checked even after an error so that one run reports
//! all independent faults. Expressions typed `invalid` never produce a
//! second error in their parents.

mod expr;
pub mod types;

use tracing::debug;

use crate::ast::display::expr_text;
use crate::ast::*;
use crate::build::ENTRY_NAME;
use crate::diagnostic::Diagnostic;
use crate::span::{Span, Spanned};
use crate::types::Ty;

/// Check a whole program and return every type error found.
pub fn check_program(program: &Program) -> Vec<Diagnostic> {
    let mut checker = TypeChecker::new(program);
    checker.check();
    debug!(errors = checker.diagnostics.len(), "type check finished");
    checker.diagnostics
}

pub(crate) struct TypeChecker<'a> {
    pub(super) program: &'a Program,
    pub(super) diagnostics: Vec<Diagnostic>,
    /// Function whose body is being checked; `None` for top-level code.
    current: Option<FunctionId>,
}

impl<'a> TypeChecker<'a> {
    pub(crate) fn new(program: &'a Program) -> Self {
        Self {
            program,
            diagnostics: Vec::new(),
            current: None,
        }
    }

    fn check(&mut self) {
        let program = self.program;
        for stmt in &program.globals {
            self.check_stmt(stmt);
        }
        for (i, func) in program.functions.iter().enumerate() {
            self.current = Some(FunctionId(i));
            self.check_function(func);
        }
        self.current = None;
    }

    fn check_function(&mut self, func: &FunctionDef) {
        self.check_block(&func.body);

        if !func.body.terminates() {
            self.diagnostics.push(
                Diagnostic::semantic(
                    format!("function '{}' does not return on every path", func.name.node),
                    func.name.span,
                )
                .with_help("end the body with `return` or `error`".to_string()),
            );
        }
        if !func.is_entry && func.return_ty == Ty::Unknown && has_return(&func.body) {
            self.diagnostics.push(
                Diagnostic::semantic(
                    format!("cannot infer the return type of function '{}'", func.name.node),
                    func.name.span,
                )
                .with_help("convert the returned value with toint(...) or tobyte(...)".to_string()),
            );
        }
    }

    fn check_block(&mut self, block: &Block) {
        for stmt in &block.stmts {
            self.check_stmt(stmt);
        }
    }

    fn check_stmt(&mut self, stmt: &Spanned<Stmt>) {
        match &stmt.node {
            Stmt::VarDecl { names, value, .. } => {
                let results = self.check_expr(value);
                for (name, ty) in names.iter().zip(results) {
                    if ty == Ty::Unknown {
                        self.unknown_binding(&name.node, value);
                    }
                }
            }
            Stmt::ConstDecl { value, .. } => {
                self.check_expr(value);
            }
            Stmt::Assign {
                scope,
                targets,
                value,
            } => {
                let results = self.check_expr(value);
                for (target, ty) in targets.iter().zip(results) {
                    let declared = self
                        .program
                        .scopes
                        .lookup(*scope, &target.node)
                        .map_or(Ty::Invalid, |s| s.ty);
                    if ty == Ty::Invalid || declared == Ty::Invalid || ty == declared {
                        continue;
                    }
                    let mut diag = Diagnostic::semantic(
                        format!(
                            "cannot assign {} to '{}' of type {} in expr '{}'",
                            ty,
                            target.node,
                            declared,
                            expr_text(&value.node)
                        ),
                        value.span,
                    );
                    if ty == Ty::Unknown {
                        diag = diag.with_help(cast_help(declared));
                    }
                    self.diagnostics.push(diag);
                }
            }
            Stmt::AssignField { field, value } => {
                let ty = self.check_scalar(value);
                if ty != Ty::Invalid && ty != field.ty {
                    self.diagnostics.push(Diagnostic::semantic(
                        format!(
                            "field '{}' takes {}, found {} in expr '{}'",
                            field.name,
                            field.ty,
                            ty,
                            expr_text(&value.node)
                        ),
                        value.span,
                    ));
                }
            }
            Stmt::Return(value) => self.check_return(value),
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
            Stmt::For { cond, body, .. } => {
                self.check_condition(cond);
                self.check_block(body);
            }
            Stmt::Expr(value) => {
                self.check_expr(value);
            }
            Stmt::InnerBegin | Stmt::InnerSubmit | Stmt::Error | Stmt::Break => {}
        }
    }

    fn unknown_binding(&mut self, name: &str, value: &Spanned<Expr>) {
        self.diagnostics.push(
            Diagnostic::semantic(
                format!(
                    "cannot infer the type of '{}' from expr '{}'",
                    name,
                    expr_text(&value.node)
                ),
                value.span,
            )
            .with_help("convert the value with toint(...) or tobyte(...)".to_string()),
        );
    }

    fn check_return(&mut self, value: &Spanned<Expr>) {
        let results = self.check_expr(value);
        let ty = match results.as_slice() {
            [ty] => *ty,
            _ => {
                self.diagnostics.push(Diagnostic::semantic(
                    format!(
                        "return needs a single value, expr '{}' produces {}",
                        expr_text(&value.node),
                        results.len()
                    ),
                    value.span,
                ));
                return;
            }
        };
        let program = self.program;
        let Some(func) = self.current.map(|id| program.function(id)) else {
            return;
        };
        let expected = func.return_ty;
        if ty == Ty::Invalid || expected == Ty::Invalid || ty == expected {
            return;
        }
        if func.is_entry {
            self.diagnostics.push(Diagnostic::semantic(
                format!(
                    "entry point '{}' must return integer, found {} in expr '{}'",
                    ENTRY_NAME,
                    ty,
                    expr_text(&value.node)
                ),
                value.span,
            ));
        } else if expected != Ty::Unknown {
            self.diagnostics.push(Diagnostic::semantic(
                format!(
                    "function '{}' returns {}, found {} in expr '{}'",
                    func.name.node,
                    expected,
                    ty,
                    expr_text(&value.node)
                ),
                value.span,
            ));
        }
    }

    pub(super) fn check_condition(&mut self, cond: &Spanned<Expr>) {
        let ty = self.check_scalar(cond);
        if ty != Ty::Invalid && ty != Ty::Integer {
            self.diagnostics.push(Diagnostic::semantic(
                format!(
                    "condition must be integer, found {} in expr '{}'",
                    ty,
                    expr_text(&cond.node)
                ),
                cond.span,
            ));
        }
    }

    pub(super) fn error(&mut self, msg: String, span: Span) {
        self.diagnostics.push(Diagnostic::semantic(msg, span));
    }
}

fn cast_help(target: Ty) -> String {
    let cast = if target == Ty::Bytes { "tobyte" } else { "toint" };
    format!("convert the value with {}(...)", cast)
}

fn has_return(block: &Block) -> bool {
    block.stmts.iter().any(|s| match &s.node {
        Stmt::Return(_) => true,
        Stmt::If {
            then_block,
            else_block,
            ..
        } => has_return(then_block) || else_block.as_ref().is_some_and(has_return),
        Stmt::For { body, .. } => has_return(body),
        _ => false,
    })
}
