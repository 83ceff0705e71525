use super::{AstBuilder, Frame};
use crate::ast::*;
use crate::builtins::fields::{self, FieldInfo};
use crate::cst;
use crate::diagnostic::Diagnostic;
use crate::scope::{RuntimeKind, ScopeId, SymbolKind};
use crate::span::{Span, Spanned};

impl AstBuilder {
    /// Build a statement list. Each declaration opens the scope seen by the
    /// statements after it.
    pub(super) fn build_stmts(&mut self, stmts: &[Spanned<cst::Stmt>], scope: ScopeId) -> Block {
        let mut current = scope;
        let mut block = Block::default();
        for stmt in stmts {
            let built = match &stmt.node {
                cst::Stmt::Let(decl) => {
                    let (next, built) = self.build_decl(decl, false, current, stmt.span);
                    current = next;
                    built
                }
                cst::Stmt::Const(decl) => {
                    let (next, built) = self.build_decl(decl, true, current, stmt.span);
                    current = next;
                    built
                }
                _ => self.build_stmt(stmt, current),
            };
            if let Some(built) = built {
                block.stmts.push(Spanned::new(built, stmt.span));
            }
        }
        block
    }

    fn build_stmt(&mut self, stmt: &Spanned<cst::Stmt>, scope: ScopeId) -> Option<Stmt> {
        match &stmt.node {
            cst::Stmt::Let(_) | cst::Stmt::Const(_) => None,
            cst::Stmt::Assign { targets, value } => self.build_assign(targets, value, scope),
            cst::Stmt::Return(value) => Some(Stmt::Return(self.build_expr(value, scope)?)),
            cst::Stmt::Error => Some(Stmt::Error),
            cst::Stmt::Break => {
                let in_loop = self.frame.as_ref().is_some_and(|f| f.loop_depth > 0);
                if !in_loop {
                    self.error("break outside of a loop".to_string(), stmt.span);
                    return None;
                }
                Some(Stmt::Break)
            }
            cst::Stmt::If {
                cond,
                then_block,
                else_block,
            } => {
                let label = self.next_label();
                let cond = self.build_expr(cond, scope);
                let then_scope = self.scopes.new_block(scope);
                let then_block = self.build_stmts(&then_block.node.stmts, then_scope);
                let else_block = else_block.as_ref().map(|b| {
                    let else_scope = self.scopes.new_block(scope);
                    self.build_stmts(&b.node.stmts, else_scope)
                });
                Some(Stmt::If {
                    cond: cond?,
                    then_block,
                    else_block,
                    label,
                })
            }
            cst::Stmt::For { cond, body } => {
                let label = self.next_label();
                let cond = self.build_expr(cond, scope);
                let body_scope = self.scopes.new_block(scope);
                self.enter_loop();
                let body = self.build_stmts(&body.node.stmts, body_scope);
                self.exit_loop();
                Some(Stmt::For {
                    cond: cond?,
                    body,
                    label,
                })
            }
            cst::Stmt::Expr(expr) => {
                if let cst::Expr::MethodCall { base, method, args } = &expr.node {
                    return self.build_inner_txn_call(base, method, args, scope, expr.span);
                }
                Some(Stmt::Expr(self.build_expr(expr, scope)?))
            }
        }
    }

    fn enter_loop(&mut self) {
        if let Some(frame) = self.frame.as_mut() {
            frame.loop_depth += 1;
        } else {
            self.frame = Some(Frame { loop_depth: 1 });
        }
    }

    fn exit_loop(&mut self) {
        if let Some(frame) = self.frame.as_mut() {
            frame.loop_depth = frame.loop_depth.saturating_sub(1);
        }
    }

    fn build_assign(
        &mut self,
        targets: &[Spanned<cst::Target>],
        value: &Spanned<cst::Expr>,
        scope: ScopeId,
    ) -> Option<Stmt> {
        if let [target] = targets {
            if let cst::Target::Field { base, field } = &target.node {
                return self.build_field_assign(base, field, value, scope, target.span);
            }
        }

        let mut ok = true;
        if !matches!(targets.len(), 1 | 2 | 4) {
            self.error(
                format!("an assignment sets 1, 2 or 4 names, found {}", targets.len()),
                targets[0].span.merge(targets[targets.len() - 1].span),
            );
            ok = false;
        }

        let mut names = Vec::new();
        for target in targets {
            match &target.node {
                cst::Target::Var(name) => {
                    if self.check_assignable(name, scope, target.span) {
                        names.push(Spanned::new(name.clone(), target.span));
                    } else {
                        ok = false;
                    }
                }
                cst::Target::Field { base, field } => {
                    self.error(
                        format!(
                            "'{}.{}' cannot be set as part of a multi-value assignment",
                            base, field.node
                        ),
                        target.span,
                    );
                    ok = false;
                }
            }
        }

        let value = self.build_expr(value, scope)?;
        let produced = value.node.result_types(&self.scopes, &self.functions).len();
        if ok && produced != targets.len() {
            self.count_mismatch(produced, targets.len(), value.span);
            ok = false;
        }

        ok.then_some(Stmt::Assign {
            scope,
            targets: names,
            value,
        })
    }

    /// Only variables can be assigned.
    fn check_assignable(&mut self, name: &str, scope: ScopeId, span: Span) -> bool {
        let Some(sym) = self.scopes.lookup(scope, name) else {
            self.error(format!("identifier '{}' not defined", name), span);
            return false;
        };
        let kind = sym.kind;
        match kind {
            SymbolKind::Variable { .. } => true,
            _ => {
                let msg = format!("cannot assign to {} '{}'", kind.describe(), name);
                self.error(msg, span);
                false
            }
        }
    }

    fn build_field_assign(
        &mut self,
        base: &str,
        field: &Spanned<String>,
        value: &Spanned<cst::Expr>,
        scope: ScopeId,
        span: Span,
    ) -> Option<Stmt> {
        let is_itxn = matches!(
            self.scopes.lookup(scope, base).map(|s| s.kind),
            Some(SymbolKind::Runtime(RuntimeKind::Itxn))
        );
        let value = self.build_expr(value, scope);
        if !is_itxn {
            self.diagnostics.push(
                Diagnostic::semantic(format!("cannot assign to field of '{}'", base), span)
                    .with_help("only inner transaction fields can be set: itxn.Field = value".to_string()),
            );
            return None;
        }
        let field = self.settable_field(field)?;
        if !self.require_version(5, "inner transactions", span) {
            return None;
        }
        Some(Stmt::AssignField {
            field,
            value: value?,
        })
    }

    fn settable_field(&mut self, field: &Spanned<String>) -> Option<&'static FieldInfo> {
        let Some(info) = fields::find(fields::TXN_FIELDS, &field.node) else {
            self.error(
                format!("unknown field '{}' for 'itxn'", field.node),
                field.span,
            );
            return None;
        };
        if !info.settable {
            self.error(
                format!("field '{}' cannot be set on an inner transaction", info.name),
                field.span,
            );
            return None;
        }
        if !self.require_version(info.min_version, &format!("field '{}'", info.name), field.span) {
            return None;
        }
        Some(info)
    }

    /// `itxn.begin()` and `itxn.submit()`.
    fn build_inner_txn_call(
        &mut self,
        base: &Spanned<String>,
        method: &Spanned<String>,
        args: &[Spanned<cst::Expr>],
        scope: ScopeId,
        span: Span,
    ) -> Option<Stmt> {
        let stmt = self.inner_txn_method(base, method, scope)?;
        if !args.is_empty() {
            self.error(
                format!(
                    "'{}.{}' takes no arguments, found {}",
                    base.node,
                    method.node,
                    args.len()
                ),
                span,
            );
            return None;
        }
        if !self.require_version(5, "inner transactions", span) {
            return None;
        }
        Some(stmt)
    }

    /// Resolve `base.method` to the inner-transaction statement it names.
    pub(super) fn inner_txn_method(
        &mut self,
        base: &Spanned<String>,
        method: &Spanned<String>,
        scope: ScopeId,
    ) -> Option<Stmt> {
        match self.scopes.lookup(scope, &base.node).map(|s| s.kind) {
            Some(SymbolKind::Runtime(RuntimeKind::Itxn)) => {}
            None => {
                self.error(format!("identifier '{}' not defined", base.node), base.span);
                return None;
            }
            Some(_) => {
                self.error(format!("'{}' has no methods", base.node), base.span);
                return None;
            }
        }
        match method.node.as_str() {
            "begin" => Some(Stmt::InnerBegin),
            "submit" => Some(Stmt::InnerSubmit),
            other => {
                self.diagnostics.push(
                    Diagnostic::semantic(
                        format!("unknown method '{}' on '{}'", other, base.node),
                        method.span,
                    )
                    .with_help("inner transactions support begin() and submit()".to_string()),
                );
                None
            }
        }
    }
}
