use super::{Ctx, Emitter, ReturnMode};
use crate::ast::*;
use crate::builtins::BuiltinCall;
use crate::scope::{ScopeId, SymbolKind};
use crate::span::Spanned;

impl Emitter<'_> {
    pub(super) fn emit_expr(&mut self, expr: &Expr, ctx: &mut Ctx) {
        match expr {
            Expr::Literal { pool, .. } => self.inst(&pool.load_op()),
            Expr::Ident { name, scope } => self.emit_ident(name, *scope),
            Expr::Unary { op, operand } => {
                self.emit_expr(&operand.node, ctx);
                self.inst(op.opcode());
            }
            Expr::Binary { op, lhs, rhs } => {
                self.emit_expr(&lhs.node, ctx);
                self.emit_expr(&rhs.node, ctx);
                self.inst(op.opcode());
            }
            Expr::Group(inner) => self.emit_expr(&inner.node, ctx),
            Expr::Call {
                function,
                name,
                args,
                site,
            } => self.emit_call(*function, name, args, *site, ctx),
            Expr::Builtin(call) => self.emit_builtin(call, ctx),
            Expr::If {
                cond,
                then_expr,
                else_expr,
                label,
            } => {
                let false_label = ctx.label("if_expr_false", *label);
                let end = ctx.label("if_expr_end", *label);
                self.emit_expr(&cond.node, ctx);
                self.inst(&format!("bz {}", false_label));
                self.emit_expr(&then_expr.node, ctx);
                self.inst(&format!("b {}", end));
                self.emit_label(&false_label);
                self.emit_expr(&else_expr.node, ctx);
                self.emit_label(&end);
            }
            Expr::Field(access) => self.emit_field(access, ctx),
            Expr::Arg(index) => match index {
                Index::Const(n) if *n < 4 => self.inst(&format!("arg_{}", n)),
                Index::Const(n) => self.inst(&format!("arg {}", n)),
                Index::Dynamic(expr) => {
                    self.emit_expr(&expr.node, ctx);
                    self.inst("args");
                }
            },
            Expr::Cast { expr, .. } => self.emit_expr(&expr.node, ctx),
        }
    }

    fn emit_ident(&mut self, name: &str, scope: ScopeId) {
        match self.program.scopes.lookup(scope, name).map(|s| s.kind) {
            Some(SymbolKind::Variable { slot }) => self.inst(&format!("load {}", slot)),
            Some(SymbolKind::Constant(pool)) => self.inst(&pool.load_op()),
            other => panic!(
                "internal error: '{}' cannot be loaded in scope {}: {:?}",
                name, scope.0, other
            ),
        }
    }

    /// Arguments are evaluated left to right, then stored into the callee's
    /// parameter slots starting from the last one.
    fn emit_call(
        &mut self,
        function: FunctionId,
        name: &str,
        args: &[Spanned<Expr>],
        site: u32,
        ctx: &mut Ctx,
    ) {
        let program = self.program;
        let callee = program.function(function);
        for arg in args {
            self.emit_expr(&arg.node, ctx);
        }
        for param in callee.params.iter().rev() {
            let slot = self.slot(callee.scope, &param.node);
            self.inst(&format!("store {}", slot));
        }

        if !callee.inline {
            self.inst(&format!("callsub fun_{}", name));
            return;
        }

        let suffix = format!("{}_{}", ctx.suffix, site);
        let end = format!("inline_{}_end{}", name, suffix);
        let mut inner = Ctx {
            loop_ends: Vec::new(),
            ret: ReturnMode::Inline(end.clone()),
            suffix,
        };
        self.emit_block(&callee.body, &mut inner);
        self.emit_label(&end);
    }

    fn emit_builtin(&mut self, call: &BuiltinCall, ctx: &mut Ctx) {
        for arg in &call.args {
            self.emit_expr(&arg.node, ctx);
        }
        if call.immediates.is_empty() {
            self.inst(&call.op);
        } else {
            self.inst(&format!("{} {}", call.op, call.immediates.join(" ")));
        }
    }

    /// Constant indices become immediates; dynamic ones are pushed and the
    /// stack-indexed opcode variant is used.
    fn emit_field(&mut self, access: &FieldAccess, ctx: &mut Ctx) {
        let field = access.field.name;
        match &access.source {
            FieldSource::Txn => match &access.index {
                None => self.inst(&format!("txn {}", field)),
                Some(Index::Const(j)) => self.inst(&format!("txna {} {}", field, j)),
                Some(Index::Dynamic(j)) => {
                    self.emit_expr(&j.node, ctx);
                    self.inst(&format!("txnas {}", field));
                }
            },
            FieldSource::Gtxn(Index::Const(i)) => match &access.index {
                None => self.inst(&format!("gtxn {} {}", i, field)),
                Some(Index::Const(j)) => self.inst(&format!("gtxna {} {} {}", i, field, j)),
                Some(Index::Dynamic(j)) => {
                    self.emit_expr(&j.node, ctx);
                    self.inst(&format!("gtxnas {} {}", i, field));
                }
            },
            FieldSource::Gtxn(Index::Dynamic(i)) => {
                self.emit_expr(&i.node, ctx);
                match &access.index {
                    None => self.inst(&format!("gtxns {}", field)),
                    Some(Index::Const(j)) => self.inst(&format!("gtxnsa {} {}", field, j)),
                    Some(Index::Dynamic(j)) => {
                        self.emit_expr(&j.node, ctx);
                        self.inst(&format!("gtxnsas {}", field));
                    }
                }
            }
            FieldSource::Global => self.inst(&format!("global {}", field)),
            FieldSource::Itxn => match &access.index {
                None => self.inst(&format!("itxn {}", field)),
                Some(Index::Const(j)) => self.inst(&format!("itxna {} {}", field, j)),
                Some(Index::Dynamic(_)) => {
                    panic!("internal error: dynamic index on itxn.{} reached code generation", field)
                }
            },
        }
    }
}
