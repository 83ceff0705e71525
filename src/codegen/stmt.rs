use super::{Ctx, Emitter, ReturnMode};
use crate::ast::*;

impl Emitter<'_> {
    pub(super) fn emit_stmt(&mut self, stmt: &Stmt, ctx: &mut Ctx) {
        match stmt {
            Stmt::VarDecl { scope, names, value } => {
                self.emit_expr(&value.node, ctx);
                self.store_all(*scope, names);
            }
            Stmt::ConstDecl { .. } => {}
            Stmt::Assign {
                scope,
                targets,
                value,
            } => {
                self.emit_expr(&value.node, ctx);
                self.store_all(*scope, targets);
            }
            Stmt::AssignField { field, value } => {
                self.emit_expr(&value.node, ctx);
                self.inst(&format!("itxn_field {}", field.name));
            }
            Stmt::InnerBegin => self.inst("itxn_begin"),
            Stmt::InnerSubmit => self.inst("itxn_submit"),
            Stmt::Return(value) => {
                self.emit_expr(&value.node, ctx);
                match &ctx.ret {
                    ReturnMode::Program => self.inst("return"),
                    ReturnMode::Subroutine => self.inst("retsub"),
                    ReturnMode::Inline(end) => {
                        let jump = format!("b {}", end);
                        self.inst(&jump);
                    }
                }
            }
            Stmt::Error => self.inst("err"),
            Stmt::If {
                cond,
                then_block,
                else_block,
                label,
            } => {
                let end = ctx.label("if_end", *label);
                self.emit_expr(&cond.node, ctx);
                match else_block {
                    Some(else_block) => {
                        let false_label = ctx.label("if_false", *label);
                        self.inst(&format!("bz {}", false_label));
                        self.emit_block(then_block, ctx);
                        self.inst(&format!("b {}", end));
                        self.emit_label(&false_label);
                        self.emit_block(else_block, ctx);
                    }
                    None => {
                        self.inst(&format!("bz {}", end));
                        self.emit_block(then_block, ctx);
                    }
                }
                self.emit_label(&end);
            }
            Stmt::For { cond, body, label } => {
                let start = ctx.label("loop_start", *label);
                let end = ctx.label("loop_end", *label);
                self.emit_label(&start);
                self.emit_expr(&cond.node, ctx);
                self.inst(&format!("bz {}", end));
                ctx.loop_ends.push(end.clone());
                self.emit_block(body, ctx);
                ctx.loop_ends.pop();
                self.inst(&format!("b {}", start));
                self.emit_label(&end);
            }
            Stmt::Break => {
                let Some(end) = ctx.loop_ends.last() else {
                    panic!("internal error: break outside of a loop reached code generation");
                };
                let jump = format!("b {}", end);
                self.inst(&jump);
            }
            Stmt::Expr(value) => {
                self.emit_expr(&value.node, ctx);
                let program = self.program;
                let produced = value
                    .node
                    .result_types(&program.scopes, &program.functions)
                    .len();
                for _ in 0..produced {
                    self.inst("pop");
                }
            }
        }
    }
}
