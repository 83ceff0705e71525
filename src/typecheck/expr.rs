use super::TypeChecker;
use crate::ast::display::expr_text;
use crate::ast::*;
use crate::builtins::{ArgShape, BuiltinCall};
use crate::diagnostic::Diagnostic;
use crate::span::Spanned;
use crate::types::{OperandRule, Ty};

impl TypeChecker<'_> {
    /// Check an expression and return the types it leaves on the stack.
    pub(super) fn check_expr(&mut self, expr: &Spanned<Expr>) -> Vec<Ty> {
        match &expr.node {
            Expr::Literal {
                value: Literal::Int(_),
                ..
            } => vec![Ty::Integer],
            Expr::Literal {
                value: Literal::Bytes(_),
                ..
            } => vec![Ty::Bytes],
            Expr::Ident { name, scope } => {
                vec![self
                    .program
                    .scopes
                    .lookup(*scope, name)
                    .map_or(Ty::Invalid, |s| s.ty)]
            }
            Expr::Unary { op, operand } => {
                let ty = self.check_scalar(operand);
                if ty != Ty::Invalid && ty != Ty::Integer {
                    let diag = operand_error(op.as_str(), ty, expr);
                    self.diagnostics.push(diag);
                    return vec![Ty::Invalid];
                }
                vec![op.result_ty()]
            }
            Expr::Binary { op, lhs, rhs } => {
                let lt = self.check_scalar(lhs);
                let rt = self.check_scalar(rhs);
                if lt == Ty::Invalid || rt == Ty::Invalid {
                    return vec![Ty::Invalid];
                }
                if lt != rt {
                    self.error(
                        format!(
                            "types mismatch: {} and {} in expr '{}'",
                            lt,
                            rt,
                            expr_text(&expr.node)
                        ),
                        expr.span,
                    );
                    return vec![Ty::Invalid];
                }
                let allowed = match op.operand_rule() {
                    OperandRule::Integer => lt == Ty::Integer,
                    OperandRule::Any => lt.is_resolved(),
                };
                if !allowed {
                    let diag = operand_error(op.as_str(), lt, expr);
                    self.diagnostics.push(diag);
                    return vec![Ty::Invalid];
                }
                vec![op.result_ty()]
            }
            Expr::Group(inner) => self.check_expr(inner),
            Expr::Call { function, name, args, .. } => {
                let program = self.program;
                let def = program.function(*function);
                for (i, (arg, expected)) in args.iter().zip(&def.param_tys).enumerate() {
                    let ty = self.check_scalar(arg);
                    if ty != Ty::Invalid && ty != *expected {
                        self.error(
                            format!(
                                "argument {} of '{}' must be {}, found {}",
                                i + 1,
                                name,
                                shape_name(*expected),
                                ty
                            ),
                            arg.span,
                        );
                    }
                }
                vec![def.return_ty]
            }
            Expr::Builtin(call) => self.check_builtin(call),
            Expr::If {
                cond,
                then_expr,
                else_expr,
                ..
            } => {
                self.check_condition(cond);
                let tt = self.check_scalar(then_expr);
                let et = self.check_scalar(else_expr);
                if tt == Ty::Invalid || et == Ty::Invalid {
                    return vec![Ty::Invalid];
                }
                if tt != et {
                    self.error(
                        format!(
                            "types mismatch: if branches are {} and {} in expr '{}'",
                            tt,
                            et,
                            expr_text(&expr.node)
                        ),
                        expr.span,
                    );
                    return vec![Ty::Invalid];
                }
                vec![tt]
            }
            Expr::Field(access) => {
                if let FieldSource::Gtxn(index) = &access.source {
                    self.check_index(index);
                }
                if let Some(index) = &access.index {
                    self.check_index(index);
                }
                vec![access.field.ty]
            }
            Expr::Arg(index) => {
                self.check_index(index);
                vec![Ty::Bytes]
            }
            Expr::Cast { ty, expr: inner } => {
                let from = self.check_scalar(inner);
                if from == Ty::Invalid {
                    return vec![Ty::Invalid];
                }
                vec![*ty]
            }
        }
    }

    /// Check an expression that must produce exactly one value.
    pub(super) fn check_scalar(&mut self, expr: &Spanned<Expr>) -> Ty {
        let results = self.check_expr(expr);
        match results.as_slice() {
            [ty] => *ty,
            _ if results.contains(&Ty::Invalid) => Ty::Invalid,
            _ => {
                self.error(
                    format!(
                        "expr '{}' produces {} values where one is expected",
                        expr_text(&expr.node),
                        results.len()
                    ),
                    expr.span,
                );
                Ty::Invalid
            }
        }
    }

    fn check_index(&mut self, index: &Index) {
        let Index::Dynamic(expr) = index else {
            return;
        };
        let ty = self.check_scalar(expr);
        if ty != Ty::Invalid && ty != Ty::Integer {
            self.error(
                format!(
                    "index must be integer, found {} in expr '{}'",
                    ty,
                    expr_text(&expr.node)
                ),
                expr.span,
            );
        }
    }

    fn check_builtin(&mut self, call: &BuiltinCall) -> Vec<Ty> {
        let mut ok = true;
        for (arg, (position, shape)) in call.args.iter().zip(&call.params) {
            let ty = self.check_scalar(arg);
            if ty == Ty::Invalid {
                ok = false;
                continue;
            }
            if !shape.accepts(ty) {
                let mut diag = Diagnostic::semantic(
                    format!(
                        "argument {} of '{}' must be {}, found {}",
                        position,
                        call.name,
                        shape.expectation(),
                        ty
                    ),
                    arg.span,
                );
                if ty == Ty::Unknown && *shape != ArgShape::Any {
                    diag = diag.with_help("convert the value with toint(...) or tobyte(...)".to_string());
                }
                self.diagnostics.push(diag);
                ok = false;
            }
        }
        if ok {
            call.results.clone()
        } else {
            vec![Ty::Invalid; call.results.len()]
        }
    }
}

fn operand_error(op: &str, ty: Ty, expr: &Spanned<Expr>) -> Diagnostic {
    let diag = Diagnostic::semantic(
        format!(
            "operator '{}' does not accept {} operands in expr '{}'",
            op,
            ty,
            expr_text(&expr.node)
        ),
        expr.span,
    );
    if ty == Ty::Unknown {
        diag.with_help("convert the value with toint(...) or tobyte(...)".to_string())
    } else {
        diag
    }
}

fn shape_name(ty: Ty) -> &'static str {
    match ty {
        Ty::Bytes => "byte[]",
        _ => "int",
    }
}
