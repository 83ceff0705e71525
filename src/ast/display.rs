//! Source-like rendering of expressions, used in diagnostics.

use super::{Expr, FieldSource, Index, Literal};
use crate::types::Ty;

/// Render an expression the way it would be written in source.
pub fn expr_text(expr: &Expr) -> String {
    match expr {
        Expr::Literal { value, .. } => literal_text(value),
        Expr::Ident { name, .. } => name.clone(),
        Expr::Unary { op, operand } => format!("{}{}", op.as_str(), expr_text(&operand.node)),
        Expr::Binary { op, lhs, rhs } => format!(
            "{} {} {}",
            expr_text(&lhs.node),
            op.as_str(),
            expr_text(&rhs.node)
        ),
        Expr::Group(inner) => format!("({})", expr_text(&inner.node)),
        Expr::Call { name, args, .. } => call_text(name, args.iter().map(|a| &a.node)),
        Expr::Builtin(call) => {
            let mut text = call_text(call.name, call.args.iter().map(|a| &a.node));
            if !call.immediates.is_empty() {
                text = format!("{} [{}]", text, call.immediates.join(" "));
            }
            text
        }
        Expr::If {
            cond,
            then_expr,
            else_expr,
            ..
        } => format!(
            "if {} {{{}}} else {{{}}}",
            expr_text(&cond.node),
            expr_text(&then_expr.node),
            expr_text(&else_expr.node)
        ),
        Expr::Field(access) => {
            let base = match &access.source {
                FieldSource::Txn => "txn".to_string(),
                FieldSource::Gtxn(idx) => format!("gtxn[{}]", index_text(idx)),
                FieldSource::Global => "global".to_string(),
                FieldSource::Itxn => "itxn".to_string(),
            };
            match &access.index {
                Some(idx) => format!("{}.{}[{}]", base, access.field.name, index_text(idx)),
                None => format!("{}.{}", base, access.field.name),
            }
        }
        Expr::Arg(idx) => format!("args[{}]", index_text(idx)),
        Expr::Cast { ty, expr } => {
            let name = if *ty == Ty::Bytes { "tobyte" } else { "toint" };
            format!("{}({})", name, expr_text(&expr.node))
        }
    }
}

fn call_text<'a>(name: &str, args: impl Iterator<Item = &'a Expr>) -> String {
    let args: Vec<String> = args.map(expr_text).collect();
    format!("{}({})", name, args.join(", "))
}

fn index_text(index: &Index) -> String {
    match index {
        Index::Const(n) => n.to_string(),
        Index::Dynamic(expr) => expr_text(&expr.node),
    }
}

fn literal_text(value: &Literal) -> String {
    match value {
        Literal::Int(n) => n.to_string(),
        Literal::Bytes(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => format!("{:?}", text),
            Err(_) => format!("0x{}", hex::encode(bytes)),
        },
    }
}
