use super::{AstBuilder, CAST_NAMES};
use crate::ast::*;
use crate::builtins::fields::{self, FieldInfo};
use crate::builtins::{self, ArgShape, ConstArg, MAX_IMMEDIATE};
use crate::cst;
use crate::diagnostic::Diagnostic;
use crate::pool::PoolRef;
use crate::scope::{RuntimeKind, ScopeId, SymbolKind};
use crate::span::{Span, Spanned};
use crate::types::Ty;

impl AstBuilder {
    /// Build an expression. `None` means it failed to resolve and an error
    /// has been recorded.
    pub(super) fn build_expr(
        &mut self,
        expr: &Spanned<cst::Expr>,
        scope: ScopeId,
    ) -> Option<Spanned<Expr>> {
        let span = expr.span;
        let node = match &expr.node {
            cst::Expr::Int(n) => Expr::Literal {
                value: Literal::Int(*n),
                pool: self.pool.intern_int(*n),
            },
            cst::Expr::Bytes(bytes) => Expr::Literal {
                value: Literal::Bytes(bytes.clone()),
                pool: self.pool.intern_bytes(bytes),
            },
            cst::Expr::Var(name) => self.build_ident(name, scope, span)?,
            cst::Expr::Unary { op, operand } => {
                let operand = self.build_expr(operand, scope)?;
                Expr::Unary {
                    op: *op,
                    operand: Box::new(operand),
                }
            }
            cst::Expr::Binary { op, lhs, rhs } => {
                let lhs = self.build_expr(lhs, scope);
                let rhs = self.build_expr(rhs, scope);
                Expr::Binary {
                    op: *op,
                    lhs: Box::new(lhs?),
                    rhs: Box::new(rhs?),
                }
            }
            cst::Expr::Group(inner) => Expr::Group(Box::new(self.build_expr(inner, scope)?)),
            cst::Expr::Call { name, args } => self.build_call(name, args, scope, span)?,
            cst::Expr::If {
                cond,
                then_expr,
                else_expr,
            } => {
                let label = self.next_label();
                let cond = self.build_expr(cond, scope);
                let then_expr = self.build_expr(then_expr, scope);
                let else_expr = self.build_expr(else_expr, scope);
                Expr::If {
                    cond: Box::new(cond?),
                    then_expr: Box::new(then_expr?),
                    else_expr: Box::new(else_expr?),
                    label,
                }
            }
            cst::Expr::Index { base, index } => self.build_index_expr(base, index, scope)?,
            cst::Expr::Member { base, field, index } => {
                Expr::Field(self.build_field_access(base, field, index.as_deref(), scope, span)?)
            }
            cst::Expr::MethodCall { base, method, .. } => {
                if self.inner_txn_method(base, method, scope).is_some() {
                    self.error(
                        format!(
                            "'{}.{}()' does not produce a value and must be used as a statement",
                            base.node, method.node
                        ),
                        span,
                    );
                }
                return None;
            }
        };
        Some(Spanned::new(node, span))
    }

    fn build_ident(&mut self, name: &str, scope: ScopeId, span: Span) -> Option<Expr> {
        let Some(sym) = self.scopes.lookup(scope, name) else {
            self.error(format!("identifier '{}' not defined", name), span);
            return None;
        };
        let kind = sym.kind;
        match kind {
            SymbolKind::Variable { .. } | SymbolKind::Constant(_) => Some(Expr::Ident {
                name: name.to_string(),
                scope,
            }),
            SymbolKind::Function(_) => {
                self.diagnostics.push(
                    Diagnostic::semantic(format!("function '{}' used as a value", name), span)
                        .with_help(format!("call it: {}(...)", name)),
                );
                None
            }
            SymbolKind::Runtime(kind) => {
                let help = match kind {
                    RuntimeKind::Args => format!("index it: {}[0]", name),
                    RuntimeKind::Gtxn => format!("access a field: {}[0].Sender", name),
                    _ => format!("access a field: {}.Sender", name),
                };
                self.diagnostics.push(
                    Diagnostic::semantic(format!("'{}' cannot be used as a value", name), span)
                        .with_help(help),
                );
                None
            }
        }
    }

    fn build_call(
        &mut self,
        name: &Spanned<String>,
        args: &[Spanned<cst::Expr>],
        scope: ScopeId,
        span: Span,
    ) -> Option<Expr> {
        if let Some(sym) = self.scopes.lookup(scope, &name.node) {
            let kind = sym.kind;
            let SymbolKind::Function(id) = kind else {
                self.error(
                    format!("'{}' is a {}, not a function", name.node, kind.describe()),
                    name.span,
                );
                return None;
            };
            return self.build_user_call(id, name, args, scope, span);
        }

        if CAST_NAMES.contains(&name.node.as_str()) {
            return self.build_cast(name, args, scope, span);
        }

        let Some(spec) = builtins::lookup(&name.node) else {
            self.error(format!("identifier '{}' not defined", name.node), name.span);
            return None;
        };
        if !spec.callable {
            self.error(
                format!("'{}' is an internal opcode and cannot be called directly", name.node),
                name.span,
            );
            return None;
        }
        if !self.require_version(spec.min_version, &format!("builtin '{}'", spec.name), name.span) {
            return None;
        }
        if args.len() != spec.args.len() {
            self.error(
                format!(
                    "builtin '{}' expects {} argument{}, found {}",
                    spec.name,
                    spec.args.len(),
                    if spec.args.len() == 1 { "" } else { "s" },
                    args.len()
                ),
                span,
            );
            return None;
        }

        let mut ok = true;
        let mut built = Vec::new();
        let mut consts = Vec::new();
        for (i, (arg, shape)) in args.iter().zip(spec.args).enumerate() {
            if let ArgShape::FieldName(_) = shape {
                match &arg.node {
                    cst::Expr::Var(field) => consts.push(ConstArg::Name(field.clone())),
                    _ => {
                        self.error(
                            format!("argument {} of '{}' must be a field name", i + 1, spec.name),
                            arg.span,
                        );
                        ok = false;
                        consts.push(ConstArg::Unknown);
                    }
                }
                continue;
            }
            consts.push(self.const_arg(&arg.node, scope));
            match self.build_expr(arg, scope) {
                Some(expr) => built.push(expr),
                None => ok = false,
            }
        }
        if !ok {
            return None;
        }

        match spec.instantiate(built, &consts, self.version) {
            Ok(call) => Some(Expr::Builtin(call)),
            Err(msg) => {
                self.error(msg, span);
                None
            }
        }
    }

    fn build_user_call(
        &mut self,
        id: FunctionId,
        name: &Spanned<String>,
        args: &[Spanned<cst::Expr>],
        scope: ScopeId,
        span: Span,
    ) -> Option<Expr> {
        let (is_entry, expected) = match self.functions.get(id.0) {
            Some(def) => (def.is_entry, def.params.len()),
            None => unreachable!("function id {} bound before its definition", id.0),
        };
        if is_entry {
            self.error(
                format!("entry point '{}' cannot be called", name.node),
                name.span,
            );
            return None;
        }
        let mut built = Vec::new();
        let mut ok = true;
        for arg in args {
            match self.build_expr(arg, scope) {
                Some(expr) => built.push(expr),
                None => ok = false,
            }
        }
        if args.len() != expected {
            self.error(
                format!(
                    "function '{}' expects {} argument{}, found {}",
                    name.node,
                    expected,
                    if expected == 1 { "" } else { "s" },
                    args.len()
                ),
                span,
            );
            return None;
        }
        if !ok {
            return None;
        }
        let site = self.next_label();
        Some(Expr::Call {
            function: id,
            name: name.node.clone(),
            args: built,
            site,
        })
    }

    fn build_cast(
        &mut self,
        name: &Spanned<String>,
        args: &[Spanned<cst::Expr>],
        scope: ScopeId,
        span: Span,
    ) -> Option<Expr> {
        let [arg] = args else {
            self.error(
                format!("'{}' expects 1 argument, found {}", name.node, args.len()),
                span,
            );
            return None;
        };
        let ty = if name.node == "tobyte" {
            Ty::Bytes
        } else {
            Ty::Integer
        };
        let expr = self.build_expr(arg, scope)?;
        Some(Expr::Cast {
            ty,
            expr: Box::new(expr),
        })
    }

    /// What is known about an argument before it is evaluated.
    fn const_arg(&self, expr: &cst::Expr, scope: ScopeId) -> ConstArg {
        match expr {
            cst::Expr::Int(n) => ConstArg::Int(*n),
            cst::Expr::Group(inner) => self.const_arg(&inner.node, scope),
            cst::Expr::Var(name) => match self.constant_int(name, scope) {
                Some(n) => ConstArg::Int(n),
                None => ConstArg::Unknown,
            },
            _ => ConstArg::Unknown,
        }
    }

    /// Value of an integer constant visible from `scope`.
    fn constant_int(&self, name: &str, scope: ScopeId) -> Option<u64> {
        match self.scopes.lookup(scope, name)?.kind {
            SymbolKind::Constant(PoolRef::Int(idx)) => self.pool.ints().get(idx).copied(),
            _ => None,
        }
    }

    /// An index that fits an immediate stays out of the pool and off the stack.
    fn build_index(&mut self, expr: &Spanned<cst::Expr>, scope: ScopeId) -> Option<Index> {
        match self.const_arg(&expr.node, scope) {
            ConstArg::Int(n) if n <= MAX_IMMEDIATE => Some(Index::Const(n as u8)),
            _ => self
                .build_expr(expr, scope)
                .map(|e| Index::Dynamic(Box::new(e))),
        }
    }

    fn runtime_kind(&self, name: &str, scope: ScopeId) -> Option<RuntimeKind> {
        match self.scopes.lookup(scope, name)?.kind {
            SymbolKind::Runtime(kind) => Some(kind),
            _ => None,
        }
    }

    /// `args[i]`. Any other indexed name is an error here; group
    /// transactions are only reached through a field.
    fn build_index_expr(
        &mut self,
        base: &Spanned<String>,
        index: &Spanned<cst::Expr>,
        scope: ScopeId,
    ) -> Option<Expr> {
        match self.runtime_kind(&base.node, scope) {
            Some(RuntimeKind::Args) => {
                let index = self.build_index(index, scope)?;
                if matches!(index, Index::Dynamic(_))
                    && !self.require_version(5, "dynamic argument index", base.span)
                {
                    return None;
                }
                Some(Expr::Arg(index))
            }
            Some(RuntimeKind::Gtxn) => {
                self.diagnostics.push(
                    Diagnostic::semantic(
                        format!("'{}[..]' needs a field", base.node),
                        base.span,
                    )
                    .with_help(format!("access a field: {}[0].Sender", base.node)),
                );
                None
            }
            _ => {
                if self.scopes.lookup(scope, &base.node).is_none() {
                    self.error(format!("identifier '{}' not defined", base.node), base.span);
                } else {
                    self.error(format!("'{}' cannot be indexed", base.node), base.span);
                }
                None
            }
        }
    }

    fn build_field_access(
        &mut self,
        base: &Spanned<cst::Expr>,
        field: &Spanned<String>,
        index: Option<&Spanned<cst::Expr>>,
        scope: ScopeId,
        span: Span,
    ) -> Option<FieldAccess> {
        let (source, source_name, table) = self.field_source(base, scope)?;
        let Some(info) = fields::find(table, &field.node) else {
            self.error(
                format!("unknown field '{}' for '{}'", field.node, source_name),
                field.span,
            );
            return None;
        };
        if !self.require_version(info.min_version, &format!("field '{}'", info.name), field.span) {
            return None;
        }

        let index = self.field_index(info, index, scope, field.span)?;
        if let FieldSource::Itxn = source {
            if !self.require_version(5, "inner transaction fields", span) {
                return None;
            }
            if matches!(index, Some(Index::Dynamic(_))) {
                self.error(
                    format!("'itxn.{}' needs a constant index", info.name),
                    span,
                );
                return None;
            }
        }

        Some(FieldAccess {
            source,
            field: info,
            index,
        })
    }

    /// Resolve the part before the dot.
    fn field_source(
        &mut self,
        base: &Spanned<cst::Expr>,
        scope: ScopeId,
    ) -> Option<(FieldSource, String, &'static [FieldInfo])> {
        match &base.node {
            cst::Expr::Var(name) => match self.runtime_kind(name, scope) {
                Some(RuntimeKind::Txn) => Some((FieldSource::Txn, name.clone(), fields::TXN_FIELDS)),
                Some(RuntimeKind::Global) => {
                    Some((FieldSource::Global, name.clone(), fields::GLOBAL_FIELDS))
                }
                Some(RuntimeKind::Itxn) => Some((FieldSource::Itxn, name.clone(), fields::TXN_FIELDS)),
                Some(RuntimeKind::Gtxn) => {
                    self.diagnostics.push(
                        Diagnostic::semantic(
                            format!("'{}' needs a transaction index", name),
                            base.span,
                        )
                        .with_help(format!("index the group: {}[0].Sender", name)),
                    );
                    None
                }
                _ => {
                    self.no_fields(name, scope, base.span);
                    None
                }
            },
            cst::Expr::Index { base: name, index } => {
                if self.runtime_kind(&name.node, scope) != Some(RuntimeKind::Gtxn) {
                    self.no_fields(&name.node, scope, name.span);
                    return None;
                }
                let index = self.build_index(index, scope)?;
                if matches!(index, Index::Dynamic(_))
                    && !self.require_version(3, "dynamic group index", base.span)
                {
                    return None;
                }
                Some((FieldSource::Gtxn(index), name.node.clone(), fields::TXN_FIELDS))
            }
            _ => {
                self.error("fields can only be read from txn, gtxn[i], global or itxn".to_string(), base.span);
                None
            }
        }
    }

    fn no_fields(&mut self, name: &str, scope: ScopeId, span: Span) {
        if self.scopes.lookup(scope, name).is_none() {
            self.error(format!("identifier '{}' not defined", name), span);
        } else {
            self.error(format!("'{}' has no fields", name), span);
        }
    }

    /// Check the array index against the field's shape. The outer `Option`
    /// is failure; the inner one is "no index".
    fn field_index(
        &mut self,
        info: &'static FieldInfo,
        index: Option<&Spanned<cst::Expr>>,
        scope: ScopeId,
        span: Span,
    ) -> Option<Option<Index>> {
        match (info.array, index) {
            (true, None) => {
                self.diagnostics.push(
                    Diagnostic::semantic(
                        format!("field '{}' is an array and needs an index", info.name),
                        span,
                    )
                    .with_help(format!("write {}[0]", info.name)),
                );
                None
            }
            (false, Some(idx)) => {
                self.error(format!("field '{}' is not an array", info.name), idx.span);
                None
            }
            (false, None) => Some(None),
            (true, Some(idx)) => {
                let index = self.build_index(idx, scope)?;
                if matches!(index, Index::Dynamic(_))
                    && !self.require_version(5, "dynamic array index", idx.span)
                {
                    return None;
                }
                Some(Some(index))
            }
        }
    }
}
