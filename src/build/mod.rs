//! AST builder: turns parse trees into the typed, scope-resolved program.
//!
//! Symbol resolution, literal pooling and label allocation all happen here
//! in one walk. A node that fails to resolve is left out of its parent and
//! an error is recorded; the walk keeps going.

mod expr;
mod stmt;
#[cfg(test)]
mod tests;

use tracing::debug;

use crate::ast::*;
use crate::builtins;
use crate::cst;
use crate::diagnostic::Diagnostic;
use crate::pool::LiteralPool;
use crate::scope::{RuntimeKind, ScopeError, ScopeId, Scopes, SymbolKind};
use crate::span::{Span, Spanned};
use crate::types::Ty;

/// Name of the entry-point function.
pub const ENTRY_NAME: &str = "logic";

/// Its labels would collide with the end of the entry body.
const RESERVED_FUNCTION_NAME: &str = "main";

/// Names that retype an expression instead of calling anything.
pub const CAST_NAMES: [&str; 2] = ["toint", "tobyte"];

/// One parsed source file, in inclusion order.
#[derive(Clone, Debug)]
pub struct SourceModule {
    pub name: String,
    pub file_id: u16,
    pub module: cst::Module,
    /// The file being compiled, as opposed to an import.
    pub is_main: bool,
}

/// Per-function state while a body is being built.
#[derive(Clone, Debug)]
pub(super) struct Frame {
    pub(super) loop_depth: u32,
}

pub(crate) struct AstBuilder {
    pub(super) version: u8,
    pub(super) pool: LiteralPool,
    pub(super) scopes: Scopes,
    pub(super) functions: Vec<FunctionDef>,
    pub(super) globals: Vec<Spanned<Stmt>>,
    /// Innermost top-level scope: the next global binds after it.
    pub(super) global_tip: ScopeId,
    pub(super) labels: u32,
    pub(super) diagnostics: Vec<Diagnostic>,
    pub(super) entry: Option<FunctionId>,
    pub(super) frame: Option<Frame>,
}

impl AstBuilder {
    pub(crate) fn new(version: u8) -> Self {
        let mut scopes = Scopes::new();
        let root = scopes.root();
        // Runtime names live in the root block so that user declarations,
        // one block further in, collide with them as immutable bindings.
        let runtime = [("global", RuntimeKind::Global), ("itxn", RuntimeKind::Itxn)];
        for (name, kind) in runtime {
            if let Err(e) = scopes.declare_runtime(root, name, kind, Span::dummy()) {
                unreachable!("fresh root scope rejected '{}': {}", name, e);
            }
        }
        let global_tip = scopes.new_block(root);
        Self {
            version,
            pool: LiteralPool::new(),
            scopes,
            functions: Vec::new(),
            globals: Vec::new(),
            global_tip,
            labels: 0,
            diagnostics: Vec::new(),
            entry: None,
            frame: None,
        }
    }

    /// Build every module in order. Returns the program when an entry point
    /// exists, together with all diagnostics collected.
    pub(crate) fn build(mut self, modules: &[SourceModule]) -> (Option<Program>, Vec<Diagnostic>) {
        for module in modules {
            debug!(module = %module.name, items = module.module.items.len(), "building module");
            for item in &module.module.items {
                self.build_item(item, module);
            }
        }

        let Some(entry) = self.entry else {
            let main_file = modules
                .iter()
                .find(|m| m.is_main)
                .map_or(0, |m| m.file_id);
            self.diagnostics.push(
                Diagnostic::semantic(
                    format!("missing entry point: function {}(txn, gtxn, args)", ENTRY_NAME),
                    Span::file_start(main_file),
                )
                .with_help(format!(
                    "define `function {}(txn, gtxn, args) {{ ... }}` in the main file",
                    ENTRY_NAME
                )),
            );
            return (None, self.diagnostics);
        };

        debug!(
            functions = self.functions.len(),
            slots = self.scopes.slots_used(),
            ints = self.pool.ints().len(),
            bytes = self.pool.bytes().len(),
            "program built"
        );

        let program = Program {
            version: self.version,
            pool: self.pool,
            scopes: self.scopes,
            globals: self.globals,
            functions: self.functions,
            entry,
        };
        (Some(program), self.diagnostics)
    }

    fn build_item(&mut self, item: &Spanned<cst::Item>, module: &SourceModule) {
        match &item.node {
            cst::Item::Let(decl) => {
                let tip = self.global_tip;
                let (scope, stmt) = self.build_decl(decl, false, tip, item.span);
                self.global_tip = scope;
                if let Some(stmt) = stmt {
                    self.globals.push(Spanned::new(stmt, item.span));
                }
            }
            cst::Item::Const(decl) => {
                let tip = self.global_tip;
                let (scope, stmt) = self.build_decl(decl, true, tip, item.span);
                self.global_tip = scope;
                if let Some(stmt) = stmt {
                    self.globals.push(Spanned::new(stmt, item.span));
                }
            }
            cst::Item::Function(func) => self.build_function(func, item.span, module),
        }
    }

    fn build_function(&mut self, func: &cst::FunctionDecl, span: Span, module: &SourceModule) {
        let name = &func.name;
        let is_entry = name.node == ENTRY_NAME;

        if builtins::lookup(&name.node).is_some() || CAST_NAMES.contains(&name.node.as_str()) {
            self.error(
                format!("'{}' is a builtin and cannot be redefined", name.node),
                name.span,
            );
        }

        if name.node == RESERVED_FUNCTION_NAME {
            self.error(
                format!("function name '{}' is reserved", name.node),
                name.span,
            );
        }

        if is_entry {
            self.check_entry_signature(func, module);
        } else if !func.inline {
            self.require_version(
                4,
                &format!("subroutine '{}'", name.node),
                name.span,
            );
        }

        let scope = self.scopes.new_block(self.global_tip);
        let mut params = Vec::new();
        let mut param_tys = Vec::new();
        for (i, param) in func.params.iter().enumerate() {
            let result = if is_entry {
                let kind = match i {
                    0 => RuntimeKind::Txn,
                    1 => RuntimeKind::Gtxn,
                    _ => RuntimeKind::Args,
                };
                param_tys.push(Ty::Unknown);
                self.scopes
                    .declare_runtime(scope, &param.name.node, kind, param.name.span)
            } else {
                let ty = match param.ty.as_ref().map(|t| t.node) {
                    Some(cst::ParamType::Byte) => Ty::Bytes,
                    Some(cst::ParamType::Int) | None => Ty::Integer,
                };
                param_tys.push(ty);
                self.scopes
                    .declare_variable(scope, &param.name.node, ty, param.name.span)
                    .map(|_| ())
            };
            if let Err(e) = result {
                self.scope_error(e, param.name.span);
            }
            params.push(param.name.clone());
        }

        let outer = self.frame.replace(Frame { loop_depth: 0 });
        let body = self.build_stmts(&func.body.node.stmts, scope);
        self.frame = outer;

        let return_ty = if is_entry {
            Ty::Integer
        } else {
            self.first_return_type(&body).unwrap_or(Ty::Unknown)
        };

        let id = FunctionId(self.functions.len());
        self.functions.push(FunctionDef {
            name: name.clone(),
            inline: func.inline,
            is_entry,
            params,
            param_tys,
            scope,
            body,
            return_ty,
            span,
        });

        // Bound only now: a body cannot call its own function.
        let decl_scope = self.scopes.new_decl(self.global_tip);
        if let Err(e) = self
            .scopes
            .declare_function(decl_scope, &name.node, id, return_ty, name.span)
        {
            self.scope_error(e, name.span);
        }
        self.global_tip = decl_scope;

        if is_entry && self.entry.is_none() && module.is_main {
            self.entry = Some(id);
        }
    }

    fn check_entry_signature(&mut self, func: &cst::FunctionDecl, module: &SourceModule) {
        let name = &func.name;
        if !module.is_main {
            self.error(
                format!(
                    "entry point '{}' must be defined in the main file, not in module '{}'",
                    ENTRY_NAME, module.name
                ),
                name.span,
            );
        }
        if func.inline {
            self.error(
                format!("entry point '{}' cannot be inline", ENTRY_NAME),
                name.span,
            );
        }
        if func.params.len() != 3 {
            self.diagnostics.push(
                Diagnostic::semantic(
                    format!(
                        "entry point '{}' must take exactly 3 parameters, found {}",
                        ENTRY_NAME,
                        func.params.len()
                    ),
                    name.span,
                )
                .with_help(format!("declare it as `function {}(txn, gtxn, args)`", ENTRY_NAME)),
            );
        }
        if let Some(typed) = func.params.iter().find(|p| p.ty.is_some()) {
            self.error(
                format!(
                    "entry point parameter '{}' cannot have a type annotation",
                    typed.name.node
                ),
                typed.name.span,
            );
        }
        if self.entry.is_some() {
            self.error(
                format!("entry point '{}' is defined more than once", ENTRY_NAME),
                name.span,
            );
        }
    }

    /// Type of the first `return` whose value type is known.
    fn first_return_type(&self, block: &Block) -> Option<Ty> {
        for stmt in &block.stmts {
            let found = match &stmt.node {
                Stmt::Return(value) => {
                    let ty = value.node.scalar_type(&self.scopes, &self.functions);
                    ty.is_resolved().then_some(ty)
                }
                Stmt::If {
                    then_block,
                    else_block,
                    ..
                } => self.first_return_type(then_block).or_else(|| {
                    else_block
                        .as_ref()
                        .and_then(|b| self.first_return_type(b))
                }),
                Stmt::For { body, .. } => self.first_return_type(body),
                _ => None,
            };
            if found.is_some() {
                return found;
            }
        }
        None
    }

    /// Shared by top-level and block declarations. Returns the scope that
    /// follows the declaration and the statement, if it could be built.
    pub(super) fn build_decl(
        &mut self,
        decl: &cst::Decl,
        is_const: bool,
        scope: ScopeId,
        span: Span,
    ) -> (ScopeId, Option<Stmt>) {
        let value = self.build_expr(&decl.value, scope);
        let decl_scope = self.scopes.new_decl(scope);
        let count = decl.names.len();

        if is_const {
            return (decl_scope, self.bind_constant(decl, value, decl_scope, span));
        }

        let mut ok = value.is_some();
        if !matches!(count, 1 | 2 | 4) {
            self.error(
                format!("a declaration binds 1, 2 or 4 names, found {}", count),
                span,
            );
            ok = false;
        }

        let results = value
            .as_ref()
            .map(|v| v.node.result_types(&self.scopes, &self.functions))
            .unwrap_or_default();
        if ok && results.len() != count {
            self.count_mismatch(results.len(), count, decl.value.span);
            ok = false;
        }

        for (i, name) in decl.names.iter().enumerate() {
            let ty = if ok {
                results.get(i).copied().unwrap_or(Ty::Invalid)
            } else {
                Ty::Invalid
            };
            if let Err(e) = self
                .scopes
                .declare_variable(decl_scope, &name.node, ty, name.span)
            {
                self.scope_error(e, name.span);
                ok = false;
            }
        }

        let stmt = match value {
            Some(value) if ok => Some(Stmt::VarDecl {
                scope: decl_scope,
                names: decl.names.clone(),
                value,
            }),
            _ => None,
        };
        (decl_scope, stmt)
    }

    fn bind_constant(
        &mut self,
        decl: &cst::Decl,
        value: Option<Spanned<Expr>>,
        decl_scope: ScopeId,
        span: Span,
    ) -> Option<Stmt> {
        if decl.names.len() != 1 {
            self.error(
                format!(
                    "a constant binds exactly one name, found {}",
                    decl.names.len()
                ),
                span,
            );
            return None;
        }
        let name = &decl.names[0];
        let resolved = value.as_ref().and_then(|v| match &v.node {
            Expr::Literal { value, pool } => {
                let ty = match value {
                    Literal::Int(_) => Ty::Integer,
                    Literal::Bytes(_) => Ty::Bytes,
                };
                Some((ty, *pool))
            }
            Expr::Ident { name, scope } => match self.scopes.lookup(*scope, name) {
                Some(sym) => match sym.kind {
                    SymbolKind::Constant(pool) => Some((sym.ty, pool)),
                    _ => None,
                },
                None => None,
            },
            _ => None,
        });

        let (ty, pool) = match resolved {
            Some(found) => found,
            None => {
                if value.is_some() {
                    self.diagnostics.push(
                        Diagnostic::semantic(
                            format!(
                                "constant '{}' must be initialized with a literal or another constant",
                                name.node
                            ),
                            decl.value.span,
                        )
                        .with_help("use `let` for computed values".to_string()),
                    );
                }
                (Ty::Invalid, crate::pool::PoolRef::Int(0))
            }
        };

        if let Err(e) = self
            .scopes
            .declare_constant(decl_scope, &name.node, ty, pool, name.span)
        {
            self.scope_error(e, name.span);
            return None;
        }
        if ty == Ty::Invalid {
            return None;
        }
        value.map(|value| Stmt::ConstDecl {
            names: decl.names.clone(),
            value,
        })
    }

    // --- Helpers ---

    pub(super) fn next_label(&mut self) -> u32 {
        let label = self.labels;
        self.labels += 1;
        label
    }

    pub(super) fn error(&mut self, msg: String, span: Span) {
        self.diagnostics.push(Diagnostic::semantic(msg, span));
    }

    pub(super) fn scope_error(&mut self, err: ScopeError, span: Span) {
        let diag = Diagnostic::semantic(err.to_string(), span);
        let diag = match err {
            ScopeError::AlreadyDeclared { previous, .. } | ScopeError::Immutable { previous, .. }
                if previous != Span::dummy() =>
            {
                diag.with_note(format!(
                    "previous declaration at byte {}..{}",
                    previous.start, previous.end
                ))
            }
            ScopeError::OutOfSlots => {
                diag.with_help("reuse variables or split the program".to_string())
            }
            _ => diag,
        };
        self.diagnostics.push(diag);
    }

    pub(super) fn count_mismatch(&mut self, values: usize, names: usize, span: Span) {
        self.error(
            format!(
                "expression produces {} value{} but {} name{} {} given",
                values,
                if values == 1 { "" } else { "s" },
                names,
                if names == 1 { "" } else { "s" },
                if names == 1 { "is" } else { "are" }
            ),
            span,
        );
    }

    /// Record an error when the target version is below `needed`.
    pub(super) fn require_version(&mut self, needed: u8, what: &str, span: Span) -> bool {
        if self.version >= needed {
            return true;
        }
        self.diagnostics.push(
            Diagnostic::semantic(
                format!(
                    "{} requires version {} (target is {})",
                    what, needed, self.version
                ),
                span,
            )
            .with_help(format!("compile with --target-version {}", needed)),
        );
        false
    }
}

/// Build a program from parsed modules.
pub fn build_program(modules: &[SourceModule], version: u8) -> (Option<Program>, Vec<Diagnostic>) {
    AstBuilder::new(version).build(modules)
}
