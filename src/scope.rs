//! Scope tree: an arena of symbol tables linked to their parents by index.
//!
//! Every `let`/`const` opens a small declaration scope for the statements
//! after it, so an initializer never sees the name it is defining. A block
//! scope marks where redeclaration stops being an error: shadowing is only
//! allowed from a strictly nested block.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::ast::FunctionId;
use crate::pool::PoolRef;
use crate::span::Span;
use crate::types::Ty;

/// Number of scratch slots the machine provides.
pub const MAX_SLOTS: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub usize);

/// Pseudo-variables backed by the runtime rather than a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuntimeKind {
    Txn,
    Gtxn,
    Args,
    Global,
    Itxn,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Variable { slot: u8 },
    Constant(PoolRef),
    Function(FunctionId),
    Runtime(RuntimeKind),
}

impl SymbolKind {
    pub fn describe(&self) -> &'static str {
        match self {
            SymbolKind::Variable { .. } => "variable",
            SymbolKind::Constant(_) => "constant",
            SymbolKind::Function(_) => "function",
            SymbolKind::Runtime(_) => "runtime pseudo-variable",
        }
    }

    fn is_immutable(&self) -> bool {
        !matches!(self, SymbolKind::Variable { .. })
    }
}

#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: String,
    pub ty: Ty,
    pub kind: SymbolKind,
    pub span: Span,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScopeKind {
    Block,
    Decl,
}

#[derive(Clone, Debug)]
struct Scope {
    parent: Option<ScopeId>,
    kind: ScopeKind,
    symbols: BTreeMap<String, Symbol>,
    /// Slot cursor when the scope was opened.
    base_slot: usize,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ScopeError {
    #[error("'{name}' is already declared in this scope")]
    AlreadyDeclared { name: String, previous: Span },
    #[error("'{name}' is a {kind} and cannot be redeclared")]
    Immutable {
        name: String,
        kind: &'static str,
        previous: Span,
    },
    #[error("too many variables: all 256 storage slots are in use")]
    OutOfSlots,
}

#[derive(Clone, Debug)]
pub struct Scopes {
    arena: Vec<Scope>,
    next_slot: usize,
}

impl Default for Scopes {
    fn default() -> Self {
        Self::new()
    }
}

impl Scopes {
    /// A tree holding only the root block scope.
    pub fn new() -> Self {
        Self {
            arena: vec![Scope {
                parent: None,
                kind: ScopeKind::Block,
                symbols: BTreeMap::new(),
                base_slot: 0,
            }],
            next_slot: 0,
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Open a nested block (function body, branch, loop body).
    pub fn new_block(&mut self, parent: ScopeId) -> ScopeId {
        self.push(parent, ScopeKind::Block)
    }

    /// Open a declaration scope for the names of one `let`/`const`.
    pub fn new_decl(&mut self, parent: ScopeId) -> ScopeId {
        self.push(parent, ScopeKind::Decl)
    }

    fn push(&mut self, parent: ScopeId, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.arena.len());
        self.arena.push(Scope {
            parent: Some(parent),
            kind,
            symbols: BTreeMap::new(),
            base_slot: self.next_slot,
        });
        id
    }

    pub fn base_slot(&self, scope: ScopeId) -> usize {
        self.arena[scope.0].base_slot
    }

    /// Number of slots handed out so far.
    pub fn slots_used(&self) -> usize {
        self.next_slot
    }

    /// Nearest binding of `name`, walking towards the root.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = &self.arena[id.0];
            if let Some(sym) = s.symbols.get(name) {
                return Some(sym);
            }
            current = s.parent;
        }
        None
    }

    pub fn declare_variable(
        &mut self,
        scope: ScopeId,
        name: &str,
        ty: Ty,
        span: Span,
    ) -> Result<u8, ScopeError> {
        self.check_redeclaration(scope, name)?;
        if self.next_slot >= MAX_SLOTS {
            return Err(ScopeError::OutOfSlots);
        }
        let slot = self.next_slot as u8;
        self.next_slot += 1;
        self.insert(scope, name, ty, SymbolKind::Variable { slot }, span);
        Ok(slot)
    }

    pub fn declare_constant(
        &mut self,
        scope: ScopeId,
        name: &str,
        ty: Ty,
        value: PoolRef,
        span: Span,
    ) -> Result<(), ScopeError> {
        self.check_redeclaration(scope, name)?;
        self.insert(scope, name, ty, SymbolKind::Constant(value), span);
        Ok(())
    }

    pub fn declare_function(
        &mut self,
        scope: ScopeId,
        name: &str,
        function: FunctionId,
        return_ty: Ty,
        span: Span,
    ) -> Result<(), ScopeError> {
        self.check_redeclaration(scope, name)?;
        self.insert(scope, name, return_ty, SymbolKind::Function(function), span);
        Ok(())
    }

    pub fn declare_runtime(
        &mut self,
        scope: ScopeId,
        name: &str,
        kind: RuntimeKind,
        span: Span,
    ) -> Result<(), ScopeError> {
        self.check_redeclaration(scope, name)?;
        self.insert(scope, name, Ty::Unknown, SymbolKind::Runtime(kind), span);
        Ok(())
    }

    fn insert(&mut self, scope: ScopeId, name: &str, ty: Ty, kind: SymbolKind, span: Span) {
        self.arena[scope.0].symbols.insert(
            name.to_string(),
            Symbol {
                name: name.to_string(),
                ty,
                kind,
                span,
            },
        );
    }

    /// Same-block redeclaration is always rejected; constants, functions
    /// and runtime names may not be redeclared anywhere they are visible.
    fn check_redeclaration(&self, scope: ScopeId, name: &str) -> Result<(), ScopeError> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = &self.arena[id.0];
            if let Some(sym) = s.symbols.get(name) {
                return Err(ScopeError::AlreadyDeclared {
                    name: name.to_string(),
                    previous: sym.span,
                });
            }
            if s.kind == ScopeKind::Block {
                break;
            }
            current = s.parent;
        }

        if let Some(sym) = self.lookup(scope, name) {
            if sym.kind.is_immutable() {
                return Err(ScopeError::Immutable {
                    name: name.to_string(),
                    kind: sym.kind.describe(),
                    previous: sym.span,
                });
            }
        }
        Ok(())
    }
}
