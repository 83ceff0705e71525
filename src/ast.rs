//! Typed, scope-resolved program tree.
//!
//! Built once by [`crate::build`], checked by [`crate::typecheck`] and then
//! lowered by [`crate::codegen`]. Nothing mutates it after construction.

pub mod display;

use crate::builtins::BuiltinCall;
use crate::builtins::fields::FieldInfo;
use crate::pool::{LiteralPool, PoolRef};
use crate::scope::{ScopeId, Scopes};
use crate::span::{Span, Spanned};
use crate::types::{BinOp, Ty, UnOp};

/// Index of a function definition in [`Program::functions`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FunctionId(pub usize);

/// A fully built compilation unit.
#[derive(Clone, Debug)]
pub struct Program {
    pub version: u8,
    pub pool: LiteralPool,
    pub scopes: Scopes,
    /// Top-level declarations of every included module, in inclusion order.
    pub globals: Vec<Spanned<Stmt>>,
    pub functions: Vec<FunctionDef>,
    pub entry: FunctionId,
}

impl Program {
    pub fn function(&self, id: FunctionId) -> &FunctionDef {
        &self.functions[id.0]
    }
}

#[derive(Clone, Debug)]
pub struct FunctionDef {
    pub name: Spanned<String>,
    pub inline: bool,
    pub is_entry: bool,
    pub params: Vec<Spanned<String>>,
    pub param_tys: Vec<Ty>,
    /// Scope holding the parameters and the top level of the body.
    pub scope: ScopeId,
    pub body: Block,
    pub return_ty: Ty,
    pub span: Span,
}

#[derive(Clone, Debug, Default)]
pub struct Block {
    pub stmts: Vec<Spanned<Stmt>>,
}

impl Block {
    /// True when control cannot fall off the end of the block.
    pub fn terminates(&self) -> bool {
        self.stmts.last().is_some_and(|s| s.node.terminates())
    }
}

#[derive(Clone, Debug)]
pub enum Stmt {
    /// `let` with one, two or four names. `scope` is where the names are bound.
    VarDecl {
        scope: ScopeId,
        names: Vec<Spanned<String>>,
        value: Spanned<Expr>,
    },
    /// `const`. The value lives in the literal pool; nothing is emitted.
    ConstDecl {
        names: Vec<Spanned<String>>,
        value: Spanned<Expr>,
    },
    /// Assignment to one, two or four existing variables.
    Assign {
        scope: ScopeId,
        targets: Vec<Spanned<String>>,
        value: Spanned<Expr>,
    },
    /// `itxn.Field = value`.
    AssignField {
        field: &'static FieldInfo,
        value: Spanned<Expr>,
    },
    InnerBegin,
    InnerSubmit,
    Return(Spanned<Expr>),
    Error,
    If {
        cond: Spanned<Expr>,
        then_block: Block,
        else_block: Option<Block>,
        label: u32,
    },
    For {
        cond: Spanned<Expr>,
        body: Block,
        label: u32,
    },
    Break,
    Expr(Spanned<Expr>),
}

impl Stmt {
    pub fn terminates(&self) -> bool {
        match self {
            Stmt::Return(_) | Stmt::Error => true,
            Stmt::If {
                then_block,
                else_block: Some(else_block),
                ..
            } => then_block.terminates() && else_block.terminates(),
            _ => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Literal {
    Int(u64),
    Bytes(Vec<u8>),
}

/// An index that is either a compile-time constant fitting an immediate
/// operand or an expression evaluated on the stack.
#[derive(Clone, Debug)]
pub enum Index {
    Const(u8),
    Dynamic(Box<Spanned<Expr>>),
}

#[derive(Clone, Debug)]
pub enum FieldSource {
    /// The current transaction.
    Txn,
    /// A transaction of the group.
    Gtxn(Index),
    Global,
    /// The last submitted inner transaction.
    Itxn,
}

#[derive(Clone, Debug)]
pub struct FieldAccess {
    pub source: FieldSource,
    pub field: &'static FieldInfo,
    pub index: Option<Index>,
}

#[derive(Clone, Debug)]
pub enum Expr {
    Literal {
        value: Literal,
        pool: PoolRef,
    },
    /// A variable or constant read, resolved in `scope` at emission.
    Ident {
        name: String,
        scope: ScopeId,
    },
    Unary {
        op: UnOp,
        operand: Box<Spanned<Expr>>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Spanned<Expr>>,
        rhs: Box<Spanned<Expr>>,
    },
    Group(Box<Spanned<Expr>>),
    /// Call of a user function. `site` numbers the call for inline labels.
    Call {
        function: FunctionId,
        name: String,
        args: Vec<Spanned<Expr>>,
        site: u32,
    },
    Builtin(BuiltinCall),
    If {
        cond: Box<Spanned<Expr>>,
        then_expr: Box<Spanned<Expr>>,
        else_expr: Box<Spanned<Expr>>,
        label: u32,
    },
    Field(FieldAccess),
    /// `args[i]`.
    Arg(Index),
    /// `toint(e)` / `tobyte(e)`: retypes without code.
    Cast {
        ty: Ty,
        expr: Box<Spanned<Expr>>,
    },
}

impl Expr {
    /// Types of the values this expression leaves on the stack, looked up
    /// from declarations: symbol types, operator tables, builtin signatures.
    pub fn result_types(&self, scopes: &Scopes, functions: &[FunctionDef]) -> Vec<Ty> {
        match self {
            Expr::Literal {
                value: Literal::Int(_),
                ..
            } => vec![Ty::Integer],
            Expr::Literal {
                value: Literal::Bytes(_),
                ..
            } => vec![Ty::Bytes],
            Expr::Ident { name, scope } => {
                vec![scopes.lookup(*scope, name).map_or(Ty::Invalid, |s| s.ty)]
            }
            Expr::Unary { op, .. } => vec![op.result_ty()],
            Expr::Binary { op, .. } => vec![op.result_ty()],
            Expr::Group(inner) => inner.node.result_types(scopes, functions),
            Expr::Call { function, .. } => vec![functions
                .get(function.0)
                .map_or(Ty::Invalid, |f| f.return_ty)],
            Expr::Builtin(call) => call.results.clone(),
            Expr::If { then_expr, .. } => then_expr.node.result_types(scopes, functions),
            Expr::Field(access) => vec![access.field.ty],
            Expr::Arg(_) => vec![Ty::Bytes],
            Expr::Cast { ty, .. } => vec![*ty],
        }
    }

    /// The single result type, or `Invalid` for multi-value expressions.
    pub fn scalar_type(&self, scopes: &Scopes, functions: &[FunctionDef]) -> Ty {
        match self.result_types(scopes, functions).as_slice() {
            [ty] => *ty,
            _ => Ty::Invalid,
        }
    }
}
