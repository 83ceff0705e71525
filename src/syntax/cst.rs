//! Concrete parse tree: what the source says, before any name resolution.

use crate::span::Spanned;
use crate::types::{BinOp, UnOp};

/// A parsed source file: the main program or an imported module.
#[derive(Clone, Debug)]
pub struct Module {
    pub imports: Vec<Spanned<Import>>,
    pub items: Vec<Spanned<Item>>,
}

/// `import stdlib.const` or `import "lib/util"`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Import {
    /// Dotted name, e.g. `["stdlib", "const"]`.
    Dotted(Vec<String>),
    /// Quoted relative path.
    Path(String),
}

impl Import {
    /// The name handed to the module provider.
    pub fn module_name(&self) -> String {
        match self {
            Import::Dotted(parts) => parts.join("."),
            Import::Path(path) => path.clone(),
        }
    }
}

/// Top-level items.
#[derive(Clone, Debug)]
pub enum Item {
    Let(Decl),
    Const(Decl),
    Function(FunctionDecl),
}

/// `let a, b = expr` / `const c = expr`.
#[derive(Clone, Debug)]
pub struct Decl {
    pub names: Vec<Spanned<String>>,
    pub value: Spanned<Expr>,
}

#[derive(Clone, Debug)]
pub struct FunctionDecl {
    pub inline: bool,
    pub name: Spanned<String>,
    pub params: Vec<Param>,
    pub body: Spanned<Block>,
}

#[derive(Clone, Debug)]
pub struct Param {
    pub name: Spanned<String>,
    pub ty: Option<Spanned<ParamType>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamType {
    Int,
    Byte,
}

#[derive(Clone, Debug)]
pub struct Block {
    pub stmts: Vec<Spanned<Stmt>>,
}

#[derive(Clone, Debug)]
pub enum Stmt {
    Let(Decl),
    Const(Decl),
    Assign {
        targets: Vec<Spanned<Target>>,
        value: Spanned<Expr>,
    },
    Return(Spanned<Expr>),
    Error,
    Break,
    If {
        cond: Spanned<Expr>,
        then_block: Spanned<Block>,
        else_block: Option<Spanned<Block>>,
    },
    For {
        cond: Spanned<Expr>,
        body: Spanned<Block>,
    },
    Expr(Spanned<Expr>),
}

/// Left-hand side of an assignment.
#[derive(Clone, Debug)]
pub enum Target {
    Var(String),
    /// `base.field`, e.g. `itxn.Amount`.
    Field { base: String, field: Spanned<String> },
}

#[derive(Clone, Debug)]
pub enum Expr {
    Int(u64),
    Bytes(Vec<u8>),
    Var(String),
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
    Call {
        name: Spanned<String>,
        args: Vec<Spanned<Expr>>,
    },
    If {
        cond: Box<Spanned<Expr>>,
        then_expr: Box<Spanned<Expr>>,
        else_expr: Box<Spanned<Expr>>,
    },
    /// `base[index]`, e.g. `args[0]` or the `gtxn[1]` part of a field access.
    Index {
        base: Spanned<String>,
        index: Box<Spanned<Expr>>,
    },
    /// `base.field` or `base.field[index]` where base is a name or an `Index`.
    Member {
        base: Box<Spanned<Expr>>,
        field: Spanned<String>,
        index: Option<Box<Spanned<Expr>>>,
    },
    /// `base.method(args)`, e.g. `itxn.begin()`.
    MethodCall {
        base: Spanned<String>,
        method: Spanned<String>,
        args: Vec<Spanned<Expr>>,
    },
}
