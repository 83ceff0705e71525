use std::fmt;

/// Value types of the language. Closed set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    /// Result of a state read whose stored type is not known statically.
    Unknown,
    Integer,
    /// Byte array.
    Bytes,
    /// Error sentinel: the expression failed to build or check.
    Invalid,
}

impl Ty {
    pub fn display(&self) -> &'static str {
        match self {
            Ty::Unknown => "unknown",
            Ty::Integer => "integer",
            Ty::Bytes => "byte[]",
            Ty::Invalid => "invalid",
        }
    }

    /// True for types that are known and valid.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Ty::Integer | Ty::Bytes)
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}

/// What an operator demands of its operands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperandRule {
    /// Operands must be integers.
    Integer,
    /// Operands may be of any type, but both sides must agree.
    Any,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    BitOr,
    BitXor,
    Mul,
    Div,
    Mod,
    BitAnd,
}

impl BinOp {
    /// Source text, which is also the opcode the machine uses.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Or => "||",
            BinOp::And => "&&",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Lt => "<",
            BinOp::LtEq => "<=",
            BinOp::Gt => ">",
            BinOp::GtEq => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::BitAnd => "&",
        }
    }

    pub fn opcode(&self) -> &'static str {
        self.as_str()
    }

    /// Declared result type. Every operator of the language yields an integer.
    pub fn result_ty(&self) -> Ty {
        Ty::Integer
    }

    pub fn operand_rule(&self) -> OperandRule {
        match self {
            BinOp::Eq | BinOp::NotEq => OperandRule::Any,
            _ => OperandRule::Integer,
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::NotEq | BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq
        )
    }

    /// (left, right) binding power; higher binds tighter.
    pub fn binding_power(&self) -> (u8, u8) {
        match self {
            BinOp::Or => (1, 2),
            BinOp::And => (3, 4),
            BinOp::Eq | BinOp::NotEq | BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq => (5, 6),
            BinOp::Add | BinOp::Sub | BinOp::BitOr | BinOp::BitXor => (7, 8),
            BinOp::Mul | BinOp::Div | BinOp::Mod | BinOp::BitAnd => (9, 10),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnOp {
    Not,
    BitNot,
}

impl UnOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnOp::Not => "!",
            UnOp::BitNot => "~",
        }
    }

    pub fn opcode(&self) -> &'static str {
        self.as_str()
    }

    pub fn result_ty(&self) -> Ty {
        Ty::Integer
    }

    pub fn operand_rule(&self) -> OperandRule {
        OperandRule::Integer
    }
}
