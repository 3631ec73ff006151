use primitive_types::U256;

use super::interner::Symbol;
use crate::{opcodes, PlatformVersion};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Block {
    pub(crate) statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Statement {
    Let {
        name: Symbol,
        value: Option<Expression>,
    },
    Assign {
        name: Symbol,
        value: Expression,
    },
    If {
        condition: Expression,
        body: Block,
    },
    Expression(Expression),
    Block(Block),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Expression {
    Literal(U256),
    Identifier(Symbol),
    Call {
        builtin: Builtin,
        arguments: Vec<Expression>,
    },
}

/// Functions built into the dialect. Each maps to exactly one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Builtin {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Gt,
    Eq,
    IsZero,
    And,
    Or,
    Xor,
    Not,
    Shl,
    Shr,
    Sload,
    Sstore,
    Pop,
    Revert,
}

impl Builtin {
    const ALL: [Self; 19] = [
        Self::Add,
        Self::Sub,
        Self::Mul,
        Self::Div,
        Self::Mod,
        Self::Lt,
        Self::Gt,
        Self::Eq,
        Self::IsZero,
        Self::And,
        Self::Or,
        Self::Xor,
        Self::Not,
        Self::Shl,
        Self::Shr,
        Self::Sload,
        Self::Sstore,
        Self::Pop,
        Self::Revert,
    ];

    pub(crate) fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|builtin| builtin.name() == name)
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Mod => "mod",
            Self::Lt => "lt",
            Self::Gt => "gt",
            Self::Eq => "eq",
            Self::IsZero => "iszero",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::Not => "not",
            Self::Shl => "shl",
            Self::Shr => "shr",
            Self::Sload => "sload",
            Self::Sstore => "sstore",
            Self::Pop => "pop",
            Self::Revert => "revert",
        }
    }

    pub(crate) fn arity(self) -> usize {
        match self {
            Self::IsZero | Self::Not | Self::Sload | Self::Pop => 1,
            _ => 2,
        }
    }

    pub(crate) fn returns_value(self) -> bool {
        !matches!(self, Self::Sstore | Self::Pop | Self::Revert)
    }

    pub(crate) fn opcode(self) -> u8 {
        match self {
            Self::Add => opcodes::ADD,
            Self::Sub => opcodes::SUB,
            Self::Mul => opcodes::MUL,
            Self::Div => opcodes::DIV,
            Self::Mod => opcodes::MOD,
            Self::Lt => opcodes::LT,
            Self::Gt => opcodes::GT,
            Self::Eq => opcodes::EQ,
            Self::IsZero => opcodes::ISZERO,
            Self::And => opcodes::AND,
            Self::Or => opcodes::OR,
            Self::Xor => opcodes::XOR,
            Self::Not => opcodes::NOT,
            Self::Shl => opcodes::SHL,
            Self::Shr => opcodes::SHR,
            Self::Sload => opcodes::SLOAD,
            Self::Sstore => opcodes::SSTORE,
            Self::Pop => opcodes::POP,
            Self::Revert => opcodes::REVERT,
        }
    }

    pub(crate) fn is_available(self, version: PlatformVersion) -> bool {
        match self {
            Self::Shl | Self::Shr => version.has_bitwise_shifting(),
            Self::Revert => version.has_revert(),
            _ => true,
        }
    }

    /// Evaluates a side-effect free builtin on constant arguments, in source order.
    pub(crate) fn evaluate(self, arguments: &[U256]) -> Option<U256> {
        let flag = |value: bool| if value { U256::one() } else { U256::zero() };
        Some(match (self, arguments) {
            (Self::Add, &[a, b]) => a.overflowing_add(b).0,
            (Self::Sub, &[a, b]) => a.overflowing_sub(b).0,
            (Self::Mul, &[a, b]) => a.overflowing_mul(b).0,
            (Self::Div, &[a, b]) => a.checked_div(b).unwrap_or_default(),
            (Self::Mod, &[a, b]) => a.checked_rem(b).unwrap_or_default(),
            (Self::Lt, &[a, b]) => flag(a < b),
            (Self::Gt, &[a, b]) => flag(a > b),
            (Self::Eq, &[a, b]) => flag(a == b),
            (Self::IsZero, &[a]) => flag(a.is_zero()),
            (Self::And, &[a, b]) => a & b,
            (Self::Or, &[a, b]) => a | b,
            (Self::Xor, &[a, b]) => a ^ b,
            (Self::Not, &[a]) => !a,
            // Shifts are left alone; whether they exist depends on the target version.
            _ => return None,
        })
    }
}
