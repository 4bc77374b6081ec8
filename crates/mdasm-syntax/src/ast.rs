//! Abstract syntax tree produced by the front end.
//!
//! One [`AstNode`] is produced per non-empty logical source line. Operators
//! are a single node type keyed by [`OperatorKind`]; precedence, arity and
//! the printed symbol are looked up from static tables on the kind.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::number::{NumericKind, NumericValue};

/// Every operator the dialect knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OperatorKind {
    /// `a + b`
    Add,
    /// `a - b`
    Sub,
    /// `a * b`
    Mul,
    /// `a / b`
    Div,
    /// `a % b`
    Mod,
    /// `a & b`
    And,
    /// `a | b`
    Or,
    /// `a ^ b`
    Xor,
    /// `a << b`
    ShiftLeft,
    /// `a >> b`
    ShiftRight,
    /// `a <<< b`
    RotateLeft,
    /// `a >>> b`
    RotateRight,
    /// `a == b`
    Eq,
    /// `a != b`
    NotEq,
    /// `a < b`
    Lt,
    /// `a > b`
    Gt,
    /// `a <= b`
    LtEq,
    /// `a >= b`
    GtEq,
    /// `a = b`
    Set,
    /// `-a`
    Neg,
    /// `~a`
    Not,
    /// `!a`
    LogicalNot,
    /// `a[b]`
    ArraySubscript,
    /// `a::b`
    Cast,
    /// `a.b`
    FieldAccess,
}

impl OperatorKind {
    /// Map an operator span's text to its kind.
    ///
    /// `-` and `+` map to their binary forms; the reducer reinterprets them
    /// as signs when they have no left operand.
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        use OperatorKind::*;
        Some(match symbol {
            "+" => Add,
            "-" => Sub,
            "*" => Mul,
            "/" => Div,
            "%" => Mod,
            "&" => And,
            "|" => Or,
            "^" => Xor,
            "=" => Set,
            "!" => LogicalNot,
            "~" => Not,
            "<" => Lt,
            ">" => Gt,
            "==" => Eq,
            "!=" => NotEq,
            "<=" => LtEq,
            ">=" => GtEq,
            "<<" => ShiftLeft,
            ">>" => ShiftRight,
            "<<<" => RotateLeft,
            ">>>" => RotateRight,
            _ => return None,
        })
    }

    /// Printed form of the operator.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        use OperatorKind::*;
        match self {
            Add => "+",
            Sub | Neg => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
            And => "&",
            Or => "|",
            Xor => "^",
            ShiftLeft => "<<",
            ShiftRight => ">>",
            RotateLeft => "<<<",
            RotateRight => ">>>",
            Eq => "==",
            NotEq => "!=",
            Lt => "<",
            Gt => ">",
            LtEq => "<=",
            GtEq => ">=",
            Set => "=",
            Not => "~",
            LogicalNot => "!",
            ArraySubscript => "[]",
            Cast => "::",
            FieldAccess => ".",
        }
    }

    /// Binding strength; lower values bind tighter.
    #[must_use]
    pub fn precedence(self) -> u8 {
        use OperatorKind::*;
        match self {
            FieldAccess | Cast => 0,
            ArraySubscript => 1,
            Neg | Not | LogicalNot => 2,
            Mul | Div | Mod => 3,
            Add | Sub => 4,
            ShiftLeft | ShiftRight | RotateLeft | RotateRight => 5,
            Lt | Gt | LtEq | GtEq => 6,
            Eq | NotEq => 7,
            And => 8,
            Xor => 9,
            Or => 10,
            Set => 11,
        }
    }

    /// Unary operators only ever take a right operand.
    #[must_use]
    pub fn is_unary(self) -> bool {
        matches!(
            self,
            OperatorKind::Neg | OperatorKind::Not | OperatorKind::LogicalNot
        )
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A numeric literal: the source text plus its decoded value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Number {
    /// Literal text as written (`$FF`, `1.5`).
    pub text: String,
    /// Decoded value.
    pub value: NumericValue,
    /// Narrowest storage class.
    pub kind: NumericKind,
}

/// Leaf values.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Literal {
    /// An identifier, or the empty placeholder for an omitted macro argument.
    Text(String),
    /// A quoted string with escapes resolved.
    String(String),
    /// A numeric literal.
    Number(Number),
}

/// `{` or `}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlockDelimiter {
    /// `{`
    Start,
    /// `}`
    End,
}

/// One node of a reduced line.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AstNode {
    /// A literal leaf.
    Literal(Literal),
    /// `name: target`
    LabelCreate {
        /// The labelled name (usually a text literal).
        name: Box<AstNode>,
        /// The statement following the label on the same line, if any.
        target: Option<Box<AstNode>>,
    },
    /// `name.size(args...)` or `name.size args, ...`
    MacroCall {
        /// Macro name.
        name: String,
        /// Text after the `.`, e.g. `b` in `dc.b`.
        size_suffix: Option<String>,
        /// Arguments in source order.
        args: Vec<AstNode>,
    },
    /// Any operator expression.
    Operator {
        /// Which operator.
        op: OperatorKind,
        /// Left operand; never set on unary operators.
        left: Option<Box<AstNode>>,
        /// Right operand.
        right: Option<Box<AstNode>>,
    },
    /// A block delimiter, passed through unprocessed.
    Block(BlockDelimiter),
}

impl AstNode {
    /// A text literal.
    pub fn text(name: impl Into<String>) -> Self {
        AstNode::Literal(Literal::Text(name.into()))
    }

    /// A string literal.
    pub fn string(value: impl Into<String>) -> Self {
        AstNode::Literal(Literal::String(value.into()))
    }

    /// An operator with no operands attached yet.
    #[must_use]
    pub fn operator(op: OperatorKind) -> Self {
        AstNode::Operator {
            op,
            left: None,
            right: None,
        }
    }

    /// A full binary operator.
    #[must_use]
    pub fn binary(op: OperatorKind, left: AstNode, right: AstNode) -> Self {
        AstNode::Operator {
            op,
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
        }
    }

    /// A full unary operator.
    #[must_use]
    pub fn unary(op: OperatorKind, operand: AstNode) -> Self {
        AstNode::Operator {
            op,
            left: None,
            right: Some(Box::new(operand)),
        }
    }

    /// Whether every operand slot this node requires is populated.
    ///
    /// Only operators can be incomplete; a binary operator needs both
    /// sides, a unary one only its right side.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        match self {
            AstNode::Operator { op, left, right } => {
                right.is_some() && (op.is_unary() || left.is_some())
            }
            _ => true,
        }
    }

    /// The literal text, when this node is a text literal.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AstNode::Literal(Literal::Text(s)) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Text(s) => f.write_str(s),
            Literal::String(s) => write!(f, "\"{}\"", s.escape_debug()),
            Literal::Number(n) => f.write_str(&n.text),
        }
    }
}

fn operand(f: &mut fmt::Formatter<'_>, node: &Option<Box<AstNode>>) -> fmt::Result {
    match node {
        Some(n) => write!(f, "{}", n),
        None => f.write_str("_"),
    }
}

impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstNode::Literal(lit) => write!(f, "{}", lit),
            AstNode::LabelCreate { name, target } => match target {
                Some(t) => write!(f, "{}: {}", name, t),
                None => write!(f, "{}:", name),
            },
            AstNode::MacroCall {
                name,
                size_suffix,
                args,
            } => {
                f.write_str(name)?;
                if let Some(size) = size_suffix {
                    write!(f, ".{}", size)?;
                }
                f.write_str("(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
            AstNode::Operator { op, left, right } => match op {
                OperatorKind::ArraySubscript => {
                    operand(f, left)?;
                    f.write_str("[")?;
                    operand(f, right)?;
                    f.write_str("]")
                }
                OperatorKind::FieldAccess => {
                    operand(f, left)?;
                    f.write_str(".")?;
                    operand(f, right)
                }
                _ if op.is_unary() => {
                    write!(f, "({}", op)?;
                    operand(f, right)?;
                    f.write_str(")")
                }
                _ => {
                    f.write_str("(")?;
                    operand(f, left)?;
                    write!(f, " {} ", op)?;
                    operand(f, right)?;
                    f.write_str(")")
                }
            },
            AstNode::Block(BlockDelimiter::Start) => f.write_str("{"),
            AstNode::Block(BlockDelimiter::End) => f.write_str("}"),
        }
    }
}
