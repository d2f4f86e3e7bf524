use crate::fixed::{Fixed, Value};
use crate::functions::{CallContext, Function};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

mod error;
mod evaluator;
mod function_args;
mod parser;
mod variables;

pub use error::*;
pub use evaluator::*;
pub use function_args::*;
pub use parser::{ExpressionParser as Parser, MAX_GROUP_DEPTH, MAX_TREE_DEPTH};
pub use variables::*;

/// A parsed expression. Every node exclusively owns its children.
pub enum SyntaxNode {
    Const(Fixed),
    VarRef(Slot),
    UnaryOperation {
        operator: UnaryOperator,
        operand: Box<SyntaxNode>,
    },
    BinaryOperation {
        left: Box<SyntaxNode>,
        operator: Operator,
        right: Box<SyntaxNode>,
    },
    Assignment {
        target: Slot,
        value: Box<SyntaxNode>,
    },
    /// Arguments are kept unevaluated; the function decides what to run.
    /// Fields drop in order, so the arguments go before the context.
    FunctionCall {
        name: String,
        function: Arc<dyn Function>,
        args: Vec<SyntaxNode>,
        context: CallContext,
    },
}

impl SyntaxNode {
    /// The slot this node refers to, if it is a bare variable reference.
    pub fn as_slot(&self) -> Option<Slot> {
        match self {
            SyntaxNode::VarRef(slot) => Some(*slot),
            _ => None,
        }
    }

    /// Number of nodes in this tree, the root included.
    pub fn node_count(&self) -> usize {
        1 + match self {
            SyntaxNode::Const(_) | SyntaxNode::VarRef(_) => 0,
            SyntaxNode::UnaryOperation { operand, .. } => operand.node_count(),
            SyntaxNode::BinaryOperation { left, right, .. } => {
                left.node_count() + right.node_count()
            }
            SyntaxNode::Assignment { value, .. } => value.node_count(),
            SyntaxNode::FunctionCall { args, .. } => {
                args.iter().map(SyntaxNode::node_count).sum::<usize>()
            }
        }
    }
}

impl fmt::Debug for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxNode::Const(value) => f.debug_tuple("Const").field(value).finish(),
            SyntaxNode::VarRef(slot) => f.debug_tuple("VarRef").field(slot).finish(),
            SyntaxNode::UnaryOperation { operator, operand } => f
                .debug_struct("UnaryOperation")
                .field("operator", operator)
                .field("operand", operand)
                .finish(),
            SyntaxNode::BinaryOperation {
                left,
                operator,
                right,
            } => f
                .debug_struct("BinaryOperation")
                .field("left", left)
                .field("operator", operator)
                .field("right", right)
                .finish(),
            SyntaxNode::Assignment { target, value } => f
                .debug_struct("Assignment")
                .field("target", target)
                .field("value", value)
                .finish(),
            SyntaxNode::FunctionCall {
                name,
                args,
                context,
                ..
            } => f
                .debug_struct("FunctionCall")
                .field("name", name)
                .field("args", args)
                .field("context", context)
                .finish(),
        }
    }
}

/// Structural equality. Calls compare by name and arguments only.
impl PartialEq for SyntaxNode {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SyntaxNode::Const(a), SyntaxNode::Const(b)) => a == b,
            (SyntaxNode::VarRef(a), SyntaxNode::VarRef(b)) => a == b,
            (
                SyntaxNode::UnaryOperation { operator, operand },
                SyntaxNode::UnaryOperation {
                    operator: other_operator,
                    operand: other_operand,
                },
            ) => operator == other_operator && operand == other_operand,
            (
                SyntaxNode::BinaryOperation {
                    left,
                    operator,
                    right,
                },
                SyntaxNode::BinaryOperation {
                    left: other_left,
                    operator: other_operator,
                    right: other_right,
                },
            ) => operator == other_operator && left == other_left && right == other_right,
            (
                SyntaxNode::Assignment { target, value },
                SyntaxNode::Assignment {
                    target: other_target,
                    value: other_value,
                },
            ) => target == other_target && value == other_value,
            (
                SyntaxNode::FunctionCall { name, args, .. },
                SyntaxNode::FunctionCall {
                    name: other_name,
                    args: other_args,
                    ..
                },
            ) => name == other_name && args == other_args,
            _ => false,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Negate,
    Not,
}

impl UnaryOperator {
    pub fn apply(&self, operand: Value) -> Value {
        match self {
            UnaryOperator::Negate => -operand,
            UnaryOperator::Not => !operand,
        }
    }
}

impl TryFrom<&str> for UnaryOperator {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "-" => Ok(UnaryOperator::Negate),
            "!" => Ok(UnaryOperator::Not),
            _ => Err(format!("Unknown unary operator: {}", value)),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    /// `**` or `^`, right associative.
    Power,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    Equal,
    NotEqual,
    And,
    Or,
    /// `,`: evaluates the left side for its effects and yields the right.
    Sequence,
}

impl Operator {
    /// Applies a strict operator to two evaluated operands.
    ///
    /// `And`, `Or` and `Sequence` control evaluation of their right operand
    /// and are handled by the evaluator; called here they act on the
    /// already-evaluated values.
    pub fn apply(&self, left: Value, right: Value) -> Value {
        match self {
            Operator::Add => left + right,
            Operator::Subtract => left - right,
            Operator::Multiply => left * right,
            Operator::Divide => left / right,
            Operator::Modulo => left % right,
            Operator::Power => left.pow(right),
            Operator::GreaterThan => left.compare(right, Ordering::is_gt),
            Operator::LessThan => left.compare(right, Ordering::is_lt),
            Operator::GreaterThanOrEqual => left.compare(right, Ordering::is_ge),
            Operator::LessThanOrEqual => left.compare(right, Ordering::is_le),
            Operator::Equal => left.compare(right, Ordering::is_eq),
            Operator::NotEqual => left.compare(right, Ordering::is_ne),
            Operator::And => !(!left + !right),
            Operator::Or => !(!left * !right),
            Operator::Sequence => right,
        }
    }
}

impl TryFrom<&str> for Operator {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "+" => Ok(Operator::Add),
            "-" => Ok(Operator::Subtract),
            "*" => Ok(Operator::Multiply),
            "/" => Ok(Operator::Divide),
            "%" => Ok(Operator::Modulo),
            "**" | "^" => Ok(Operator::Power),
            ">" => Ok(Operator::GreaterThan),
            "<" => Ok(Operator::LessThan),
            ">=" => Ok(Operator::GreaterThanOrEqual),
            "<=" => Ok(Operator::LessThanOrEqual),
            "==" => Ok(Operator::Equal),
            "!=" => Ok(Operator::NotEqual),
            "&&" => Ok(Operator::And),
            "||" => Ok(Operator::Or),
            "," => Ok(Operator::Sequence),
            _ => Err(format!("Unknown operator: {}", value)),
        }
    }
}
