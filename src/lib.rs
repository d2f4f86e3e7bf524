pub mod ast;
pub mod fixed;
pub mod functions;
pub mod session;

pub use ast::{destroy, evaluate, Args, Evaluator, Parser, SyntaxError, SyntaxNode, Variables};
pub use fixcalc_macros::fixcalc_fn;
pub use fixed::{Fixed, Value};
pub use functions::{CallContext, Function, Registry};

/// Evaluates a self-contained expression with the built-in functions.
pub fn evaluate_expression(expression: &str) -> Result<Value, SyntaxError> {
    Evaluator::new().evaluate_expression(expression)
}
