use crate::ast::{Args, Operator, Parser, SyntaxError, SyntaxNode, Variables};
use crate::fixed::Value;
use crate::functions::{Function, Registry};
use log::debug;
use rayon::prelude::*;

impl SyntaxNode {
    /// Evaluates this tree against the current contents of `variables`.
    ///
    /// `variables` must be the table the tree was parsed against. Failures
    /// never abort: they come back as [`Value::Undefined`] or
    /// [`Value::Overflow`] and propagate through every operator.
    pub fn eval(&mut self, variables: &mut Variables) -> Value {
        match self {
            SyntaxNode::Const(value) => Value::Number(*value),

            SyntaxNode::VarRef(slot) => variables.get(*slot),

            SyntaxNode::UnaryOperation { operator, operand } => {
                let value = operand.eval(variables);
                operator.apply(value)
            }

            SyntaxNode::BinaryOperation {
                left,
                operator,
                right,
            } => {
                let left_value = left.eval(variables);
                match operator {
                    Operator::Sequence => right.eval(variables),
                    Operator::And | Operator::Or => {
                        let Value::Number(n) = left_value else {
                            return left_value;
                        };
                        // && stops at zero, || stops at non-zero
                        if n.is_zero() == (*operator == Operator::And) {
                            return Value::from_int(i32::from(!n.is_zero()));
                        }
                        operator.apply(left_value, right.eval(variables))
                    }
                    _ => {
                        let right_value = right.eval(variables);
                        operator.apply(left_value, right_value)
                    }
                }
            }

            SyntaxNode::Assignment { target, value } => {
                let value = value.eval(variables);
                variables.set(*target, value);
                value
            }

            SyntaxNode::FunctionCall {
                function,
                args,
                context,
                ..
            } => {
                let mut args = Args::new(args, variables);
                function.call(&mut args, context)
            }
        }
    }
}

/// Evaluates `root` against `variables`.
pub fn evaluate(root: &mut SyntaxNode, variables: &mut Variables) -> Value {
    root.eval(variables)
}

/// Releases a tree and the variable table it was parsed against.
///
/// Children go before their parents, and each call node's context is
/// dropped exactly once, after its arguments.
pub fn destroy(root: SyntaxNode, variables: Variables) {
    debug!("Destroying syntax tree with {} nodes", root.node_count());
    drop(root);
    variables.destroy();
}

/// Parses and evaluates expressions against a fixed set of functions.
pub struct Evaluator {
    registry: Registry,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    /// Creates an `Evaluator` with the built-in functions registered.
    pub fn new() -> Self {
        Self::with_registry(Registry::with_builtins())
    }

    pub fn with_registry(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Registers a function with the evaluator.
    pub fn register_function<F>(&mut self, name: &str, function: F)
    where
        F: Function + 'static,
    {
        self.registry.register_function(name, function);
    }

    /// Parse an expression string into a tree bound to `variables`.
    pub fn parse_expression(
        &self,
        expression: &str,
        variables: &mut Variables,
    ) -> Result<SyntaxNode, SyntaxError> {
        Parser::parse_expression(expression, variables, &self.registry)
    }

    /// Parses and evaluates `expression`, keeping variable bindings in
    /// `variables` for later expressions.
    pub fn evaluate_with(
        &self,
        expression: &str,
        variables: &mut Variables,
    ) -> Result<Value, SyntaxError> {
        let mut ast = self.parse_expression(expression, variables)?;
        let result = ast.eval(variables);
        debug!("Result of '{}': {}", expression, result);
        Ok(result)
    }

    /// Evaluates a self-contained expression with a fresh variable table.
    ///
    /// # Returns
    ///
    /// * `Ok(Value)` if parsing succeeds; the value may be a sentinel.
    /// * `Err(SyntaxError)` if the expression does not parse.
    pub fn evaluate_expression(&self, expression: &str) -> Result<Value, SyntaxError> {
        let mut variables = Variables::new();
        let mut ast = self.parse_expression(expression, &mut variables)?;
        let result = ast.eval(&mut variables);
        debug!("Result of '{}': {}", expression, result);
        destroy(ast, variables);
        Ok(result)
    }

    /// Evaluates independent expressions in parallel. Each expression gets
    /// its own tree and variable table.
    pub fn evaluate_batch<S>(&self, expressions: &[S]) -> Vec<Result<Value, SyntaxError>>
    where
        S: AsRef<str> + Sync,
    {
        expressions
            .par_iter()
            .map(|expression| self.evaluate_expression(expression.as_ref()))
            .collect()
    }
}
