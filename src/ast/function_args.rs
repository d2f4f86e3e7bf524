use crate::ast::{SyntaxNode, Slot, Variables};
use crate::fixed::Value;

/// The unevaluated argument list of one call, together with the variable
/// table the arguments were parsed against.
pub struct Args<'a> {
    nodes: &'a mut [SyntaxNode],
    variables: &'a mut Variables,
}

impl<'a> Args<'a> {
    pub fn new(nodes: &'a mut [SyntaxNode], variables: &'a mut Variables) -> Self {
        Self { nodes, variables }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Evaluates argument `index`. May run any number of times; every run
    /// sees the current variable values. A missing argument is `Undefined`.
    pub fn eval(&mut self, index: usize) -> Value {
        match self.nodes.get_mut(index) {
            Some(node) => node.eval(self.variables),
            None => Value::Undefined,
        }
    }

    /// Evaluates every argument once, left to right.
    pub fn eval_all(&mut self) -> Vec<Value> {
        (0..self.len()).map(|index| self.eval(index)).collect()
    }

    /// The variable slot named by argument `index`, if that argument is a
    /// bare variable reference.
    pub fn slot(&self, index: usize) -> Option<Slot> {
        self.nodes.get(index).and_then(SyntaxNode::as_slot)
    }

    pub fn node(&self, index: usize) -> Option<&SyntaxNode> {
        self.nodes.get(index)
    }

    pub fn variables(&mut self) -> &mut Variables {
        &mut *self.variables
    }

    pub fn get(&self, slot: Slot) -> Value {
        self.variables.get(slot)
    }

    pub fn set(&mut self, slot: Slot, value: Value) {
        self.variables.set(slot, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::Fixed;

    #[test]
    fn test_args_evaluate_lazily() {
        let mut variables = Variables::new();
        let x = variables.resolve("x");
        let mut nodes = vec![SyntaxNode::VarRef(x), SyntaxNode::Const(Fixed::from_int(4))];
        let mut args = Args::new(&mut nodes, &mut variables);

        assert_eq!(args.len(), 2);
        assert_eq!(args.slot(0), Some(x));
        assert_eq!(args.slot(1), None);
        assert_eq!(args.eval(0), Value::ZERO);
        args.set(x, Value::from_int(9));
        assert_eq!(args.eval(0), Value::from_int(9));
        assert_eq!(args.eval_all(), vec![Value::from_int(9), Value::from_int(4)]);
        assert_eq!(args.eval(2), Value::Undefined);
    }
}
