use crate::ast::{Operator, SyntaxError, SyntaxNode, UnaryOperator, Variables};
use crate::fixed::Fixed;
use crate::functions::Registry;
use log::debug;
use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "./expression.pest"]
pub struct ExpressionParser;

impl ExpressionParser {
    /// Parses `input` into a syntax tree.
    ///
    /// Identifiers followed by `(` must name a function in `registry`; every
    /// other identifier is bound to a slot in `variables`, which is created
    /// on first use. On error nothing built so far survives.
    pub fn parse_expression(
        input: &str,
        variables: &mut Variables,
        registry: &Registry,
    ) -> Result<SyntaxNode, SyntaxError> {
        debug!("Parsing expression: {}", input);
        check_group_depth(input)?;
        let parse_result = ExpressionParser::parse(Rule::expression, input)
            .map_err(|e| SyntaxError::Grammar(e.to_string()))?
            .next()
            .ok_or_else(|| SyntaxError::Grammar("Failed to parse expression".to_string()))?;

        let mut builder = TreeBuilder {
            variables,
            registry,
        };
        let built = builder.build_expression(parse_result)?;
        debug!(
            "Built syntax tree with {} nodes, {} deep",
            built.node.node_count(),
            built.depth
        );
        Ok(built.node)
    }

    /// Parses raw expression bytes; only ASCII text is accepted.
    pub fn parse_bytes(
        input: &[u8],
        variables: &mut Variables,
        registry: &Registry,
    ) -> Result<SyntaxNode, SyntaxError> {
        if !input.is_ascii() {
            return Err(SyntaxError::InvalidEncoding);
        }
        let text = std::str::from_utf8(input).map_err(|_| SyntaxError::InvalidEncoding)?;
        Self::parse_expression(text, variables, registry)
    }
}

/// Deepest syntax tree the parser builds, counted in nodes from the root.
pub const MAX_TREE_DEPTH: usize = 1000;

/// Deepest nesting of parentheses, call parentheses included.
pub const MAX_GROUP_DEPTH: usize = 64;

/// Rejects parenthesis nesting beyond [`MAX_GROUP_DEPTH`] before the grammar
/// recurses into it. Balance is left to the grammar.
fn check_group_depth(input: &str) -> Result<(), SyntaxError> {
    let mut depth = 0usize;
    for byte in input.bytes() {
        match byte {
            b'(' => {
                depth += 1;
                if depth > MAX_GROUP_DEPTH {
                    return Err(SyntaxError::TooDeep {
                        limit: MAX_GROUP_DEPTH,
                    });
                }
            }
            b')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

/// A subtree together with its depth in nodes.
struct Built {
    node: SyntaxNode,
    depth: usize,
}

impl Built {
    fn leaf(node: SyntaxNode) -> Self {
        Self { node, depth: 1 }
    }
}

/// Depth of a node whose deepest child is `child_depth` deep.
fn parent_depth(child_depth: usize) -> Result<usize, SyntaxError> {
    if child_depth >= MAX_TREE_DEPTH {
        return Err(SyntaxError::TooDeep {
            limit: MAX_TREE_DEPTH,
        });
    }
    Ok(child_depth + 1)
}

fn binary_node(left: Built, operator: Operator, right: Built) -> Result<Built, SyntaxError> {
    let depth = parent_depth(left.depth.max(right.depth))?;
    Ok(Built {
        node: SyntaxNode::BinaryOperation {
            left: Box::new(left.node),
            operator,
            right: Box::new(right.node),
        },
        depth,
    })
}

struct TreeBuilder<'a> {
    variables: &'a mut Variables,
    registry: &'a Registry,
}

impl TreeBuilder<'_> {
    fn build_expression(&mut self, pair: Pair<Rule>) -> Result<Built, SyntaxError> {
        let mut pairs = pair.into_inner();
        self.build_sequence(expect_pair(&mut pairs, "expression")?)
    }

    fn build_sequence(&mut self, pair: Pair<Rule>) -> Result<Built, SyntaxError> {
        let mut pairs = pair.into_inner().filter(|p| p.as_rule() != Rule::COMMA);
        let first = pairs
            .next()
            .ok_or_else(|| SyntaxError::Grammar("Expected an expression".to_string()))?;
        let mut built = self.build_assignment(first)?;

        for next in pairs {
            let right = self.build_assignment(next)?;
            built = binary_node(built, Operator::Sequence, right)?;
        }

        Ok(built)
    }

    /// `a = b = value`: targets bind left to right, assignments nest to the right.
    fn build_assignment(&mut self, pair: Pair<Rule>) -> Result<Built, SyntaxError> {
        let mut targets = Vec::new();
        let mut value = None;
        for inner in pair.into_inner() {
            if inner.as_rule() == Rule::identifier {
                debug!("Building assignment to '{}'", inner.as_str());
                targets.push(self.variables.resolve(inner.as_str()));
            } else {
                value = Some(self.build_operand(inner)?);
            }
        }

        let mut built =
            value.ok_or_else(|| SyntaxError::Grammar("Expected an assigned value".to_string()))?;
        for target in targets.into_iter().rev() {
            let depth = parent_depth(built.depth)?;
            built = Built {
                node: SyntaxNode::Assignment {
                    target,
                    value: Box::new(built.node),
                },
                depth,
            };
        }
        Ok(built)
    }

    fn build_operand(&mut self, pair: Pair<Rule>) -> Result<Built, SyntaxError> {
        match pair.as_rule() {
            Rule::or_expression
            | Rule::and_expression
            | Rule::equality_expression
            | Rule::comparison_expression
            | Rule::arithmetic_expression
            | Rule::term => self.build_binary_chain(pair),
            Rule::factor | Rule::exponent => self.build_factor(pair),
            Rule::power => self.build_power(pair),
            rule => Err(SyntaxError::Grammar(format!(
                "Unexpected rule in operand: {:?}",
                rule
            ))),
        }
    }

    /// One precedence level: `operand (operator operand)*`, folded to the left.
    fn build_binary_chain(&mut self, pair: Pair<Rule>) -> Result<Built, SyntaxError> {
        let mut pairs = pair.into_inner();
        let mut built = self.build_operand(expect_pair(&mut pairs, "operand")?)?;

        while let Some(operator_pair) = pairs.next() {
            let operator =
                Operator::try_from(operator_pair.as_str()).map_err(SyntaxError::Grammar)?;
            let right = self.build_operand(expect_pair(&mut pairs, "right operand")?)?;
            built = binary_node(built, operator, right)?;
        }

        Ok(built)
    }

    /// `base ** exponent ** ...`, folded to the right.
    fn build_power(&mut self, pair: Pair<Rule>) -> Result<Built, SyntaxError> {
        let mut operands = Vec::new();
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::POWER => {}
                Rule::exponent => operands.push(self.build_factor(inner)?),
                _ => operands.push(self.build_primary(inner)?),
            }
        }

        let mut built = operands
            .pop()
            .ok_or_else(|| SyntaxError::Grammar("Expected a primary expression".to_string()))?;
        while let Some(base) = operands.pop() {
            built = binary_node(base, Operator::Power, built)?;
        }
        Ok(built)
    }

    fn build_factor(&mut self, pair: Pair<Rule>) -> Result<Built, SyntaxError> {
        let mut operators = Vec::new();
        let mut operand = None;

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::MINUS | Rule::NOT => operators
                    .push(UnaryOperator::try_from(inner.as_str()).map_err(SyntaxError::Grammar)?),
                Rule::power => operand = Some(self.build_power(inner)?),
                _ => operand = Some(self.build_primary(inner)?),
            }
        }

        let mut built = operand
            .ok_or_else(|| SyntaxError::Grammar("Expected a primary expression".to_string()))?;
        // the operator closest to the operand applies first
        for operator in operators.into_iter().rev() {
            let depth = parent_depth(built.depth)?;
            built = Built {
                node: SyntaxNode::UnaryOperation {
                    operator,
                    operand: Box::new(built.node),
                },
                depth,
            };
        }
        Ok(built)
    }

    fn build_primary(&mut self, pair: Pair<Rule>) -> Result<Built, SyntaxError> {
        match pair.as_rule() {
            Rule::number => {
                let literal = pair.as_str();
                let value =
                    Fixed::parse_literal(literal).map_err(|source| SyntaxError::InvalidLiteral {
                        literal: literal.to_string(),
                        source,
                    })?;
                Ok(Built::leaf(SyntaxNode::Const(value)))
            }
            Rule::identifier => Ok(Built::leaf(SyntaxNode::VarRef(
                self.variables.resolve(pair.as_str()),
            ))),
            Rule::group => {
                let mut pairs = pair.into_inner();
                self.build_sequence(expect_pair(&mut pairs, "grouped expression")?)
            }
            Rule::function_call => self.build_function_call(pair),
            rule => Err(SyntaxError::Grammar(format!(
                "Unexpected rule in primary expression: {:?}",
                rule
            ))),
        }
    }

    fn build_function_call(&mut self, pair: Pair<Rule>) -> Result<Built, SyntaxError> {
        let mut inner = pair.into_inner();
        let name = expect_pair(&mut inner, "function name")?.as_str().to_string();
        let function = self
            .registry
            .get(&name)
            .cloned()
            .ok_or_else(|| SyntaxError::UnknownFunction(name.clone()))?;

        let mut args = Vec::new();
        let mut deepest = 0;
        if let Some(arguments) = inner.next() {
            for argument in arguments.into_inner() {
                if argument.as_rule() == Rule::assignment {
                    let built = self.build_assignment(argument)?;
                    deepest = deepest.max(built.depth);
                    args.push(built.node);
                }
            }
        }
        let depth = parent_depth(deepest)?;

        debug!("Building call to '{}' with {} arguments", name, args.len());
        let context = function.new_context();
        Ok(Built {
            node: SyntaxNode::FunctionCall {
                name,
                function,
                args,
                context,
            },
            depth,
        })
    }
}

fn expect_pair<'i>(pairs: &mut Pairs<'i, Rule>, what: &str) -> Result<Pair<'i, Rule>, SyntaxError> {
    pairs
        .next()
        .ok_or_else(|| SyntaxError::Grammar(format!("Expected {}", what)))
}
