use crate::ast::Args;
use crate::fixed::Value;
use crate::functions::Registry;

pub fn register(registry: &mut Registry) {
    registry.register_function("sqrt", sqrt);
}

/// `sqrt(x)`: square root, `Undefined` for negative `x` or a wrong arity.
pub fn sqrt(args: &mut Args<'_>) -> Value {
    if args.len() != 1 {
        return Value::Undefined;
    }
    args.eval(0).sqrt()
}

#[cfg(test)]
mod tests {
    use crate::fixed::{Fixed, Value};
    use crate::Evaluator;

    fn eval(expression: &str) -> Value {
        Evaluator::new().evaluate_expression(expression).unwrap()
    }

    #[test]
    fn test_sqrt_of_perfect_squares() {
        assert_eq!(eval("sqrt(0)"), Value::ZERO);
        assert_eq!(eval("sqrt(1)"), Value::from_int(1));
        assert_eq!(eval("sqrt(16)"), Value::from_int(4));
        assert_eq!(eval("sqrt(144)"), Value::from_int(12));
        assert_eq!(eval("sqrt(2.25)"), eval("1.5"));
        assert_eq!(eval("sqrt(0.0625)"), eval("0.25"));
    }

    #[test]
    fn test_sqrt_of_two() {
        let root = eval("sqrt(2)").number().unwrap();
        assert!((root.to_f64() - std::f64::consts::SQRT_2).abs() < 1e-9);
        assert_eq!(root, Fixed::from_raw(6_074_000_999).unwrap());
    }

    #[test]
    fn test_sqrt_domain_error() {
        assert_eq!(eval("sqrt(-1)"), Value::Undefined);
        assert_eq!(eval("sqrt(-0.5)"), Value::Undefined);
        assert_eq!(eval("sqrt(-0)"), Value::ZERO);
    }

    #[test]
    fn test_sqrt_arity() {
        assert_eq!(eval("sqrt()"), Value::Undefined);
        assert_eq!(eval("sqrt(4, 9)"), Value::Undefined);
    }

    #[test]
    fn test_sqrt_passes_sentinels_through() {
        assert_eq!(eval("sqrt(1 / 0)"), Value::Overflow);
        assert_eq!(eval("sqrt(0 / 0)"), Value::Undefined);
        assert_eq!(eval("sqrt(sqrt(-4))"), Value::Undefined);
    }
}
