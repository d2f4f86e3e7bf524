use fixcalc::{fixcalc_fn, Args, Evaluator, Fixed, Value, Variables};

#[fixcalc_fn]
fn clamp(x: Fixed, low: Fixed, high: Fixed) -> Value {
    Value::Number(x.max(low).min(high))
}

#[fixcalc_fn]
fn is_nan(x: Value) -> Value {
    Value::Number(Fixed::from_bool(x == Value::Undefined))
}

fn main() {
    pretty_env_logger::init();

    let mut evaluator = Evaluator::new();
    evaluator.register_function("clamp", clamp);
    evaluator.register_function("is_nan", is_nan);

    let mut variables = Variables::new();
    let lines = [
        "price = 120.25, volume = 3000",
        "price > 100 && volume < 5000",
        "clamp(price * 2, 0, 200)",
        "sqrt(volume)",
        "sum(i * i, i, 1, 10)",
        "is_nan(sqrt(-1)), is_nan(1 / 0)",
    ];
    for expression in lines {
        match evaluator.evaluate_with(expression, &mut variables) {
            Ok(result) => println!("{} => {} (raw {})", expression, result, result.to_bits()),
            Err(err) => println!("{} => error: {}", expression, err),
        }
    }
}
