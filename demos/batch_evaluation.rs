use fixcalc::Evaluator;

fn main() {
    pretty_env_logger::init();

    let expressions: Vec<String> = (1..=8)
        .map(|n| format!("sum(k * k, k, 1, {})", n * 100))
        .chain(["1 / 0".to_string(), "(1 + 2".to_string()])
        .collect();

    let evaluator = Evaluator::new();
    let results = evaluator.evaluate_batch(&expressions);
    for (expression, result) in expressions.iter().zip(results) {
        match result {
            Ok(value) => println!("{} => {}", expression, value),
            Err(err) => println!("{} => error: {}", expression, err),
        }
    }
}
