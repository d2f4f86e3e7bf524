use fixcalc::{destroy, evaluate, Evaluator, Value, Variables};

fn main() {
    pretty_env_logger::init();

    let evaluator = Evaluator::new();
    let mut variables = Variables::new();

    let mut ast = evaluator
        .parse_expression("x * x - 2 * x + count()", &mut variables)
        .expect("Failed to parse");
    println!("{:#?}", ast);

    let Some(x) = variables.lookup("x") else {
        return;
    };
    for n in -2..=2 {
        variables.set(x, Value::from_int(n));
        println!("x = {} => {}", n, evaluate(&mut ast, &mut variables));
    }

    destroy(ast, variables);
}
