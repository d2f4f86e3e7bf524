use criterion::{black_box, criterion_group, criterion_main, Criterion};
use evalexpr::*;
use fixcalc::{Evaluator, Variables};

/// Benchmark simple arithmetic expressions
fn benchmark_simple_arithmetic(c: &mut Criterion) {
    let mut group = c.benchmark_group("Simple arithmetic Expression Evaluation");

    let evaluator = Evaluator::new();
    let expr = "2 + 3 * 4";

    let mut variables = Variables::new();
    let mut parsed = evaluator.parse_expression(expr, &mut variables).unwrap();
    let precompiled_evalexpr = build_operator_tree::<DefaultNumericTypes>(expr).unwrap();

    group.bench_function("fixcalc_arithmetic", |b| {
        b.iter(|| evaluator.evaluate_expression(black_box(expr)).unwrap())
    });

    group.bench_function("preparsed_arithmetic", |b| {
        b.iter(|| black_box(parsed.eval(&mut variables)))
    });

    group.bench_function("native_rust_arithmetic", |b| {
        b.iter(|| black_box(2.0 + 3.0 * 4.0))
    });

    group.bench_function("meval_arithmetic", |b| {
        b.iter(|| meval::eval_str(black_box(expr)).unwrap())
    });

    group.bench_function("evalexpr_arithmetic", |b| {
        b.iter(|| evalexpr::eval(black_box(expr)).unwrap())
    });

    group.bench_function("precompiled_evalexpr_arithmetic", |b| {
        b.iter(|| precompiled_evalexpr.eval().unwrap())
    });
}

/// Benchmark complex arithmetic expressions
fn benchmark_complex_arithmetic(c: &mut Criterion) {
    let mut group = c.benchmark_group("Complex arithmetic Expression Evaluation");

    let evaluator = Evaluator::new();
    let expr = "(10 + 20) * 3 / (4 - 1) + 5";

    let mut variables = Variables::new();
    let mut parsed = evaluator.parse_expression(expr, &mut variables).unwrap();
    let precompiled_evalexpr = build_operator_tree::<DefaultNumericTypes>(expr).unwrap();

    group.bench_function("fixcalc_complex_arithmetic", |b| {
        b.iter(|| evaluator.evaluate_expression(black_box(expr)).unwrap())
    });

    group.bench_function("preparsed_complex_arithmetic", |b| {
        b.iter(|| black_box(parsed.eval(&mut variables)))
    });

    group.bench_function("native_rust_complex_arithmetic", |b| {
        b.iter(|| black_box((10.0 + 20.0) * 3.0 / (4.0 - 1.0) + 5.0))
    });

    group.bench_function("meval_complex_arithmetic", |b| {
        b.iter(|| meval::eval_str(black_box(expr)).unwrap())
    });

    group.bench_function("evalexpr_complex_arithmetic", |b| {
        b.iter(|| evalexpr::eval(black_box(expr)).unwrap())
    });

    group.bench_function("precompiled_evalexpr_complex_arithmetic", |b| {
        b.iter(|| precompiled_evalexpr.eval().unwrap())
    });
}

/// Benchmark logical expressions
fn benchmark_logic_expressions(c: &mut Criterion) {
    let mut group = c.benchmark_group("Logic Expression Evaluation");

    let evaluator = Evaluator::new();
    let expr = "1 > 2 && 3 < 4 || 5 == 5";

    let mut variables = Variables::new();
    let mut parsed = evaluator.parse_expression(expr, &mut variables).unwrap();
    let precompiled_evalexpr = build_operator_tree::<DefaultNumericTypes>(expr).unwrap();

    group.bench_function("fixcalc_logic_expression", |b| {
        b.iter(|| evaluator.evaluate_expression(black_box(expr)).unwrap())
    });

    group.bench_function("preparsed_logic_expression", |b| {
        b.iter(|| black_box(parsed.eval(&mut variables)))
    });

    group.bench_function("evalexpr_logic_expression", |b| {
        b.iter(|| evalexpr::eval(black_box(expr)).unwrap())
    });

    group.bench_function("precompiled_evalexpr_logic_expression", |b| {
        b.iter(|| precompiled_evalexpr.eval().unwrap())
    });
}

/// Benchmark built-in function calls
fn benchmark_function_calls(c: &mut Criterion) {
    let mut group = c.benchmark_group("Function Call Evaluation");

    let evaluator = Evaluator::new();
    let expr = "sqrt(2)";

    let mut variables = Variables::new();
    let mut parsed = evaluator.parse_expression(expr, &mut variables).unwrap();

    group.bench_function("fixcalc_function_call", |b| {
        b.iter(|| evaluator.evaluate_expression(black_box(expr)).unwrap())
    });

    group.bench_function("preparsed_function_call", |b| {
        b.iter(|| black_box(parsed.eval(&mut variables)))
    });

    group.bench_function("native_rust_function_call", |b| {
        b.iter(|| black_box(2.0f64).sqrt())
    });

    group.bench_function("meval_function_call", |b| {
        b.iter(|| meval::eval_str(black_box(expr)).unwrap())
    });
}

/// Benchmark the summation loop
fn benchmark_sum(c: &mut Criterion) {
    let mut group = c.benchmark_group("Summation Evaluation");

    let evaluator = Evaluator::new();
    let expr = "sum(i * i, i, 1, 1000)";

    let mut variables = Variables::new();
    let mut parsed = evaluator.parse_expression(expr, &mut variables).unwrap();

    group.bench_function("preparsed_sum", |b| {
        b.iter(|| black_box(parsed.eval(&mut variables)))
    });

    group.bench_function("native_rust_sum", |b| {
        b.iter(|| black_box((1..=1000i64).map(|i| i * i).sum::<i64>()))
    });
}

/// Grouping benchmarks
criterion_group!(
    benches,
    benchmark_simple_arithmetic,
    benchmark_complex_arithmetic,
    benchmark_logic_expressions,
    benchmark_function_calls,
    benchmark_sum,
);
criterion_main!(benches);
