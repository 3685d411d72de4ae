//! Benchmarks for deref, unification and alternative search.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nexus::syntax::TermReader;
use nexus::unify::{unify_alternatives, Environment, Unifier, UnifyConfig};
use nexus::{SymbolId, SymbolTable};

/// Two lists of length n: one of fresh variables, one of integers.
fn setup_lists(n: usize) -> (SymbolTable, SymbolId, SymbolId) {
    let mut table = SymbolTable::new();
    let vars: Vec<_> = (0..n).map(|i| table.new_variable(&format!("V{}", i))).collect();
    let consts: Vec<_> = (0..n)
        .map(|i| table.new_constant(&i.to_string(), i as i64))
        .collect();
    let open = table.new_list_from(&vars, SymbolId::NULL);
    let ground = table.new_list_from(&consts, SymbolId::NULL);
    (table, open, ground)
}

/// A chain X0 -> X1 -> ... -> Xn -> 42 in one environment.
fn setup_chain(n: usize) -> (SymbolTable, Environment, SymbolId) {
    let mut table = SymbolTable::new();
    let vars: Vec<_> = (0..=n).map(|i| table.new_variable(&format!("X{}", i))).collect();
    let answer = table.new_constant("42", 42);
    let mut env = Environment::new();
    for pair in vars.windows(2) {
        env.add_binding(pair[0], pair[1]);
    }
    env.add_binding(vars[n], answer);
    (table, env, vars[0])
}

fn bench_unify_lists(c: &mut Criterion) {
    let mut group = c.benchmark_group("unify_lists");

    for size in [10, 100, 1_000, 10_000].iter() {
        let (table, open, ground) = setup_lists(*size);
        let unifier = Unifier::with_defaults(&table);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |bench, _| {
            bench.iter(|| {
                let mut env = Environment::new();
                black_box(unifier.unify(open, ground, &mut env))
            });
        });
    }

    group.finish();
}

fn bench_deref_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("deref_chain");

    for length in [1, 10, 100, 1_000].iter() {
        let (table, env, start) = setup_chain(*length);
        let unifier = Unifier::with_defaults(&table);
        group.bench_with_input(BenchmarkId::new("length", length), length, |bench, _| {
            bench.iter(|| black_box(unifier.deref(start, &env)));
        });
    }

    group.finish();
}

fn bench_occurs_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("occurs_check");
    let (table, open, ground) = setup_lists(1_000);

    for on in [false, true] {
        let unifier = Unifier::new(&table, UnifyConfig::default().with_occurs_check(on));
        group.bench_function(if on { "on" } else { "off" }, |bench| {
            bench.iter(|| {
                let mut env = Environment::new();
                black_box(unifier.unify(open, ground, &mut env))
            });
        });
    }

    group.finish();
}

fn bench_alternatives(c: &mut Criterion) {
    let mut group = c.benchmark_group("unify_alternatives");

    for count in [100, 1_000, 10_000].iter() {
        let mut table = SymbolTable::new();
        let mut reader = TermReader::new(&mut table);
        let goal = reader.read_term("edge(n0, X, W)").unwrap();
        let facts: Vec<SymbolId> = (0..*count)
            .map(|i| {
                reader
                    .read_term(&format!("edge(n{}, n{}, {})", i % 10, i + 1, i))
                    .unwrap()
            })
            .collect();
        let env = Environment::new();
        let config = UnifyConfig::default();

        group.bench_with_input(BenchmarkId::from_parameter(count), count, |bench, _| {
            bench.iter(|| black_box(unify_alternatives(&table, goal, &facts, &env, &config)).len());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_unify_lists,
    bench_deref_chain,
    bench_occurs_check,
    bench_alternatives
);
criterion_main!(benches);
