//! Benchmark harness for search throughput
//!
//! Measures simulations per second on a fixed initial-street position,
//! sequential and parallel, plus the action generator in isolation.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pineapple_engine::GameState;
use pineapple_mcts::{ActionGenerator, MctsConfig, MctsEngine};

fn dealt_state(seed: u64) -> GameState {
    let mut state = GameState::new(2, 0, 0, Some(seed)).unwrap();
    state.deal_street().unwrap();
    state
}

fn benchmark_sequential_search(c: &mut Criterion) {
    let state = dealt_state(12345);
    let engine = MctsEngine::new(MctsConfig {
        num_simulations: Some(500),
        num_threads: 1,
        ..MctsConfig::default()
    });

    c.bench_function("mcts_500_simulations_sequential", |b| {
        b.iter(|| {
            let report = engine.search(black_box(&state)).unwrap();
            black_box(report.simulations)
        })
    });
}

fn benchmark_parallel_search(c: &mut Criterion) {
    let state = dealt_state(12345);
    let engine = MctsEngine::new(MctsConfig {
        num_simulations: Some(500),
        num_threads: 4,
        ..MctsConfig::default()
    });

    c.bench_function("mcts_500_simulations_4_threads", |b| {
        b.iter(|| {
            let report = engine.search(black_box(&state)).unwrap();
            black_box(report.simulations)
        })
    });
}

fn benchmark_action_generation(c: &mut Criterion) {
    let state = dealt_state(777);
    let generator = ActionGenerator::new();

    c.bench_function("generate_initial_candidates", |b| {
        b.iter(|| {
            let actions = generator.generate(black_box(&state));
            black_box(actions.len())
        })
    });
}

criterion_group!(
    benches,
    benchmark_sequential_search,
    benchmark_parallel_search,
    benchmark_action_generation
);
criterion_main!(benches);
