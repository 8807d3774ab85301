//! Benchmark harness for the OFC hand evaluator
//!
//! Measures 5-card and 3-card categorization throughput, with and without
//! jokers in the sample population.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pineapple_engine::card::Card;
use pineapple_engine::hand::{evaluate_five, evaluate_three};

/// Simple LCG for deterministic random number generation
struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Lcg { state: seed }
    }

    fn next(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state >> 33
    }

    fn next_card(&mut self, universe: u8) -> Card {
        loop {
            if let Some(card) = Card::from_value((self.next() % universe as u64) as u8) {
                return card;
            }
        }
    }
}

/// Generate unique-card hands of the given size
fn generate_hands(count: usize, size: usize, universe: u8, seed: u64) -> Vec<Vec<Card>> {
    let mut lcg = Lcg::new(seed);
    let mut hands = Vec::with_capacity(count);
    for _ in 0..count {
        let mut hand: Vec<Card> = Vec::with_capacity(size);
        while hand.len() < size {
            let card = lcg.next_card(universe);
            if !hand.contains(&card) {
                hand.push(card);
            }
        }
        hands.push(hand);
    }
    hands
}

fn benchmark_five_card(c: &mut Criterion) {
    let hands = generate_hands(100_000, 5, 52, 12345);

    c.bench_function("evaluate_five_standard", |b| {
        b.iter(|| {
            let mut acc = 0usize;
            for hand in black_box(&hands) {
                let rank = evaluate_five(hand).unwrap();
                acc += rank.primary as usize;
            }
            black_box(acc)
        })
    });
}

fn benchmark_five_card_with_jokers(c: &mut Criterion) {
    // Universe of 54 values mixes both joker sentinels into the sample
    let hands = generate_hands(100_000, 5, 54, 54321);

    c.bench_function("evaluate_five_jokers", |b| {
        b.iter(|| {
            let mut acc = 0usize;
            for hand in black_box(&hands) {
                let rank = evaluate_five(hand).unwrap();
                acc += rank.category as usize;
            }
            black_box(acc)
        })
    });
}

fn benchmark_three_card(c: &mut Criterion) {
    let hands = generate_hands(100_000, 3, 52, 777);

    c.bench_function("evaluate_three_standard", |b| {
        b.iter(|| {
            let mut acc = 0usize;
            for hand in black_box(&hands) {
                let rank = evaluate_three(hand).unwrap();
                acc += rank.primary as usize;
            }
            black_box(acc)
        })
    });
}

criterion_group!(
    benches,
    benchmark_five_card,
    benchmark_five_card_with_jokers,
    benchmark_three_card
);
criterion_main!(benches);
