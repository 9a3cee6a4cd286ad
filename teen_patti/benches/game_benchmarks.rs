use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::{SeedableRng, rngs::StdRng};
use std::hint::black_box;
use teen_patti::game::{Card, Deck, Suit, deal, rank_hand};

/// Benchmark shuffling a fresh 52-card deck
fn bench_shuffle(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);

    c.bench_function("deck_shuffle", |b| {
        b.iter(|| {
            let mut deck = Deck::default();
            deck.shuffle_with(&mut rng);
            black_box(deck)
        });
    });
}

/// Benchmark dealing to rooms of different sizes
fn bench_deal(c: &mut Criterion) {
    let mut group = c.benchmark_group("deal");
    let mut rng = StdRng::seed_from_u64(11);

    for seats in [2usize, 5, 7] {
        group.bench_with_input(BenchmarkId::from_parameter(seats), &seats, |b, &seats| {
            b.iter(|| deal(black_box((0..seats).collect::<Vec<_>>()), &mut rng));
        });
    }

    group.finish();
}

/// Benchmark ranking one hand from each category
fn bench_rank_hand(c: &mut Criterion) {
    let hands = [
        ("trail", [Card(9, Suit::Spade), Card(9, Suit::Heart), Card(9, Suit::Club)]),
        (
            "pure_sequence",
            [Card(12, Suit::Heart), Card(13, Suit::Heart), Card(14, Suit::Heart)],
        ),
        ("sequence", [Card(4, Suit::Club), Card(5, Suit::Heart), Card(6, Suit::Spade)]),
        ("color", [Card(2, Suit::Diamond), Card(8, Suit::Diamond), Card(11, Suit::Diamond)]),
        ("pair", [Card(7, Suit::Club), Card(7, Suit::Diamond), Card(13, Suit::Spade)]),
        ("high_card", [Card(4, Suit::Club), Card(7, Suit::Diamond), Card(13, Suit::Heart)]),
    ];

    let mut group = c.benchmark_group("rank_hand");
    for (name, hand) in &hands {
        group.bench_with_input(BenchmarkId::from_parameter(name), hand, |b, hand| {
            b.iter(|| rank_hand(black_box(hand)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_shuffle, bench_deal, bench_rank_hand);
criterion_main!(benches);
