use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use tournament_bracket::bracket::{Match, cascade_byes, generate, round_count, score_match};
use uuid::Uuid;

fn roster(n: usize) -> Vec<Uuid> {
    (0..n).map(|_| Uuid::new_v4()).collect()
}

/// Generated bracket with round-1 byes already propagated
fn setup_bracket(n: usize) -> Vec<Match> {
    let mut matches = generate(Uuid::new_v4(), &roster(n)).expect("valid roster");
    cascade_byes(&mut matches);
    matches
}

/// Score every match round by round, player 1 always winning
fn play_through(mut matches: Vec<Match>, rounds: u32) -> Vec<Match> {
    for round in 1..=rounds {
        let ready: Vec<Uuid> = matches
            .iter()
            .filter(|m| m.round == round && m.is_ready())
            .map(|m| m.id)
            .collect();
        for id in ready {
            score_match(&mut matches, id, 1, 0).expect("ready match scores");
        }
    }
    matches
}

/// Benchmark bracket generation for various roster sizes
fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");

    for n_players in [8usize, 33, 128, 1000] {
        let players = roster(n_players);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_players", n_players)),
            &players,
            |b, players| {
                b.iter(|| generate(black_box(Uuid::nil()), black_box(players)));
            },
        );
    }

    group.finish();
}

/// Benchmark playing a whole bracket from round 1 to the final
fn bench_play_through(c: &mut Criterion) {
    let mut group = c.benchmark_group("play_through");

    for n_players in [8usize, 33, 128] {
        let rounds = round_count(n_players);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_players", n_players)),
            &n_players,
            |b, &n| {
                b.iter_batched(
                    || setup_bracket(n),
                    |matches| play_through(matches, rounds),
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

criterion_group!(bracket_operations, bench_generate, bench_play_through);

criterion_main!(bracket_operations);
