use analysis::rounds::{self, RoundBoundaries};
use analysis::session::PlayerRecord;
use analysis::teams::{self, TeamPolicy};

fn main() {
    divan::main();
}

fn noisy_starts(rounds: u32) -> Vec<u32> {
    (0..rounds)
        .flat_map(|r| {
            let start = r * 8000;
            [start, start + 3, start + 40, start + 200]
        })
        .collect()
}

#[divan::bench(args = [24, 30, 48])]
fn dedup_starts(bencher: divan::Bencher, rounds: u32) {
    let ticks = noisy_starts(rounds);

    bencher.bench(|| rounds::dedup_round_starts(divan::black_box(&ticks), rounds::ROUND_START_MIN_GAP));
}

#[divan::bench(args = [1_000, 64_000, 256_000])]
fn filter_round_ticks(bencher: divan::Bencher, length: u32) {
    let boundaries = RoundBoundaries::new(vec![Some(100)], vec![Some(100 + length)]);

    bencher.bench(|| {
        let round = boundaries.pair(0).unwrap();
        divan::black_box(round.ticks()).filter(|t| t % 64 == 0).count()
    });
}

#[divan::bench(args = [10, 12, 64])]
fn resolve_teams(bencher: divan::Bencher, players: u64) {
    let roster: Vec<_> = (0..players)
        .map(|i| PlayerRecord {
            steamid: 76561198000000000 + i,
            name: format!("Player {}", i),
            team_code: 2 + (i % 2) as i32,
        })
        .collect();
    let policy = TeamPolicy::default();

    bencher.bench(|| teams::resolve(divan::black_box(&roster), &policy));
}
