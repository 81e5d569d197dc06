//! Battle resolution benchmarks for galaxy_core.
//!
//! Run with: `cargo bench -p galaxy_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use galaxy_core::combat::{simulate_battle, BattleInput, BattleParties};
use galaxy_core::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

fn parties() -> BattleParties {
    BattleParties {
        id: ReportId(1),
        timestamp: 0,
        attacker_id: PlayerId(1),
        defender_id: Some(PlayerId(2)),
        attacker_planet_id: PlanetId(1),
        defender_planet_id: PlanetId(2),
    }
}

/// Battles between mixed forces of growing size.
pub fn battle_benchmark(c: &mut Criterion) {
    let config = GameConfig::default();
    let bonuses = Bonuses::default();
    let stock = Resources::new(50_000.0, 30_000.0, 10_000.0, 0.0);
    let mut group = c.benchmark_group("simulate_battle");

    for scale in [1u32, 10, 100] {
        let attacker = Fleet::from([
            (ShipType::LightFighter, 50 * scale),
            (ShipType::Cruiser, 5 * scale),
            (ShipType::SmallCargo, 10 * scale),
        ]);
        let defender_fleet = Fleet::from([(ShipType::HeavyFighter, 10 * scale)]);
        let defense = Defense::from([
            (DefenseType::RocketLauncher, 40 * scale),
            (DefenseType::GaussCannon, 2 * scale),
        ]);
        let input = BattleInput {
            attacker_fleet: &attacker,
            defender_fleet: &defender_fleet,
            defender_defense: &defense,
            defender_resources: &stock,
            attacker_bonuses: &bonuses,
            defender_bonuses: &bonuses,
        };

        group.bench_with_input(BenchmarkId::from_parameter(scale), &input, |b, input| {
            let mut rng = SmallRng::seed_from_u64(7);
            b.iter(|| black_box(simulate_battle(parties(), input, &config, &mut rng)));
        });
    }
    group.finish();
}

criterion_group!(benches, battle_benchmark);
criterion_main!(benches);
