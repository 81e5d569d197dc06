//! Balance testing utilities.
//!
//! Runs many seeded battles between fixed compositions to measure win
//! rates, losses and debris, so table changes can be checked against
//! expectations.

use galaxy_core::combat::{simulate_battle, BattleInput, BattleParties, BattleWinner};
use galaxy_core::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// One side-by-side matchup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matchup {
    /// Attacking ships.
    pub attacker: Fleet,
    /// Defending ships.
    pub defender_fleet: Fleet,
    /// Defending structures.
    pub defender_defense: Defense,
}

/// Statistics for a set of battles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleStats {
    /// Total battles run.
    pub total_battles: u32,
    /// Attacker wins.
    pub attacker_wins: u32,
    /// Defender wins.
    pub defender_wins: u32,
    /// Draws (round limit or mutual destruction).
    pub draws: u32,
    /// Average rounds fought.
    pub avg_rounds: f64,
    /// Average share of the attacker's fleet value lost.
    pub avg_attacker_loss_ratio: f64,
    /// Average share of the defender's force value lost.
    pub avg_defender_loss_ratio: f64,
    /// Average metal plus crystal left in orbit.
    pub avg_debris: f64,
}

impl BattleStats {
    /// Attacker win rate (0.0 to 1.0).
    pub fn attacker_win_rate(&self) -> f64 {
        if self.total_battles == 0 {
            return 0.5;
        }
        f64::from(self.attacker_wins) / f64::from(self.total_battles)
    }

    /// Defender win rate (0.0 to 1.0).
    pub fn defender_win_rate(&self) -> f64 {
        if self.total_battles == 0 {
            return 0.5;
        }
        f64::from(self.defender_wins) / f64::from(self.total_battles)
    }

    /// Check if the matchup is balanced (attacker rate within range).
    pub fn is_balanced(&self, min_rate: f64, max_rate: f64) -> bool {
        let rate = self.attacker_win_rate();
        rate >= min_rate && rate <= max_rate
    }
}

/// Metal plus crystal plus deuterium cost of a fleet.
pub fn fleet_value(fleet: &Fleet, config: &GameConfig) -> f64 {
    fleet
        .iter()
        .map(|(kind, n)| config.ship(kind).cost.total_materials() * f64::from(n))
        .sum()
}

/// Metal plus crystal plus deuterium cost of a defense.
pub fn defense_value(defense: &Defense, config: &GameConfig) -> f64 {
    defense
        .iter()
        .map(|(kind, n)| config.defense(kind).cost.total_materials() * f64::from(n))
        .sum()
}

fn ratio(lost: f64, total: f64) -> f64 {
    if total > 0.0 {
        lost / total
    } else {
        0.0
    }
}

/// Fight `runs` battles, seeding battle `i` with `seed + i`.
pub fn run_battles(matchup: &Matchup, config: &GameConfig, seed: u64, runs: u32) -> BattleStats {
    let no_bonuses = Bonuses::default();
    let no_stock = Resources::ZERO;
    let input = BattleInput {
        attacker_fleet: &matchup.attacker,
        defender_fleet: &matchup.defender_fleet,
        defender_defense: &matchup.defender_defense,
        defender_resources: &no_stock,
        attacker_bonuses: &no_bonuses,
        defender_bonuses: &no_bonuses,
    };
    let attacker_value = fleet_value(&matchup.attacker, config);
    let defender_value = fleet_value(&matchup.defender_fleet, config)
        + defense_value(&matchup.defender_defense, config);

    let mut stats = BattleStats::default();
    let (mut rounds, mut a_loss, mut d_loss, mut debris) = (0.0, 0.0, 0.0, 0.0);

    for i in 0..runs {
        let mut rng = SmallRng::seed_from_u64(seed.wrapping_add(u64::from(i)));
        let parties = BattleParties {
            id: ReportId(u64::from(i) + 1),
            timestamp: 0,
            attacker_id: PlayerId(1),
            defender_id: Some(PlayerId(2)),
            attacker_planet_id: PlanetId(1),
            defender_planet_id: PlanetId(2),
        };
        let result = simulate_battle(parties, &input, config, &mut rng);

        stats.total_battles += 1;
        match result.winner {
            BattleWinner::Attacker => stats.attacker_wins += 1,
            BattleWinner::Defender => stats.defender_wins += 1,
            BattleWinner::Draw => stats.draws += 1,
        }
        rounds += f64::from(result.rounds);
        a_loss += ratio(fleet_value(&result.attacker_losses, config), attacker_value);
        d_loss += ratio(
            fleet_value(&result.defender_losses.fleet, config)
                + defense_value(&result.defender_losses.defense, config),
            defender_value,
        );
        debris += result.debris_field.metal + result.debris_field.crystal;
    }

    if runs > 0 {
        let n = f64::from(runs);
        stats.avg_rounds = rounds / n;
        stats.avg_attacker_loss_ratio = a_loss / n;
        stats.avg_defender_loss_ratio = d_loss / n;
        stats.avg_debris = debris / n;
    }
    stats
}
