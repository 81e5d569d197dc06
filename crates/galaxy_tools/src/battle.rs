//! Seeded battle batches from the command line.

use galaxy_core::data::GameConfig;
use galaxy_core::units::{CountMap, Kind};
use galaxy_test_utils::balance::{run_battles, BattleStats, Matchup};
use serde::Serialize;

use crate::{Result, ToolError};

/// Parse `"light_fighter=10,cruiser=2"` into a count map.
///
/// An empty string is an empty map. Repeated kinds add up.
///
/// # Errors
///
/// Returns an error for unknown kinds or malformed counts.
pub fn parse_counts<K: Kind>(list: &str) -> Result<CountMap<K>> {
    let mut counts = CountMap::new();
    for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (name, count) = entry
            .split_once('=')
            .ok_or_else(|| ToolError::Argument(format!("expected name=count, got {entry:?}")))?;
        let kind = K::from_name(name.trim())
            .ok_or_else(|| ToolError::Argument(format!("unknown unit {:?}", name.trim())))?;
        let count: u32 = count
            .trim()
            .parse()
            .map_err(|e| ToolError::Argument(format!("bad count in {entry:?}: {e}")))?;
        counts.add(kind, count);
    }
    Ok(counts)
}

/// Outcome of a batch, as printed by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Forces involved.
    pub matchup: Matchup,
    /// First seed.
    pub seed: u64,
    /// Aggregate statistics.
    pub stats: BattleStats,
}

/// Run `runs` battles of `matchup` starting at `seed`.
///
/// # Errors
///
/// Returns an error if the attacker fleet is empty.
pub fn run_batch(matchup: Matchup, config: &GameConfig, seed: u64, runs: u32) -> Result<BatchReport> {
    if matchup.attacker.is_empty() {
        return Err(ToolError::Argument("attacker fleet is empty".into()));
    }
    let stats = run_battles(&matchup, config, seed, runs);
    tracing::info!(
        runs,
        attacker_wins = stats.attacker_wins,
        defender_wins = stats.defender_wins,
        draws = stats.draws,
        "Batch finished"
    );
    Ok(BatchReport {
        matchup,
        seed,
        stats,
    })
}

impl BatchReport {
    /// Human-readable summary.
    #[must_use]
    pub fn to_text(&self) -> String {
        let s = &self.stats;
        format!(
            "battles: {}\n\
             attacker wins: {} ({:.1}%)\n\
             defender wins: {} ({:.1}%)\n\
             draws: {}\n\
             avg rounds: {:.2}\n\
             avg attacker loss: {:.1}%\n\
             avg defender loss: {:.1}%\n\
             avg debris: {:.0}",
            s.total_battles,
            s.attacker_wins,
            s.attacker_win_rate() * 100.0,
            s.defender_wins,
            s.defender_win_rate() * 100.0,
            s.draws,
            s.avg_rounds,
            s.avg_attacker_loss_ratio * 100.0,
            s.avg_defender_loss_ratio * 100.0,
            s.avg_debris,
        )
    }

    /// JSON encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use galaxy_core::units::{DefenseType, Fleet, ShipType};

    #[test]
    fn test_parse_counts() {
        let fleet: Fleet = parse_counts("light_fighter=10, cruiser=2,light_fighter=1").unwrap();
        assert_eq!(fleet.get(ShipType::LightFighter), 11);
        assert_eq!(fleet.get(ShipType::Cruiser), 2);
        assert!(parse_counts::<ShipType>("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_counts_rejects_garbage() {
        assert!(parse_counts::<ShipType>("death_star=1").is_err());
        assert!(parse_counts::<ShipType>("light_fighter").is_err());
        assert!(parse_counts::<DefenseType>("rocket_launcher=-3").is_err());
    }

    #[test]
    fn test_batch_json_has_stats() {
        let matchup = Matchup {
            attacker: parse_counts("light_fighter=5").unwrap(),
            ..Matchup::default()
        };
        let report = run_batch(matchup, &GameConfig::default(), 1, 3).unwrap();
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["stats"]["attacker_wins"], 3);
        assert!(report.to_text().contains("attacker wins: 3"));
    }

    #[test]
    fn test_empty_attacker_rejected() {
        let err = run_batch(Matchup::default(), &GameConfig::default(), 1, 1).unwrap_err();
        assert!(matches!(err, ToolError::Argument(_)));
    }
}
