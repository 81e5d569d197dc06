//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the universe produces identical
//! results given identical requests and identically seeded generators.
//!
//! # Testing Strategy
//!
//! Sources of non-determinism include:
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   The core only iterates ordered maps.
//!
//! - **Unseeded randomness**: Combat and moon rolls draw from a generator
//!   the caller passes in. Every harness here seeds a `SmallRng`.
//!
//! - **Clock-derived ids**: Ids come from the universe's own counters.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual operations (battle, integration, queue)
//! 2. **Property tests**: Random inputs must still produce deterministic outputs
//! 3. **Scenario tests**: Scripted universes are reproducible
//! 4. **Parallel tests**: Running N universes in parallel all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use galaxy_core::simulation::Universe;
use rand::rngs::SmallRng;
use rand::SeedableRng;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps per run.
    pub steps: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic run).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs were deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Universe is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a process multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `steps` - Number of steps per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one step
/// * `hash` - Function to compute the state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, u64),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();
        for n in 0..steps {
            step(&mut state, n);
        }
        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// A universe paired with the generator that drives its random rolls.
#[derive(Debug, Clone)]
pub struct SeededUniverse {
    /// The universe.
    pub universe: Universe,
    /// Its random source.
    pub rng: SmallRng,
}

impl SeededUniverse {
    /// Pair `universe` with a generator seeded from `seed`.
    #[must_use]
    pub fn new(universe: Universe, seed: u64) -> Self {
        Self {
            universe,
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

/// Run a scripted universe twice and compare final hashes.
///
/// `script` is called once per step with the step number.
pub fn verify_universe_determinism<Setup, Script>(
    setup: Setup,
    script: Script,
    steps: u64,
    seed: u64,
) -> DeterminismResult
where
    Setup: Fn() -> Universe,
    Script: Fn(&mut SeededUniverse, u64),
{
    verify_determinism(
        2,
        steps,
        || SeededUniverse::new(setup(), seed),
        &script,
        |s| s.universe.state_hash(),
    )
}

/// Result of parallel universe runs.
#[derive(Debug, Clone)]
pub struct ParallelRunResult {
    /// Final state hash from each run.
    pub hashes: Vec<u64>,
    /// Number of steps each run took.
    pub steps: u64,
    /// Number of runs.
    pub runs: usize,
}

impl ParallelRunResult {
    /// Check if all runs produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all runs matched.
    ///
    /// # Panics
    ///
    /// Panics if runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel universes diverged!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.runs,
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run N scripted universes on scoped threads and collect final hashes.
///
/// Catches non-determinism that only shows up under thread scheduling or
/// memory layout differences.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_universes<Setup, Script>(
    setup: Setup,
    script: Script,
    runs: usize,
    steps: u64,
    seed: u64,
) -> ParallelRunResult
where
    Setup: Fn() -> Universe + Sync,
    Script: Fn(&mut SeededUniverse, u64) + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..runs)
            .map(|_| {
                s.spawn(|| {
                    let mut state = SeededUniverse::new(setup(), seed);
                    for n in 0..steps {
                        script(&mut state, n);
                    }
                    state.universe.state_hash()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    ParallelRunResult {
        hashes,
        steps,
        runs,
    }
}

/// Step two copies side by side and report the first step after which
/// their hashes differ.
///
/// # Returns
///
/// `None` if the copies never diverge, `Some(step)` otherwise. Step `0`
/// means the setups already differed.
pub fn find_first_divergence<Setup, Script>(
    setup: Setup,
    script: Script,
    steps: u64,
    seed: u64,
) -> Option<u64>
where
    Setup: Fn() -> Universe,
    Script: Fn(&mut SeededUniverse, u64),
{
    let mut a = SeededUniverse::new(setup(), seed);
    let mut b = SeededUniverse::new(setup(), seed);

    if a.universe.state_hash() != b.universe.state_hash() {
        return Some(0);
    }

    for n in 0..steps {
        script(&mut a, n);
        script(&mut b, n);
        if a.universe.state_hash() != b.universe.state_hash() {
            return Some(n + 1);
        }
    }

    None
}

/// Verify that a snapshot round-trip preserves the state hash exactly.
pub fn verify_snapshot_determinism(universe: &Universe) -> bool {
    let Ok(bytes) = universe.snapshot() else {
        return false;
    };
    match Universe::from_snapshot(&bytes) {
        Ok(restored) => restored.state_hash() == universe.state_hash(),
        Err(_) => false,
    }
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{defense, duel, fleet};
    use galaxy_core::prelude::*;

    const MINUTE: Timestamp = 60_000;

    fn duel_universe() -> Universe {
        duel(
            fleet(&[(ShipType::LightFighter, 40), (ShipType::HeavyFighter, 10)]),
            fleet(&[(ShipType::LightFighter, 15)]),
            defense(&[(DefenseType::RocketLauncher, 20), (DefenseType::LightLaser, 5)]),
        )
        .universe
    }

    /// Attack on step 0, then step both players a minute at a time.
    ///
    /// Returns what the attacker's step reported.
    fn attack_step(state: &mut SeededUniverse, n: u64) -> MissionReport {
        let now = n * MINUTE;
        let u = &mut state.universe;
        if n == 0 {
            let fleet = u.planet("1:1:1").map(|p| p.fleet.clone()).unwrap_or_default();
            u.dispatch(
                PlayerId(1),
                DispatchRequest {
                    origin_key: "1:1:1".into(),
                    target: Coordinates::new(1, 1, 4),
                    kind: MissionKind::Attack,
                    fleet,
                    cargo: Resources::ZERO,
                },
                now,
            )
            .expect("the duel attacker can launch its whole fleet");
        }
        let report = u.step(PlayerId(1), now, &mut state.rng);
        u.step(PlayerId(2), now, &mut state.rng);
        report
    }

    fn attack_script(state: &mut SeededUniverse, n: u64) {
        attack_step(state, n);
    }

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 10, || 0u64, |s, n| *s += n, |s| *s);
        result.assert_deterministic();
        assert_eq!(result.hashes, vec![45, 45, 45]);
    }

    #[test]
    fn test_empty_universe_determinism() {
        let result = verify_universe_determinism(Universe::default, |_, _| {}, 5, 1);
        result.assert_deterministic();
    }

    #[test]
    fn test_battle_scenario_determinism() {
        let result = verify_universe_determinism(duel_universe, attack_script, 5, 42);
        result.assert_deterministic();
    }

    #[test]
    fn test_battle_scenario_resolves() {
        let mut state = SeededUniverse::new(duel_universe(), 42);
        let battles: usize = (0..5)
            .map(|n| attack_step(&mut state, n).battle_reports.len())
            .sum();
        assert_eq!(battles, 1);
        assert_eq!(state.universe.active_missions(PlayerId(1)), 0);
    }

    #[test]
    fn test_no_divergence() {
        assert_eq!(find_first_divergence(duel_universe, attack_script, 5, 9), None);
    }

    #[test]
    fn test_parallel_universes_match() {
        let result = run_parallel_universes(duel_universe, attack_script, 4, 5, 3);
        result.assert_deterministic();
        assert_eq!(result.hashes.len(), 4);
    }

    #[test]
    fn test_snapshot_round_trip_after_battle() {
        let mut state = SeededUniverse::new(duel_universe(), 5);
        for n in 0..3 {
            attack_script(&mut state, n);
        }
        assert!(verify_snapshot_determinism(&state.universe));
    }

    #[test]
    fn test_compute_hash_is_stable() {
        assert_eq!(compute_hash(&"galaxy"), compute_hash(&"galaxy"));
        assert_ne!(compute_hash(&1u32), compute_hash(&2u32));
    }
}
