//! Core Simulation Components and Resources
//!
//! This module contains the ECS building blocks shared by the whole engine:
//! - `Combatant`: health, injuries, skills, faction and combat accounting
//! - `GameRng`: seeded random number generator resource
//! - `TickCount`: the single global tick counter
//!
//! Weapons, abilities and status effects live in their own modules.

use bevy::prelude::*;
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Seeded random number generator for deterministic simulation runs.
///
/// When a seed is provided (e.g. via a headless scenario), the same seed
/// always produces the same outcome. Without a seed, uses system entropy.
#[derive(Resource)]
pub struct GameRng {
    rng: StdRng,
    /// The seed used to initialize this RNG (if deterministic)
    pub seed: Option<u64>,
}

impl GameRng {
    /// Create a new GameRng with a specific seed for deterministic behavior
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    /// Create a new GameRng with random entropy (non-deterministic)
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            seed: None,
        }
    }

    /// Generate a random f32 in the range [0.0, 1.0)
    pub fn random_f32(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Generate a random f32 in the given range
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        min + self.random_f32() * (max - min)
    }

    /// Generate a random integer in the inclusive range [min, max]
    pub fn range_inclusive(&mut self, min: i32, max: i32) -> i32 {
        debug_assert!(min <= max, "range_inclusive: min {} > max {}", min, max);
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    /// Roll against a probability in [0.0, 1.0]
    pub fn chance(&mut self, probability: f32) -> bool {
        self.random_f32() < probability
    }

    /// Weighted discrete choice: picks an index with probability
    /// proportional to its weight. Weights must be non-negative and not
    /// all zero; falls back to index 0 otherwise.
    pub fn weighted_choice(&mut self, weights: &[f32]) -> usize {
        let total: f32 = weights.iter().filter(|w| **w > 0.0).sum();
        if total <= 0.0 || weights.is_empty() {
            return 0;
        }
        let mut roll = self.random_f32() * total;
        for (i, w) in weights.iter().enumerate() {
            if *w <= 0.0 {
                continue;
            }
            if roll < *w {
                return i;
            }
            roll -= *w;
        }
        weights.len() - 1
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

/// The single global tick counter. Advanced exactly once per simulation
/// step, before any other system runs.
#[derive(Resource, Default, Clone, Copy, Debug)]
pub struct TickCount(pub u64);

/// One wound on a combatant. Current health is derived from the injury
/// list, so healing an injury and taking damage share one representation.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Injury {
    /// How much health this wound subtracts.
    pub severity: f32,
    /// Permanent injuries are skipped by normal regeneration.
    pub permanent: bool,
}

/// Core combatant component containing health, skills and accounting.
#[derive(Component, Clone, Debug)]
pub struct Combatant {
    /// Display name for logging ("Raider A", "Colonist Jun")
    pub name: String,
    /// Faction identifier; two combatants are hostile iff their factions differ
    pub faction: u8,
    /// Maximum health points
    pub max_health: f32,
    /// Open wounds; current health = max_health - total severity
    pub injuries: Vec<Injury>,
    /// Health fraction at or below which the combatant counts as downed
    pub downed_fraction: f32,
    /// Flat damage mitigation fraction in [0, 1), reduced by armor penetration
    pub armor: f32,
    /// Melee proficiency, 0..=20; scales dash range and blade barrages
    pub melee_skill: u8,
    /// Shooting proficiency, 0..=20; scales volley density and skill damage
    pub shooting_skill: u8,
    /// Set once by the death bookkeeping system so later systems in the
    /// same tick do not double-process a kill
    pub is_dead: bool,
    /// Total damage this combatant has dealt
    pub damage_dealt: f32,
    /// Total damage this combatant has taken
    pub damage_taken: f32,
}

impl Combatant {
    pub fn new(name: impl Into<String>, faction: u8, max_health: f32) -> Self {
        Self {
            name: name.into(),
            faction,
            max_health,
            injuries: Vec::new(),
            downed_fraction: 0.2,
            armor: 0.0,
            melee_skill: 0,
            shooting_skill: 0,
            is_dead: false,
            damage_dealt: 0.0,
            damage_taken: 0.0,
        }
    }

    pub fn with_skills(mut self, melee: u8, shooting: u8) -> Self {
        self.melee_skill = melee;
        self.shooting_skill = shooting;
        self
    }

    pub fn with_armor(mut self, armor: f32) -> Self {
        self.armor = armor.clamp(0.0, 0.95);
        self
    }

    pub fn current_health(&self) -> f32 {
        let wounds: f32 = self.injuries.iter().map(|i| i.severity).sum();
        (self.max_health - wounds).max(0.0)
    }

    pub fn is_alive(&self) -> bool {
        !self.is_dead && self.current_health() > 0.0
    }

    pub fn is_downed(&self) -> bool {
        self.is_alive() && self.current_health() <= self.max_health * self.downed_fraction
    }

    /// The per-tick caster validity check: dead, downed or despawned
    /// casters cancel their ability on the next tick boundary.
    pub fn is_dead_or_downed(&self) -> bool {
        !self.is_alive() || self.is_downed()
    }

    /// Record a wound. Returns the health actually lost (damage beyond
    /// remaining health is not counted toward statistics).
    pub fn take_injury(&mut self, severity: f32, permanent: bool) -> f32 {
        debug_assert!(severity >= 0.0, "negative injury severity {}", severity);
        if severity <= 0.0 {
            return 0.0;
        }
        let before = self.current_health();
        self.injuries.push(Injury {
            severity,
            permanent,
        });
        let actual = before - self.current_health();
        self.damage_taken += actual;
        actual
    }

    /// Heal the most severe eligible injuries, capped at `max_injuries`
    /// wounds per call so periodic regeneration cannot instantly erase a
    /// long fight. Returns the total severity healed.
    pub fn heal_most_severe(
        &mut self,
        amount: f32,
        max_injuries: usize,
        include_permanent: bool,
    ) -> f32 {
        if amount <= 0.0 || max_injuries == 0 {
            return 0.0;
        }

        // Indices of eligible injuries, most severe first.
        let mut order: Vec<usize> = (0..self.injuries.len())
            .filter(|&i| include_permanent || !self.injuries[i].permanent)
            .collect();
        order.sort_by(|&a, &b| {
            self.injuries[b]
                .severity
                .partial_cmp(&self.injuries[a].severity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut healed = 0.0;
        for &i in order.iter().take(max_injuries) {
            let injury = &mut self.injuries[i];
            let delta = injury.severity.min(amount);
            injury.severity -= delta;
            healed += delta;
        }
        self.injuries.retain(|i| i.severity > 0.0);
        healed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let seed = 42;
        let mut rng1 = GameRng::from_seed(seed);
        let mut rng2 = GameRng::from_seed(seed);

        for _ in 0..100 {
            assert_eq!(rng1.random_f32(), rng2.random_f32());
        }
    }

    #[test]
    fn test_range_inclusive_bounds() {
        let mut rng = GameRng::from_seed(7);
        for _ in 0..200 {
            let v = rng.range_inclusive(30, 60);
            assert!((30..=60).contains(&v), "value {} out of range", v);
        }
    }

    #[test]
    fn test_weighted_choice_respects_zero_weights() {
        let mut rng = GameRng::from_seed(9);
        for _ in 0..100 {
            let idx = rng.weighted_choice(&[0.0, 1.0, 0.0]);
            assert_eq!(idx, 1);
        }
    }

    #[test]
    fn test_weighted_choice_empty_falls_back() {
        let mut rng = GameRng::from_seed(9);
        assert_eq!(rng.weighted_choice(&[]), 0);
        assert_eq!(rng.weighted_choice(&[0.0, 0.0]), 0);
    }

    #[test]
    fn test_current_health_derived_from_injuries() {
        let mut c = Combatant::new("Test", 1, 100.0);
        assert_eq!(c.current_health(), 100.0);
        c.take_injury(30.0, false);
        assert_eq!(c.current_health(), 70.0);
        c.take_injury(80.0, false);
        assert_eq!(c.current_health(), 0.0);
        assert!(!c.is_alive());
    }

    #[test]
    fn test_damage_taken_caps_at_remaining_health() {
        let mut c = Combatant::new("Test", 1, 50.0);
        let actual = c.take_injury(80.0, false);
        assert_eq!(actual, 50.0);
        assert_eq!(c.damage_taken, 50.0);
    }

    #[test]
    fn test_downed_threshold() {
        let mut c = Combatant::new("Test", 1, 100.0);
        c.take_injury(75.0, false);
        assert!(c.is_alive());
        assert!(!c.is_downed());
        c.take_injury(10.0, false);
        assert!(c.is_downed());
        assert!(c.is_dead_or_downed());
    }

    #[test]
    fn test_heal_most_severe_prefers_worst_wound() {
        let mut c = Combatant::new("Test", 1, 100.0);
        c.take_injury(10.0, false);
        c.take_injury(30.0, false);
        c.take_injury(20.0, false);

        let healed = c.heal_most_severe(5.0, 1, false);
        assert_eq!(healed, 5.0);
        // The 30-severity wound should now be 25.
        let max = c
            .injuries
            .iter()
            .map(|i| i.severity)
            .fold(0.0f32, f32::max);
        assert_eq!(max, 25.0);
    }

    #[test]
    fn test_heal_skips_permanent_injuries() {
        let mut c = Combatant::new("Test", 1, 100.0);
        c.take_injury(40.0, true);
        c.take_injury(10.0, false);

        c.heal_most_severe(100.0, 3, false);
        assert_eq!(c.injuries.len(), 1);
        assert!(c.injuries[0].permanent);
        assert_eq!(c.current_health(), 60.0);
    }

    #[test]
    fn test_heal_cap_limits_injuries_touched() {
        let mut c = Combatant::new("Test", 1, 100.0);
        for _ in 0..5 {
            c.take_injury(10.0, false);
        }
        c.heal_most_severe(10.0, 3, false);
        assert_eq!(c.injuries.len(), 2);
    }
}
