//! Weapon Model
//!
//! Equipped items drive ability damage. A weapon carries optional melee and
//! ranged attack profiles plus the metadata the damage resolver falls back
//! on when a profile is missing (mass, market value, tech level).
//!
//! Classification (blade, pistol, shotgun) is heuristic on purpose: item
//! catalogs from outside sources are incomplete and inconsistently tagged,
//! so the checks match against label and tag patterns instead of trusting
//! a single field.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Damage classification carried on every damage event.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum DamageKind {
    Cut,
    Stab,
    Blunt,
    Burn,
    Bullet,
    Blast,
}

/// Quality tier of an item. Maps to a fixed multiplicative damage ladder.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum Quality {
    Awful,
    Poor,
    Normal,
    Good,
    Excellent,
    Masterwork,
    Legendary,
}

impl Quality {
    /// The damage multiplier ladder, worst to best.
    pub fn damage_multiplier(&self) -> f32 {
        match self {
            Quality::Awful => 0.5,
            Quality::Poor => 0.75,
            Quality::Normal => 1.0,
            Quality::Good => 1.15,
            Quality::Excellent => 1.35,
            Quality::Masterwork => 1.5,
            Quality::Legendary => 1.8,
        }
    }

    pub fn all() -> [Quality; 7] {
        [
            Quality::Awful,
            Quality::Poor,
            Quality::Normal,
            Quality::Good,
            Quality::Excellent,
            Quality::Masterwork,
            Quality::Legendary,
        ]
    }
}

/// Rough technology tier, used only as a last-resort damage signal.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Serialize, Deserialize)]
pub enum TechLevel {
    #[default]
    Neolithic,
    Medieval,
    Industrial,
    Spacer,
}

/// One attack mode of a weapon: its declared base power and damage type.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct AttackProfile {
    pub power: f32,
    pub kind: DamageKind,
}

/// An equipped item. Attached to the combatant entity that carries it.
#[derive(Component, Clone, Debug, Serialize, Deserialize)]
pub struct Weapon {
    /// Display label ("steel longsword", "pump shotgun")
    pub label: String,
    /// Melee attack profile, if the item can strike
    pub melee: Option<AttackProfile>,
    /// Ranged attack profile, if the item can shoot
    pub ranged: Option<AttackProfile>,
    pub quality: Quality,
    /// Mass in kilograms; damage signal for unknown items
    #[serde(default)]
    pub mass: f32,
    /// Market value; primary damage signal for unknown items
    #[serde(default)]
    pub market_value: f32,
    #[serde(default)]
    pub tech_level: TechLevel,
    /// Free-form classification tags from the item catalog
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Weapon {
    /// A plain melee weapon for scenarios and tests.
    pub fn melee(label: impl Into<String>, power: f32, kind: DamageKind, quality: Quality) -> Self {
        Self {
            label: label.into(),
            melee: Some(AttackProfile { power, kind }),
            ranged: None,
            quality,
            mass: 0.0,
            market_value: 0.0,
            tech_level: TechLevel::default(),
            tags: Vec::new(),
        }
    }

    /// A plain ranged weapon for scenarios and tests.
    pub fn ranged(label: impl Into<String>, power: f32, kind: DamageKind, quality: Quality) -> Self {
        Self {
            label: label.into(),
            melee: None,
            ranged: Some(AttackProfile { power, kind }),
            quality,
            mass: 0.0,
            market_value: 0.0,
            tech_level: TechLevel::default(),
            tags: Vec::new(),
        }
    }

    pub fn is_ranged(&self) -> bool {
        self.ranged.is_some()
    }

    /// A melee-usable weapon: carries a melee profile and is not primarily
    /// a ranged weapon. Dashing slash abilities require this.
    pub fn is_melee_weapon(&self) -> bool {
        self.melee.is_some() && self.ranged.is_none()
    }

    fn matches_any(&self, patterns: &[&str]) -> bool {
        let label = self.label.to_lowercase();
        patterns.iter().any(|p| {
            label.contains(p) || self.tags.iter().any(|t| t.to_lowercase().contains(p))
        })
    }

    /// Blade detection for the category damage bonus.
    pub fn is_blade(&self) -> bool {
        const BLADE_PATTERNS: &[&str] = &[
            "sword", "blade", "katana", "saber", "machete", "knife", "dagger", "gladius",
        ];
        self.melee.is_some() && self.matches_any(BLADE_PATTERNS)
    }

    /// Pistol and revolver detection, for point-blank volley abilities.
    pub fn is_pistol(&self) -> bool {
        const PISTOL_PATTERNS: &[&str] = &[
            "pistol", "revolver", "handgun", "sidearm", "magnum", "autopistol",
        ];
        self.ranged.is_some() && self.matches_any(PISTOL_PATTERNS)
    }

    /// Shotgun detection, for the close-range blast ability.
    pub fn is_shotgun(&self) -> bool {
        const SHOTGUN_PATTERNS: &[&str] = &[
            "shotgun", "scatter", "buckshot", "pump", "sawed-off", "boomstick",
        ];
        self.ranged.is_some() && self.matches_any(SHOTGUN_PATTERNS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_ladder_is_monotonic() {
        let mut last = 0.0;
        for q in Quality::all() {
            let m = q.damage_multiplier();
            assert!(m > last, "{:?} multiplier {} not above {}", q, m, last);
            last = m;
        }
        assert_eq!(Quality::Normal.damage_multiplier(), 1.0);
        assert_eq!(Quality::Legendary.damage_multiplier(), 1.8);
    }

    #[test]
    fn test_blade_detection_by_label() {
        let sword = Weapon::melee("steel longsword", 14.0, DamageKind::Cut, Quality::Normal);
        assert!(sword.is_blade());
        let club = Weapon::melee("wooden club", 9.0, DamageKind::Blunt, Quality::Normal);
        assert!(!club.is_blade());
    }

    #[test]
    fn test_blade_detection_by_tag() {
        let mut exotic = Weapon::melee("zanpakuto", 20.0, DamageKind::Cut, Quality::Excellent);
        assert!(!exotic.is_blade());
        exotic.tags.push("Blade".to_string());
        assert!(exotic.is_blade());
    }

    #[test]
    fn test_pistol_and_shotgun_detection() {
        let revolver = Weapon::ranged("heavy revolver", 12.0, DamageKind::Bullet, Quality::Good);
        assert!(revolver.is_pistol());
        assert!(!revolver.is_shotgun());

        let shotgun = Weapon::ranged("pump shotgun", 18.0, DamageKind::Bullet, Quality::Normal);
        assert!(shotgun.is_shotgun());
        assert!(!shotgun.is_pistol());
    }

    #[test]
    fn test_melee_weapon_excludes_ranged_items() {
        let rifle = Weapon::ranged("bolt-action rifle", 18.0, DamageKind::Bullet, Quality::Normal);
        assert!(!rifle.is_melee_weapon());
        let sword = Weapon::melee("steel gladius", 12.0, DamageKind::Stab, Quality::Normal);
        assert!(sword.is_melee_weapon());
    }
}
