//! Headless scenario configuration
//!
//! A scenario file (JSON) describes the grid, the combatants, and a
//! script of cast requests by tick. Used by the CLI binary and the
//! integration tests.

use serde::{Deserialize, Serialize};

use crate::engine::abilities::AbilityKind;
use crate::engine::grid::TerrainKind;
use crate::engine::weapon::Weapon;
use crate::settings::AbilitySettings;

/// One terrain override painted onto the default all-floor grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainPatch {
    pub x: i32,
    pub z: i32,
    pub terrain: TerrainKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub patches: Vec<TerrainPatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatantConfig {
    pub name: String,
    pub faction: u8,
    pub x: i32,
    pub z: i32,
    pub max_health: f32,
    #[serde(default)]
    pub melee_skill: u8,
    #[serde(default)]
    pub shooting_skill: u8,
    #[serde(default)]
    pub armor: f32,
    #[serde(default)]
    pub weapon: Option<Weapon>,
}

/// A scripted cast: at `tick`, `caster` casts `kind` at a cell or at a
/// named combatant (whose position is resolved at request time).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CastScript {
    pub tick: u64,
    pub caster: String,
    pub kind: AbilityKind,
    #[serde(default)]
    pub target_x: i32,
    #[serde(default)]
    pub target_z: i32,
    #[serde(default)]
    pub target: Option<String>,
}

/// A complete headless scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    pub grid: GridConfig,
    pub combatants: Vec<CombatantConfig>,
    #[serde(default)]
    pub casts: Vec<CastScript>,
    /// Number of ticks to simulate
    pub ticks: u64,
    /// Seed for deterministic runs
    #[serde(default)]
    pub seed: Option<u64>,
    /// Full settings override; defaults apply when absent
    #[serde(default)]
    pub settings: Option<AbilitySettings>,
}

impl ScenarioConfig {
    pub fn from_json(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|e| format!("Failed to parse scenario: {}", e))
    }

    pub fn load(path: &std::path::Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {:?}: {}", path, e))?;
        Self::from_json(&text)
    }
}
