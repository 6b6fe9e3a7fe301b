//! Data-Driven Ability Definitions
//!
//! Structural knobs per ability kind (cast ranges, dash pacing, barrage
//! sizes) are loaded from `assets/config/abilities.ron` instead of being
//! hardcoded, so balance changes do not require recompilation. Combat
//! geometry that defines an ability's identity (cone angles, sweep
//! shapes) stays in the ability modules.
//!
//! All definitions are validated at startup; the engine then reads them
//! through `get_unchecked`.

use std::collections::HashMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::AbilityKind;

/// Structural configuration for one ability kind.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AbilityDef {
    /// Display name of the ability
    pub name: String,
    /// Maximum cast range in cells (0 = self-targeted)
    #[serde(default)]
    pub range: f32,
    /// Minimum cast range; nonzero for abilities with a range band
    #[serde(default)]
    pub min_range: f32,
    /// Ticks between dash steps or volley shots
    #[serde(default)]
    pub step_interval: u32,
    /// Random warmup bounds in ticks (inclusive)
    #[serde(default)]
    pub warmup_min: u32,
    #[serde(default)]
    pub warmup_max: u32,
    /// Ticks between warmup pulse effects
    #[serde(default)]
    pub pulse_interval: u32,
    /// Ticks between barrage waves or volley launches
    #[serde(default)]
    pub wave_interval: u32,
    /// Base wave count before skill scaling
    #[serde(default)]
    pub base_waves: u32,
    /// Area radius for barrages
    #[serde(default)]
    pub radius: f32,
    /// Trailing ticks after the last wave before the instance completes
    #[serde(default)]
    pub grace_ticks: u32,
    /// Hard cap on total emissions regardless of skill scaling
    #[serde(default)]
    pub max_total: u32,
}

/// Root structure of the abilities.ron file
#[derive(Debug, Serialize, Deserialize)]
pub struct AbilityDefsConfig {
    pub abilities: HashMap<AbilityKind, AbilityDef>,
}

/// Resource containing all ability definitions.
///
/// Loaded from `assets/config/abilities.ron` at startup and validated so
/// later access can assume completeness.
#[derive(Resource)]
pub struct AbilityDefs {
    definitions: HashMap<AbilityKind, AbilityDef>,
}

impl Default for AbilityDefs {
    /// Load definitions from the default config file. Panics if the file
    /// cannot be loaded; intended for tests and simple hosts.
    fn default() -> Self {
        load_ability_defs().expect("Failed to load ability definitions in Default impl")
    }
}

impl AbilityDefs {
    pub fn new(config: AbilityDefsConfig) -> Self {
        Self {
            definitions: config.abilities,
        }
    }

    pub fn get(&self, kind: AbilityKind) -> Option<&AbilityDef> {
        self.definitions.get(&kind)
    }

    /// Get the definition for a kind, panicking if absent. Safe after
    /// startup validation has confirmed every kind is defined.
    pub fn get_unchecked(&self, kind: AbilityKind) -> &AbilityDef {
        self.definitions
            .get(&kind)
            .unwrap_or_else(|| panic!("Ability {:?} not found in definitions", kind))
    }

    /// Check that every ability kind is defined and sane.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();
        for kind in AbilityKind::all() {
            match self.definitions.get(&kind) {
                None => problems.push(format!("missing definition for {:?}", kind)),
                Some(def) => {
                    if def.name.is_empty() {
                        problems.push(format!("{:?} has an empty name", kind));
                    }
                    if def.range < 0.0 || def.min_range < 0.0 {
                        problems.push(format!("{:?} has a negative range", kind));
                    }
                    if def.min_range > def.range && def.range > 0.0 {
                        problems.push(format!("{:?} min_range exceeds range", kind));
                    }
                    if def.warmup_max < def.warmup_min {
                        problems.push(format!("{:?} warmup_max below warmup_min", kind));
                    }
                }
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}

/// Load ability definitions from assets/config/abilities.ron
pub fn load_ability_defs() -> Result<AbilityDefs, String> {
    let config_path = "assets/config/abilities.ron";

    let contents = std::fs::read_to_string(config_path)
        .map_err(|e| format!("Failed to read {}: {}", config_path, e))?;

    let config: AbilityDefsConfig =
        ron::from_str(&contents).map_err(|e| format!("Failed to parse {}: {}", config_path, e))?;

    let defs = AbilityDefs::new(config);
    defs.validate()
        .map_err(|problems| format!("Invalid ability definitions: {}", problems.join("; ")))?;

    info!(
        "Loaded {} ability definitions from {}",
        defs.definitions.len(),
        config_path
    );

    Ok(defs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(name: &str) -> AbilityDef {
        AbilityDef {
            name: name.to_string(),
            range: 10.0,
            min_range: 0.0,
            step_interval: 2,
            warmup_min: 0,
            warmup_max: 0,
            pulse_interval: 0,
            wave_interval: 0,
            base_waves: 0,
            radius: 0.0,
            grace_ticks: 0,
            max_total: 0,
        }
    }

    #[test]
    fn test_validate_flags_missing_kind() {
        let mut abilities = HashMap::new();
        abilities.insert(AbilityKind::Lunge, def("Lunge"));
        let defs = AbilityDefs::new(AbilityDefsConfig { abilities });
        let problems = defs.validate().unwrap_err();
        assert!(problems.iter().any(|p| p.contains("GhostDash")));
    }

    #[test]
    fn test_validate_flags_inverted_warmup() {
        let mut abilities = HashMap::new();
        for kind in AbilityKind::all() {
            abilities.insert(kind, def(kind.name()));
        }
        abilities.get_mut(&AbilityKind::Riftburst).unwrap().warmup_min = 60;
        abilities.get_mut(&AbilityKind::Riftburst).unwrap().warmup_max = 30;
        let defs = AbilityDefs::new(AbilityDefsConfig { abilities });
        assert!(defs.validate().is_err());
    }
}
