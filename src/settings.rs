//! Engine Settings
//!
//! User-facing tuning knobs for the ability engine: a master switch, an
//! enable flag and a damage multiplier per ability kind, the blade damage
//! bonus and the friendly-fire rule.
//!
//! The engine only ever reads this resource. The hosting game may rewrite
//! any value between two ticks (a settings window, a console command); the
//! state machines tolerate that by reading at each access unless a value
//! was explicitly snapshotted at cast time.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::engine::abilities::AbilityKind;

/// User-configurable settings for the ability engine.
#[derive(Resource, Clone, Debug, Serialize, Deserialize)]
pub struct AbilitySettings {
    /// Master switch; when false every cast is rejected.
    pub mod_enabled: bool,

    pub lunge_enabled: bool,
    pub ghost_dash_enabled: bool,
    pub point_blank_enabled: bool,
    pub riftburst_enabled: bool,
    pub bullet_dive_enabled: bool,
    pub blade_rain_enabled: bool,
    pub arc_wave_enabled: bool,
    pub void_arc_enabled: bool,
    pub cinderfall_enabled: bool,
    pub overdrive_enabled: bool,
    pub transcendence_enabled: bool,

    pub lunge_damage_multiplier: f32,
    pub ghost_dash_damage_multiplier: f32,
    pub point_blank_damage_multiplier: f32,
    pub riftburst_damage_multiplier: f32,
    pub bullet_dive_damage_multiplier: f32,
    pub blade_rain_damage_multiplier: f32,
    pub arc_wave_damage_multiplier: f32,
    pub void_arc_damage_multiplier: f32,
    pub cinderfall_damage_multiplier: f32,
    pub overdrive_damage_multiplier: f32,
    pub transcendence_damage_multiplier: f32,

    /// Extra percent damage for blade-class melee weapons.
    pub sword_damage_bonus: f32,
    /// When true, area abilities never hit allied pawns.
    pub disable_friendly_fire: bool,
}

impl Default for AbilitySettings {
    fn default() -> Self {
        Self {
            mod_enabled: true,
            lunge_enabled: true,
            ghost_dash_enabled: true,
            point_blank_enabled: true,
            riftburst_enabled: true,
            bullet_dive_enabled: true,
            blade_rain_enabled: true,
            arc_wave_enabled: true,
            void_arc_enabled: true,
            cinderfall_enabled: true,
            overdrive_enabled: true,
            transcendence_enabled: true,
            lunge_damage_multiplier: 1.2,
            ghost_dash_damage_multiplier: 1.0,
            point_blank_damage_multiplier: 1.5,
            riftburst_damage_multiplier: 1.0,
            bullet_dive_damage_multiplier: 0.5,
            blade_rain_damage_multiplier: 1.0,
            arc_wave_damage_multiplier: 1.0,
            void_arc_damage_multiplier: 1.0,
            cinderfall_damage_multiplier: 1.0,
            overdrive_damage_multiplier: 1.5,
            transcendence_damage_multiplier: 2.0,
            sword_damage_bonus: 10.0,
            disable_friendly_fire: true,
        }
    }
}

impl AbilitySettings {
    /// Whether casts of `kind` are currently allowed.
    pub fn enabled(&self, kind: AbilityKind) -> bool {
        if !self.mod_enabled {
            return false;
        }
        match kind {
            AbilityKind::Lunge => self.lunge_enabled,
            AbilityKind::GhostDash => self.ghost_dash_enabled,
            AbilityKind::PointBlank => self.point_blank_enabled,
            AbilityKind::Riftburst => self.riftburst_enabled,
            AbilityKind::BulletDive => self.bullet_dive_enabled,
            AbilityKind::BladeRain => self.blade_rain_enabled,
            AbilityKind::ArcWave => self.arc_wave_enabled,
            AbilityKind::VoidArc => self.void_arc_enabled,
            AbilityKind::Cinderfall => self.cinderfall_enabled,
            AbilityKind::Overdrive => self.overdrive_enabled,
            AbilityKind::Transcendence => self.transcendence_enabled,
        }
    }

    /// The current damage multiplier for `kind`. Read live on every
    /// damage application unless a kind snapshots it at cast.
    pub fn damage_multiplier(&self, kind: AbilityKind) -> f32 {
        match kind {
            AbilityKind::Lunge => self.lunge_damage_multiplier,
            AbilityKind::GhostDash => self.ghost_dash_damage_multiplier,
            AbilityKind::PointBlank => self.point_blank_damage_multiplier,
            AbilityKind::Riftburst => self.riftburst_damage_multiplier,
            AbilityKind::BulletDive => self.bullet_dive_damage_multiplier,
            AbilityKind::BladeRain => self.blade_rain_damage_multiplier,
            AbilityKind::ArcWave => self.arc_wave_damage_multiplier,
            AbilityKind::VoidArc => self.void_arc_damage_multiplier,
            AbilityKind::Cinderfall => self.cinderfall_damage_multiplier,
            AbilityKind::Overdrive => self.overdrive_damage_multiplier,
            AbilityKind::Transcendence => self.transcendence_damage_multiplier,
        }
    }

    /// Load settings from a RON file, or return defaults if the file does
    /// not exist or fails to parse.
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(contents) => match ron::from_str(&contents) {
                    Ok(settings) => {
                        info!("Loaded ability settings from {:?}", path);
                        settings
                    }
                    Err(e) => {
                        warn!("Failed to parse settings file: {}", e);
                        Self::default()
                    }
                },
                Err(e) => {
                    warn!("Failed to read settings file: {}", e);
                    Self::default()
                }
            }
        } else {
            Self::default()
        }
    }

    /// Save settings to a RON file.
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let contents = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        fs::write(path, contents)?;
        Ok(())
    }
}
