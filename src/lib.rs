//! gridstrike - a tick-based combat ability engine for a grid world
//!
//! Executes timed, multi-phase combat abilities inside a simulated grid
//! world: dash strikes, warmup bursts, projectile barrages and timed
//! transformations, each advanced as a bounded state machine once per
//! simulation tick.
//!
//! This library exposes the engine plus a headless scenario runner for
//! testing and batch analysis.

pub mod cli;
pub mod combat;
pub mod engine;
pub mod headless;
pub mod settings;

// Re-export commonly used types
pub use combat::log::{CombatLog, CombatLogEventType};
pub use engine::abilities::{AbilityKind, AbilityPhase, ActiveAbility, TargetSnapshot};
pub use engine::cast::CastError;
pub use engine::grid::{Cell, MapGrid, TerrainKind};
pub use engine::EnginePlugin;
pub use headless::{ScenarioConfig, SimReport};
pub use settings::AbilitySettings;
