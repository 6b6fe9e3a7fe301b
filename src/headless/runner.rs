//! Headless scenario execution
//!
//! Builds a Bevy app from a scenario config and drives it for a fixed
//! number of ticks without any graphical output. Each `app.update()` is
//! one simulation tick. Results are returned programmatically for tests
//! and batch analysis.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::combat::log::{CombatLog, CombatLogEventType, SimMetadata};
use crate::engine::abilities::defs::{load_ability_defs, AbilityDefs};
use crate::engine::abilities::TargetSnapshot;
use crate::engine::cast::CastRequest;
use crate::engine::components::{Combatant, GameRng, TickCount};
use crate::engine::grid::{Cell, GridPos, MapGrid};
use crate::engine::status::StatusEffects;
use crate::engine::EnginePlugin;

use super::config::ScenarioConfig;

/// Outcome for a single combatant after the run.
#[derive(Debug, Clone)]
pub struct CombatantOutcome {
    pub name: String,
    pub faction: u8,
    pub max_health: f32,
    pub final_health: f32,
    pub survived: bool,
    pub damage_dealt: f32,
    pub damage_taken: f32,
}

/// Result of a completed headless run.
pub struct SimReport {
    pub scenario_name: String,
    pub ticks_run: u64,
    pub random_seed: Option<u64>,
    pub combatants: Vec<CombatantOutcome>,
    /// The full combat log, for queries and export.
    pub log: CombatLog,
}

impl SimReport {
    pub fn metadata(&self) -> SimMetadata {
        SimMetadata {
            scenario_name: self.scenario_name.clone(),
            ticks_run: self.ticks_run,
            random_seed: self.random_seed,
        }
    }

    pub fn survivors(&self) -> Vec<&CombatantOutcome> {
        self.combatants.iter().filter(|c| c.survived).collect()
    }
}

/// A scenario app plus the name-to-entity mapping needed to script it.
pub struct ScenarioApp {
    pub app: App,
    pub entities: HashMap<String, Entity>,
}

/// Build a ready-to-tick app from a scenario. Ability definitions load
/// from the asset catalog.
pub fn build_scenario_app(config: &ScenarioConfig) -> Result<ScenarioApp, String> {
    let defs = load_ability_defs()?;
    Ok(build_scenario_app_with_defs(config, defs))
}

/// Build the app with explicit definitions (tests inject their own).
pub fn build_scenario_app_with_defs(config: &ScenarioConfig, defs: AbilityDefs) -> ScenarioApp {
    let mut app = App::new();
    app.add_plugins(EnginePlugin);

    let mut grid = MapGrid::new(config.grid.width, config.grid.height);
    for patch in &config.grid.patches {
        grid.set_terrain(Cell::new(patch.x, patch.z), patch.terrain);
    }
    app.insert_resource(grid);
    app.insert_resource(defs);

    let settings = config.settings.clone().unwrap_or_default();
    app.insert_resource(settings);

    let rng = match config.seed {
        Some(seed) => GameRng::from_seed(seed),
        None => GameRng::from_entropy(),
    };
    app.insert_resource(rng);

    let mut entities = HashMap::new();
    for spec in &config.combatants {
        let combatant = Combatant::new(spec.name.clone(), spec.faction, spec.max_health)
            .with_skills(spec.melee_skill, spec.shooting_skill)
            .with_armor(spec.armor);
        let mut entity_commands = app.world_mut().spawn((
            combatant,
            GridPos(Cell::new(spec.x, spec.z)),
            StatusEffects::default(),
        ));
        if let Some(weapon) = &spec.weapon {
            entity_commands.insert(weapon.clone());
        }
        entities.insert(spec.name.clone(), entity_commands.id());
    }

    {
        let mut log = app.world_mut().resource_mut::<CombatLog>();
        log.clear();
        log.log(
            CombatLogEventType::SimEvent,
            format!("Scenario '{}' started", config.name),
        );
    }

    ScenarioApp { app, entities }
}

impl ScenarioApp {
    /// Issue one cast request, to be processed on the next update.
    pub fn request_cast(
        &mut self,
        caster: &str,
        kind: crate::engine::abilities::AbilityKind,
        target: TargetSnapshot,
    ) {
        let Some(&caster_entity) = self.entities.get(caster) else {
            warn!("request_cast: unknown caster '{}'", caster);
            return;
        };
        self.app.world_mut().send_event(CastRequest {
            caster: caster_entity,
            kind,
            target,
        });
    }

    /// Advance the simulation one tick.
    pub fn tick(&mut self) {
        self.app.update();
    }

    pub fn current_tick(&self) -> u64 {
        self.app.world().resource::<TickCount>().0
    }
}

/// Run a scenario start to finish, dispatching scripted casts at their
/// ticks, and collect the report.
pub fn run_scenario(config: &ScenarioConfig) -> Result<SimReport, String> {
    let mut scenario = build_scenario_app(config)?;
    run_built_scenario(config, &mut scenario);
    Ok(collect_report(config, scenario))
}

/// Drive a prebuilt scenario app through the configured tick budget.
pub fn run_built_scenario(config: &ScenarioConfig, scenario: &mut ScenarioApp) {
    for tick in 0..config.ticks {
        for cast in config.casts.iter().filter(|c| c.tick == tick) {
            let target = resolve_target(cast, scenario);
            scenario.request_cast(&cast.caster, cast.kind, target);
        }
        scenario.tick();
    }
}

fn resolve_target(cast: &super::config::CastScript, scenario: &ScenarioApp) -> TargetSnapshot {
    if let Some(target_name) = &cast.target {
        if let Some(&entity) = scenario.entities.get(target_name) {
            if let Some(pos) = scenario.app.world().get::<GridPos>(entity) {
                return TargetSnapshot::pawn(entity, pos.0);
            }
        }
    }
    TargetSnapshot::cell(Cell::new(cast.target_x, cast.target_z))
}

/// Extract the report from a finished run.
pub fn collect_report(config: &ScenarioConfig, mut scenario: ScenarioApp) -> SimReport {
    let world = scenario.app.world_mut();

    let mut combatants = Vec::new();
    let mut query = world.query::<&Combatant>();
    for combatant in query.iter(world) {
        combatants.push(CombatantOutcome {
            name: combatant.name.clone(),
            faction: combatant.faction,
            max_health: combatant.max_health,
            final_health: combatant.current_health(),
            survived: combatant.is_alive(),
            damage_dealt: combatant.damage_dealt,
            damage_taken: combatant.damage_taken,
        });
    }

    let ticks_run = world.resource::<TickCount>().0;
    let log = world
        .remove_resource::<CombatLog>()
        .unwrap_or_default();

    SimReport {
        scenario_name: config.name.clone(),
        ticks_run,
        random_seed: config.seed,
        combatants,
        log,
    }
}
