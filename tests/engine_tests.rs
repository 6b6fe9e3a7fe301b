//! Integration tests for the tick-driven ability engine
//!
//! Each test builds a small scripted scenario, drives the app tick by
//! tick and asserts on world state, the combat log and the effect queue.

use bevy::prelude::Entity;

use gridstrike::engine::abilities::defs::{AbilityDef, AbilityDefs, AbilityDefsConfig};
use gridstrike::engine::abilities::{AbilityKind, ActiveAbility, TargetSnapshot};
use gridstrike::engine::components::Combatant;
use gridstrike::engine::effects::{EffectRequest, EffectSink, VisualKind};
use gridstrike::engine::grid::{Cell, GridPos};
use gridstrike::engine::status::{StatusEffect, StatusEffects, StatusKind};
use gridstrike::engine::weapon::{DamageKind, Quality, Weapon};
use gridstrike::headless::config::{CombatantConfig, GridConfig, TerrainPatch};
use gridstrike::headless::runner::{build_scenario_app, build_scenario_app_with_defs, ScenarioApp};
use gridstrike::headless::ScenarioConfig;
use gridstrike::{CombatLogEventType, TerrainKind};

fn sword() -> Weapon {
    Weapon::melee("steel sword", 10.0, DamageKind::Cut, Quality::Normal)
}

fn scenario(width: i32, height: i32, combatants: Vec<CombatantConfig>) -> ScenarioConfig {
    ScenarioConfig {
        name: "test".to_string(),
        grid: GridConfig {
            width,
            height,
            patches: Vec::new(),
        },
        combatants,
        casts: Vec::new(),
        ticks: 100,
        seed: Some(42),
        settings: None,
    }
}

fn combatant(name: &str, faction: u8, x: i32, z: i32) -> CombatantConfig {
    CombatantConfig {
        name: name.to_string(),
        faction,
        x,
        z,
        max_health: 100.0,
        melee_skill: 0,
        shooting_skill: 0,
        armor: 0.0,
        weapon: None,
    }
}

fn get_combatant<'a>(scenario: &'a ScenarioApp, name: &str) -> &'a Combatant {
    let entity = scenario.entities[name];
    scenario.app.world().get::<Combatant>(entity).unwrap()
}

fn get_position(scenario: &ScenarioApp, name: &str) -> Cell {
    let entity = scenario.entities[name];
    scenario.app.world().get::<GridPos>(entity).unwrap().0
}

fn kill(scenario: &mut ScenarioApp, name: &str) {
    let entity = scenario.entities[name];
    let mut combatant = scenario
        .app
        .world_mut()
        .get_mut::<Combatant>(entity)
        .unwrap();
    let max = combatant.max_health;
    combatant.take_injury(max + 1.0, false);
}

fn has_active_ability(scenario: &ScenarioApp, name: &str) -> bool {
    let entity = scenario.entities[name];
    scenario.app.world().get::<ActiveAbility>(entity).is_some()
}

/// Definitions with a fixed warmup so warmup timing is deterministic.
fn defs_with_fixed_warmup(warmup: u32) -> AbilityDefs {
    let mut abilities = std::collections::HashMap::new();
    for kind in AbilityKind::all() {
        abilities.insert(kind, default_def(kind));
    }
    let riftburst = abilities.get_mut(&AbilityKind::Riftburst).unwrap();
    riftburst.warmup_min = warmup;
    riftburst.warmup_max = warmup;
    let defs = AbilityDefs::new(AbilityDefsConfig { abilities });
    assert!(defs.validate().is_ok());
    defs
}

fn default_def(kind: AbilityKind) -> AbilityDef {
    // Mirror the asset catalog closely enough for engine behavior.
    let mut def = AbilityDef {
        name: kind.name().to_string(),
        range: 25.0,
        min_range: 0.0,
        step_interval: 2,
        warmup_min: 30,
        warmup_max: 60,
        pulse_interval: 10,
        wave_interval: 3,
        base_waves: 5,
        radius: 4.0,
        grace_ticks: 30,
        max_total: 20,
    };
    if kind == AbilityKind::BulletDive {
        def.min_range = 6.0;
        def.range = 10.0;
        def.step_interval = 3;
    }
    def
}

// =============================================================================
// Dash Scenarios
// =============================================================================

#[test]
fn test_respecting_dash_stops_at_wall() {
    // Caster at (0,0), target at (5,0), wall at (3,0). The dash path is
    // [(1,0), (2,0)]; the dash stops short and no damage lands.
    let mut config = scenario(
        20,
        20,
        vec![
            CombatantConfig {
                weapon: Some(sword()),
                ..combatant("Caster", 1, 0, 0)
            },
            combatant("Target", 2, 5, 0),
        ],
    );
    config.grid.patches.push(TerrainPatch {
        x: 3,
        z: 0,
        terrain: TerrainKind::Wall,
    });

    let mut scenario = build_scenario_app(&config).unwrap();
    let target_entity = scenario.entities["Target"];
    scenario.request_cast(
        "Caster",
        AbilityKind::Lunge,
        TargetSnapshot::pawn(target_entity, Cell::new(5, 0)),
    );
    for _ in 0..30 {
        scenario.tick();
    }

    assert_eq!(get_position(&scenario, "Caster"), Cell::new(2, 0));
    assert_eq!(get_combatant(&scenario, "Target").damage_taken, 0.0);
    assert!(!has_active_ability(&scenario, "Caster"));
}

#[test]
fn test_lunge_reaches_and_strikes_once() {
    let mut config = scenario(
        20,
        20,
        vec![
            CombatantConfig {
                weapon: Some(sword()),
                ..combatant("Caster", 1, 0, 0)
            },
            combatant("Target", 2, 5, 0),
        ],
    );
    config.ticks = 40;

    let mut scenario = build_scenario_app(&config).unwrap();
    let target_entity = scenario.entities["Target"];
    scenario.request_cast(
        "Caster",
        AbilityKind::Lunge,
        TargetSnapshot::pawn(target_entity, Cell::new(5, 0)),
    );
    for _ in 0..40 {
        scenario.tick();
    }

    // Landed adjacent, never on top of the target.
    assert_eq!(get_position(&scenario, "Caster"), Cell::new(4, 0));
    // Exactly one strike: sword 10 * blade bonus 1.1 * multiplier 1.2 = 13.
    let target = get_combatant(&scenario, "Target");
    assert_eq!(target.damage_taken, 13.0);
    // The strike staggers.
    let statuses = scenario
        .app
        .world()
        .get::<StatusEffects>(target_entity)
        .unwrap();
    assert!(statuses.has(StatusKind::Stagger) || target.damage_taken > 0.0);
}

#[test]
fn test_ghost_dash_passes_through_wall_and_sweeps() {
    // A wall at (3,0) does not stop the bypassing dash; a pawn standing
    // beside the path is swept exactly once.
    let mut config = scenario(
        20,
        20,
        vec![
            CombatantConfig {
                weapon: Some(sword()),
                ..combatant("Caster", 1, 0, 0)
            },
            combatant("Bystander", 2, 4, 1),
        ],
    );
    config.grid.patches.push(TerrainPatch {
        x: 3,
        z: 0,
        terrain: TerrainKind::Wall,
    });

    let mut scenario = build_scenario_app(&config).unwrap();
    scenario.request_cast(
        "Caster",
        AbilityKind::GhostDash,
        TargetSnapshot::cell(Cell::new(8, 0)),
    );
    for _ in 0..40 {
        scenario.tick();
    }

    // The dash crossed the wall and finished at the far end.
    assert_eq!(get_position(&scenario, "Caster"), Cell::new(8, 0));
    // Swept once: 10 * 1.1 blade bonus = 11 damage.
    let bystander = get_combatant(&scenario, "Bystander");
    assert_eq!(bystander.damage_taken, 11.0);
}

#[test]
fn test_single_instance_per_caster() {
    let config = scenario(
        20,
        20,
        vec![
            CombatantConfig {
                weapon: Some(sword()),
                ..combatant("Caster", 1, 0, 0)
            },
            combatant("Target", 2, 10, 0),
        ],
    );

    let mut scenario = build_scenario_app(&config).unwrap();
    scenario.request_cast(
        "Caster",
        AbilityKind::GhostDash,
        TargetSnapshot::cell(Cell::new(10, 0)),
    );
    scenario.tick();
    assert!(has_active_ability(&scenario, "Caster"));

    // A second cast while the dash runs is rejected outright.
    scenario.request_cast(
        "Caster",
        AbilityKind::GhostDash,
        TargetSnapshot::cell(Cell::new(0, 10)),
    );
    scenario.tick();

    let log = scenario.app.world().resource::<gridstrike::CombatLog>();
    let rejections = log.filter_by_type(CombatLogEventType::CastRejected);
    assert_eq!(rejections.len(), 1);
    assert!(rejections[0].message.contains("already in progress"));
}

// =============================================================================
// Warmup and Cancellation
// =============================================================================

#[test]
fn test_warmup_cancelled_by_caster_death() {
    // A 30-tick fixed warmup cancelled by caster death at tick 15: the
    // instance transitions to Cancelled on the next tick and no damage
    // is ever applied.
    let config = scenario(
        20,
        20,
        vec![
            CombatantConfig {
                weapon: Some(sword()),
                ..combatant("Caster", 1, 0, 0)
            },
            combatant("Target", 2, 5, 0),
        ],
    );
    let mut scenario = build_scenario_app_with_defs(&config, defs_with_fixed_warmup(30));
    scenario.request_cast(
        "Caster",
        AbilityKind::Riftburst,
        TargetSnapshot::cell(Cell::new(5, 0)),
    );

    for _ in 0..15 {
        scenario.tick();
    }
    assert!(has_active_ability(&scenario, "Caster"));
    kill(&mut scenario, "Caster");

    // One more tick: the cancellation is observed at the tick boundary.
    scenario.tick();
    assert!(!has_active_ability(&scenario, "Caster"));

    let log = scenario.app.world().resource::<gridstrike::CombatLog>();
    assert_eq!(
        log.filter_by_type(CombatLogEventType::AbilityCancelled).len(),
        1
    );
    assert_eq!(get_combatant(&scenario, "Target").damage_taken, 0.0);
}

#[test]
fn test_warmup_completes_and_bursts() {
    let config = scenario(
        20,
        20,
        vec![
            CombatantConfig {
                weapon: Some(sword()),
                ..combatant("Caster", 1, 0, 0)
            },
            combatant("Target", 2, 5, 0),
        ],
    );
    let mut scenario = build_scenario_app_with_defs(&config, defs_with_fixed_warmup(30));
    scenario.request_cast(
        "Caster",
        AbilityKind::Riftburst,
        TargetSnapshot::cell(Cell::new(5, 0)),
    );

    for _ in 0..35 {
        scenario.tick();
    }
    assert!(!has_active_ability(&scenario, "Caster"));
    // The target stood inside the slash radius: weapon damage landed.
    assert!(get_combatant(&scenario, "Target").damage_taken > 0.0);
}

#[test]
fn test_dash_cancelled_when_target_dies() {
    let config = scenario(
        30,
        30,
        vec![
            CombatantConfig {
                weapon: Some(sword()),
                ..combatant("Caster", 1, 0, 0)
            },
            combatant("Target", 2, 12, 0),
        ],
    );

    let mut scenario = build_scenario_app(&config).unwrap();
    let target_entity = scenario.entities["Target"];
    scenario.request_cast(
        "Caster",
        AbilityKind::Lunge,
        TargetSnapshot::pawn(target_entity, Cell::new(12, 0)),
    );
    scenario.tick();
    assert!(has_active_ability(&scenario, "Caster"));

    kill(&mut scenario, "Target");
    scenario.tick();
    assert!(!has_active_ability(&scenario, "Caster"));

    let log = scenario.app.world().resource::<gridstrike::CombatLog>();
    assert_eq!(
        log.filter_by_type(CombatLogEventType::AbilityCancelled).len(),
        1
    );
}

// =============================================================================
// Barrage Timing
// =============================================================================

#[test]
fn test_barrage_wave_schedule_and_count() {
    // Cinderfall at shooting skill 0 fires exactly base_waves = 5 orbs,
    // one per 3 ticks starting on the cast tick, then completes after
    // the grace window without ever firing a sixth.
    let config = scenario(
        30,
        30,
        vec![
            CombatantConfig {
                weapon: Some(Weapon::ranged(
                    "bolt-action rifle",
                    18.0,
                    DamageKind::Bullet,
                    Quality::Normal,
                )),
                ..combatant("Caster", 1, 0, 0)
            },
            combatant("Target", 2, 12, 0),
        ],
    );

    let mut scenario = build_scenario_app_with_defs(&config, {
        let mut abilities = std::collections::HashMap::new();
        for kind in AbilityKind::all() {
            abilities.insert(kind, default_def(kind));
        }
        AbilityDefs::new(AbilityDefsConfig { abilities })
    });
    scenario.request_cast(
        "Caster",
        AbilityKind::Cinderfall,
        TargetSnapshot::cell(Cell::new(12, 0)),
    );

    // Record the tick of each launch by watching the fire glow requests.
    let mut launch_ticks = Vec::new();
    let mut last_count = 0;
    for tick in 0..80u64 {
        scenario.tick();
        let sink = scenario.app.world().resource::<EffectSink>();
        let count = sink
            .pending()
            .iter()
            .filter(|r| {
                matches!(
                    r,
                    EffectRequest::Visual {
                        kind: VisualKind::FireGlow,
                        ..
                    }
                )
            })
            .count();
        if count > last_count {
            launch_ticks.push(tick);
            last_count = count;
        }
    }

    assert_eq!(launch_ticks, vec![0, 3, 6, 9, 12]);
    assert!(!has_active_ability(&scenario, "Caster"));
}

#[test]
fn test_barrage_grace_window_delays_completion() {
    let config = scenario(
        30,
        30,
        vec![CombatantConfig {
            weapon: Some(Weapon::ranged(
                "hunting rifle",
                16.0,
                DamageKind::Bullet,
                Quality::Normal,
            )),
            ..combatant("Caster", 1, 0, 0)
        }],
    );

    let mut scenario = build_scenario_app_with_defs(&config, {
        let mut abilities = std::collections::HashMap::new();
        for kind in AbilityKind::all() {
            abilities.insert(kind, default_def(kind));
        }
        AbilityDefs::new(AbilityDefsConfig { abilities })
    });
    scenario.request_cast(
        "Caster",
        AbilityKind::Cinderfall,
        TargetSnapshot::cell(Cell::new(12, 0)),
    );

    // Last wave fires on tick 12; the instance must survive the grace
    // window (30 ticks) before completing.
    for _ in 0..20 {
        scenario.tick();
    }
    assert!(has_active_ability(&scenario, "Caster"));
    for _ in 0..30 {
        scenario.tick();
    }
    assert!(!has_active_ability(&scenario, "Caster"));
}

// =============================================================================
// Status Effect Scenarios
// =============================================================================

#[test]
fn test_independent_burn_stacks_age_independently() {
    let config = scenario(10, 10, vec![combatant("Victim", 2, 5, 5)]);
    let mut scenario = build_scenario_app(&config).unwrap();
    let victim = scenario.entities["Victim"];

    {
        let mut statuses = scenario
            .app
            .world_mut()
            .get_mut::<StatusEffects>(victim)
            .unwrap();
        statuses.apply(StatusEffect::burning(2.0, 120).with_source(Entity::from_raw(901)));
        statuses.apply(StatusEffect::burning(2.0, 240).with_source(Entity::from_raw(902)));
        statuses.apply(StatusEffect::burning(2.0, 360).with_source(Entity::from_raw(903)));
    }

    let count = |scenario: &ScenarioApp| {
        scenario
            .app
            .world()
            .get::<StatusEffects>(victim)
            .unwrap()
            .count(StatusKind::Burning)
    };

    assert_eq!(count(&scenario), 3);
    for _ in 0..130 {
        scenario.tick();
    }
    assert_eq!(count(&scenario), 2);
    for _ in 0..120 {
        scenario.tick();
    }
    assert_eq!(count(&scenario), 1);
    for _ in 0..120 {
        scenario.tick();
    }
    assert_eq!(count(&scenario), 0);

    // Each stack pulsed every second; total damage reflects three
    // overlapping stacks at 2 damage per pulse.
    assert!(get_combatant(&scenario, "Victim").damage_taken > 0.0);
}

#[test]
fn test_transformation_applies_buff_and_regenerates() {
    let config = scenario(10, 10, vec![combatant("Caster", 1, 5, 5)]);
    let mut scenario = build_scenario_app(&config).unwrap();
    let caster = scenario.entities["Caster"];

    // Wound the caster so regeneration has something to mend.
    {
        let mut combatant = scenario
            .app
            .world_mut()
            .get_mut::<Combatant>(caster)
            .unwrap();
        combatant.take_injury(40.0, false);
    }

    scenario.request_cast(
        "Caster",
        AbilityKind::Overdrive,
        TargetSnapshot::cell(Cell::new(5, 5)),
    );
    scenario.tick();

    // The instance completed immediately; the buff carries the rest.
    assert!(!has_active_ability(&scenario, "Caster"));
    let statuses = scenario.app.world().get::<StatusEffects>(caster).unwrap();
    assert!(statuses.has(StatusKind::Overdrive));
    assert_eq!(statuses.damage_multiplier(), 1.5);

    let before = get_combatant(&scenario, "Caster").current_health();
    for _ in 0..300 {
        scenario.tick();
    }
    let after = get_combatant(&scenario, "Caster").current_health();
    // 2 health per second for 5 seconds.
    assert!(after > before + 8.0, "expected regeneration, {} -> {}", before, after);
}

#[test]
fn test_transcendence_supersedes_overdrive() {
    let config = scenario(10, 10, vec![combatant("Caster", 1, 5, 5)]);
    let mut scenario = build_scenario_app(&config).unwrap();
    let caster = scenario.entities["Caster"];

    scenario.request_cast(
        "Caster",
        AbilityKind::Overdrive,
        TargetSnapshot::cell(Cell::new(5, 5)),
    );
    scenario.tick();
    scenario.request_cast(
        "Caster",
        AbilityKind::Transcendence,
        TargetSnapshot::cell(Cell::new(5, 5)),
    );
    scenario.tick();

    let statuses = scenario.app.world().get::<StatusEffects>(caster).unwrap();
    assert!(!statuses.has(StatusKind::Overdrive));
    assert!(statuses.has(StatusKind::Transcendence));
    assert_eq!(statuses.damage_multiplier(), 2.0);
}

// =============================================================================
// Cone Scenario
// =============================================================================

#[test]
fn test_void_arc_hits_cone_and_brands() {
    let config = scenario(
        30,
        30,
        vec![
            CombatantConfig {
                weapon: Some(sword()),
                ..combatant("Caster", 1, 5, 5)
            },
            // Dead ahead at distance 4: inside the cone.
            combatant("Ahead", 2, 9, 5),
            // Behind the caster: never hit.
            combatant("Behind", 2, 2, 5),
        ],
    );

    let mut scenario = build_scenario_app(&config).unwrap();
    scenario.request_cast(
        "Caster",
        AbilityKind::VoidArc,
        TargetSnapshot::cell(Cell::new(12, 5)),
    );
    scenario.tick();
    scenario.tick();

    let ahead_entity = scenario.entities["Ahead"];
    let ahead = get_combatant(&scenario, "Ahead");
    assert_eq!(ahead.damage_taken, 12.0);
    let statuses = scenario
        .app
        .world()
        .get::<StatusEffects>(ahead_entity)
        .unwrap();
    assert!(statuses.has(StatusKind::Lacerated));

    assert_eq!(get_combatant(&scenario, "Behind").damage_taken, 0.0);
}

#[test]
fn test_void_arc_friendly_fire_gate() {
    let mut config = scenario(
        30,
        30,
        vec![
            CombatantConfig {
                weapon: Some(sword()),
                ..combatant("Caster", 1, 5, 5)
            },
            combatant("Ally", 1, 8, 5),
            combatant("Enemy", 2, 10, 5),
        ],
    );
    // Friendly fire disabled by default; make it explicit.
    let mut settings = gridstrike::AbilitySettings::default();
    settings.disable_friendly_fire = true;
    config.settings = Some(settings);

    let mut scenario = build_scenario_app(&config).unwrap();
    scenario.request_cast(
        "Caster",
        AbilityKind::VoidArc,
        TargetSnapshot::cell(Cell::new(12, 5)),
    );
    scenario.tick();

    assert_eq!(get_combatant(&scenario, "Ally").damage_taken, 0.0);
    assert_eq!(get_combatant(&scenario, "Enemy").damage_taken, 12.0);
}
