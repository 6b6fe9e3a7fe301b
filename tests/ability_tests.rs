//! Unit tests for ability definitions and cast validation
//!
//! These tests verify that:
//! - All ability kinds have valid definitions in the asset catalog
//! - Cast validation enforces weapon class, range and state preconditions
//! - Rejected casts produce typed errors and build no instance

use std::collections::HashMap;

use bevy::prelude::Entity;

use gridstrike::engine::abilities::defs::AbilityDefs;
use gridstrike::engine::abilities::{AbilityKind, AbilityPhase, TargetSnapshot};
use gridstrike::engine::cast::{try_cast, CastContext, CastError};
use gridstrike::engine::components::{Combatant, GameRng};
use gridstrike::engine::grid::{Cell, MapGrid, PawnSnapshot, WorldView};
use gridstrike::engine::status::StatusEffects;
use gridstrike::engine::weapon::{DamageKind, Quality, Weapon};
use gridstrike::settings::AbilitySettings;

/// Helper to load ability definitions for tests
fn load_defs() -> AbilityDefs {
    AbilityDefs::default()
}

struct Fixture {
    grid: MapGrid,
    occupants: HashMap<Cell, Entity>,
    pawns: HashMap<Entity, PawnSnapshot>,
    settings: AbilitySettings,
    defs: AbilityDefs,
    caster: Combatant,
    statuses: StatusEffects,
    rng: GameRng,
}

impl Fixture {
    fn new() -> Self {
        Self {
            grid: MapGrid::new(40, 40),
            occupants: HashMap::new(),
            pawns: HashMap::new(),
            settings: AbilitySettings::default(),
            defs: load_defs(),
            caster: Combatant::new("Caster", 1, 100.0).with_skills(8, 8),
            statuses: StatusEffects::default(),
            rng: GameRng::from_seed(7),
        }
    }

    fn spawn_enemy(&mut self, id: u32, cell: Cell) -> Entity {
        let entity = Entity::from_raw(id);
        self.occupants.insert(cell, entity);
        self.pawns.insert(
            entity,
            PawnSnapshot {
                cell,
                faction: 2,
                alive: true,
                downed: false,
            },
        );
        entity
    }

    fn cast(
        &mut self,
        kind: AbilityKind,
        target: TargetSnapshot,
        weapon: Option<&Weapon>,
        has_active: bool,
    ) -> Result<gridstrike::ActiveAbility, CastError> {
        let caster_entity = Entity::from_raw(1000);
        let ctx = CastContext {
            caster: caster_entity,
            caster_cell: Cell::new(10, 10),
            combatant: &self.caster,
            weapon,
            statuses: &self.statuses,
            settings: &self.settings,
            defs: &self.defs,
        };
        let view = WorldView::new(&self.grid, &self.occupants, &self.pawns);
        try_cast(kind, target, &ctx, has_active, &view, &mut self.rng)
    }
}

fn sword() -> Weapon {
    Weapon::melee("steel sword", 12.0, DamageKind::Cut, Quality::Normal)
}

fn pistol() -> Weapon {
    Weapon::ranged("autopistol", 10.0, DamageKind::Bullet, Quality::Normal)
}

fn shotgun() -> Weapon {
    Weapon::ranged("pump shotgun", 18.0, DamageKind::Bullet, Quality::Normal)
}

// =============================================================================
// Definition Catalog Tests
// =============================================================================

#[test]
fn test_all_kinds_have_definitions() {
    let defs = load_defs();
    for kind in AbilityKind::all() {
        let def = defs.get(kind);
        assert!(def.is_some(), "{:?} should have a definition", kind);
        assert!(!def.unwrap().name.is_empty(), "{:?} should have a name", kind);
    }
}

#[test]
fn test_definitions_validate() {
    assert!(load_defs().validate().is_ok());
}

#[test]
fn test_warmup_bounds_are_ordered() {
    let defs = load_defs();
    let def = defs.get_unchecked(AbilityKind::Riftburst);
    assert!(def.warmup_min > 0);
    assert!(def.warmup_max >= def.warmup_min);
}

#[test]
fn test_barrage_kinds_have_wave_structure() {
    let defs = load_defs();
    for kind in [AbilityKind::BladeRain, AbilityKind::Cinderfall] {
        let def = defs.get_unchecked(kind);
        assert!(def.base_waves > 0, "{:?} should have base waves", kind);
        assert!(def.wave_interval > 0, "{:?} should have a wave interval", kind);
        assert!(def.radius > 0.0, "{:?} should have a radius", kind);
        assert!(def.grace_ticks > 0, "{:?} should have a grace window", kind);
    }
}

#[test]
fn test_range_band_kinds_have_min_range() {
    let defs = load_defs();
    let def = defs.get_unchecked(AbilityKind::BulletDive);
    assert!(def.min_range > 0.0);
    assert!(def.range > def.min_range);
}

// =============================================================================
// Weapon Class Preconditions
// =============================================================================

#[test]
fn test_melee_kinds_reject_missing_weapon() {
    let mut fx = Fixture::new();
    let enemy = fx.spawn_enemy(1, Cell::new(14, 10));
    let pistol = pistol();

    for (kind, target) in [
        (AbilityKind::Lunge, TargetSnapshot::pawn(enemy, Cell::new(14, 10))),
        (AbilityKind::GhostDash, TargetSnapshot::cell(Cell::new(15, 10))),
        (AbilityKind::Riftburst, TargetSnapshot::cell(Cell::new(14, 10))),
        (AbilityKind::ArcWave, TargetSnapshot::cell(Cell::new(14, 10))),
        (AbilityKind::VoidArc, TargetSnapshot::cell(Cell::new(14, 10))),
    ] {
        assert_eq!(
            fx.cast(kind, target, None, false).unwrap_err(),
            CastError::NoMeleeWeapon,
            "{:?} without a weapon",
            kind
        );
        assert_eq!(
            fx.cast(kind, target, Some(&pistol), false).unwrap_err(),
            CastError::NoMeleeWeapon,
            "{:?} with a ranged weapon",
            kind
        );
    }
}

#[test]
fn test_bullet_dive_requires_pistol_class() {
    let mut fx = Fixture::new();
    let target = TargetSnapshot::cell(Cell::new(18, 10));

    let rifle = Weapon::ranged("bolt-action rifle", 18.0, DamageKind::Bullet, Quality::Normal);
    assert_eq!(
        fx.cast(AbilityKind::BulletDive, target, Some(&rifle), false)
            .unwrap_err(),
        CastError::NoPistolWeapon
    );

    let pistol = pistol();
    assert!(fx
        .cast(AbilityKind::BulletDive, target, Some(&pistol), false)
        .is_ok());
}

#[test]
fn test_point_blank_requires_shotgun_class() {
    let mut fx = Fixture::new();
    let enemy = fx.spawn_enemy(1, Cell::new(14, 10));
    let target = TargetSnapshot::pawn(enemy, Cell::new(14, 10));

    let pistol = pistol();
    assert_eq!(
        fx.cast(AbilityKind::PointBlank, target, Some(&pistol), false)
            .unwrap_err(),
        CastError::NoShotgunWeapon
    );

    let shotgun = shotgun();
    assert!(fx
        .cast(AbilityKind::PointBlank, target, Some(&shotgun), false)
        .is_ok());
}

// =============================================================================
// Target and Range Preconditions
// =============================================================================

#[test]
fn test_lunge_requires_pawn_target() {
    let mut fx = Fixture::new();
    let weapon = sword();
    assert_eq!(
        fx.cast(
            AbilityKind::Lunge,
            TargetSnapshot::cell(Cell::new(14, 10)),
            Some(&weapon),
            false
        )
        .unwrap_err(),
        CastError::MustTargetPawn
    );
}

#[test]
fn test_lunge_rejects_dead_target() {
    let mut fx = Fixture::new();
    let enemy = fx.spawn_enemy(1, Cell::new(14, 10));
    fx.pawns.get_mut(&enemy).unwrap().alive = false;
    let weapon = sword();

    assert_eq!(
        fx.cast(
            AbilityKind::Lunge,
            TargetSnapshot::pawn(enemy, Cell::new(14, 10)),
            Some(&weapon),
            false
        )
        .unwrap_err(),
        CastError::MustTargetPawn
    );
}

#[test]
fn test_bullet_dive_range_band() {
    let mut fx = Fixture::new();
    let weapon = pistol();

    // Too close (distance 3, band is 6..=10).
    let near = fx
        .cast(
            AbilityKind::BulletDive,
            TargetSnapshot::cell(Cell::new(13, 10)),
            Some(&weapon),
            false,
        )
        .unwrap_err();
    assert!(matches!(near, CastError::OutOfRangeBand { .. }));

    // Too far (distance 15).
    let far = fx
        .cast(
            AbilityKind::BulletDive,
            TargetSnapshot::cell(Cell::new(25, 10)),
            Some(&weapon),
            false,
        )
        .unwrap_err();
    assert!(matches!(far, CastError::OutOfRangeBand { .. }));

    // Inside the band (distance 8).
    assert!(fx
        .cast(
            AbilityKind::BulletDive,
            TargetSnapshot::cell(Cell::new(18, 10)),
            Some(&weapon),
            false
        )
        .is_ok());
}

#[test]
fn test_no_safe_landing_rejects_cast() {
    let mut fx = Fixture::new();
    // Surround the target with walls far beyond the landing search.
    let target_cell = Cell::new(18, 10);
    for dx in -7..=7 {
        for dz in -7..=7 {
            fx.grid
                .set_terrain(target_cell.offset(dx, dz), gridstrike::TerrainKind::Wall);
        }
    }
    let weapon = pistol();
    assert_eq!(
        fx.cast(
            AbilityKind::BulletDive,
            TargetSnapshot::cell(target_cell),
            Some(&weapon),
            false
        )
        .unwrap_err(),
        CastError::NoSafeLanding
    );
}

// =============================================================================
// State Preconditions
// =============================================================================

#[test]
fn test_disabled_kind_rejects_cast() {
    let mut fx = Fixture::new();
    fx.settings.ghost_dash_enabled = false;
    let weapon = sword();
    assert_eq!(
        fx.cast(
            AbilityKind::GhostDash,
            TargetSnapshot::cell(Cell::new(15, 10)),
            Some(&weapon),
            false
        )
        .unwrap_err(),
        CastError::Disabled
    );
}

#[test]
fn test_master_switch_rejects_all_casts() {
    let mut fx = Fixture::new();
    fx.settings.mod_enabled = false;
    assert_eq!(
        fx.cast(
            AbilityKind::Overdrive,
            TargetSnapshot::cell(Cell::new(10, 10)),
            None,
            false
        )
        .unwrap_err(),
        CastError::Disabled
    );
}

#[test]
fn test_active_instance_rejects_second_cast() {
    let mut fx = Fixture::new();
    let weapon = sword();
    assert_eq!(
        fx.cast(
            AbilityKind::GhostDash,
            TargetSnapshot::cell(Cell::new(15, 10)),
            Some(&weapon),
            true
        )
        .unwrap_err(),
        CastError::AlreadyCasting
    );
}

#[test]
fn test_incapacitated_caster_rejects_cast() {
    let mut fx = Fixture::new();
    fx.statuses
        .apply(gridstrike::engine::status::StatusEffect::stunned(60));
    let weapon = sword();
    assert_eq!(
        fx.cast(
            AbilityKind::GhostDash,
            TargetSnapshot::cell(Cell::new(15, 10)),
            Some(&weapon),
            false
        )
        .unwrap_err(),
        CastError::CasterIncapacitated
    );
}

#[test]
fn test_transformation_tier_rules() {
    use gridstrike::engine::status::StatusEffect;

    let mut fx = Fixture::new();
    let self_target = TargetSnapshot::cell(Cell::new(10, 10));

    // Fresh caster: both tiers castable.
    assert!(fx.cast(AbilityKind::Overdrive, self_target, None, false).is_ok());
    assert!(fx
        .cast(AbilityKind::Transcendence, self_target, None, false)
        .is_ok());

    // Tier 1 active: tier 1 rejected, tier 2 upgrades.
    fx.statuses.apply(StatusEffect::overdrive(1.5));
    assert!(matches!(
        fx.cast(AbilityKind::Overdrive, self_target, None, false)
            .unwrap_err(),
        CastError::TransformationActive(_)
    ));
    assert!(fx
        .cast(AbilityKind::Transcendence, self_target, None, false)
        .is_ok());

    // Tier 2 active: both rejected.
    fx.statuses.apply(StatusEffect::transcendence(2.0));
    assert_eq!(
        fx.cast(AbilityKind::Overdrive, self_target, None, false)
            .unwrap_err(),
        CastError::StrongerTransformationActive
    );
    assert!(matches!(
        fx.cast(AbilityKind::Transcendence, self_target, None, false)
            .unwrap_err(),
        CastError::TransformationActive(_)
    ));
}

// =============================================================================
// Instance Construction
// =============================================================================

#[test]
fn test_riftburst_starts_in_warmup_with_rolled_budget() {
    let mut fx = Fixture::new();
    let weapon = sword();
    let instance = fx
        .cast(
            AbilityKind::Riftburst,
            TargetSnapshot::cell(Cell::new(14, 10)),
            Some(&weapon),
            false,
        )
        .unwrap();
    assert_eq!(instance.phase, AbilityPhase::Warmup);
    match instance.state {
        gridstrike::engine::abilities::AbilityState::Burst(ref burst) => {
            assert!((30..=60).contains(&burst.warmup_left));
        }
        _ => panic!("Riftburst should carry burst state"),
    }
}

#[test]
fn test_lunge_path_lands_adjacent_not_on_target() {
    let mut fx = Fixture::new();
    let enemy = fx.spawn_enemy(1, Cell::new(14, 10));
    let weapon = sword();
    let instance = fx
        .cast(
            AbilityKind::Lunge,
            TargetSnapshot::pawn(enemy, Cell::new(14, 10)),
            Some(&weapon),
            false,
        )
        .unwrap();
    match instance.state {
        gridstrike::engine::abilities::AbilityState::Dash(ref dash) => {
            let last = *dash.path.cells().last().unwrap();
            assert_eq!(last, Cell::new(13, 10));
        }
        _ => panic!("Lunge should carry dash state"),
    }
}

#[test]
fn test_ghost_dash_path_ignores_walls() {
    let mut fx = Fixture::new();
    fx.grid.set_terrain(Cell::new(12, 10), gridstrike::TerrainKind::Wall);
    let weapon = sword();
    let instance = fx
        .cast(
            AbilityKind::GhostDash,
            TargetSnapshot::cell(Cell::new(15, 10)),
            Some(&weapon),
            false,
        )
        .unwrap();
    match instance.state {
        gridstrike::engine::abilities::AbilityState::Dash(ref dash) => {
            assert!(dash.path.cells().contains(&Cell::new(12, 10)));
            assert!(dash.path.cells().contains(&Cell::new(15, 10)));
        }
        _ => panic!("Ghost Dash should carry dash state"),
    }
}
