//! Bullet Dive: leap over the battlefield raining pistol fire, then land
//! at the target point.
//!
//! The jump path ignores ground obstacles (the caster is airborne) and
//! is walked front to back; at each path cell a burst of bullets drops
//! straight down, the burst size scaling with shooting skill. A hard cap
//! bounds the total volley. When the path is spent the caster lands at
//! the nearest safe cell around the target.
//!
//! The cast demands a pistol-class weapon and a target inside a strict
//! range band, and refuses outright when no safe landing exists near the
//! target, so the caster can never strand itself mid-air.

use crate::engine::cast::{CastContext, CastError};
use crate::engine::components::GameRng;
use crate::engine::damage;
use crate::engine::effects::{SoundKind, VisualKind};
use crate::engine::grid::WorldView;
use crate::engine::path::{self, PathMode};
use crate::engine::projectiles::{ProjectileMotion, ProjectileSpawn};
use crate::settings::AbilitySettings;

use super::{
    AbilityAction, AbilityKind, AbilityPhase, AbilityState, ActiveAbility, CasterCtx, DiveState,
    TargetSnapshot,
};

/// Bullets dropped per path cell from shooting skill, clamped 3..=6.
fn bullets_per_cell(shooting_skill: u8) -> u32 {
    (3 + shooting_skill as u32 / 4).clamp(3, 6)
}

pub fn validate(
    target: TargetSnapshot,
    ctx: &CastContext,
    view: &WorldView,
    rng: &mut GameRng,
) -> Result<ActiveAbility, CastError> {
    if !ctx.weapon.is_some_and(|w| w.is_pistol()) {
        return Err(CastError::NoPistolWeapon);
    }
    ctx.check_range_band(AbilityKind::BulletDive, &target)?;

    // Reject up front when there is nowhere to land; the dive must end
    // on solid ground.
    if path::find_safe_landing(target.cell, ctx.caster, 3, view, rng).is_none() {
        return Err(CastError::NoSafeLanding);
    }

    let def = ctx.defs.get_unchecked(AbilityKind::BulletDive);
    let jump_path = path::plan_path(
        ctx.caster_cell,
        target.cell,
        PathMode::Bypassing,
        def.range.ceil() as usize + 1,
        view,
    );
    if jump_path.is_empty() {
        return Err(CastError::NoPath);
    }

    Ok(ActiveAbility::new(
        AbilityKind::BulletDive,
        AbilityPhase::Executing,
        target,
        AbilityState::Dive(DiveState {
            path: jump_path,
            bullets_per_cell: bullets_per_cell(ctx.combatant.shooting_skill),
            fired_in_cell: 0,
            total_fired: 0,
            interval: def.step_interval.max(1),
            ticks_since_shot: def.step_interval.max(1),
        }),
    ))
}

pub fn tick(
    ability: &mut ActiveAbility,
    caster: &CasterCtx,
    view: &WorldView,
    settings: &AbilitySettings,
    rng: &mut GameRng,
    actions: &mut Vec<AbilityAction>,
) {
    let target_cell = ability.target.cell;
    let AbilityState::Dive(dive) = &mut ability.state else {
        ability.phase = AbilityPhase::Cancelled;
        return;
    };

    let def_max_total = 50;

    // Path exhausted (or volley capped): land and finish.
    if dive.path.finished() || dive.total_fired >= def_max_total {
        if let Some(landing) = path::find_safe_landing(target_cell, caster.entity, 3, view, rng) {
            actions.push(AbilityAction::MoveCaster(landing));
            actions.push(AbilityAction::Visual {
                kind: VisualKind::Flash,
                cell: landing,
                scale: 2.0,
            });
            actions.push(AbilityAction::Sound {
                kind: SoundKind::Teleport,
                cell: landing,
            });
        }
        // No safe landing anymore: the caster stays where it was. What
        // was already fired stays fired.
        ability.transition(AbilityPhase::Complete);
        return;
    }

    // At most one bullet per interval.
    dive.ticks_since_shot += 1;
    if dive.ticks_since_shot < dive.interval {
        return;
    }
    dive.ticks_since_shot = 0;

    let Some(cell) = dive.path.peek() else {
        return;
    };

    let multiplier = settings.damage_multiplier(AbilityKind::BulletDive) * caster.damage_bonus;
    if let Some(spec) = caster
        .weapon
        .and_then(|w| damage::resolve_ranged(w, multiplier))
    {
        actions.push(AbilityAction::SpawnProjectile(ProjectileSpawn {
            source: caster.entity,
            source_faction: caster.combatant.faction,
            label: AbilityKind::BulletDive.name().to_string(),
            spec,
            motion: ProjectileMotion::Falling {
                cell,
                delay_ticks: 2,
                impact_radius: 0.0,
                burn_chance: 0.0,
            },
        }));
        actions.push(AbilityAction::Visual {
            kind: VisualKind::MuzzleFlash,
            cell,
            scale: 0.8,
        });
        actions.push(AbilityAction::Sound {
            kind: SoundKind::GunShot,
            cell,
        });
    }
    dive.total_fired += 1;
    dive.fired_in_cell += 1;

    if dive.fired_in_cell >= dive.bullets_per_cell {
        dive.path.advance();
        dive.fired_in_cell = 0;
    }
}
