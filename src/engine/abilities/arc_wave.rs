//! Arc Wave: launch piercing slash waves down a line.
//!
//! One to three waves (mostly one; the same lucky-roll distribution as
//! Riftburst) launch twenty ticks apart from the caster's current cell
//! toward the target, each extended out to the full projectile range and
//! traveling as an independent piercing projectile. In a multi-wave
//! volley the final wave hits half again as hard.

use crate::engine::cast::{CastContext, CastError};
use crate::engine::components::GameRng;
use crate::engine::damage;
use crate::engine::effects::{SoundKind, VisualKind};
use crate::engine::grid::{Cell, WorldView};
use crate::engine::path::{self, PathMode};
use crate::engine::projectiles::{ProjectileMotion, ProjectileSpawn};
use crate::settings::AbilitySettings;

use super::{
    AbilityAction, AbilityKind, AbilityPhase, AbilityState, ActiveAbility, CasterCtx,
    TargetSnapshot, VolleyState,
};

/// Full travel distance of a wave, in cells.
const WAVE_RANGE: f32 = 25.0;
/// Damage bonus on the final wave of a multi-wave volley.
const FINAL_WAVE_BONUS: f32 = 1.5;

fn roll_wave_count(rng: &mut GameRng) -> u32 {
    let roll = rng.random_f32();
    if roll <= 0.05 {
        3
    } else if roll <= 0.20 {
        2
    } else {
        1
    }
}

pub fn validate(
    target: TargetSnapshot,
    ctx: &CastContext,
    _view: &WorldView,
    rng: &mut GameRng,
) -> Result<ActiveAbility, CastError> {
    if !ctx.weapon.is_some_and(|w| w.is_melee_weapon()) {
        return Err(CastError::NoMeleeWeapon);
    }
    if target.cell == ctx.caster_cell {
        return Err(CastError::CannotTargetSelf);
    }

    let def = ctx.defs.get_unchecked(AbilityKind::ArcWave);
    let interval = def.wave_interval.max(1);
    Ok(ActiveAbility::new(
        AbilityKind::ArcWave,
        AbilityPhase::Executing,
        target,
        AbilityState::Volley(VolleyState {
            launched: 0,
            total: roll_wave_count(rng),
            interval,
            // First wave launches on the first tick.
            ticks_since_launch: interval,
        }),
    ))
}

/// Extend the caster-to-target line out to the full wave range.
fn extended_target(from: Cell, toward: Cell) -> Cell {
    match from.direction_to(toward) {
        Some((dx, dz)) => Cell::new(
            from.x + (dx * WAVE_RANGE).round() as i32,
            from.z + (dz * WAVE_RANGE).round() as i32,
        ),
        None => toward,
    }
}

pub fn tick(
    ability: &mut ActiveAbility,
    caster: &CasterCtx,
    view: &WorldView,
    settings: &AbilitySettings,
    _rng: &mut GameRng,
    actions: &mut Vec<AbilityAction>,
) {
    let target_cell = ability.target.cell;
    let AbilityState::Volley(volley) = &mut ability.state else {
        ability.phase = AbilityPhase::Cancelled;
        return;
    };

    volley.ticks_since_launch += 1;
    if volley.ticks_since_launch < volley.interval {
        return;
    }
    volley.ticks_since_launch = 0;

    let is_final = volley.launched + 1 == volley.total && volley.total >= 2;
    let mut multiplier = settings.damage_multiplier(AbilityKind::ArcWave) * caster.damage_bonus;
    if is_final {
        multiplier *= FINAL_WAVE_BONUS;
    }

    if let Some(spec) = caster
        .weapon
        .and_then(|w| damage::resolve_melee(w, multiplier, settings))
    {
        let wave_path = path::plan_path(
            caster.cell,
            extended_target(caster.cell, target_cell),
            PathMode::Bypassing,
            WAVE_RANGE as usize,
            view,
        );
        if !wave_path.is_empty() {
            actions.push(AbilityAction::SpawnProjectile(ProjectileSpawn {
                source: caster.entity,
                source_faction: caster.combatant.faction,
                label: AbilityKind::ArcWave.name().to_string(),
                spec,
                motion: ProjectileMotion::Piercing {
                    path: wave_path,
                    step_interval: 1,
                },
            }));
        }
        actions.push(AbilityAction::Visual {
            kind: VisualKind::SlashArc,
            cell: caster.cell,
            scale: 2.0 + volley.launched as f32 * 0.3,
        });
        actions.push(AbilityAction::Sound {
            kind: if is_final {
                SoundKind::BurstImpact
            } else {
                SoundKind::BladeWhoosh
            },
            cell: caster.cell,
        });
    }
    volley.launched += 1;

    if volley.launched >= volley.total {
        ability.transition(AbilityPhase::Complete);
    }
}
