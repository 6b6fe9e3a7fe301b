//! Cinderfall: a barrage of falling fire orbs.
//!
//! The ranged cousin of Blade Rain: orbs rain over the target circle at
//! a fixed cadence, their count scaling with shooting skill up to a
//! configured cap. Orbs are summoned fire, so damage goes through the
//! skill resolver (attributed to the ability, not the gun) and every
//! orb sets its victims burning.

use crate::engine::cast::{CastContext, CastError};
use crate::engine::components::GameRng;
use crate::engine::damage;
use crate::engine::effects::{SoundKind, VisualKind};
use crate::engine::grid::{Cell, WorldView};
use crate::engine::projectiles::{ProjectileMotion, ProjectileSpawn};
use crate::engine::weapon::DamageKind;
use crate::settings::AbilitySettings;

use super::{
    AbilityAction, AbilityKind, AbilityPhase, AbilityState, ActiveAbility, BarrageState,
    CasterCtx, TargetSnapshot,
};

const ORB_FALL_TICKS: u32 = 12;
const ORB_IMPACT_RADIUS: f32 = 1.5;

/// Orb count: base plus half of shooting skill, capped.
fn total_orbs(base: u32, shooting_skill: u8, cap: u32) -> u32 {
    let total = base + shooting_skill as u32 / 2;
    if cap > 0 {
        total.min(cap)
    } else {
        total
    }
}

pub fn validate(
    target: TargetSnapshot,
    ctx: &CastContext,
    _view: &WorldView,
    _rng: &mut GameRng,
) -> Result<ActiveAbility, CastError> {
    if !ctx.weapon.is_some_and(|w| w.is_ranged()) {
        return Err(CastError::NoRangedWeapon);
    }
    ctx.check_range_band(AbilityKind::Cinderfall, &target)?;

    let def = ctx.defs.get_unchecked(AbilityKind::Cinderfall);
    Ok(ActiveAbility::new(
        AbilityKind::Cinderfall,
        AbilityPhase::Executing,
        target,
        AbilityState::Barrage(BarrageState {
            waves_done: 0,
            total: total_orbs(def.base_waves, ctx.combatant.shooting_skill, def.max_total),
            interval: def.wave_interval.max(1),
            ticks_since_wave: def.wave_interval.max(1),
            radius: def.radius,
            grace_ticks: def.grace_ticks,
        }),
    ))
}

fn random_cell_in_circle(center: Cell, radius: f32, rng: &mut GameRng, view: &WorldView) -> Cell {
    let angle = rng.random_range(0.0, std::f32::consts::TAU);
    let distance = radius * rng.random_f32().sqrt();
    let cell = Cell::new(
        center.x + (angle.cos() * distance).round() as i32,
        center.z + (angle.sin() * distance).round() as i32,
    );
    if view.in_bounds(cell) {
        cell
    } else {
        center
    }
}

pub fn tick(
    ability: &mut ActiveAbility,
    caster: &CasterCtx,
    view: &WorldView,
    settings: &AbilitySettings,
    rng: &mut GameRng,
    actions: &mut Vec<AbilityAction>,
) {
    let center = ability.target.cell;
    let AbilityState::Barrage(barrage) = &mut ability.state else {
        ability.phase = AbilityPhase::Cancelled;
        return;
    };

    match ability.phase {
        AbilityPhase::Executing => {
            barrage.ticks_since_wave += 1;
            if barrage.ticks_since_wave < barrage.interval {
                return;
            }
            barrage.ticks_since_wave = 0;

            let multiplier =
                settings.damage_multiplier(AbilityKind::Cinderfall) * caster.damage_bonus;
            let cell = random_cell_in_circle(center, barrage.radius, rng, view);
            actions.push(AbilityAction::SpawnProjectile(ProjectileSpawn {
                source: caster.entity,
                source_faction: caster.combatant.faction,
                label: AbilityKind::Cinderfall.name().to_string(),
                spec: damage::resolve_skill(
                    caster.combatant.shooting_skill,
                    multiplier,
                    DamageKind::Burn,
                ),
                motion: ProjectileMotion::Falling {
                    cell,
                    delay_ticks: ORB_FALL_TICKS,
                    impact_radius: ORB_IMPACT_RADIUS,
                    burn_chance: 1.0,
                },
            }));
            actions.push(AbilityAction::Visual {
                kind: VisualKind::FireGlow,
                cell,
                scale: 1.0,
            });
            actions.push(AbilityAction::Sound {
                kind: SoundKind::BurstImpact,
                cell,
            });
            barrage.waves_done += 1;

            if barrage.waves_done >= barrage.total {
                ability.transition(AbilityPhase::Sustaining);
            }
        }
        AbilityPhase::Sustaining => {
            if ability.ticks_in_phase >= barrage.grace_ticks {
                ability.transition(AbilityPhase::Complete);
            }
        }
        _ => {
            ability.transition(AbilityPhase::Cancelled);
        }
    }
}
