//! Blade Rain: a barrage of spectral blades over an area.
//!
//! One blade falls every few ticks at a uniformly random point inside
//! the target circle; the total count scales with melee skill and is
//! decided once at cast. The blades are summoned, not thrown, so their
//! damage comes from the skill resolver and is attributed to the ability
//! name. After the last blade a rare bonus blade can strike the exact
//! center, and the instance holds a short grace window so the final
//! impacts land before it deregisters.

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

/// How long a summoned blade hangs before striking.
const BLADE_FALL_TICKS: u32 = 10;
const BLADE_IMPACT_RADIUS: f32 = 1.5;
const SPECIAL_BLADE_IMPACT_RADIUS: f32 = 2.5;

/// Blade count: base plus three quarters of melee skill.
fn total_blades(base: u32, melee_skill: u8, cap: u32) -> u32 {
    let total = base + (melee_skill as f32 * 0.75) as u32;
    if cap > 0 {
        total.min(cap)
    } else {
        total
    }
}

/// Chance for the bonus center blade: 1% plus 0.3% per melee level.
fn special_blade_chance(melee_skill: u8) -> f32 {
    (1.0 + melee_skill as f32 * 0.3) / 100.0
}

pub fn validate(
    target: TargetSnapshot,
    ctx: &CastContext,
    _view: &WorldView,
    _rng: &mut GameRng,
) -> Result<ActiveAbility, CastError> {
    ctx.check_range_band(AbilityKind::BladeRain, &target)?;

    let def = ctx.defs.get_unchecked(AbilityKind::BladeRain);
    Ok(ActiveAbility::new(
        AbilityKind::BladeRain,
        AbilityPhase::Executing,
        target,
        AbilityState::Barrage(BarrageState {
            waves_done: 0,
            total: total_blades(def.base_waves, ctx.combatant.melee_skill, def.max_total),
            interval: def.wave_interval.max(1),
            ticks_since_wave: def.wave_interval.max(1),
            radius: def.radius,
            grace_ticks: def.grace_ticks,
        }),
    ))
}

/// A uniformly random cell inside the circle around `center`.
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
                settings.damage_multiplier(AbilityKind::BladeRain) * caster.damage_bonus;
            let cell = random_cell_in_circle(center, barrage.radius, rng, view);
            actions.push(AbilityAction::SpawnProjectile(ProjectileSpawn {
                source: caster.entity,
                source_faction: caster.combatant.faction,
                label: AbilityKind::BladeRain.name().to_string(),
                spec: damage::resolve_skill(
                    caster.combatant.shooting_skill,
                    multiplier,
                    DamageKind::Stab,
                ),
                motion: ProjectileMotion::Falling {
                    cell,
                    delay_ticks: BLADE_FALL_TICKS,
                    impact_radius: BLADE_IMPACT_RADIUS,
                    burn_chance: 0.0,
                },
            }));
            actions.push(AbilityAction::Visual {
                kind: VisualKind::Flash,
                cell,
                scale: 0.8,
            });
            actions.push(AbilityAction::Sound {
                kind: SoundKind::BladeWhoosh,
                cell,
            });
            barrage.waves_done += 1;

            if barrage.waves_done >= barrage.total {
                // Rare finisher at the exact center, twice as heavy.
                if rng.chance(special_blade_chance(caster.combatant.melee_skill)) {
                    let multiplier = multiplier * 2.0;
                    actions.push(AbilityAction::SpawnProjectile(ProjectileSpawn {
                        source: caster.entity,
                        source_faction: caster.combatant.faction,
                        label: AbilityKind::BladeRain.name().to_string(),
                        spec: damage::resolve_skill(
                            caster.combatant.shooting_skill,
                            multiplier,
                            DamageKind::Stab,
                        ),
                        motion: ProjectileMotion::Falling {
                            cell: center,
                            delay_ticks: BLADE_FALL_TICKS + 5,
                            impact_radius: SPECIAL_BLADE_IMPACT_RADIUS,
                            burn_chance: 0.0,
                        },
                    }));
                    actions.push(AbilityAction::Visual {
                        kind: VisualKind::Flash,
                        cell: center,
                        scale: 3.5,
                    });
                }
                ability.transition(AbilityPhase::Sustaining);
            }
        }
        AbilityPhase::Sustaining => {
            // Grace window: in-flight blades resolve on their own, the
            // instance just waits before deregistering.
            if ability.ticks_in_phase >= barrage.grace_ticks {
                ability.transition(AbilityPhase::Complete);
            }
        }
        _ => {
            ability.transition(AbilityPhase::Cancelled);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_blades_scales_with_melee() {
        assert_eq!(total_blades(15, 0, 0), 15);
        assert_eq!(total_blades(15, 8, 0), 21);
        assert_eq!(total_blades(15, 20, 0), 30);
    }

    #[test]
    fn test_total_blades_honors_cap() {
        assert_eq!(total_blades(15, 20, 25), 25);
    }

    #[test]
    fn test_special_chance_bounds() {
        assert!((special_blade_chance(0) - 0.01).abs() < 1e-6);
        assert!((special_blade_chance(20) - 0.07).abs() < 1e-6);
    }
}
