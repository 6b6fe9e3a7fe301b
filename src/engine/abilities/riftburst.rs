//! Riftburst: gather for a moment, then burst-slash an area.
//!
//! The warmup length is rolled once at cast (30 to 60 ticks) and counts
//! down with a visible pulse every ten ticks; the caster is committed
//! but the instance cancels cleanly if the caster goes down. On
//! completion, one to three slashes land around the target cell (mostly
//! one; two or three on lucky rolls), each dealing full weapon damage to
//! everything within two cells of its impact point.

use crate::engine::cast::{CastContext, CastError};
use crate::engine::components::GameRng;
use crate::engine::damage;
use crate::engine::effects::{SoundKind, VisualKind};
use crate::engine::grid::{Cell, WorldView};
use crate::engine::targeting::{self, TargetFilter};
use crate::settings::AbilitySettings;

use super::{
    AbilityAction, AbilityKind, AbilityPhase, AbilityState, ActiveAbility, BurstState, CasterCtx,
    TargetSnapshot,
};

const SLASH_RADIUS: f32 = 2.0;

pub fn validate(
    target: TargetSnapshot,
    ctx: &CastContext,
    _view: &WorldView,
    rng: &mut GameRng,
) -> Result<ActiveAbility, CastError> {
    if !ctx.weapon.is_some_and(|w| w.is_melee_weapon()) {
        return Err(CastError::NoMeleeWeapon);
    }
    ctx.check_range_band(AbilityKind::Riftburst, &target)?;

    let def = ctx.defs.get_unchecked(AbilityKind::Riftburst);
    // The warmup budget is decided once, at cast.
    let warmup = rng.range_inclusive(def.warmup_min as i32, def.warmup_max as i32) as u32;

    Ok(ActiveAbility::new(
        AbilityKind::Riftburst,
        AbilityPhase::Warmup,
        target,
        AbilityState::Burst(BurstState {
            warmup_left: warmup,
            pulse_interval: def.pulse_interval.max(1),
            ticks_until_pulse: def.pulse_interval.max(1),
        }),
    ))
}

/// Slash count distribution: 80% one, 15% two, 5% three.
fn roll_slash_count(rng: &mut GameRng) -> u32 {
    let roll = rng.random_f32();
    if roll <= 0.05 {
        3
    } else if roll <= 0.20 {
        2
    } else {
        1
    }
}

/// Impact point for slash `index` of `total`: the target cell itself for
/// a single slash, a short randomized spread around it otherwise.
fn slash_position(
    target: Cell,
    index: u32,
    total: u32,
    rng: &mut GameRng,
    view: &WorldView,
) -> Cell {
    if total == 1 {
        return target;
    }
    let angle = (360.0 / total as f32) * index as f32;
    let distance = rng.random_range(0.5, 1.5);
    let cell = Cell::new(
        target.x + (angle.to_radians().cos() * distance).round() as i32,
        target.z + (angle.to_radians().sin() * distance).round() as i32,
    );
    if view.in_bounds(cell) {
        cell
    } else {
        target
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
    let target_cell = ability.target.cell;
    let AbilityState::Burst(burst) = &mut ability.state else {
        ability.phase = AbilityPhase::Cancelled;
        return;
    };

    match ability.phase {
        AbilityPhase::Warmup => {
            burst.warmup_left = burst.warmup_left.saturating_sub(1);
            burst.ticks_until_pulse = burst.ticks_until_pulse.saturating_sub(1);
            if burst.ticks_until_pulse == 0 {
                burst.ticks_until_pulse = burst.pulse_interval;
                actions.push(AbilityAction::Visual {
                    kind: VisualKind::WarmupPulse,
                    cell: caster.cell,
                    scale: 0.8,
                });
            }
            if burst.warmup_left == 0 {
                ability.transition(AbilityPhase::Executing);
            }
        }
        AbilityPhase::Executing => {
            let slash_count = roll_slash_count(rng);
            let multiplier =
                settings.damage_multiplier(AbilityKind::Riftburst) * caster.damage_bonus;
            let filter = TargetFilter::from_settings(
                caster.entity,
                caster.combatant.faction,
                settings,
            );

            for index in 0..slash_count {
                let position = slash_position(target_cell, index, slash_count, rng, view);
                actions.push(AbilityAction::Visual {
                    kind: VisualKind::Flash,
                    cell: position,
                    scale: 3.0,
                });
                actions.push(AbilityAction::Sound {
                    kind: SoundKind::BurstImpact,
                    cell: position,
                });

                // Snapshot victims before queueing damage.
                let victims = targeting::collect_in_radius(position, SLASH_RADIUS, &filter, view);
                for victim in victims {
                    if let Some(spec) = caster
                        .weapon
                        .and_then(|w| damage::resolve_melee(w, multiplier, settings))
                    {
                        actions.push(AbilityAction::Damage {
                            target: victim,
                            spec,
                            ability_label: AbilityKind::Riftburst.name().to_string(),
                        });
                    }
                }
            }
            ability.transition(AbilityPhase::Complete);
        }
        _ => {
            ability.transition(AbilityPhase::Cancelled);
        }
    }
}
