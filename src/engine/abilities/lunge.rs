//! Lunge: dash to an enemy and strike once on arrival.
//!
//! The dash path is obstruction-respecting and lands adjacent to the
//! target, never on top of it. One cell advances per step interval; the
//! moment the caster is adjacent the single strike lands, gated by
//! `has_struck` so a lingering instance can never hit twice. The strike
//! also staggers the target briefly.

use crate::engine::cast::{CastContext, CastError};
use crate::engine::components::GameRng;
use crate::engine::damage;
use crate::engine::effects::{SoundKind, VisualKind};
use crate::engine::grid::WorldView;
use crate::engine::path::{self, PathMode, PlannedPath};
use crate::engine::status::StatusEffect;
use crate::settings::AbilitySettings;

use super::{
    AbilityAction, AbilityKind, AbilityPhase, AbilityState, ActiveAbility, CasterCtx, DashState,
    TargetSnapshot,
};

const STRIKE_STAGGER_SEVERITY: f32 = 0.3;

pub fn validate(
    target: TargetSnapshot,
    ctx: &CastContext,
    view: &WorldView,
    rng: &mut GameRng,
) -> Result<ActiveAbility, CastError> {
    if !ctx.weapon.is_some_and(|w| w.is_melee_weapon()) {
        return Err(CastError::NoMeleeWeapon);
    }
    let target_entity = ctx.check_pawn_target(&target, view)?;
    ctx.check_range_band(AbilityKind::Lunge, &target)?;

    let def = ctx.defs.get_unchecked(AbilityKind::Lunge);
    let mut dash_path = path::plan_path_to_entity(
        ctx.caster_cell,
        target.cell,
        PathMode::Respecting,
        def.range.ceil() as usize,
        view,
    );

    if dash_path.is_empty() {
        if ctx.caster_cell.chebyshev_distance(target.cell) <= 1 {
            // Already adjacent: no movement, straight to the strike.
        } else {
            // The straight line is blocked immediately; fall back to a
            // safe landing right next to the target.
            let landing = path::find_safe_landing(target.cell, ctx.caster, 1, view, rng)
                .ok_or(CastError::NoSafeLanding)?;
            dash_path = PlannedPath::from_cells([landing], PathMode::Respecting);
        }
    }

    Ok(ActiveAbility::new(
        AbilityKind::Lunge,
        AbilityPhase::Executing,
        TargetSnapshot::pawn(target_entity, target.cell),
        AbilityState::Dash(DashState::new(dash_path, def.step_interval.max(1))),
    ))
}

pub fn tick(
    ability: &mut ActiveAbility,
    caster: &CasterCtx,
    view: &WorldView,
    settings: &AbilitySettings,
    _rng: &mut GameRng,
    actions: &mut Vec<AbilityAction>,
) {
    let target = ability.target;
    let AbilityState::Dash(dash) = &mut ability.state else {
        ability.phase = AbilityPhase::Cancelled;
        return;
    };

    let mut position = caster.cell;

    // At most one cell per step interval.
    dash.ticks_since_step += 1;
    if dash.ticks_since_step >= dash.step_interval && !dash.path.finished() {
        dash.ticks_since_step = 0;
        if let Some(next) = dash.path.peek() {
            // Re-check the cell this tick; the world may have changed
            // since the path was planned.
            let blocked = !view.standable(next)
                || view.occupant_at(next).is_some_and(|e| e != caster.entity);
            if blocked {
                // Dash stops short; strike only if already in reach.
                while dash.path.advance().is_some() {}
            } else {
                dash.path.advance();
                actions.push(AbilityAction::Visual {
                    kind: VisualKind::DustPuff,
                    cell: position,
                    scale: 1.5,
                });
                actions.push(AbilityAction::MoveCaster(next));
                position = next;
            }
        }
    }

    // Strike the instant adjacency is reached, exactly once.
    if !dash.has_struck && position.chebyshev_distance(target.cell) <= 1 {
        if let Some(target_entity) = target.entity {
            let multiplier =
                settings.damage_multiplier(AbilityKind::Lunge) * caster.damage_bonus;
            // The weapon was validated at cast but can vanish between
            // ticks; a lost weapon makes the strike fizzle, not panic.
            if let Some(spec) = caster
                .weapon
                .and_then(|w| damage::resolve_melee(w, multiplier, settings))
            {
                actions.push(AbilityAction::Damage {
                    target: target_entity,
                    spec,
                    ability_label: AbilityKind::Lunge.name().to_string(),
                });
                actions.push(AbilityAction::ApplyStatus {
                    target: target_entity,
                    effect: StatusEffect::stagger(STRIKE_STAGGER_SEVERITY)
                        .with_source(caster.entity),
                });
                actions.push(AbilityAction::Visual {
                    kind: VisualKind::ImpactSpark,
                    cell: target.cell,
                    scale: 1.5,
                });
                actions.push(AbilityAction::Sound {
                    kind: SoundKind::SlashHit,
                    cell: target.cell,
                });
            }
            dash.has_struck = true;
        }
        ability.transition(AbilityPhase::Complete);
        return;
    }

    // Path exhausted without reaching the target: the dash stopped short
    // of an obstacle and the instance simply ends.
    if dash.path.finished() {
        ability.transition(AbilityPhase::Complete);
    }
}
