//! Ghost Dash: a dash that cuts straight through obstacles.
//!
//! The path is obstruction-bypassing on purpose: trees, walls and other
//! blockers do not stop the dash, which is the ability's defining trick.
//! Each step teleports the caster one cell forward and slashes the 3x3
//! block around the new position. A per-instance already-hit set keeps
//! any pawn from being slashed twice by one dash.
//!
//! Dash length scales with melee skill. If the dash ends somewhere a
//! pawn cannot actually stand, the caster is shunted to the nearest safe
//! cell as the instance completes.

use crate::engine::cast::{CastContext, CastError};
use crate::engine::components::GameRng;
use crate::engine::damage;
use crate::engine::effects::VisualKind;
use crate::engine::grid::WorldView;
use crate::engine::path::{self, PathMode};
use crate::settings::AbilitySettings;

use super::{
    sweep_3x3, AbilityAction, AbilityKind, AbilityPhase, AbilityState, ActiveAbility, CasterCtx,
    DashState, TargetSnapshot,
};

const SWEEP_STAGGER_SEVERITY: f32 = 0.4;

/// Dash length from melee skill: base 10 cells, half a cell per skill
/// level, capped at 20.
fn max_dash_cells(melee_skill: u8) -> usize {
    (10 + melee_skill as usize / 2).clamp(10, 20)
}

pub fn validate(
    target: TargetSnapshot,
    ctx: &CastContext,
    view: &WorldView,
    _rng: &mut GameRng,
) -> Result<ActiveAbility, CastError> {
    if !ctx.weapon.is_some_and(|w| w.is_melee_weapon()) {
        return Err(CastError::NoMeleeWeapon);
    }
    if target.cell == ctx.caster_cell {
        return Err(CastError::CannotTargetSelf);
    }

    let def = ctx.defs.get_unchecked(AbilityKind::GhostDash);
    let dash_path = path::plan_path(
        ctx.caster_cell,
        target.cell,
        PathMode::Bypassing,
        max_dash_cells(ctx.combatant.melee_skill),
        view,
    );
    if dash_path.is_empty() {
        return Err(CastError::NoPath);
    }

    Ok(ActiveAbility::new(
        AbilityKind::GhostDash,
        AbilityPhase::Executing,
        target,
        AbilityState::Dash(DashState::new(dash_path, def.step_interval.max(1))),
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
    let AbilityState::Dash(dash) = &mut ability.state else {
        ability.phase = AbilityPhase::Cancelled;
        return;
    };

    dash.ticks_since_step += 1;
    if dash.ticks_since_step < dash.step_interval {
        return;
    }
    dash.ticks_since_step = 0;

    let Some(next) = dash.path.advance() else {
        ability.transition(AbilityPhase::Complete);
        return;
    };

    actions.push(AbilityAction::Visual {
        kind: VisualKind::DustPuff,
        cell: caster.cell,
        scale: 1.2,
    });
    actions.push(AbilityAction::MoveCaster(next));

    let multiplier = settings.damage_multiplier(AbilityKind::GhostDash) * caster.damage_bonus;
    sweep_3x3(
        next,
        caster,
        view,
        settings,
        &mut dash.already_hit,
        || {
            caster
                .weapon
                .and_then(|w| damage::resolve_melee(w, multiplier, settings))
        },
        AbilityKind::GhostDash.name(),
        SWEEP_STAGGER_SEVERITY,
        actions,
    );

    if dash.path.finished() {
        // A bypassing dash can legally end inside a wall; shunt to the
        // nearest safe cell so the caster does not stay embedded there.
        if !path::is_safe_landing(next, caster.entity, view) {
            if let Some(landing) = path::find_safe_landing(next, caster.entity, 2, view, rng) {
                actions.push(AbilityAction::MoveCaster(landing));
            }
        }
        ability.transition(AbilityPhase::Complete);
    }
}
